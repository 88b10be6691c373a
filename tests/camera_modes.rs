//! Integration tests for camera mode switching and input-driven sessions.

use glam::{Mat4, Quat, Vec2, Vec3};
use nibiru::{CameraController, CameraMode, CameraSettings, FrameInput, OrientationCamera, ZoomKind};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const MODES: [CameraMode; 4] = [
    CameraMode::FirstPerson,
    CameraMode::Watch,
    CameraMode::Fly,
    CameraMode::Orbit,
];

fn camera() -> OrientationCamera {
    OrientationCamera::new(CameraSettings::default()).unwrap()
}

/// The view matrix must always be the rigid inverse of the camera pose.
fn assert_view_consistent(cam: &OrientationCamera) {
    let position = cam.position();
    let expected = Mat4::look_at_rh(position, position + cam.view_direction(), cam.y_axis());
    assert!(
        cam.view().abs_diff_eq(expected, 1e-3),
        "view {:?} does not match pose at {position:?} in {:?}",
        cam.view(),
        cam.mode()
    );
    assert!((cam.orientation().length() - 1.0).abs() < 1e-4);
}

#[test]
fn test_random_session_keeps_pose_consistent() {
    let mut rng = SmallRng::seed_from_u64(7);
    let mut cam = camera();
    cam.set_orbit_target(Vec3::new(3.0, 1.0, -4.0));

    for step in 0..500 {
        if step % 50 == 0 {
            cam.set_mode(MODES[rng.gen_range(0..MODES.len())]);
        }

        cam.rotate(
            rng.gen_range(-20.0..20.0),
            rng.gen_range(-20.0..20.0),
            rng.gen_range(-20.0..20.0),
        );
        cam.move_by(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );

        assert_view_consistent(&cam);

        match cam.mode() {
            CameraMode::Orbit => {
                let distance = (cam.position() - cam.orbit_target()).length();
                assert!((distance - cam.orbit_offset()).abs() < 1e-3);
            }
            CameraMode::FirstPerson | CameraMode::Watch => {
                assert!(cam.accumulated_pitch().abs() <= 90.0);
                assert!(cam.x_axis().y.abs() < 1e-3);
            }
            CameraMode::Fly => {}
        }
    }
}

#[test]
fn test_orbit_is_a_detour_from_every_mode() {
    for mode in [CameraMode::FirstPerson, CameraMode::Watch, CameraMode::Fly] {
        let mut cam = camera();
        cam.set_mode(mode);
        cam.set_position(Vec3::new(-2.0, 0.0, 7.0));
        cam.rotate(40.0, 25.0, 0.0);

        let position = cam.position();
        let orientation = cam.orientation();

        cam.set_mode(CameraMode::Orbit);
        cam.rotate(30.0, -10.0, 0.0);
        cam.zoom(4.0, 1.0, 100.0);
        cam.set_mode(mode);

        assert!(cam.position().abs_diff_eq(position, 1e-4), "{mode:?}");
        // q and -q are the same rotation.
        assert!((cam.orientation().dot(orientation).abs() - 1.0).abs() < 1e-4, "{mode:?}");
    }
}

#[test]
fn test_orbit_starts_behind_current_view() {
    let mut cam = camera();
    cam.set_mode(CameraMode::Fly);
    cam.set_orientation(Quat::from_rotation_y(90f32.to_radians()));
    cam.set_orbit_target(Vec3::new(0.0, 2.0, 0.0));

    cam.set_mode(CameraMode::Orbit);
    let expected = Vec3::new(0.0, 2.0, 0.0) + Vec3::X * cam.orbit_offset();
    assert!(cam.position().abs_diff_eq(expected, 1e-3));
    assert!(cam.view_direction().abs_diff_eq(Vec3::NEG_X, 1e-4));
    assert!(cam.target_y().abs_diff_eq(Vec3::Y, 1e-4));
}

#[test]
fn test_orbit_follows_moving_target() {
    let mut cam = camera();
    cam.set_mode(CameraMode::Orbit);
    let offset = cam.position() - cam.orbit_target();

    cam.set_orbit_target(Vec3::new(10.0, 0.0, 0.0));
    assert!((cam.position() - cam.orbit_target()).abs_diff_eq(offset, 1e-4));
}

#[test]
fn test_zoom_dispatch_by_mode() {
    for mode in MODES {
        let mut cam = camera();
        cam.set_mode(mode);
        let kind = cam.zoom(60.0, 10.0, 80.0);
        if mode == CameraMode::Orbit {
            assert_eq!(kind, ZoomKind::OrbitDistance);
            assert_eq!(cam.field_of_view(), 90.0);
            assert_eq!(cam.orbit_offset(), 80.0);
        } else {
            assert_eq!(kind, ZoomKind::FieldOfView);
            assert_eq!(cam.field_of_view(), 60.0);
        }
    }
}

#[test]
fn test_settings_from_json() {
    let settings: CameraSettings =
        serde_json::from_str(r#"{ "fov_x": 75.0, "mode": "Orbit", "prefer_target_y": false }"#).unwrap();
    assert_eq!(settings.fov_x, 75.0);
    assert_eq!(settings.near, CameraSettings::default().near);

    let cam = OrientationCamera::new(settings).unwrap();
    assert_eq!(cam.mode(), CameraMode::Orbit);
    assert!(!cam.prefer_target_y());

    let inverted: CameraSettings =
        serde_json::from_str(r#"{ "orbit_min": 50.0, "orbit_max": 5.0 }"#).unwrap();
    assert!(OrientationCamera::new(inverted).is_err());
}

#[test]
fn test_controller_session() {
    let mut cam = camera();
    let mut controller = CameraController::default();
    let dt = 1.0 / 60.0;

    for (mode, frames) in [
        (CameraMode::Watch, 60),
        (CameraMode::Fly, 60),
        (CameraMode::Orbit, 60),
        (CameraMode::FirstPerson, 60),
    ] {
        cam.set_mode(mode);
        for frame in 0..frames {
            let input = FrameInput {
                mouse_delta: Vec2::new(3.0, -2.0),
                movement: Vec3::new(1.0, 0.0, 1.0),
                wheel: if frame % 10 == 0 { -1.0 } else { 0.0 },
            };
            controller.drive(&mut cam, &input, dt);
            assert_view_consistent(&cam);
        }
    }

    // First person walks on the remembered ground height.
    assert!(cam.position().y.abs() < 1e-4);
}
