//! Quaternion camera with mode-dependent rotation rules.
//!
//! The camera keeps a position and a camera-to-world orientation. Its local
//! axes are the orientation applied to the world axes: `x_axis` points
//! right, `y_axis` up and `z_axis` backwards, so the camera looks down
//! `-z_axis`. Angles passed to [`OrientationCamera::rotate`] are in degrees
//! and are applied as given; input scaling and sign conventions belong to
//! the caller (see [`controller`](crate::controller)).
//!
//! # Modes
//!
//! | Mode | Rotation | Movement |
//! |------|----------|----------|
//! | [`CameraMode::FirstPerson`] | yaw about world up, pitch clamped to ±90°, no roll | on the ground plane |
//! | [`CameraMode::Watch`] | as first person | free, vertical along world up |
//! | [`CameraMode::Fly`] | free yaw/pitch/roll | along local axes |
//! | [`CameraMode::Orbit`] | around a target | none; position is derived |
//!
//! Entering orbit saves the pose and leaving it restores the pose, so an
//! orbit is a detour that leaves the camera where it was.

use crate::error::ConfigError;
use glam::{EulerRot, Mat3, Mat4, Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// World up.
pub const WORLD_Y: Vec3 = Vec3::Y;

/// Camera behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CameraMode {
    /// Walks on the ground: level yaw, clamped pitch.
    FirstPerson,
    /// Spectator: first-person rotation with unconstrained movement.
    #[default]
    Watch,
    /// Six degrees of freedom.
    Fly,
    /// Circles a target at a distance.
    Orbit,
}

/// Which meaning [`OrientationCamera::zoom`] applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomKind {
    /// Changed the horizontal field of view.
    FieldOfView,
    /// Changed the distance to the orbit target.
    OrbitDistance,
}

fn default_fov() -> f32 {
    90.0
}

fn default_aspect() -> f32 {
    16.0 / 9.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    1000.0
}

fn default_orbit_offset() -> f32 {
    25.0
}

fn default_orbit_min() -> f32 {
    3.0
}

fn default_orbit_max() -> f32 {
    100.0
}

fn default_prefer_target_y() -> bool {
    true
}

/// Construction parameters for an [`OrientationCamera`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    /// Horizontal field of view in degrees.
    #[serde(default = "default_fov")]
    pub fov_x: f32,
    #[serde(default = "default_aspect")]
    pub aspect: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
    /// Initial distance from the orbit target.
    #[serde(default = "default_orbit_offset")]
    pub orbit_offset: f32,
    #[serde(default = "default_orbit_min")]
    pub orbit_min: f32,
    #[serde(default = "default_orbit_max")]
    pub orbit_max: f32,
    /// Orbit around the target's up axis instead of rolling freely.
    #[serde(default = "default_prefer_target_y")]
    pub prefer_target_y: bool,
    #[serde(default)]
    pub mode: CameraMode,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_x: default_fov(),
            aspect: default_aspect(),
            near: default_near(),
            far: default_far(),
            orbit_offset: default_orbit_offset(),
            orbit_min: default_orbit_min(),
            orbit_max: default_orbit_max(),
            prefer_target_y: default_prefer_target_y(),
            mode: CameraMode::default(),
        }
    }
}

impl CameraSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_projection(self.fov_x, self.aspect, self.near, self.far)?;
        if !self.orbit_min.is_finite() || !self.orbit_max.is_finite() {
            return Err(ConfigError::Orbit("bounds must be finite"));
        }
        if self.orbit_min < 0.0 {
            return Err(ConfigError::Orbit("minimum must not be negative"));
        }
        if !self.orbit_offset.is_finite() {
            return Err(ConfigError::Orbit("initial offset must be finite"));
        }
        if self.orbit_min > self.orbit_max {
            return Err(ConfigError::InvertedRange {
                name: "orbit distance",
                min: self.orbit_min,
                max: self.orbit_max,
            });
        }
        Ok(())
    }
}

/// Narrowest field of view, in degrees, that zooming will reach.
pub const MIN_FIELD_OF_VIEW: f32 = 0.1;
/// Widest field of view, in degrees, that zooming will reach.
pub const MAX_FIELD_OF_VIEW: f32 = 179.9;

/// Clamp `value` between two bounds given in either order. `None` if any
/// input is NaN.
fn clamp_between(value: f32, a: f32, b: f32) -> Option<f32> {
    if value.is_nan() || a.is_nan() || b.is_nan() {
        return None;
    }
    Some(value.clamp(a.min(b), a.max(b)))
}

fn validate_projection(fov_x: f32, aspect: f32, near: f32, far: f32) -> Result<(), ConfigError> {
    if fov_x.is_nan() || fov_x <= 0.0 || fov_x >= 180.0 {
        return Err(ConfigError::Projection("field of view must be in (0, 180) degrees"));
    }
    if aspect.is_nan() || aspect <= 0.0 {
        return Err(ConfigError::Projection("aspect ratio must be positive"));
    }
    if near.is_nan() || far.is_nan() || near <= 0.0 || far <= near {
        return Err(ConfigError::Projection("clip planes must satisfy 0 < near < far"));
    }
    Ok(())
}

/// Pose captured on entering orbit.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SavedPose {
    position: Vec3,
    orientation: Quat,
    accum_pitch: f32,
}

/// Position, orientation and projection of a 3D view.
#[derive(Debug, Clone)]
pub struct OrientationCamera {
    mode: CameraMode,
    position: Vec3,
    orientation: Quat,
    accum_pitch: f32,

    saved: SavedPose,
    first_person_y: f32,

    orbit_target: Vec3,
    target_y: Vec3,
    orbit_offset: f32,
    orbit_min: f32,
    orbit_max: f32,
    prefer_target_y: bool,

    fov_x: f32,
    aspect: f32,
    near: f32,
    far: f32,

    view: Mat4,
    projection: Mat4,
}

impl OrientationCamera {
    /// A camera at the origin looking down world -Z.
    pub fn new(settings: CameraSettings) -> Result<Self, ConfigError> {
        settings.validate()?;

        let mut camera = Self {
            mode: CameraMode::Watch,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            accum_pitch: 0.0,
            saved: SavedPose {
                position: Vec3::ZERO,
                orientation: Quat::IDENTITY,
                accum_pitch: 0.0,
            },
            first_person_y: 0.0,
            orbit_target: Vec3::ZERO,
            target_y: WORLD_Y,
            orbit_offset: settings
                .orbit_offset
                .clamp(settings.orbit_min, settings.orbit_max),
            orbit_min: settings.orbit_min,
            orbit_max: settings.orbit_max,
            prefer_target_y: settings.prefer_target_y,
            fov_x: settings.fov_x,
            aspect: settings.aspect,
            near: settings.near,
            far: settings.far,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };

        camera.rebuild_projection();
        camera.update_view();
        camera.set_mode(settings.mode);
        Ok(camera)
    }

    // =========================================================================
    // MODES
    // =========================================================================

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    /// Switch behavior, carrying the pose across as each mode expects.
    pub fn set_mode(&mut self, mode: CameraMode) {
        let previous = self.mode;
        if previous == mode {
            return;
        }

        log::debug!("Camera mode {previous:?} -> {mode:?}");

        if previous == CameraMode::FirstPerson {
            self.first_person_y = self.position.y;
        }

        self.mode = mode;

        match mode {
            CameraMode::FirstPerson => {
                if previous == CameraMode::Orbit {
                    self.restore_saved_pose();
                }
                self.position.y = self.first_person_y;
                self.update_view();
                self.undo_roll();
            }
            CameraMode::Watch => {
                if previous == CameraMode::Orbit {
                    self.restore_saved_pose();
                }
                self.update_view();
                self.undo_roll();
            }
            CameraMode::Fly => {
                if previous == CameraMode::Orbit {
                    self.restore_saved_pose();
                }
                self.update_view();
            }
            CameraMode::Orbit => {
                self.saved = SavedPose {
                    position: self.position,
                    orientation: self.orientation,
                    accum_pitch: self.accum_pitch,
                };
                self.target_y = self.y_axis();

                let eye = self.orbit_target + self.z_axis() * self.orbit_offset;
                self.look_at(eye, self.orbit_target, self.target_y);
            }
        }
    }

    fn restore_saved_pose(&mut self) {
        self.position = self.saved.position;
        self.orientation = self.saved.orientation;
        self.accum_pitch = self.saved.accum_pitch;
    }

    // =========================================================================
    // ROTATION
    // =========================================================================

    /// Rotate by yaw (about Y), pitch (about X) and roll (about Z), in
    /// degrees. Positive angles are counter-clockwise looking down the axis.
    pub fn rotate(&mut self, yaw: f32, pitch: f32, roll: f32) {
        match self.mode {
            CameraMode::FirstPerson | CameraMode::Watch => self.rotate_first_person(yaw, pitch),
            CameraMode::Fly => self.rotate_fly(yaw, pitch, roll),
            CameraMode::Orbit => self.rotate_orbit(yaw, pitch, roll),
        }
        self.update_view();
    }

    fn rotate_first_person(&mut self, yaw: f32, mut pitch: f32) {
        // Clamp the applied delta, not just the total, so the camera lands
        // exactly on the limit.
        self.accum_pitch += pitch;
        if self.accum_pitch > 90.0 {
            pitch = 90.0 - (self.accum_pitch - pitch);
            self.accum_pitch = 90.0;
        }
        if self.accum_pitch < -90.0 {
            pitch = -90.0 - (self.accum_pitch - pitch);
            self.accum_pitch = -90.0;
        }

        // Yaw about world up keeps roll from creeping in.
        if yaw != 0.0 {
            let rotation = Quat::from_axis_angle(WORLD_Y, yaw.to_radians());
            self.orientation = rotation * self.orientation;
        }
        if pitch != 0.0 {
            let rotation = Quat::from_axis_angle(Vec3::X, pitch.to_radians());
            self.orientation *= rotation;
        }
        self.orientation = self.orientation.normalize();
    }

    fn rotate_fly(&mut self, yaw: f32, pitch: f32, roll: f32) {
        self.accum_pitch += pitch;
        if self.accum_pitch > 360.0 {
            self.accum_pitch -= 360.0;
        }
        if self.accum_pitch < -360.0 {
            self.accum_pitch += 360.0;
        }

        self.apply_yaw_pitch_roll(yaw, pitch, roll);
    }

    fn rotate_orbit(&mut self, yaw: f32, pitch: f32, roll: f32) {
        if !self.prefer_target_y {
            self.apply_yaw_pitch_roll(yaw, pitch, roll);
            return;
        }

        if yaw != 0.0 {
            let rotation = Quat::from_axis_angle(self.target_y, yaw.to_radians());
            self.orientation = rotation * self.orientation;
        }
        if pitch != 0.0 {
            let rotation = Quat::from_axis_angle(Vec3::X, pitch.to_radians());
            self.orientation *= rotation;
        }
        self.orientation = self.orientation.normalize();
    }

    fn apply_yaw_pitch_roll(&mut self, yaw: f32, pitch: f32, roll: f32) {
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            yaw.to_radians(),
            pitch.to_radians(),
            roll.to_radians(),
        );
        self.orientation = (self.orientation * rotation).normalize();
    }

    /// Level the camera. While orbiting this levels it against the orbit
    /// target's up axis.
    pub fn undo_roll(&mut self) {
        if self.mode == CameraMode::Orbit {
            self.look_at(self.position, self.orbit_target, self.target_y);
        } else {
            let forward = self.view_direction();
            self.look_at(self.position, self.position + forward, WORLD_Y);
        }
    }

    // =========================================================================
    // MOVEMENT
    // =========================================================================

    /// Move `dx` right, `dy` up and `dz` forward. Ignored while orbiting.
    pub fn move_by(&mut self, dx: f32, dy: f32, dz: f32) {
        let x_axis = self.x_axis();
        let (up, forward) = match self.mode {
            CameraMode::Orbit => return,
            CameraMode::FirstPerson => (WORLD_Y, WORLD_Y.cross(x_axis).normalize()),
            CameraMode::Watch => (WORLD_Y, self.view_direction()),
            CameraMode::Fly => (self.y_axis(), self.view_direction()),
        };

        self.position += x_axis * dx + up * dy + forward * dz;
        self.update_view();
    }

    /// Move by `direction * distance`, component-wise, in world space.
    /// Ignored while orbiting.
    pub fn move_along(&mut self, direction: Vec3, distance: Vec3) {
        if self.mode == CameraMode::Orbit {
            return;
        }
        self.position += direction * distance;
        self.update_view();
    }

    /// Place the camera. Returns `false` while orbiting, where the position
    /// is derived from the target and cannot be assigned.
    pub fn set_position(&mut self, position: Vec3) -> bool {
        if self.mode == CameraMode::Orbit {
            log::debug!("Ignoring camera position assignment while orbiting");
            return false;
        }
        self.position = position;
        self.update_view();
        true
    }

    /// Replace the orientation. The pitch estimate is re-derived from it.
    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation.normalize();
        self.accum_pitch = self.view_direction().y.clamp(-1.0, 1.0).asin().to_degrees();
        self.update_view();
    }

    /// Point the camera at `target` from its current position, keeping the
    /// current up axis.
    pub fn look_at_target(&mut self, target: Vec3) {
        let up = self.y_axis();
        self.look_at(self.position, target, up);
    }

    /// Rebuild the pose from an eye point, a target and an up hint.
    ///
    /// `eye` must differ from `target` and `up` must not be parallel to the
    /// view direction; otherwise the basis is undefined.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        let z_axis = (eye - target).normalize();
        let x_axis = up.cross(z_axis).normalize();
        let y_axis = z_axis.cross(x_axis).normalize();

        self.position = eye;
        self.view = view_from_basis(x_axis, y_axis, z_axis, eye);

        // Keep the quaternion and pitch in step so later rotations continue
        // from this pose.
        self.orientation = Quat::from_mat3(&Mat3::from_cols(x_axis, y_axis, z_axis)).normalize();
        self.accum_pitch = (-z_axis.y).clamp(-1.0, 1.0).asin().to_degrees();
    }

    // =========================================================================
    // ORBIT
    // =========================================================================

    pub fn orbit_target(&self) -> Vec3 {
        self.orbit_target
    }

    /// Move the point orbited around.
    pub fn set_orbit_target(&mut self, target: Vec3) {
        self.orbit_target = target;
        self.update_view();
    }

    pub fn orbit_offset(&self) -> f32 {
        self.orbit_offset
    }

    /// Configured orbit distance bounds.
    pub fn orbit_range(&self) -> (f32, f32) {
        (self.orbit_min, self.orbit_max)
    }

    pub fn prefer_target_y(&self) -> bool {
        self.prefer_target_y
    }

    pub fn set_prefer_target_y(&mut self, prefer: bool) {
        self.prefer_target_y = prefer;
    }

    /// Up axis captured when orbiting began.
    pub fn target_y(&self) -> Vec3 {
        self.target_y
    }

    // =========================================================================
    // ZOOM & PROJECTION
    // =========================================================================

    /// Mode-dependent zoom: changes the orbit distance by `amount` while
    /// orbiting, otherwise sets the horizontal field of view to `amount`
    /// degrees. `min`/`max` bound whichever quantity is changed.
    pub fn zoom(&mut self, amount: f32, min: f32, max: f32) -> ZoomKind {
        if self.mode == CameraMode::Orbit {
            self.zoom_orbit(amount, min, max);
            ZoomKind::OrbitDistance
        } else {
            self.set_field_of_view(amount, min, max);
            ZoomKind::FieldOfView
        }
    }

    /// Change the distance to the orbit target by `delta`, clamped to the
    /// range spanned by `min` and `max` and never below zero. The camera
    /// moves along its view direction when orbiting. NaN input or an
    /// infinite result leaves the distance unchanged.
    pub fn zoom_orbit(&mut self, delta: f32, min: f32, max: f32) {
        let Some(offset) = clamp_between(self.orbit_offset + delta, min, max) else {
            return;
        };
        if !offset.is_finite() {
            return;
        }
        self.orbit_offset = offset.max(0.0);
        self.update_view();
    }

    /// Set the horizontal field of view in degrees, clamped to the range
    /// spanned by `min` and `max` and then to
    /// [`MIN_FIELD_OF_VIEW`]..=[`MAX_FIELD_OF_VIEW`]. NaN input is ignored.
    pub fn set_field_of_view(&mut self, fov_x: f32, min: f32, max: f32) {
        let Some(fov_x) = clamp_between(fov_x, min, max) else {
            return;
        };
        self.fov_x = fov_x.clamp(MIN_FIELD_OF_VIEW, MAX_FIELD_OF_VIEW);
        self.rebuild_projection();
    }

    /// Set every projection parameter at once. Invalid values are rejected
    /// and the previous projection kept.
    pub fn perspective(
        &mut self,
        fov_x: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Result<(), ConfigError> {
        validate_projection(fov_x, aspect, near, far)?;
        self.fov_x = fov_x;
        self.aspect = aspect;
        self.near = near;
        self.far = far;
        self.rebuild_projection();
        Ok(())
    }

    /// Horizontal field of view in degrees.
    pub fn field_of_view(&self) -> f32 {
        self.fov_x
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    fn rebuild_projection(&mut self) {
        let half_x = (self.fov_x * 0.5).to_radians();
        let fov_y = 2.0 * (half_x.tan() / self.aspect).atan();
        self.projection = Mat4::perspective_rh(fov_y, self.aspect, self.near, self.far);
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Accumulated pitch in degrees.
    pub fn accumulated_pitch(&self) -> f32 {
        self.accum_pitch
    }

    pub fn x_axis(&self) -> Vec3 {
        self.orientation * Vec3::X
    }

    pub fn y_axis(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    pub fn z_axis(&self) -> Vec3 {
        self.orientation * Vec3::Z
    }

    pub fn view_direction(&self) -> Vec3 {
        -self.z_axis()
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    fn update_view(&mut self) {
        let x_axis = self.x_axis();
        let y_axis = self.y_axis();
        let z_axis = self.z_axis();

        if self.mode == CameraMode::Orbit {
            self.position = self.orbit_target + z_axis * self.orbit_offset;
        }

        self.view = view_from_basis(x_axis, y_axis, z_axis, self.position);
    }
}

/// World-to-view matrix for an orthonormal camera basis at `eye`.
fn view_from_basis(x_axis: Vec3, y_axis: Vec3, z_axis: Vec3, eye: Vec3) -> Mat4 {
    Mat4::from_cols(
        Vec4::new(x_axis.x, y_axis.x, z_axis.x, 0.0),
        Vec4::new(x_axis.y, y_axis.y, z_axis.y, 0.0),
        Vec4::new(x_axis.z, y_axis.z, z_axis.z, 0.0),
        Vec4::new(-x_axis.dot(eye), -y_axis.dot(eye), -z_axis.dot(eye), 1.0),
    )
}
