//! Headless particle scene.
//!
//! Flies a projectile in a circle, leaves a smoke trail behind it and keeps
//! a camera on it, logging ring statistics once a second. Pass a directory
//! of `<name>.json` particle settings to override the built-in presets.
//!
//! ```text
//! RUST_LOG=debug cargo run --bin nibiru-demo -- assets/particles
//! ```

use nibiru::prelude::*;
use std::error::Error;
use std::f32::consts::TAU;

const FRAMES: u64 = 600;
const ORBIT_RADIUS: f32 = 20.0;

fn presets() -> MemorySource<ParticleSettings> {
    MemorySource::new()
        .with("smoke", ParticleSettings::smoke())
        .with("fire", ParticleSettings::fire())
        .with("explosion", ParticleSettings::explosion())
        .with("projectile_trail", ParticleSettings::projectile_trail())
}

fn projectile_position(t: f32) -> Vec3 {
    let angle = t * TAU / 5.0;
    Vec3::new(angle.cos() * ORBIT_RADIUS, 2.0 + angle.sin() * 3.0, angle.sin() * ORBIT_RADIUS)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut assets: Box<dyn AssetProvider<ParticleSettings>> = match std::env::args().nth(1) {
        Some(dir) => {
            log::info!("Loading particle settings from {dir}");
            Box::new(ContentCache::new(JsonDirectory::new(dir)))
        }
        None => Box::new(ContentCache::new(presets())),
    };

    let mut trail_system = ParticleSystem::from_asset(assets.as_mut(), "projectile_trail")?;
    let mut smoke = ParticleSystem::from_asset(assets.as_mut(), "smoke")?;

    let mut trail = ParticleTrail::new(100.0, projectile_position(0.0))?;
    let mut camera = OrientationCamera::new(CameraSettings {
        mode: CameraMode::Watch,
        ..Default::default()
    })?;
    camera.look_at(Vec3::new(0.0, 15.0, 60.0), Vec3::ZERO, Vec3::Y);

    let mut controller = CameraController::new();
    let mut clock = FrameClock::fixed(1.0 / 60.0);

    for frame in 0..FRAMES {
        let dt = clock.tick();
        let projectile = projectile_position(clock.elapsed());

        trail.update(&mut trail_system, dt, projectile);
        if frame % 4 == 0 {
            smoke.add_particle(Vec3::ZERO, Vec3::ZERO);
        }

        match frame {
            200 => {
                camera.set_orbit_target(projectile);
                camera.set_mode(CameraMode::Orbit);
            }
            400 => camera.set_mode(CameraMode::Fly),
            _ => {}
        }
        if camera.mode() == CameraMode::Orbit {
            camera.set_orbit_target(projectile);
        }

        // A slow drift to the right while creeping forward.
        let input = FrameInput {
            mouse_delta: Vec2::new(1.0, 0.0),
            movement: Vec3::new(0.0, 0.0, 1.0),
            wheel: if frame % 30 == 0 { 1.0 } else { 0.0 },
        };
        controller.drive(&mut camera, &input, dt);

        trail_system.update(dt);
        smoke.update(dt);

        let trail_frame = trail_system.draw_ranges();
        let smoke_frame = smoke.draw_ranges();
        let uniforms = ParticleUniforms::new(&camera, 720.0, trail_frame.current_time);

        if clock.frame() % 60 == 0 {
            log::info!(
                "t={:.1}s trail: {} live / {} retired (draw {} in {} call(s)), smoke: {} live, camera {:?} at {:.1?}",
                clock.elapsed(),
                trail_system.active_count(),
                trail_system.retired_count(),
                trail_frame.draw.len(),
                trail_frame.draw.iter().count(),
                smoke.active_count(),
                camera.mode(),
                camera.position(),
            );
            log::debug!(
                "smoke upload {} slots, uniform block {} bytes",
                smoke_frame.upload.len(),
                bytemuck::bytes_of(&uniforms).len()
            );
        }
    }

    trail_system.release(assets.as_mut());
    smoke.release(assets.as_mut());
    log::info!("Done after {} frames", clock.frame());
    Ok(())
}
