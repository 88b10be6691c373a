//! Turns raw per-frame input into camera commands.
//!
//! [`OrientationCamera`] only understands already-scaled rotation and
//! movement deltas. [`CameraController`] sits in front of it: mouse motion
//! is smoothed by a [`MouseFilter`], held movement keys accelerate through a
//! [`MotionRamp`], and the result is mapped onto the camera differently for
//! each [`CameraMode`].
//!
//! ```ignore
//! let mut controller = CameraController::default();
//!
//! // Once per frame, after polling the window:
//! let input = FrameInput {
//!     mouse_delta: pointer_motion,
//!     movement: Vec3::new(strafe, rise, forward),
//!     wheel: scroll,
//! };
//! controller.drive(&mut camera, &input, dt);
//! ```

use crate::camera::{CameraMode, OrientationCamera};
use glam::{Vec2, Vec3};

/// Mouse samples kept for weighted filtering.
pub const MOUSE_HISTORY: usize = 10;

/// Input gathered for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Pointer motion in pixels, +X right and +Y down.
    pub mouse_delta: Vec2,
    /// Held movement keys, each axis in `[-1, 1]`.
    ///
    /// Y is up and Z is forward. X strafes right in first-person modes, yaws
    /// left when flying and rolls left when orbiting.
    pub movement: Vec3,
    /// Scroll wheel motion, positive when scrolled away from the user.
    pub wheel: f32,
}

/// Weighted moving average over recent mouse samples, followed by a
/// two-frame average.
///
/// Each older sample weighs `sensitivity` times the one after it, so a
/// sensitivity of 0 disables the history and values near 1 smooth heavily.
#[derive(Debug, Clone)]
pub struct MouseFilter {
    history: [Vec2; MOUSE_HISTORY],
    sensitivity: f32,
    frames: [Vec2; 2],
    index: usize,
}

impl Default for MouseFilter {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl MouseFilter {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            history: [Vec2::ZERO; MOUSE_HISTORY],
            sensitivity,
            frames: [Vec2::ZERO; 2],
            index: 0,
        }
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity;
    }

    /// Feed this frame's motion and get the smoothed motion back.
    pub fn filter(&mut self, delta: Vec2) -> Vec2 {
        // Newest sample at the front.
        self.history.rotate_right(1);
        self.history[0] = delta;

        let mut sum = Vec2::ZERO;
        let mut total = 0.0;
        let mut weight = 1.0;
        for sample in &self.history {
            sum += *sample * weight;
            total += weight;
            weight *= self.sensitivity;
        }
        let weighted = sum / total;

        self.frames[self.index] = weighted;
        let smoothed = (self.frames[0] + self.frames[1]) * 0.5;
        self.index ^= 1;
        self.frames[self.index] = Vec2::ZERO;
        smoothed
    }

    /// Forget all history.
    pub fn reset(&mut self) {
        self.history = [Vec2::ZERO; MOUSE_HISTORY];
        self.frames = [Vec2::ZERO; 2];
        self.index = 0;
    }
}

/// Per-axis velocity that ramps up while a direction is held and back down
/// to rest when released.
#[derive(Debug, Clone)]
pub struct MotionRamp {
    acceleration: Vec3,
    max_velocity: Vec3,
    velocity: Vec3,
    held: Vec3,
}

impl Default for MotionRamp {
    fn default() -> Self {
        Self::new(Vec3::splat(8.0), Vec3::splat(1.0))
    }
}

impl MotionRamp {
    pub fn new(acceleration: Vec3, max_velocity: Vec3) -> Self {
        Self {
            acceleration,
            max_velocity,
            velocity: Vec3::ZERO,
            held: Vec3::ZERO,
        }
    }

    pub fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    pub fn max_velocity(&self) -> Vec3 {
        self.max_velocity
    }

    /// Velocity after the most recent step.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Advance by `dt` with `direction` held and return the displacement.
    ///
    /// Axes that are idle and at rest never move, so rounding error cannot
    /// make the camera creep.
    pub fn step(&mut self, direction: Vec3, dt: f32) -> Vec3 {
        // A freshly pressed direction starts from rest.
        let held = Vec3::new(sign(direction.x), sign(direction.y), sign(direction.z));
        for axis in 0..3 {
            if held[axis] != 0.0 && held[axis] != self.held[axis] {
                self.velocity[axis] = 0.0;
            }
        }
        self.held = held;

        let mut displacement = Vec3::ZERO;
        if self.velocity.length_squared() != 0.0 {
            displacement = self.velocity * dt + 0.5 * self.acceleration * dt * dt;
            for axis in 0..3 {
                if direction[axis] == 0.0 && self.velocity[axis].abs() < 1e-6 {
                    displacement[axis] = 0.0;
                }
            }
        }

        self.update_velocity(direction, dt);
        displacement
    }

    fn update_velocity(&mut self, direction: Vec3, dt: f32) {
        for axis in 0..3 {
            let accel = self.acceleration[axis] * dt;
            let limit = self.max_velocity[axis];
            let v = &mut self.velocity[axis];

            if direction[axis] != 0.0 {
                *v = (*v + direction[axis] * accel).clamp(-limit, limit);
            } else if *v > 0.0 {
                *v = (*v - accel).max(0.0);
            } else {
                *v = (*v + accel).min(0.0);
            }
        }
    }

    /// Stop immediately.
    pub fn halt(&mut self) {
        self.velocity = Vec3::ZERO;
        self.held = Vec3::ZERO;
    }
}

fn sign(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Maps [`FrameInput`] onto an [`OrientationCamera`].
#[derive(Debug, Clone)]
pub struct CameraController {
    /// Degrees of rotation per smoothed pixel of mouse motion.
    pub rotation_speed: f32,
    /// Degrees per second of yaw from the movement X axis when flying.
    pub fly_yaw_speed: f32,
    /// Degrees per second of roll from the movement X axis when orbiting.
    pub orbit_roll_speed: f32,
    /// Orbit distance per wheel notch.
    pub wheel_speed: f32,
    filter: MouseFilter,
    ramp: MotionRamp,
}

impl Default for CameraController {
    fn default() -> Self {
        Self {
            rotation_speed: 0.3,
            fly_yaw_speed: 100.0,
            orbit_roll_speed: 100.0,
            wheel_speed: 1.0,
            filter: MouseFilter::default(),
            ramp: MotionRamp::default(),
        }
    }
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rotation_speed(mut self, speed: f32) -> Self {
        self.rotation_speed = speed;
        self
    }

    pub fn with_mouse_filter(mut self, filter: MouseFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_motion(mut self, ramp: MotionRamp) -> Self {
        self.ramp = ramp;
        self
    }

    pub fn mouse_filter(&self) -> &MouseFilter {
        &self.filter
    }

    pub fn motion(&self) -> &MotionRamp {
        &self.ramp
    }

    /// Apply one frame of input.
    pub fn drive(&mut self, camera: &mut OrientationCamera, input: &FrameInput, dt: f32) {
        // Turning toward the pointer: left and up are positive.
        let mouse = self.filter.filter(-input.mouse_delta);
        let mut direction = input.movement.clamp(Vec3::NEG_ONE, Vec3::ONE);

        match camera.mode() {
            CameraMode::FirstPerson | CameraMode::Watch => {
                self.rotate_smoothly(camera, mouse.x, mouse.y, 0.0);
                self.apply_motion(camera, direction, dt);
            }
            CameraMode::Fly => {
                self.rotate_smoothly(camera, 0.0, -mouse.y, mouse.x);

                let yaw = direction.x * self.fly_yaw_speed * dt;
                if yaw != 0.0 {
                    camera.rotate(yaw, 0.0, 0.0);
                }
                // X steers, it does not strafe.
                direction.x = 0.0;
                self.apply_motion(camera, direction, dt);
            }
            CameraMode::Orbit => {
                self.rotate_smoothly(camera, -mouse.x, -mouse.y, 0.0);

                if !camera.prefer_target_y() {
                    let roll = direction.x * self.orbit_roll_speed * dt;
                    if roll != 0.0 {
                        camera.rotate(0.0, 0.0, roll);
                    }
                }

                let zoom = -sign(input.wheel) * self.wheel_speed;
                if zoom != 0.0 {
                    let (min, max) = camera.orbit_range();
                    camera.zoom_orbit(zoom, min, max);
                }
            }
        }
    }

    fn rotate_smoothly(&self, camera: &mut OrientationCamera, yaw: f32, pitch: f32, roll: f32) {
        let speed = self.rotation_speed;
        camera.rotate(yaw * speed, pitch * speed, roll * speed);
    }

    fn apply_motion(&mut self, camera: &mut OrientationCamera, direction: Vec3, dt: f32) {
        let displacement = self.ramp.step(direction, dt);
        if displacement != Vec3::ZERO {
            camera.move_by(displacement.x, displacement.y, displacement.z);
        }
    }
}
