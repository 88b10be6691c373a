//! # Nibiru - particle ring and orientation camera
//!
//! Two frame-driven building blocks for a real-time renderer:
//!
//! - [`ParticleSystem`]: a fixed-capacity ring of GPU particle records that
//!   lets the CPU spawn at any rate while the GPU draws a few frames behind.
//! - [`OrientationCamera`]: a quaternion camera whose rotate/move/zoom
//!   commands mean different things in first-person, watch, fly and orbit
//!   modes, with lossless switching in and out of orbit.
//!
//! ## Quick Start
//!
//! ```ignore
//! use nibiru::prelude::*;
//!
//! let mut cache = ContentCache::new(MemorySource::new().with("smoke", ParticleSettings::smoke()));
//! let mut smoke = ParticleSystem::from_asset(&mut cache, "smoke")?;
//! let mut trail = ParticleTrail::new(60.0, Vec3::ZERO)?;
//! let mut camera = OrientationCamera::new(CameraSettings::default())?;
//! let mut clock = FrameClock::new();
//!
//! loop {
//!     let dt = clock.tick();
//!     trail.update(&mut smoke, dt, emitter_position);
//!     smoke.update(dt);
//!     camera.rotate(yaw, pitch, 0.0);
//!
//!     let frame = smoke.draw_ranges();
//!     // hand frame.upload / frame.draw and camera.view_projection() to the renderer
//! }
//! ```
//!
//! ## Particle Lifecycle
//!
//! Every slot of the ring is in exactly one region, in this circular order:
//!
//! | Region | Meaning |
//! |--------|---------|
//! | retired | expired, possibly still read by the GPU |
//! | active | uploaded and being drawn |
//! | new | spawned since the last frame, not yet uploaded |
//! | free | available for spawning |
//!
//! A spawn into a full ring is dropped. Expired particles are held for
//! [`RETIREMENT_DELAY`] drawn frames before their slots are reused.
//!
//! ## Camera Modes
//!
//! | Mode | Behavior |
//! |------|----------|
//! | [`CameraMode::FirstPerson`] | level yaw, pitch clamped to ±90°, walks on the ground |
//! | [`CameraMode::Watch`] | first-person look with free movement |
//! | [`CameraMode::Fly`] | free yaw, pitch and roll |
//! | [`CameraMode::Orbit`] | circles a target; position is derived |
//!
//! [`CameraController`] turns raw mouse and key input into camera commands.

pub mod assets;
pub mod camera;
pub mod controller;
pub mod error;
pub mod gpu;
pub mod particle;
pub mod ring;
pub mod settings;
pub mod system;
pub mod time;
pub mod trail;

pub use assets::{AssetProvider, AssetSource, ContentCache, JsonDirectory, MemorySource};
pub use bytemuck;
pub use camera::{CameraMode, CameraSettings, OrientationCamera, ZoomKind};
pub use controller::{CameraController, FrameInput, MotionRamp, MouseFilter};
pub use error::{AssetError, ConfigError};
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use gpu::{blend_state, ParticleUniforms, ParticleVertexBuffer};
pub use particle::Particle;
pub use ring::{RingCursors, SlotRanges};
pub use settings::{BlendFactor, ParticleSettings};
pub use system::{FrameDraw, ParticleSystem, RETIREMENT_DELAY};
pub use time::FrameClock;
pub use trail::ParticleTrail;

/// Everything needed for a typical frame loop.
///
/// ```ignore
/// use nibiru::prelude::*;
/// ```
pub mod prelude {
    pub use crate::assets::{AssetProvider, AssetSource, ContentCache, JsonDirectory, MemorySource};
    pub use crate::camera::{CameraMode, CameraSettings, OrientationCamera, ZoomKind};
    pub use crate::controller::{CameraController, FrameInput};
    pub use crate::error::{AssetError, ConfigError};
    pub use crate::gpu::{blend_state, ParticleUniforms, ParticleVertexBuffer};
    pub use crate::particle::Particle;
    pub use crate::settings::{BlendFactor, ParticleSettings};
    pub use crate::system::{FrameDraw, ParticleSystem};
    pub use crate::time::FrameClock;
    pub use crate::trail::ParticleTrail;
    pub use crate::{Mat4, Quat, Vec2, Vec3, Vec4};
}
