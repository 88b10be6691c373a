//! Tuning parameters for a particle system.
//!
//! Settings are plain data: loaded once (usually as JSON through an
//! [`AssetProvider`](crate::assets::AssetProvider)), shared behind an `Arc`
//! and never mutated by the system that uses them.
//!
//! # Example
//!
//! ```ignore
//! let settings = ParticleSettings {
//!     max_particles: 500,
//!     duration: 2.0,
//!     max_horizontal_velocity: 15.0,
//!     ..ParticleSettings::default()
//! };
//! settings.validate()?;
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Blend factor applied to source or destination color when compositing
/// particles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendFactor {
    Zero,
    One,
    SourceColor,
    InverseSourceColor,
    #[default]
    SourceAlpha,
    InverseSourceAlpha,
    DestinationColor,
    InverseDestinationColor,
    DestinationAlpha,
    InverseDestinationAlpha,
}

fn default_technique() -> String {
    "NonRotatingParticles".into()
}

fn default_max_particles() -> usize {
    100
}

fn default_duration() -> f32 {
    1.0
}

fn default_sensitivity() -> f32 {
    1.0
}

fn default_destination_blend() -> BlendFactor {
    BlendFactor::InverseSourceAlpha
}

/// Everything that controls how one particle effect looks and behaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleSettings {
    /// Shader technique to render with. Effects that never rotate can use a
    /// cheaper pixel shader.
    #[serde(default = "default_technique")]
    pub technique_name: String,
    /// Texture applied to each point sprite.
    #[serde(default)]
    pub texture_name: Option<String>,
    /// Ring capacity. One slot is kept empty, so at most
    /// `max_particles - 1` particles are alive at once.
    #[serde(default = "default_max_particles")]
    pub max_particles: usize,
    /// Particle lifetime in seconds.
    #[serde(default = "default_duration")]
    pub duration: f32,
    /// How much of the emitter's own velocity each particle inherits.
    #[serde(default = "default_sensitivity")]
    pub emitter_velocity_sensitivity: f32,
    /// Random X/Z speed range added to each particle.
    #[serde(default)]
    pub min_horizontal_velocity: f32,
    #[serde(default)]
    pub max_horizontal_velocity: f32,
    /// Random Y speed range added to each particle.
    #[serde(default)]
    pub min_vertical_velocity: f32,
    #[serde(default)]
    pub max_vertical_velocity: f32,
    #[serde(default)]
    pub source_blend: BlendFactor,
    #[serde(default = "default_destination_blend")]
    pub destination_blend: BlendFactor,
}

impl Default for ParticleSettings {
    fn default() -> Self {
        Self {
            technique_name: default_technique(),
            texture_name: None,
            max_particles: default_max_particles(),
            duration: default_duration(),
            emitter_velocity_sensitivity: default_sensitivity(),
            min_horizontal_velocity: 0.0,
            max_horizontal_velocity: 0.0,
            min_vertical_velocity: 0.0,
            max_vertical_velocity: 0.0,
            source_blend: BlendFactor::SourceAlpha,
            destination_blend: default_destination_blend(),
        }
    }
}

impl ParticleSettings {
    // =========================================================================
    // PRESETS
    // =========================================================================

    /// Slow, long-lived smoke plume.
    pub fn smoke() -> Self {
        Self {
            texture_name: Some("smoke".into()),
            technique_name: "RotatingParticles".into(),
            max_particles: 600,
            duration: 10.0,
            max_horizontal_velocity: 15.0,
            min_vertical_velocity: 10.0,
            max_vertical_velocity: 20.0,
            ..Self::default()
        }
    }

    /// Additive flames.
    pub fn fire() -> Self {
        Self {
            texture_name: Some("fire".into()),
            max_particles: 2400,
            duration: 2.0,
            max_horizontal_velocity: 15.0,
            min_vertical_velocity: -10.0,
            max_vertical_velocity: 10.0,
            destination_blend: BlendFactor::One,
            ..Self::default()
        }
    }

    /// One-shot radial burst.
    pub fn explosion() -> Self {
        Self {
            texture_name: Some("explosion".into()),
            technique_name: "RotatingParticles".into(),
            max_particles: 100,
            duration: 2.0,
            min_horizontal_velocity: 20.0,
            max_horizontal_velocity: 30.0,
            min_vertical_velocity: -20.0,
            max_vertical_velocity: 20.0,
            destination_blend: BlendFactor::One,
            ..Self::default()
        }
    }

    /// Thin trail left behind a moving projectile. Barely inherits the
    /// projectile's velocity.
    pub fn projectile_trail() -> Self {
        Self {
            texture_name: Some("smoke".into()),
            max_particles: 1000,
            duration: 3.0,
            emitter_velocity_sensitivity: 0.1,
            max_horizontal_velocity: 1.0,
            min_vertical_velocity: -1.0,
            max_vertical_velocity: 1.0,
            ..Self::default()
        }
    }

    /// Check the invariants a particle system relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration.is_nan() || self.duration <= 0.0 {
            return Err(ConfigError::NonPositiveDuration(self.duration));
        }
        if self.max_particles == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        check_range(
            "horizontal velocity",
            self.min_horizontal_velocity,
            self.max_horizontal_velocity,
        )?;
        check_range(
            "vertical velocity",
            self.min_vertical_velocity,
            self.max_vertical_velocity,
        )?;
        Ok(())
    }

    /// Save the settings to a JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load settings from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&json)?;
        Ok(settings)
    }
}

fn check_range(name: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min > max {
        Err(ConfigError::InvertedRange { name, min, max })
    } else {
        Ok(())
    }
}
