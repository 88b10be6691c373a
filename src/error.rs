//! Error types for Nibiru.
//!
//! Only construction and asset loading can fail. Per-frame operations on a
//! validly built [`ParticleSystem`](crate::ParticleSystem) or
//! [`OrientationCamera`](crate::OrientationCamera) are total.

use thiserror::Error;

/// Errors raised while validating configuration or building a component.
///
/// A component that failed with one of these was never constructed and
/// must not be used.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Particle lifetime must be strictly positive.
    #[error("particle duration must be positive, got {0}s")]
    NonPositiveDuration(f32),
    /// The ring buffer needs at least one slot.
    #[error("particle capacity must be at least 1")]
    ZeroCapacity,
    /// A min/max pair is inverted.
    #[error("{name}: minimum {min} is greater than maximum {max}")]
    InvertedRange {
        /// Which setting the range belongs to.
        name: &'static str,
        /// Configured minimum.
        min: f32,
        /// Configured maximum.
        max: f32,
    },
    /// A projection parameter is out of range.
    #[error("invalid projection: {0}")]
    Projection(&'static str),
    /// An orbit distance setting is out of range.
    #[error("invalid orbit distance: {0}")]
    Orbit(&'static str),
    /// Spawn rate must be positive and finite.
    #[error("spawn rate must be positive and finite, got {0} per second")]
    NonPositiveRate(f32),
    /// The asset provider could not supply a required asset.
    #[error("required asset `{0}` is not available")]
    MissingAsset(String),
}

/// Errors that can occur while fetching an asset from its source.
#[derive(Debug, Error)]
pub enum AssetError {
    /// No asset is registered under this id.
    #[error("asset `{0}` not found")]
    NotFound(String),
    /// Failed to read the asset file from disk.
    #[error("failed to read asset `{id}`: {source}")]
    Io {
        /// Asset id that was requested.
        id: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The asset file is not valid JSON for the requested type.
    #[error("failed to parse asset `{id}`: {source}")]
    Parse {
        /// Asset id that was requested.
        id: String,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
}
