//! Trails of particles left behind a moving emitter.

use crate::error::ConfigError;
use crate::system::ParticleSystem;
use glam::Vec3;

/// Spawns particles at a steady rate along the path of a moving object.
///
/// Spawn positions are interpolated between the previous and current
/// emitter positions, so spacing stays even regardless of object speed or
/// frame rate. Time not used up by one update carries into the next.
#[derive(Debug, Clone)]
pub struct ParticleTrail {
    interval: f32,
    last_position: Vec3,
    time_left: f32,
}

impl ParticleTrail {
    /// Create a trail emitting `particles_per_second`, starting at `initial`.
    ///
    /// The rate must be positive and finite, and high enough that its
    /// interval is representable.
    pub fn new(particles_per_second: f32, initial: Vec3) -> Result<Self, ConfigError> {
        let interval = 1.0 / particles_per_second;
        if !particles_per_second.is_finite() || particles_per_second <= 0.0 || !interval.is_normal() {
            return Err(ConfigError::NonPositiveRate(particles_per_second));
        }
        Ok(Self {
            interval,
            last_position: initial,
            time_left: 0.0,
        })
    }

    /// Seconds between two spawns.
    pub fn interval(&self) -> f32 {
        self.interval
    }

    pub fn last_position(&self) -> Vec3 {
        self.last_position
    }

    /// Move the emitter to `new_position` over `dt` seconds, spawning into
    /// `system` along the way. Returns how many particles were requested.
    pub fn update(&mut self, system: &mut ParticleSystem, dt: f32, new_position: Vec3) -> usize {
        let mut requested = 0;

        if dt.is_finite() && dt > 0.0 {
            let velocity = (new_position - self.last_position) / dt;

            let mut time_to_spend = self.time_left + dt;
            let mut current_time = -self.time_left;

            while time_to_spend > self.interval {
                current_time += self.interval;
                time_to_spend -= self.interval;

                let mu = current_time / dt;
                let position = self.last_position.lerp(new_position, mu);
                system.add_particle(position, velocity);
                requested += 1;
            }

            self.time_left = time_to_spend;
        }

        self.last_position = new_position;
        requested
    }
}
