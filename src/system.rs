//! GPU-latency-aware particle system.
//!
//! Particles live in a fixed-size ring split into four regions (see
//! [`ring`](crate::ring)). The CPU spawns into the free region at any rate;
//! each frame the renderer uploads the new region and draws the active one;
//! expired particles sit in the retired region for a few frames before
//! their slots are reused, because the GPU may still be reading them.
//!
//! # Per-frame order
//!
//! ```ignore
//! system.add_particle(position, velocity);   // any number of times
//! system.update(dt);                         // retire and reclaim
//! let frame = system.draw_ranges();          // promote, then submit
//! renderer.upload(system.particles(), &frame.upload);
//! renderer.draw(&frame.draw, frame.current_time);
//! ```

use crate::assets::AssetProvider;
use crate::error::ConfigError;
use crate::particle::Particle;
use crate::ring::{self, RingCursors, SlotRanges};
use crate::settings::ParticleSettings;
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;
use std::sync::Arc;

/// Frames a retired slot is held before reuse. The GPU is assumed never to
/// run more than two frames behind the CPU; one more covers drivers that
/// bend that rule.
///
/// The retirement frame is stored in [`Particle::time`](crate::Particle::time)
/// as an `f32`, which holds every integer only up to 2^24. The draw counter
/// returns to zero whenever the retired region drains, so it only gets that
/// far under an emitter that never pauses for 2^24 frames (about 78 hours at
/// 60 fps). Past that the stored frame rounds, and a slot may be reclaimed a
/// frame early or late.
pub const RETIREMENT_DELAY: u32 = 3;

/// What the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDraw {
    /// Slots spawned since the last frame; copy these to the GPU buffer.
    pub upload: SlotRanges,
    /// Slots to draw, already including `upload`.
    pub draw: SlotRanges,
    /// Simulation clock the shader animates against.
    pub current_time: f32,
}

/// Fixed-capacity particle ring.
pub struct ParticleSystem {
    settings: Arc<ParticleSettings>,
    resource: Option<String>,
    particles: Vec<Particle>,
    cursors: RingCursors,
    current_time: f32,
    draw_counter: u32,
    rng: SmallRng,
}

impl ParticleSystem {
    /// Build a system with entropy-seeded jitter.
    pub fn new(settings: Arc<ParticleSettings>) -> Result<Self, ConfigError> {
        Self::with_rng(settings, SmallRng::from_entropy())
    }

    /// Build a system whose random jitter is reproducible.
    pub fn with_seed(settings: Arc<ParticleSettings>, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(settings, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(settings: Arc<ParticleSettings>, rng: SmallRng) -> Result<Self, ConfigError> {
        settings.validate()?;

        log::info!(
            "Creating particle system: {} slots, {}s lifetime",
            settings.max_particles,
            settings.duration
        );

        Ok(Self {
            particles: vec![Particle::default(); settings.max_particles],
            settings,
            resource: None,
            cursors: RingCursors::default(),
            current_time: 0.0,
            draw_counter: 0,
            rng,
        })
    }

    /// Build a system from settings supplied by an asset provider.
    ///
    /// An absent asset is a configuration error: the effect cannot run.
    pub fn from_asset(
        provider: &mut dyn AssetProvider<ParticleSettings>,
        id: &str,
    ) -> Result<Self, ConfigError> {
        let settings = provider
            .load(id)
            .ok_or_else(|| ConfigError::MissingAsset(id.to_string()))?;

        match Self::new(settings) {
            Ok(mut system) => {
                system.resource = Some(id.to_string());
                Ok(system)
            }
            Err(e) => {
                provider.unload(id);
                Err(e)
            }
        }
    }

    /// Hand the settings back to the provider they came from.
    pub fn release(self, provider: &mut dyn AssetProvider<ParticleSettings>) {
        if let Some(id) = &self.resource {
            log::debug!("Releasing particle settings [{id}]");
            provider.unload(id);
        }
    }

    /// Spawn one particle.
    ///
    /// Returns `false` and changes nothing when the ring is full; dropping
    /// spawns under load is the intended backpressure.
    pub fn add_particle(&mut self, position: Vec3, velocity: Vec3) -> bool {
        let capacity = self.capacity();
        let next_free = ring::next(self.cursors.free, capacity);

        if next_free == self.cursors.retired {
            log::trace!("Particle ring full, dropping spawn");
            return false;
        }

        let velocity = self.jitter(velocity * self.settings.emitter_velocity_sensitivity);
        let random = self.rng.gen::<[u8; 4]>();

        self.particles[self.cursors.free] = Particle {
            position,
            velocity,
            random,
            time: self.current_time,
        };
        self.cursors.free = next_free;
        true
    }

    fn jitter(&mut self, mut velocity: Vec3) -> Vec3 {
        let s = &self.settings;

        let horizontal = lerp(
            s.min_horizontal_velocity,
            s.max_horizontal_velocity,
            self.rng.gen::<f32>(),
        );
        let angle = self.rng.gen::<f32>() * TAU;
        velocity.x += horizontal * angle.cos();
        velocity.z += horizontal * angle.sin();

        velocity.y += lerp(
            s.min_vertical_velocity,
            s.max_vertical_velocity,
            self.rng.gen::<f32>(),
        );
        velocity
    }

    /// Advance the clock, retire expired particles and reclaim slots the
    /// GPU is done with.
    pub fn update(&mut self, dt: f32) {
        self.current_time += dt;

        self.retire_active_particles();
        self.free_retired_particles();

        // The clock only matters while something is drawn; resetting it
        // keeps spawn times small enough for full float precision.
        if self.cursors.active == self.cursors.free {
            self.current_time = 0.0;
        }

        if self.cursors.retired == self.cursors.active {
            self.draw_counter = 0;
        }
    }

    fn retire_active_particles(&mut self) {
        let capacity = self.capacity();
        let duration = self.settings.duration;

        while self.cursors.active != self.cursors.new {
            let particle = &mut self.particles[self.cursors.active];
            if self.current_time - particle.time < duration {
                break;
            }

            // The slot now records the frame it retired on.
            particle.time = self.draw_counter as f32;
            self.cursors.active = ring::next(self.cursors.active, capacity);
        }
    }

    fn free_retired_particles(&mut self) {
        let capacity = self.capacity();

        while self.cursors.retired != self.cursors.active {
            let retired_on = self.particles[self.cursors.retired].time as u32;
            if self.draw_counter.saturating_sub(retired_on) < RETIREMENT_DELAY {
                break;
            }
            self.cursors.retired = ring::next(self.cursors.retired, capacity);
        }
    }

    /// Promote newly spawned particles and report what to upload and draw.
    ///
    /// Call exactly once per rendered frame, after [`update`](Self::update).
    /// Each call counts as one submitted frame for the retirement delay.
    pub fn draw_ranges(&mut self) -> FrameDraw {
        let capacity = self.capacity();
        let upload = SlotRanges::between(self.cursors.new, self.cursors.free, capacity);
        self.cursors.new = self.cursors.free;

        let draw = SlotRanges::between(self.cursors.active, self.cursors.free, capacity);
        let frame = FrameDraw {
            upload,
            draw,
            current_time: self.current_time,
        };

        self.draw_counter += 1;
        frame
    }

    /// The backing records, indexed by ring slot.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn cursors(&self) -> RingCursors {
        self.cursors
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    /// Particles that will be drawn next frame (active plus new).
    pub fn active_count(&self) -> usize {
        ring::distance(self.cursors.active, self.cursors.free, self.capacity())
    }

    /// Slots still waiting out the retirement delay.
    pub fn retired_count(&self) -> usize {
        self.cursors.retired_len(self.capacity())
    }

    /// True when nothing is alive, pending or retired.
    pub fn is_idle(&self) -> bool {
        self.cursors.retired == self.cursors.free
    }

    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    pub fn draw_counter(&self) -> u32 {
        self.draw_counter
    }

    pub fn settings(&self) -> &Arc<ParticleSettings> {
        &self.settings
    }

    /// Asset id the settings were loaded from, if any.
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{ContentCache, MemorySource};

    fn system(capacity: usize, duration: f32) -> ParticleSystem {
        let settings = ParticleSettings {
            max_particles: capacity,
            duration,
            ..Default::default()
        };
        ParticleSystem::with_seed(Arc::new(settings), 7).unwrap()
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let zero = ParticleSettings {
            max_particles: 0,
            ..Default::default()
        };
        assert!(matches!(
            ParticleSystem::new(Arc::new(zero)),
            Err(ConfigError::ZeroCapacity)
        ));

        let negative = ParticleSettings {
            duration: -1.0,
            ..Default::default()
        };
        assert!(ParticleSystem::new(Arc::new(negative)).is_err());
    }

    #[test]
    fn test_spawn_writes_record_at_free_slot() {
        let mut sys = system(8, 1.0);
        sys.update(0.25);
        assert!(sys.add_particle(Vec3::new(1.0, 2.0, 3.0), Vec3::X));

        let p = sys.particles()[0];
        assert_eq!(p.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p.velocity, Vec3::X);
        assert_eq!(sys.cursors().free, 1);
        assert_eq!(sys.cursors().new, 0);
    }

    #[test]
    fn test_spawn_time_is_clock() {
        let mut sys = system(8, 1.0);
        sys.add_particle(Vec3::ZERO, Vec3::ZERO);
        sys.draw_ranges();
        sys.update(0.25);
        sys.add_particle(Vec3::ZERO, Vec3::ZERO);
        assert_eq!(sys.particles()[1].time, 0.25);
    }

    #[test]
    fn test_velocity_scaled_and_jittered() {
        let settings = ParticleSettings {
            emitter_velocity_sensitivity: 0.5,
            min_horizontal_velocity: 2.0,
            max_horizontal_velocity: 2.0,
            min_vertical_velocity: 1.0,
            max_vertical_velocity: 1.0,
            ..Default::default()
        };
        let mut sys = ParticleSystem::with_seed(Arc::new(settings), 3).unwrap();
        sys.add_particle(Vec3::ZERO, Vec3::new(0.0, 4.0, 0.0));

        let v = sys.particles()[0].velocity;
        assert!((v.y - 3.0).abs() < 1e-5);
        let horizontal = (v.x * v.x + v.z * v.z).sqrt();
        assert!((horizontal - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_same_seed_same_jitter() {
        let settings = Arc::new(ParticleSettings::fire());
        let mut a = ParticleSystem::with_seed(Arc::clone(&settings), 11).unwrap();
        let mut b = ParticleSystem::with_seed(settings, 11).unwrap();
        a.add_particle(Vec3::ZERO, Vec3::ZERO);
        b.add_particle(Vec3::ZERO, Vec3::ZERO);
        assert_eq!(a.particles()[0], b.particles()[0]);
    }

    #[test]
    fn test_full_ring_drops_without_change() {
        let mut sys = system(4, 1.0);
        assert!(sys.add_particle(Vec3::ZERO, Vec3::ZERO));
        assert!(sys.add_particle(Vec3::ZERO, Vec3::ZERO));
        assert!(sys.add_particle(Vec3::ZERO, Vec3::ZERO));

        let before_cursors = sys.cursors();
        let before_records = sys.particles().to_vec();
        assert!(!sys.add_particle(Vec3::ONE, Vec3::ONE));
        assert_eq!(sys.cursors(), before_cursors);
        assert_eq!(sys.particles(), &before_records[..]);
    }

    #[test]
    fn test_new_particles_do_not_retire_before_promotion() {
        let mut sys = system(8, 1.0);
        sys.add_particle(Vec3::ZERO, Vec3::ZERO);
        sys.update(5.0);
        assert_eq!(sys.cursors().active, 0);
        assert_eq!(sys.cursors().free, 1);
    }

    #[test]
    fn test_retires_exactly_at_duration() {
        let mut sys = system(8, 1.0);
        sys.add_particle(Vec3::ZERO, Vec3::ZERO);
        sys.draw_ranges();

        sys.update(0.5);
        assert_eq!(sys.active_count(), 1);
        sys.update(0.25);
        assert_eq!(sys.active_count(), 1);
        sys.update(0.25);
        assert_eq!(sys.active_count(), 0);
        assert_eq!(sys.retired_count(), 1);
    }

    #[test]
    fn test_retired_slot_records_draw_frame() {
        let mut sys = system(8, 1.0);
        sys.add_particle(Vec3::ZERO, Vec3::ZERO);
        sys.draw_ranges();
        sys.draw_ranges();
        sys.update(1.0);
        assert_eq!(sys.particles()[0].time, 2.0);
    }

    #[test]
    fn test_reclaim_waits_three_draws() {
        let mut sys = system(8, 1.0);
        sys.add_particle(Vec3::ZERO, Vec3::ZERO);
        sys.draw_ranges();
        sys.update(1.0);
        assert_eq!(sys.retired_count(), 1);

        for _ in 0..2 {
            sys.draw_ranges();
            sys.update(0.0);
            assert_eq!(sys.retired_count(), 1);
        }

        sys.draw_ranges();
        sys.update(0.0);
        assert_eq!(sys.retired_count(), 0);
        assert!(sys.is_idle());
        assert_eq!(sys.draw_counter(), 0);
    }

    #[test]
    fn test_draw_counter_restarts_after_stream_stops() {
        let mut sys = system(64, 0.1);
        for _ in 0..600 {
            sys.add_particle(Vec3::ZERO, Vec3::ZERO);
            sys.update(1.0 / 60.0);
            sys.draw_ranges();
        }
        // A steady stream keeps the retired region occupied.
        assert!(sys.draw_counter() >= 600);

        for _ in 0..20 {
            sys.update(1.0 / 60.0);
            sys.draw_ranges();
        }
        sys.update(0.0);
        assert!(sys.is_idle());
        assert_eq!(sys.draw_counter(), 0);
        assert_eq!(sys.current_time(), 0.0);
    }

    #[test]
    fn test_clock_resets_when_nothing_alive() {
        let mut sys = system(8, 1.0);
        sys.add_particle(Vec3::ZERO, Vec3::ZERO);
        sys.draw_ranges();
        sys.update(0.6);
        assert_eq!(sys.current_time(), 0.6);

        sys.update(0.6);
        assert_eq!(sys.current_time(), 0.0);

        sys.add_particle(Vec3::ZERO, Vec3::ZERO);
        assert_eq!(sys.particles()[1].time, 0.0);
    }

    #[test]
    fn test_idle_clock_stays_zero() {
        let mut sys = system(8, 1.0);
        for _ in 0..10 {
            sys.update(0.1);
        }
        assert_eq!(sys.current_time(), 0.0);
    }

    #[test]
    fn test_draw_ranges_promote_new() {
        let mut sys = system(8, 10.0);
        sys.add_particle(Vec3::ZERO, Vec3::ZERO);
        sys.add_particle(Vec3::ZERO, Vec3::ZERO);

        let frame = sys.draw_ranges();
        assert_eq!(frame.upload.iter().collect::<Vec<_>>(), vec![0..2]);
        assert_eq!(frame.draw.iter().collect::<Vec<_>>(), vec![0..2]);
        assert_eq!(sys.cursors().new, 2);
        assert_eq!(sys.draw_counter(), 1);

        let frame = sys.draw_ranges();
        assert!(frame.upload.is_empty());
        assert_eq!(frame.draw.len(), 2);
    }

    #[test]
    fn test_draw_range_wraps() {
        let mut sys = system(4, 1.0);
        for _ in 0..3 {
            sys.add_particle(Vec3::ZERO, Vec3::ZERO);
        }
        sys.draw_ranges();
        sys.update(1.0);
        for _ in 0..3 {
            sys.draw_ranges();
        }
        sys.update(0.0);
        assert!(sys.is_idle());
        assert_eq!(sys.cursors().free, 3);

        sys.add_particle(Vec3::ZERO, Vec3::ZERO);
        sys.add_particle(Vec3::ZERO, Vec3::ZERO);
        let frame = sys.draw_ranges();
        assert_eq!(frame.draw.iter().collect::<Vec<_>>(), vec![3..4, 0..1]);
        assert_eq!(frame.upload, frame.draw);
    }

    #[test]
    fn test_from_asset_and_release() {
        let mut cache = ContentCache::new(
            MemorySource::new().with("spark", ParticleSettings::explosion()),
        );

        let sys = ParticleSystem::from_asset(&mut cache, "spark").unwrap();
        assert_eq!(sys.capacity(), 100);
        assert_eq!(sys.resource(), Some("spark"));
        assert_eq!(cache.ref_count("spark"), 1);

        sys.release(&mut cache);
        assert!(!cache.is_cached("spark"));
    }

    #[test]
    fn test_from_asset_missing() {
        let mut cache: ContentCache<ParticleSettings, _> = ContentCache::new(MemorySource::new());
        assert_eq!(
            ParticleSystem::from_asset(&mut cache, "rain").err(),
            Some(ConfigError::MissingAsset("rain".into()))
        );
    }

    #[test]
    fn test_from_asset_invalid_releases_asset() {
        let broken = ParticleSettings {
            duration: 0.0,
            ..Default::default()
        };
        let mut cache = ContentCache::new(MemorySource::new().with("broken", broken));
        assert!(ParticleSystem::from_asset(&mut cache, "broken").is_err());
        assert!(!cache.is_cached("broken"));
    }
}
