//! Frame clock for the per-frame update loop.
//!
//! Particle systems and cameras advance by a `dt` in seconds. A
//! [`FrameClock`] hands one out per frame, either measured from wall time
//! or as a constant step, and folds pause and slow motion into it.
//!
//! ```ignore
//! use nibiru::time::FrameClock;
//!
//! let mut clock = FrameClock::new();
//! loop {
//!     let dt = clock.tick();
//!     trail.update(&mut system, dt, emitter_position);
//!     system.update(dt);
//! }
//! ```

use std::time::Instant;

/// Longest measured step handed out by default, in seconds.
const DEFAULT_STALL_LIMIT: f32 = 0.25;

/// Where the unscaled step of a frame comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    /// Wall time since the previous tick, capped at `limit`.
    Measured { limit: f32 },
    /// The same step every frame.
    Fixed(f32),
}

/// Produces one `dt` per frame.
#[derive(Debug)]
pub struct FrameClock {
    last_tick: Instant,
    step: Step,
    speed: f32,
    paused: bool,
    frames: u64,
    /// Sum of every scaled step handed out.
    elapsed: f32,
}

impl FrameClock {
    /// A clock that measures wall time between ticks.
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            step: Step::Measured {
                limit: DEFAULT_STALL_LIMIT,
            },
            speed: 1.0,
            paused: false,
            frames: 0,
            elapsed: 0.0,
        }
    }

    /// A clock that advances by `step` seconds per frame, for replays and
    /// tests.
    pub fn fixed(step: f32) -> Self {
        Self {
            step: Step::Fixed(step.max(0.0)),
            ..Self::new()
        }
    }

    /// Begin a frame and return its `dt`. Returns 0 while paused, without
    /// counting the frame.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let wall = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;

        if self.paused {
            return 0.0;
        }

        let step = match self.step {
            Step::Measured { limit } => wall.min(limit),
            Step::Fixed(step) => step,
        };
        let dt = step * self.speed;
        self.elapsed += dt;
        self.frames += 1;
        dt
    }

    /// Seconds handed out so far.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Frames counted while running.
    pub fn frame(&self) -> u64 {
        self.frames
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn time_scale(&self) -> f32 {
        self.speed
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Restart after [`pause`](Self::pause). The paused wall time is not
    /// handed out on the next tick.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.last_tick = Instant::now();
        }
    }

    /// Cap on a measured step, so a stall does not emit seconds of
    /// particles at once. Has no effect on a fixed clock.
    pub fn set_stall_limit(&mut self, limit: f32) {
        if let Step::Measured { limit: current } = &mut self.step {
            *current = limit.max(0.0);
        }
    }

    /// Multiply every step by `scale`. Negative values stop time.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.speed = scale.max(0.0);
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
