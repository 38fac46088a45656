use std::f64::consts::TAU;
use std::time::Instant;

use tracing::debug;

/// All "now" reads go through one injected clock so transitions are exactly
/// reproducible under test.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Wall-clock milliseconds since construction.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Display rate the transition duration is derived against.
pub const TARGET_FPS: f64 = 60.0;

const MIN_DURATION_MS: f64 = 500.0;
const SPEED_EPSILON: f64 = 1e-6;

/// One rotation-amount interpolation from 0 to 1. Settled (no transition in
/// flight) reports progress 1.0; arming restarts from 0 with a duration of
/// roughly 5% of the active cut's oscillation period, floored at 500 ms.
#[derive(Clone, Debug)]
pub struct TransitionController {
    start_ms: Option<f64>,
    duration_ms: f64,
}

impl Default for TransitionController {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionController {
    pub fn new() -> Self {
        Self {
            start_ms: None,
            duration_ms: MIN_DURATION_MS,
        }
    }

    /// (Re-)enters the transitioning state, deriving the duration from the
    /// active cut's rotation speed.
    pub fn arm(&mut self, rotation_speed: f64, now_ms: f64) {
        let period_frames = TAU / rotation_speed.max(SPEED_EPSILON);
        self.duration_ms = (0.05 * period_frames / TARGET_FPS * 1000.0).max(MIN_DURATION_MS);
        self.start_ms = Some(now_ms);
        debug!(duration_ms = self.duration_ms, "transition armed");
    }

    /// Current progress in [0, 1], auto-settling once it reaches 1.0.
    pub fn progress(&mut self, now_ms: f64) -> f64 {
        match self.start_ms {
            None => 1.0,
            Some(start) => {
                let t = ((now_ms - start) / self.duration_ms).clamp(0.0, 1.0);
                if t >= 1.0 {
                    self.start_ms = None;
                }
                t
            }
        }
    }

    pub fn is_settled(&self) -> bool {
        self.start_ms.is_none()
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }
}
