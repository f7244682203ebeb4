//! Burst/normal pacing for the trade feed.
//!
//! One `tick()` per displayed trade. The returned interval is how long the
//! scheduler waits before the next trade.

use tracing::trace;

use crate::config::PacingConfig;
use crate::feed::rng::{RandomSource, SeededRng};
use crate::feed::types::{PacingState, Regime};

#[derive(Debug, Clone)]
pub struct PacingController<R = SeededRng> {
    burst_probability: f64,
    burst_intervals_ms: Vec<u64>,
    burst_lengths: Vec<u32>,
    normal_intervals_ms: Vec<u64>,
    state: PacingState,
    rng: R,
}

impl<R: RandomSource> PacingController<R> {
    /// Starts in `Normal` at the slowest normal interval.
    ///
    /// The config must have passed `PacingConfig::validate`.
    pub fn new(config: &PacingConfig, rng: R) -> Self {
        let initial = config.normal_intervals_ms.iter().copied().max().unwrap_or_default();
        Self {
            burst_probability: config.burst_probability,
            burst_intervals_ms: config.burst_intervals_ms.clone(),
            burst_lengths: config.burst_lengths.clone(),
            normal_intervals_ms: config.normal_intervals_ms.clone(),
            state: PacingState {
                regime: Regime::Normal,
                interval_ms: initial,
                remaining_burst_ticks: 0,
            },
            rng,
        }
    }

    pub fn state(&self) -> PacingState {
        self.state
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }

    /// Advance one tick.
    ///
    /// A running burst counts down without touching the random source; only
    /// once it is exhausted does the next tick roll for a new regime.
    pub fn tick(&mut self) -> PacingState {
        if self.state.remaining_burst_ticks > 0 {
            self.state.remaining_burst_ticks -= 1;
            trace!(remaining = self.state.remaining_burst_ticks, "Burst continues");
            return self.state;
        }

        if self.rng.next_f64() < self.burst_probability {
            let interval = self.burst_intervals_ms[self.rng.pick(self.burst_intervals_ms.len())];
            let length = self.burst_lengths[self.rng.pick(self.burst_lengths.len())];
            self.state = PacingState {
                regime: Regime::Burst,
                interval_ms: interval,
                // this tick is the first of the burst
                remaining_burst_ticks: length.saturating_sub(1),
            };
            trace!(interval_ms = interval, length, "Entering burst");
        } else {
            let interval = self.normal_intervals_ms[self.rng.pick(self.normal_intervals_ms.len())];
            self.state = PacingState {
                regime: Regime::Normal,
                interval_ms: interval,
                remaining_burst_ticks: 0,
            };
            trace!(interval_ms = interval, "Normal pacing");
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PacingConfig {
        PacingConfig {
            burst_probability: 0.25,
            burst_intervals_ms: vec![400, 450, 500],
            burst_lengths: vec![4, 6, 8],
            normal_intervals_ms: vec![1800, 2000, 2200],
        }
    }

    /// Replays fixed draws and counts how many were taken.
    struct Scripted {
        draws: Vec<f64>,
        taken: usize,
    }

    impl Scripted {
        fn new(draws: Vec<f64>) -> Self {
            Self { draws, taken: 0 }
        }
    }

    impl RandomSource for Scripted {
        fn next_f64(&mut self) -> f64 {
            let x = self.draws[self.taken];
            self.taken += 1;
            x
        }
    }

    #[test]
    fn test_initial_state() {
        let pacing = PacingController::new(&config(), SeededRng::new(1));
        assert_eq!(
            pacing.state(),
            PacingState { regime: Regime::Normal, interval_ms: 2200, remaining_burst_ticks: 0 }
        );
    }

    #[test]
    fn test_normal_tick_draws_interval() {
        // roll 0.9 -> normal, interval idx floor(0.4 * 3) = 1
        let mut pacing = PacingController::new(&config(), Scripted::new(vec![0.9, 0.4]));
        let state = pacing.tick();
        assert_eq!(state.regime, Regime::Normal);
        assert_eq!(state.interval_ms, 2000);
        assert_eq!(pacing.rng().taken, 2);
    }

    #[test]
    fn test_burst_runs_full_length_without_draws() {
        // roll 0.1 -> burst; interval idx 2 (500ms); length idx 1 (6 ticks); then a normal roll
        let mut pacing =
            PacingController::new(&config(), Scripted::new(vec![0.1, 0.9, 0.5, 0.8, 0.0]));

        let first = pacing.tick();
        assert_eq!(first.regime, Regime::Burst);
        assert_eq!(first.interval_ms, 500);
        assert_eq!(first.remaining_burst_ticks, 5);
        assert_eq!(pacing.rng().taken, 3);

        // ticks 2..=6 of the burst take no draws and keep the interval
        for expected_remaining in (0..5).rev() {
            let state = pacing.tick();
            assert_eq!(state.regime, Regime::Burst);
            assert_eq!(state.interval_ms, 500);
            assert_eq!(state.remaining_burst_ticks, expected_remaining);
            assert_eq!(pacing.rng().taken, 3);
        }

        // tick L+1 rolls again
        let after = pacing.tick();
        assert_eq!(pacing.rng().taken, 5);
        assert_eq!(after.regime, Regime::Normal);
        assert_eq!(after.interval_ms, 1800);
    }

    #[test]
    fn test_certain_burst_with_seeded_rng() {
        let mut cfg = config();
        cfg.burst_probability = 1.0;
        cfg.burst_lengths = vec![4];
        let mut pacing = PacingController::new(&cfg, SeededRng::new(1234));

        let state = pacing.tick();
        assert_eq!(state.regime, Regime::Burst);
        assert_eq!(pacing.rng().draws(), 3);
        for _ in 0..3 {
            pacing.tick();
            assert_eq!(pacing.rng().draws(), 3);
        }
        pacing.tick();
        assert_eq!(pacing.rng().draws(), 6);
    }

    #[test]
    fn test_invariant_holds_over_long_run() {
        let mut pacing = PacingController::new(&config(), SeededRng::new(987_654));
        for _ in 0..10_000 {
            let state = pacing.tick();
            if state.remaining_burst_ticks > 0 {
                assert_eq!(state.regime, Regime::Burst);
            }
            match state.regime {
                Regime::Burst => assert!([400, 450, 500].contains(&state.interval_ms)),
                Regime::Normal => assert!([1800, 2000, 2200].contains(&state.interval_ms)),
            }
        }
    }

    #[test]
    fn test_same_seed_same_schedule() {
        let mut a = PacingController::new(&config(), SeededRng::new(55));
        let mut b = PacingController::new(&config(), SeededRng::new(55));
        for _ in 0..500 {
            assert_eq!(a.tick(), b.tick());
        }
    }
}
