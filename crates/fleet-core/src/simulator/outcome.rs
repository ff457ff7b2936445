//! Sources of simulated durations and success draws

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimulatorConfig;

/// Produces one plan per launched worker
pub trait OutcomeSource: Send + Sync {
    fn plan(&self) -> Box<dyn ActionPlan>;
}

/// Draws made by a single worker
pub trait ActionPlan: Send {
    /// How long the simulated work takes
    fn duration(&mut self) -> Duration;
    /// Whether the work succeeds, drawn after the wait
    fn succeeds(&mut self) -> bool;
}

/// Uniform duration in whole seconds, Bernoulli success
#[derive(Debug)]
pub struct RandomOutcome {
    min_secs: u64,
    max_secs: u64,
    success_rate: f64,
    seed: Option<u64>,
    draws: AtomicU64,
}

impl RandomOutcome {
    pub fn new(config: &SimulatorConfig) -> Self {
        Self {
            min_secs: config.min_duration_secs,
            max_secs: config.max_duration_secs.max(config.min_duration_secs),
            success_rate: config.success_rate.clamp(0.0, 1.0),
            seed: config.seed,
            draws: AtomicU64::new(0),
        }
    }
}

impl OutcomeSource for RandomOutcome {
    fn plan(&self) -> Box<dyn ActionPlan> {
        let rng = match self.seed {
            Some(seed) => {
                let n = self.draws.fetch_add(1, Ordering::Relaxed);
                StdRng::seed_from_u64(seed.wrapping_add(n))
            }
            None => StdRng::from_entropy(),
        };
        Box::new(RandomPlan {
            rng,
            min_secs: self.min_secs,
            max_secs: self.max_secs,
            success_rate: self.success_rate,
        })
    }
}

struct RandomPlan {
    rng: StdRng,
    min_secs: u64,
    max_secs: u64,
    success_rate: f64,
}

impl ActionPlan for RandomPlan {
    fn duration(&mut self) -> Duration {
        Duration::from_secs(self.rng.gen_range(self.min_secs..=self.max_secs))
    }

    fn succeeds(&mut self) -> bool {
        self.rng.gen_bool(self.success_rate)
    }
}

/// Deterministic outcome, mostly for tests and demos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedOutcome {
    pub duration: Duration,
    pub success: bool,
}

impl FixedOutcome {
    pub fn succeeding(duration: Duration) -> Self {
        Self {
            duration,
            success: true,
        }
    }

    pub fn failing(duration: Duration) -> Self {
        Self {
            duration,
            success: false,
        }
    }
}

impl OutcomeSource for FixedOutcome {
    fn plan(&self) -> Box<dyn ActionPlan> {
        Box::new(*self)
    }
}

impl ActionPlan for FixedOutcome {
    fn duration(&mut self) -> Duration {
        self.duration
    }

    fn succeeds(&mut self) -> bool {
        self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_duration_within_bounds() {
        let outcomes = RandomOutcome::new(&SimulatorConfig::default());
        for _ in 0..200 {
            let d = outcomes.plan().duration();
            assert!(d >= Duration::from_secs(10) && d <= Duration::from_secs(30));
            assert_eq!(d.subsec_nanos(), 0);
        }
    }

    #[test]
    fn test_success_rate_extremes() {
        let always = RandomOutcome::new(&SimulatorConfig {
            success_rate: 1.0,
            ..Default::default()
        });
        let never = RandomOutcome::new(&SimulatorConfig {
            success_rate: 0.0,
            ..Default::default()
        });
        for _ in 0..100 {
            assert!(always.plan().succeeds());
            assert!(!never.plan().succeeds());
        }
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let config = SimulatorConfig {
            seed: Some(42),
            ..Default::default()
        };
        let a = RandomOutcome::new(&config);
        let b = RandomOutcome::new(&config);
        for _ in 0..20 {
            let (mut pa, mut pb) = (a.plan(), b.plan());
            assert_eq!(pa.duration(), pb.duration());
            assert_eq!(pa.succeeds(), pb.succeeds());
        }
    }

    #[test]
    fn test_fixed_outcome() {
        let mut plan = FixedOutcome::failing(Duration::from_secs(3)).plan();
        assert_eq!(plan.duration(), Duration::from_secs(3));
        assert!(!plan.succeeds());
    }
}
