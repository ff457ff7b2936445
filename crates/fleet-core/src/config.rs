//! Action simulator configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FleetError, FleetResult};

fn default_min_duration_secs() -> u64 {
    10
}

fn default_max_duration_secs() -> u64 {
    30
}

fn default_tick_ms() -> u64 {
    1000
}

fn default_success_rate() -> f64 {
    0.9
}

fn default_event_capacity() -> usize {
    256
}

/// Tuning knobs for simulated actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Lower bound of the simulated duration (inclusive)
    #[serde(default = "default_min_duration_secs")]
    pub min_duration_secs: u64,
    /// Upper bound of the simulated duration (inclusive)
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,
    /// How often a worker checks its stop flag
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Probability that an uninterrupted action completes
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,
    /// Buffered events per subscriber before it starts lagging
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// Fixed seed for reproducible runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: default_min_duration_secs(),
            max_duration_secs: default_max_duration_secs(),
            tick_ms: default_tick_ms(),
            success_rate: default_success_rate(),
            event_capacity: default_event_capacity(),
            seed: None,
        }
    }
}

impl SimulatorConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn min_duration(&self) -> Duration {
        Duration::from_secs(self.min_duration_secs)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }

    pub fn validate(&self) -> FleetResult<()> {
        if self.min_duration_secs > self.max_duration_secs {
            return Err(FleetError::InvalidRequest(format!(
                "min_duration_secs ({}) exceeds max_duration_secs ({})",
                self.min_duration_secs, self.max_duration_secs
            )));
        }
        if self.tick_ms == 0 {
            return Err(FleetError::InvalidRequest(
                "tick_ms must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.success_rate) {
            return Err(FleetError::InvalidRequest(format!(
                "success_rate must be within [0, 1], got {}",
                self.success_rate
            )));
        }
        if self.event_capacity == 0 {
            return Err(FleetError::InvalidRequest(
                "event_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulatorConfig::default();
        assert_eq!(config.min_duration(), Duration::from_secs(10));
        assert_eq!(config.max_duration(), Duration::from_secs(30));
        assert_eq!(config.tick(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SimulatorConfig =
            serde_json::from_str(r#"{ "success_rate": 0.5, "seed": 7 }"#).unwrap();
        assert_eq!(config.success_rate, 0.5);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_duration_secs, 30);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let inverted = SimulatorConfig {
            min_duration_secs: 5,
            max_duration_secs: 1,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let no_tick = SimulatorConfig {
            tick_ms: 0,
            ..Default::default()
        };
        assert!(no_tick.validate().is_err());

        let rate = SimulatorConfig {
            success_rate: 1.5,
            ..Default::default()
        };
        assert!(rate.validate().is_err());
    }
}
