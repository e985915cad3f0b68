//! Timing engine configuration.
//!
//! Every threshold, capacity and timeout the detectors use is set here and
//! checked once, when the analyzer is built.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::embedding::DEFAULT_EMBEDDING_CACHE_CAPACITY;
use crate::energy::DEFAULT_ENERGY_HISTORY;
use crate::error::{ConfigError, non_zero, unit_range};
use crate::silence::DEFAULT_SILENCE_THRESHOLD_MS;

pub const DEFAULT_TOPIC_SHIFT_THRESHOLD: f32 = 0.6;
pub const DEFAULT_TOPIC_WINDOW: usize = 5;
pub const DEFAULT_MIN_INTERRUPTION_SCORE: f32 = 0.7;
pub const DEFAULT_SIGNAL_HISTORY: usize = 20;
pub const DEFAULT_EMBEDDING_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_SILENCE_CHECK_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Quiet time before silence is reported.
    pub silence_threshold_ms: u64,
    /// Average weighted similarity below which a topic shift is reported.
    pub topic_shift_threshold: f32,
    /// Prior segments compared against each new one.
    pub topic_window: usize,
    pub embedding_cache_capacity: usize,
    pub energy_history: usize,
    /// Score at or above which the recommendation is `interrupt_now`.
    pub min_interruption_score: f32,
    pub signal_history: usize,
    pub embedding_timeout_ms: u64,
    /// Cadence of the silence poll.
    pub silence_check_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            silence_threshold_ms: DEFAULT_SILENCE_THRESHOLD_MS,
            topic_shift_threshold: DEFAULT_TOPIC_SHIFT_THRESHOLD,
            topic_window: DEFAULT_TOPIC_WINDOW,
            embedding_cache_capacity: DEFAULT_EMBEDDING_CACHE_CAPACITY,
            energy_history: DEFAULT_ENERGY_HISTORY,
            min_interruption_score: DEFAULT_MIN_INTERRUPTION_SCORE,
            signal_history: DEFAULT_SIGNAL_HISTORY,
            embedding_timeout_ms: DEFAULT_EMBEDDING_TIMEOUT_MS,
            silence_check_interval_ms: DEFAULT_SILENCE_CHECK_INTERVAL_MS,
        }
    }
}

impl TimingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_zero("silence_threshold_ms", self.silence_threshold_ms)?;
        unit_range("topic_shift_threshold", self.topic_shift_threshold)?;
        non_zero("topic_window", self.topic_window)?;
        non_zero("embedding_cache_capacity", self.embedding_cache_capacity)?;
        non_zero("energy_history", self.energy_history)?;
        unit_range("min_interruption_score", self.min_interruption_score)?;
        non_zero("signal_history", self.signal_history)?;
        non_zero("embedding_timeout_ms", self.embedding_timeout_ms)?;
        non_zero("silence_check_interval_ms", self.silence_check_interval_ms)?;
        Ok(())
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_millis(self.embedding_timeout_ms)
    }

    pub fn silence_check_interval(&self) -> Duration {
        Duration::from_millis(self.silence_check_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TimingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.silence_threshold_ms, 3000);
        assert_eq!(config.topic_window, 5);
        assert_eq!(config.embedding_cache_capacity, 20);
        assert_eq!(config.energy_history, 10);
        assert_eq!(config.signal_history, 20);
        assert_eq!(config.silence_check_interval(), Duration::from_secs(1));
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let config = TimingConfig {
            topic_shift_threshold: 1.5,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::OutOfUnitRange {
                name: "topic_shift_threshold",
                value: 1.5,
            })
        );

        let config = TimingConfig {
            min_interruption_score: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_capacities() {
        let config = TimingConfig {
            topic_window: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Zero("topic_window")));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: TimingConfig =
            serde_json::from_str(r#"{"silence_threshold_ms": 4500}"#).unwrap();
        assert_eq!(config.silence_threshold_ms, 4500);
        assert_eq!(config.topic_shift_threshold, DEFAULT_TOPIC_SHIFT_THRESHOLD);
    }
}
