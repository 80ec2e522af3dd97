//! Engine Configuration
//!
//! Immutable parameter set handed to every engine component. Every field has a
//! default, so a partial JSON document only overrides what it names.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mastery::MasteryRules;
use crate::priority::PriorityWeights;
use crate::scheduler::{IntervalConfig, MAX_INTERVAL_DAYS};
use crate::session::SessionConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("interval step table is empty")]
    EmptyIntervalTable,
    #[error("interval step table must be non-decreasing, step {index} drops to {value}")]
    DecreasingIntervalTable { index: usize, value: u32 },
    #[error("interval step {index} is {value} days, above the {max} day limit")]
    IntervalTooLong { index: usize, value: u32, max: u32 },
    #[error("minimum interval must be at least one day")]
    ZeroMinimumInterval,
    #[error("minimum interval {value} exceeds the {max} day limit")]
    MinimumIntervalTooLong { value: u32, max: u32 },
    #[error("multiplier {name} must be a positive finite number, got {value}")]
    InvalidMultiplier { name: &'static str, value: f64 },
    #[error("accuracy threshold {name} must be within 0..=1, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
    #[error("no session patterns configured")]
    NoPatterns,
    #[error("session pattern {0} selects no words")]
    EmptyPattern(String),
    #[error("session pattern {0} is defined twice")]
    DuplicatePattern(String),
    #[error("unknown session pattern: {0}")]
    UnknownPattern(String),
    #[error("candidate multiplier must be at least 1")]
    ZeroCandidateMultiplier,
    #[error("invalid engine config json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub mastery: MasteryRules,
    pub interval: IntervalConfig,
    pub priority: PriorityWeights,
    pub session: SessionConfig,
}

impl EngineConfig {
    /// Parse and validate a JSON document
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_mastery()?;
        self.validate_interval()?;
        self.validate_session()
    }

    fn validate_mastery(&self) -> Result<(), ConfigError> {
        check_threshold("mastery.aptitudeAccuracy", self.mastery.aptitude_accuracy)
    }

    fn validate_interval(&self) -> Result<(), ConfigError> {
        let interval = &self.interval;
        if interval.steps.is_empty() {
            return Err(ConfigError::EmptyIntervalTable);
        }
        for (index, pair) in interval.steps.windows(2).enumerate() {
            if pair[1] < pair[0] {
                return Err(ConfigError::DecreasingIntervalTable {
                    index: index + 1,
                    value: pair[1],
                });
            }
        }
        if let Some(index) = interval.steps.iter().position(|&days| days > MAX_INTERVAL_DAYS) {
            return Err(ConfigError::IntervalTooLong {
                index,
                value: interval.steps[index],
                max: MAX_INTERVAL_DAYS,
            });
        }
        if interval.min_interval_days == 0 {
            return Err(ConfigError::ZeroMinimumInterval);
        }
        if interval.min_interval_days > MAX_INTERVAL_DAYS {
            return Err(ConfigError::MinimumIntervalTooLong {
                value: interval.min_interval_days,
                max: MAX_INTERVAL_DAYS,
            });
        }

        for (name, value) in [
            ("interval.severeMultiplier", interval.severe_multiplier),
            ("interval.lowMultiplier", interval.low_multiplier),
            ("interval.highMultiplier", interval.high_multiplier),
            ("interval.volumeMultiplier", interval.volume_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidMultiplier { name, value });
            }
        }
        for (name, value) in [
            ("interval.severeAccuracy", interval.severe_accuracy),
            ("interval.lowAccuracy", interval.low_accuracy),
            ("interval.highAccuracy", interval.high_accuracy),
        ] {
            check_threshold(name, value)?;
        }
        Ok(())
    }

    fn validate_session(&self) -> Result<(), ConfigError> {
        let session = &self.session;
        if session.patterns.is_empty() {
            return Err(ConfigError::NoPatterns);
        }
        if session.candidate_multiplier == 0 {
            return Err(ConfigError::ZeroCandidateMultiplier);
        }
        let mut seen = HashSet::new();
        for pattern in &session.patterns {
            if pattern.total() == 0 {
                return Err(ConfigError::EmptyPattern(pattern.name.clone()));
            }
            if !seen.insert(pattern.name.as_str()) {
                return Err(ConfigError::DuplicatePattern(pattern.name.clone()));
            }
        }
        Ok(())
    }
}

fn check_threshold(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionPattern;

    #[test]
    fn test_default_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"interval":{"steps":[1,2,4,8]}}"#).unwrap();
        assert_eq!(config.interval.steps, vec![1, 2, 4, 8]);
        assert_eq!(config.interval.learning_cap_days, 3);
        assert_eq!(config.session.patterns.len(), 4);
    }

    #[test]
    fn test_rejects_decreasing_table() {
        let err = EngineConfig::from_json(r#"{"interval":{"steps":[1,7,3]}}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DecreasingIntervalTable { index: 2, value: 3 }
        ));
    }

    #[test]
    fn test_rejects_overlong_intervals() {
        let err = EngineConfig::from_json(r#"{"interval":{"steps":[1,4000000000]}}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::IntervalTooLong {
                index: 1,
                value: 4_000_000_000,
                ..
            }
        ));

        let err = EngineConfig::from_json(r#"{"interval":{"minIntervalDays":40000}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MinimumIntervalTooLong { value: 40000, .. }));

        let steps = format!(r#"{{"interval":{{"steps":[1,{MAX_INTERVAL_DAYS}]}}}}"#);
        EngineConfig::from_json(&steps).unwrap();
    }

    #[test]
    fn test_rejects_empty_pattern() {
        let mut config = EngineConfig::default();
        config.session.patterns = vec![SessionPattern::new("idle", 0, 0, 0, 0)];
        assert!(matches!(config.validate(), Err(ConfigError::EmptyPattern(_))));
    }

    #[test]
    fn test_rejects_duplicate_pattern_names() {
        let mut config = EngineConfig::default();
        config.session.patterns.push(SessionPattern::new("balanced", 1, 1, 1, 1));
        assert!(matches!(config.validate(), Err(ConfigError::DuplicatePattern(_))));
    }

    #[test]
    fn test_unknown_pattern_lookup() {
        let config = EngineConfig::default();
        assert!(config.session.pattern("balanced").is_ok());
        assert!(matches!(
            config.session.pattern("nope"),
            Err(ConfigError::UnknownPattern(_))
        ));
    }
}
