//! Triage policy: the singleton that governs auto-closing.

use serde::{Deserialize, Serialize};

/// Tunable triage settings, stored once per database.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageConfig {
    /// When false, every ticket is escalated regardless of confidence.
    pub auto_close_enabled: bool,

    /// Minimum classifier confidence (inclusive) for auto-closing.
    pub confidence_threshold: f64,

    /// Hours before an unresolved ticket counts as overdue.
    pub sla_hours: u32,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            auto_close_enabled: true,
            confidence_threshold: 0.78,
            sla_hours: 24,
        }
    }
}

impl TriageConfig {
    /// Checks that the threshold is a probability.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(format!(
                "confidence threshold must be between 0 and 1, got {}",
                self.confidence_threshold
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TriageConfig::default();
        assert!(config.auto_close_enabled);
        assert!((config.confidence_threshold - 0.78).abs() < f64::EPSILON);
        assert_eq!(config.sla_hours, 24);
    }

    #[test]
    fn threshold_out_of_range_is_invalid() {
        let config = TriageConfig {
            confidence_threshold: 1.2,
            ..TriageConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(TriageConfig::default().validate().is_ok());
    }
}
