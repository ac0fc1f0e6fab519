//! The auto-close decision.

use crate::model::TriageConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub auto_close: bool,
}

/// Auto-close when enabled and `confidence` reaches the threshold (inclusive).
pub fn decide(confidence: f64, config: &TriageConfig) -> Decision {
    Decision {
        auto_close: config.auto_close_enabled && confidence >= config.confidence_threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(threshold: f64) -> TriageConfig {
        TriageConfig {
            confidence_threshold: threshold,
            ..TriageConfig::default()
        }
    }

    #[test]
    fn matches_threshold_comparison_across_grid() {
        for t in [0.0, 0.25, 0.5, 0.78, 0.8, 0.85, 0.9, 1.0] {
            for c in [0.0, 0.5, 0.78, 0.8, 0.85, 0.9, 1.0] {
                assert_eq!(decide(c, &config(t)).auto_close, c >= t, "c={c} t={t}");
            }
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(decide(0.78, &config(0.78)).auto_close);
    }

    #[test]
    fn disabled_never_auto_closes() {
        let disabled = TriageConfig {
            auto_close_enabled: false,
            ..config(0.0)
        };
        assert!(!decide(1.0, &disabled).auto_close);
    }
}
