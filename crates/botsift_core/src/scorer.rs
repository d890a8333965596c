//! Weighted score aggregation
//!
//! Runs the fixed registry of feature extractors over a validated,
//! normalized email and folds their outcomes into a total score plus a
//! named per-feature breakdown. The aggregation itself is trivial by
//! design; all judgment lives in the extractors.

use crate::disposable::DisposableDomains;
use crate::features;
use crate::syntax::NormalizedEmail;
use crate::{DetectionConfig, FeatureResult};
use std::collections::BTreeMap;
use tracing::debug;

/// Feature names used as breakdown keys. Part of the diagnostics
/// contract with downstream consumers.
pub const FEATURE_DISPOSABLE_DOMAIN: &str = "disposable_domain";
pub const FEATURE_OBVIOUS_BOT_LOCALPART: &str = "obvious_bot_localpart";
pub const FEATURE_HIGH_RANDOMNESS: &str = "high_randomness";
pub const FEATURE_ROLE_ACCOUNT: &str = "role_account";
pub const FEATURE_NAME_ANALYSIS: &str = "name_analysis";

/// Scores validated emails against the configured weights.
///
/// Borrows the config and disposable set; holds no state of its own, so
/// one scorer can serve many rows concurrently.
pub struct BotScorer<'a> {
    config: &'a DetectionConfig,
    disposable: &'a DisposableDomains,
}

impl<'a> BotScorer<'a> {
    pub fn new(config: &'a DetectionConfig, disposable: &'a DisposableDomains) -> Self {
        Self { config, disposable }
    }

    /// Compute the total score and per-feature breakdown for an email
    /// that already passed verification.
    ///
    /// Every extractor appears in the breakdown whether or not it fired;
    /// the name analysis entry carries a signed contribution and is the
    /// only term that can be negative.
    pub fn score(
        &self,
        email: &NormalizedEmail,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> (f64, BTreeMap<String, FeatureResult>) {
        let config = self.config;
        let mut breakdown = BTreeMap::new();
        let mut score = 0.0;

        let binary_features: [(&str, bool, f64); 4] = [
            (
                FEATURE_DISPOSABLE_DOMAIN,
                features::is_disposable_domain(email, self.disposable),
                config.disposable_domain_weight,
            ),
            (
                FEATURE_OBVIOUS_BOT_LOCALPART,
                features::has_bot_keyword(&email.local_part),
                config.obvious_bot_localpart_weight,
            ),
            (
                FEATURE_HIGH_RANDOMNESS,
                features::is_high_randomness(&email.local_part, config),
                config.high_randomness_weight,
            ),
            (
                FEATURE_ROLE_ACCOUNT,
                features::is_role_account(email),
                config.role_account_weight,
            ),
        ];

        for (name, triggered, weight) in binary_features {
            let contribution = if triggered { weight } else { 0.0 };
            score += contribution;
            breakdown.insert(
                name.to_string(),
                FeatureResult {
                    triggered,
                    weight,
                    contribution,
                },
            );
        }

        let name_contribution =
            features::name_adjustment(first_name, last_name, &email.local_part, config);
        score += name_contribution;
        breakdown.insert(
            FEATURE_NAME_ANALYSIS.to_string(),
            FeatureResult {
                triggered: name_contribution != 0.0,
                weight: name_contribution,
                contribution: name_contribution,
            },
        );

        debug!(
            "Scored {} -> {:.2} (threshold {:.2})",
            email.address, score, config.bot_threshold
        );

        (score, breakdown)
    }

    /// Whether a score meets the bot threshold. The comparison is
    /// inclusive: a score exactly at the threshold classifies as bot.
    /// The signed name adjustment can leave a sum that is mathematically
    /// equal to the threshold a few ULPs below it (0.3 - 0.1 vs 0.2), so
    /// the comparison absorbs accumulated rounding.
    pub fn is_bot(&self, score: f64) -> bool {
        score - self.config.bot_threshold >= -1e-9
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::normalize;
    use pretty_assertions::assert_eq;

    fn scorer_fixtures() -> (DetectionConfig, DisposableDomains) {
        (DetectionConfig::default(), DisposableDomains::default())
    }

    #[test]
    fn disposable_plus_keyword_stack() {
        let (config, disposable) = scorer_fixtures();
        let scorer = BotScorer::new(&config, &disposable);

        let email = normalize("bot@mailinator.com").unwrap();
        let (score, breakdown) = scorer.score(&email, None, None);

        assert_eq!(score, 3.5);
        assert!(scorer.is_bot(score));
        assert!(breakdown[FEATURE_DISPOSABLE_DOMAIN].triggered);
        assert!(breakdown[FEATURE_OBVIOUS_BOT_LOCALPART].triggered);
        assert!(!breakdown[FEATURE_HIGH_RANDOMNESS].triggered);
        assert!(!breakdown[FEATURE_ROLE_ACCOUNT].triggered);
        assert_eq!(breakdown[FEATURE_NAME_ANALYSIS].contribution, 0.0);
    }

    #[test]
    fn role_account_alone_stays_below_default_threshold() {
        let (config, disposable) = scorer_fixtures();
        let scorer = BotScorer::new(&config, &disposable);

        let email = normalize("admin@company.com").unwrap();
        let (score, breakdown) = scorer.score(&email, Some("Admin"), Some("User"));

        // Role weight minus the human-names adjustment.
        assert!((score - 0.2).abs() < 1e-9);
        assert!(breakdown[FEATURE_ROLE_ACCOUNT].triggered);
        assert!(!breakdown[FEATURE_OBVIOUS_BOT_LOCALPART].triggered);
        assert!(!scorer.is_bot(score));
    }

    #[test]
    fn role_account_is_bot_at_lowered_threshold() {
        let config = DetectionConfig {
            bot_threshold: 0.2,
            ..DetectionConfig::default()
        };
        let disposable = DisposableDomains::default();
        let scorer = BotScorer::new(&config, &disposable);

        let email = normalize("admin@company.com").unwrap();
        let (score, _) = scorer.score(&email, Some("Admin"), Some("User"));
        assert!(scorer.is_bot(score));
    }

    #[test]
    fn human_names_produce_negative_score() {
        let (config, disposable) = scorer_fixtures();
        let scorer = BotScorer::new(&config, &disposable);

        let email = normalize("john.doe@gmail.com").unwrap();
        let (score, breakdown) = scorer.score(&email, Some("John"), Some("Doe"));

        assert!((score - (-0.1)).abs() < 1e-9);
        assert!(!scorer.is_bot(score));
        assert_eq!(breakdown[FEATURE_NAME_ANALYSIS].contribution, -0.1);
        // The name adjustment is the only signed term; all others are >= 0.
        for (name, result) in &breakdown {
            if name != FEATURE_NAME_ANALYSIS {
                assert!(result.contribution >= 0.0);
            }
        }
    }

    #[test]
    fn randomness_plus_missing_names_stack() {
        let (config, disposable) = scorer_fixtures();
        let scorer = BotScorer::new(&config, &disposable);

        let email = normalize("xq7k9m2n4p8r@company.com").unwrap();
        let (score, breakdown) = scorer.score(&email, None, None);

        assert!((score - 1.2).abs() < 1e-9);
        assert!(scorer.is_bot(score));
        assert!(breakdown[FEATURE_HIGH_RANDOMNESS].triggered);
        assert_eq!(breakdown[FEATURE_NAME_ANALYSIS].contribution, 0.2);
    }

    #[test]
    fn threshold_comparison_is_inclusive() {
        let (config, disposable) = scorer_fixtures();
        let scorer = BotScorer::new(&config, &disposable);

        // High randomness alone, names present but not human-shaped:
        // the total lands exactly on the default threshold of 1.0.
        let email = normalize("xq7k9m2n4p8r@company.com").unwrap();
        let (score, _) = scorer.score(&email, Some("X1"), Some("Y2"));

        assert_eq!(score, 1.0);
        assert!(scorer.is_bot(score));
    }

    #[test]
    fn threshold_comparison_absorbs_rounding_drift() {
        let config = DetectionConfig {
            bot_threshold: 0.2,
            ..DetectionConfig::default()
        };
        let disposable = DisposableDomains::default();
        let scorer = BotScorer::new(&config, &disposable);

        // Role weight plus the negative human-names adjustment sums to
        // 0.19999999999999998 in f64, mathematically equal to 0.2. The
        // inclusive comparison must still classify it as bot.
        let email = normalize("admin@company.com").unwrap();
        let (score, _) = scorer.score(&email, Some("Admin"), Some("User"));
        assert!(score < 0.2);
        assert!(scorer.is_bot(score));

        // A score genuinely below the threshold still stays clean.
        assert!(!scorer.is_bot(0.1));
    }

    #[test]
    fn score_is_monotonic_over_triggered_features() {
        let (config, disposable) = scorer_fixtures();
        let scorer = BotScorer::new(&config, &disposable);

        // Same names; each additional triggered extractor only raises the total.
        let role_only = normalize("admin@company.com").unwrap();
        let role_and_disposable = normalize("admin@mailinator.com").unwrap();

        let (base, _) = scorer.score(&role_only, None, None);
        let (stacked, _) = scorer.score(&role_and_disposable, None, None);
        assert!(stacked > base);
    }

    #[test]
    fn breakdown_names_all_extractors() {
        let (config, disposable) = scorer_fixtures();
        let scorer = BotScorer::new(&config, &disposable);

        let email = normalize("john.doe@gmail.com").unwrap();
        let (_, breakdown) = scorer.score(&email, None, None);

        assert_eq!(breakdown.len(), 5);
        for name in [
            FEATURE_DISPOSABLE_DOMAIN,
            FEATURE_OBVIOUS_BOT_LOCALPART,
            FEATURE_HIGH_RANDOMNESS,
            FEATURE_ROLE_ACCOUNT,
            FEATURE_NAME_ANALYSIS,
        ] {
            assert!(breakdown.contains_key(name), "missing feature {}", name);
        }
    }
}
