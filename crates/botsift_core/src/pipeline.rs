//! Detection pipeline orchestrating verification and scoring
//!
//! This module coordinates the verification gate (syntax + MX) and the
//! scoring engine, applying the configured policy for unverifiable
//! emails. Invalid emails never reach the feature extractors.

use crate::disposable::DisposableDomains;
use crate::dns::{MxLookup, MxResolver};
use crate::scorer::BotScorer;
use crate::syntax::{self, NormalizedEmail};
use crate::{BotVerdict, DetectionConfig, EmailStatus, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Classification pipeline for a single run.
///
/// Holds the immutable run configuration, the disposable-domain set, and
/// the MX lookup implementation. All methods take `&self`; rows may be
/// classified concurrently.
pub struct DetectionPipeline<M: MxLookup = MxResolver> {
    config: DetectionConfig,
    disposable: DisposableDomains,
    mx: M,
}

impl DetectionPipeline<MxResolver> {
    /// Create a pipeline with the default disposable set and a real DNS
    /// resolver configured from `config`.
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.validate()?;

        let mx = MxResolver::new(
            Duration::from_millis(config.mx_timeout_ms),
            config.dns_attempts,
        );
        let disposable = DisposableDomains::default();

        info!(
            "Detection pipeline initialized - threshold: {}, syntax: {}, mx: {}, {} disposable domains",
            config.bot_threshold,
            config.enable_syntax_check,
            config.enable_mx_check,
            disposable.len()
        );

        Ok(Self {
            config,
            disposable,
            mx,
        })
    }

    /// Replace the default disposable set with a caller-supplied one.
    pub fn with_disposable_domains(mut self, disposable: DisposableDomains) -> Self {
        self.disposable = disposable;
        self
    }
}

impl<M: MxLookup> DetectionPipeline<M> {
    /// Create a pipeline with a custom MX lookup implementation.
    ///
    /// Used by tests to stub DNS, and by callers that front the resolver
    /// with their own caching.
    pub fn with_mx_lookup(config: DetectionConfig, mx: M) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            disposable: DisposableDomains::default(),
            mx,
        })
    }

    /// The configuration this pipeline was built from.
    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Classify the verification status of an email address.
    ///
    /// Empty or whitespace-only input is `unknown`: the absence of a
    /// value, not a failure. Syntax and DNS failures are statuses, never
    /// errors: verification failure is business logic here.
    pub async fn classify_status(&self, email: &str) -> EmailStatus {
        if email.trim().is_empty() {
            return EmailStatus::Unknown;
        }

        let normalized = match syntax::normalize(email) {
            Some(normalized) => Some(normalized),
            None if self.config.enable_syntax_check => return EmailStatus::InvalidSyntax,
            // Syntax checking disabled: fall through to the MX check with
            // whatever domain can be salvaged from the raw input.
            None => None,
        };

        if self.config.enable_mx_check {
            let domain = match &normalized {
                Some(email) => Some(email.domain.clone()),
                None => syntax::raw_domain(email),
            };
            match domain {
                Some(domain) => {
                    if !self.mx.has_mx(&domain).await {
                        return EmailStatus::NoMx;
                    }
                }
                // No domain to resolve at all.
                None => return EmailStatus::NoMx,
            }
        }

        EmailStatus::Valid
    }

    /// Top-level bot decision for one email.
    ///
    /// Unverifiable emails short-circuit to the configured policy and are
    /// never scored; valid emails are normalized and scored against the
    /// threshold.
    #[instrument(skip(self, first_name, last_name), fields(email = %email))]
    pub async fn is_bot_email(
        &self,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> bool {
        if email.trim().is_empty() {
            return false;
        }

        let status = self.classify_status(email).await;
        self.decide(email, status, first_name, last_name).is_bot
    }

    /// Verbose form of the bot decision, returning the full verdict with
    /// the per-feature breakdown for diagnostics and threshold tuning.
    #[instrument(skip(self, first_name, last_name), fields(email = %email))]
    pub async fn explain(
        &self,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> BotVerdict {
        let status = self.classify_status(email).await;
        self.decide(email, status, first_name, last_name)
    }

    /// Apply the policy branching for an already-observed status, scoring
    /// only when the status is valid. Shared by the single-email entry
    /// points and the batch classifier so that one observed status drives
    /// both labels.
    pub(crate) fn decide(
        &self,
        email: &str,
        status: EmailStatus,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> BotVerdict {
        if status != EmailStatus::Valid {
            let is_bot = status != EmailStatus::Unknown && self.config.treat_unverifiable_as_bot;
            debug!(
                "Email {} short-circuited with status {} -> bot={}",
                email, status, is_bot
            );
            return BotVerdict {
                email: email.to_string(),
                email_status: status,
                is_bot,
                score: 0.0,
                threshold: self.config.bot_threshold,
                breakdown: BTreeMap::new(),
            };
        }

        // Status is valid, so the address re-parses; fall back to an empty
        // breakdown if it somehow does not.
        let Some(normalized) = syntax::normalize(email) else {
            return BotVerdict {
                email: email.to_string(),
                email_status: EmailStatus::InvalidSyntax,
                is_bot: self.config.treat_unverifiable_as_bot,
                score: 0.0,
                threshold: self.config.bot_threshold,
                breakdown: BTreeMap::new(),
            };
        };

        self.score_verdict(&normalized, first_name, last_name)
    }

    fn score_verdict(
        &self,
        email: &NormalizedEmail,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> BotVerdict {
        let scorer = BotScorer::new(&self.config, &self.disposable);
        let (score, breakdown) = scorer.score(email, first_name, last_name);

        BotVerdict {
            email: email.address.clone(),
            email_status: EmailStatus::Valid,
            is_bot: scorer.is_bot(score),
            score,
            threshold: self.config.bot_threshold,
            breakdown,
        }
    }

    /// Pipeline statistics for monitoring.
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            disposable_domains_count: self.disposable.len(),
            bot_keywords_count: crate::features::bot_keyword_count(),
            role_prefixes_count: crate::features::role_prefix_count(),
        }
    }
}

/// Statistics about the detection pipeline
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub disposable_domains_count: usize,
    pub bot_keywords_count: usize,
    pub role_prefixes_count: usize,
}


#[cfg(test)]
mod tests {
    use super::test_support::pipeline_with_mx;
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn empty_input_is_unknown_not_an_error() {
        let pipeline = pipeline_with_mx(DetectionConfig::default(), true);
        assert_eq!(pipeline.classify_status("").await, EmailStatus::Unknown);
        assert_eq!(pipeline.classify_status("   ").await, EmailStatus::Unknown);
    }

    #[tokio::test]
    async fn syntax_failure_is_invalid_syntax() {
        let pipeline = pipeline_with_mx(DetectionConfig::default(), true);
        assert_eq!(
            pipeline.classify_status("invalid-email").await,
            EmailStatus::InvalidSyntax
        );
        assert_eq!(
            pipeline.classify_status("@company.com").await,
            EmailStatus::InvalidSyntax
        );
    }

    #[tokio::test]
    async fn missing_mx_is_no_mx() {
        let pipeline = pipeline_with_mx(DetectionConfig::default(), false);
        assert_eq!(
            pipeline.classify_status("user@dead-domain.example").await,
            EmailStatus::NoMx
        );
    }

    #[tokio::test]
    async fn disabling_mx_check_keeps_valid_status() {
        let config = DetectionConfig {
            enable_mx_check: false,
            ..DetectionConfig::default()
        };
        // Resolver would say "no MX", but the check is off.
        let pipeline = pipeline_with_mx(config, false);
        assert_eq!(
            pipeline.classify_status("user@dead-domain.example").await,
            EmailStatus::Valid
        );
    }

    #[tokio::test]
    async fn unverifiable_email_follows_policy() {
        // Policy on: invalid syntax is a bot without scoring.
        let pipeline = pipeline_with_mx(DetectionConfig::default(), true);
        assert!(pipeline.is_bot_email("invalid-email", None, None).await);

        // Policy off: invalid syntax is not a bot, still not scored.
        let config = DetectionConfig {
            treat_unverifiable_as_bot: false,
            ..DetectionConfig::default()
        };
        let pipeline = pipeline_with_mx(config, true);
        assert!(!pipeline.is_bot_email("invalid-email", None, None).await);
    }

    #[tokio::test]
    async fn no_mx_follows_policy_too() {
        let pipeline = pipeline_with_mx(DetectionConfig::default(), false);
        assert!(pipeline.is_bot_email("john.doe@gmail.com", None, None).await);

        let verdict = pipeline.explain("john.doe@gmail.com", None, None).await;
        assert_eq!(verdict.email_status, EmailStatus::NoMx);
        assert_eq!(verdict.score, 0.0);
        assert!(verdict.breakdown.is_empty());
    }

    #[tokio::test]
    async fn valid_emails_are_scored() {
        let pipeline = pipeline_with_mx(DetectionConfig::default(), true);

        assert!(pipeline.is_bot_email("bot@mailinator.com", None, None).await);
        assert!(
            !pipeline
                .is_bot_email("john.doe@gmail.com", Some("John"), Some("Doe"))
                .await
        );
        assert!(
            pipeline
                .is_bot_email("xq7k9m2n4p8r@company.com", None, None)
                .await
        );
    }

    #[tokio::test]
    async fn role_account_threshold_sensitivity() {
        let pipeline = pipeline_with_mx(DetectionConfig::default(), true);
        assert!(
            !pipeline
                .is_bot_email("admin@company.com", Some("Admin"), Some("User"))
                .await
        );

        let config = DetectionConfig {
            bot_threshold: 0.2,
            ..DetectionConfig::default()
        };
        let pipeline = pipeline_with_mx(config, true);
        assert!(
            pipeline
                .is_bot_email("admin@company.com", Some("Admin"), Some("User"))
                .await
        );
    }

    #[tokio::test]
    async fn explain_carries_full_breakdown() {
        let pipeline = pipeline_with_mx(DetectionConfig::default(), true);
        let verdict = pipeline.explain("bot@mailinator.com", None, None).await;

        assert_eq!(verdict.email_status, EmailStatus::Valid);
        assert!(verdict.is_bot);
        assert_eq!(verdict.score, 3.5);
        assert_eq!(verdict.threshold, 1.0);
        assert_eq!(verdict.breakdown.len(), 5);
        assert!(verdict.breakdown["disposable_domain"].triggered);
        assert!(verdict.breakdown["obvious_bot_localpart"].triggered);
    }

    #[tokio::test]
    async fn explain_normalizes_the_address() {
        let pipeline = pipeline_with_mx(DetectionConfig::default(), true);
        let verdict = pipeline.explain("  John.Doe@GMAIL.com ", None, None).await;
        assert_eq!(verdict.email, "John.Doe@gmail.com");
    }

    #[tokio::test]
    async fn status_is_independent_of_bot_decision() {
        // MX disabled must never downgrade a syntactically valid email.
        let config = DetectionConfig {
            enable_mx_check: false,
            treat_unverifiable_as_bot: true,
            ..DetectionConfig::default()
        };
        let pipeline = pipeline_with_mx(config, false);

        let verdict = pipeline.explain("bot@mailinator.com", None, None).await;
        assert_eq!(verdict.email_status, EmailStatus::Valid);
        assert!(verdict.is_bot); // bot because of the score, not the status
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_at_construction() {
        let config = DetectionConfig {
            mx_timeout_ms: 0,
            ..DetectionConfig::default()
        };
        assert!(DetectionPipeline::new(config).is_err());
    }

    #[test]
    fn stats_report_rule_set_sizes() {
        let pipeline = pipeline_with_mx(DetectionConfig::default(), true);
        let stats = pipeline.stats();
        assert!(stats.disposable_domains_count > 0);
        assert!(stats.bot_keywords_count > 0);
        assert!(stats.role_prefixes_count > 0);
    }
}
