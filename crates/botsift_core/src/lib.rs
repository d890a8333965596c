//! # botsift_core
//!
//! Heuristic bot classification for email addresses, built around a
//! weighted scoring engine and an email-verification gate.
//!
//! ## Features
//!
//! - **Email verification gate** combining syntax validation and a
//!   bounded-time DNS MX lookup into a single status
//! - **Pure feature extractors** for disposable domains, bot-indicator
//!   local-parts, lexical randomness, role accounts, and name plausibility
//! - **Weighted scoring** with a configurable threshold and a full
//!   per-feature breakdown for diagnostics
//! - **Batch classification** over tabular records, producing clean/bot
//!   partitions, an annotated view, and aggregate counts
//!
//! ## Example
//!
//! ```rust,no_run
//! use botsift_core::{DetectionConfig, DetectionPipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DetectionConfig::default();
//!     let pipeline = DetectionPipeline::new(config)?;
//!
//!     let is_bot = pipeline.is_bot_email("bot@mailinator.com", None, None).await;
//!     println!("Bot: {}", is_bot);
//!
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod disposable;
pub mod dns;
pub mod features;
pub mod pipeline;
pub mod scorer;
pub mod syntax;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Configuration for a single classification run.
///
/// Built once from caller-supplied options and never mutated afterwards;
/// a new run gets a new config. All weights and thresholds carry the
/// defaults the scoring rules were tuned against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Score at or above which an email is classified as a bot (inclusive)
    pub bot_threshold: f64,
    /// Weight contributed when the domain is in the disposable set
    pub disposable_domain_weight: f64,
    /// Weight contributed when the local-part contains a bot indicator
    pub obvious_bot_localpart_weight: f64,
    /// Weight contributed when the local-part shows high lexical randomness
    pub high_randomness_weight: f64,
    /// Weight contributed when the address matches a role-account prefix
    pub role_account_weight: f64,
    /// Weight contributed when names are absent and the local-part is noisy
    pub missing_names_weight: f64,
    /// Signed weight contributed when supplied names look human (negative)
    pub human_names_weight: f64,
    /// Minimum local-part length before the randomness check applies
    pub min_length_for_randomness: usize,
    /// Digit ratio above which a local-part counts as random
    pub high_digit_ratio: f64,
    /// Punctuation ratio above which a local-part counts as random
    pub high_special_ratio: f64,
    /// Vowel ratio below which a local-part counts as random
    pub low_vowel_ratio: f64,
    /// Minimum run of consecutive non-vowel letters that counts as random
    pub min_consonant_run: usize,
    /// Enable the email syntax check
    pub enable_syntax_check: bool,
    /// Enable the DNS MX record check
    pub enable_mx_check: bool,
    /// Classify unverifiable emails (invalid syntax or no MX) as bots
    pub treat_unverifiable_as_bot: bool,
    /// MX lookup timeout in milliseconds
    pub mx_timeout_ms: u64,
    /// Maximum number of DNS lookup attempts per query
    pub dns_attempts: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            bot_threshold: 1.0,
            disposable_domain_weight: 2.0,
            obvious_bot_localpart_weight: 1.5,
            high_randomness_weight: 1.0,
            role_account_weight: 0.3,
            missing_names_weight: 0.2,
            human_names_weight: -0.1,
            min_length_for_randomness: 10,
            high_digit_ratio: 0.4,
            high_special_ratio: 0.3,
            low_vowel_ratio: 0.2,
            min_consonant_run: 5,
            enable_syntax_check: true,
            enable_mx_check: true,
            treat_unverifiable_as_bot: true,
            mx_timeout_ms: 5_000,
            dns_attempts: 2,
        }
    }
}

impl DetectionConfig {
    /// Check the configuration for values the scoring rules cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.bot_threshold.is_finite() {
            return Err(DetectionError::InvalidConfig(
                "bot_threshold must be finite".to_string(),
            ));
        }
        for (name, ratio) in [
            ("high_digit_ratio", self.high_digit_ratio),
            ("high_special_ratio", self.high_special_ratio),
            ("low_vowel_ratio", self.low_vowel_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(DetectionError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, ratio
                )));
            }
        }
        if self.mx_timeout_ms == 0 {
            return Err(DetectionError::InvalidConfig(
                "mx_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.dns_attempts == 0 {
            return Err(DetectionError::InvalidConfig(
                "dns_attempts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Verification status of a single email address.
///
/// `Unknown` denotes absence of an email value, not a verification failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    Valid,
    InvalidSyntax,
    NoMx,
    Unknown,
}

impl EmailStatus {
    /// The fixed wire label for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Valid => "valid",
            EmailStatus::InvalidSyntax => "invalid_syntax",
            EmailStatus::NoMx => "no_mx",
            EmailStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bot label attached to a classified record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BotLabel {
    True,
    False,
    Unknown,
}

impl BotLabel {
    /// The fixed wire label for this value.
    pub fn as_str(&self) -> &'static str {
        match self {
            BotLabel::True => "TRUE",
            BotLabel::False => "FALSE",
            BotLabel::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for BotLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single feature extractor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureResult {
    /// Whether the extractor fired
    pub triggered: bool,
    /// The configured weight the extractor contributes when it fires
    pub weight: f64,
    /// The signed amount actually added to the total score
    pub contribution: f64,
}

/// Full scoring verdict for one email, including the per-feature breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotVerdict {
    /// The email as submitted (normalized when scoring ran)
    pub email: String,
    /// Verification status observed before scoring
    pub email_status: EmailStatus,
    /// Whether the email is classified as a bot
    pub is_bot: bool,
    /// Total score; zero when scoring was short-circuited
    pub score: f64,
    /// Threshold the score was compared against (inclusive)
    pub threshold: f64,
    /// Per-extractor outcome, keyed by feature name; empty when the
    /// email never reached the extractors
    pub breakdown: BTreeMap<String, FeatureResult>,
}

/// Errors that can occur during classification.
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("column '{0}' not found in record batch")]
    MissingColumn(String),
    #[error("record batch is empty")]
    EmptyBatch,
    #[error("record batch too large: {rows} rows exceeds limit of {limit}")]
    BatchTooLarge { rows: usize, limit: usize },
    #[error("malformed record batch: {0}")]
    MalformedBatch(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DetectionError>;

// Re-export main types
pub use batch::{BatchOutcome, ColumnMapping, RecordBatch, Summary};
pub use dns::{MxLookup, MxResolver};
pub use pipeline::DetectionPipeline;
pub use syntax::NormalizedEmail;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_matches_tuned_values() {
        let config = DetectionConfig::default();
        assert_eq!(config.bot_threshold, 1.0);
        assert_eq!(config.disposable_domain_weight, 2.0);
        assert_eq!(config.obvious_bot_localpart_weight, 1.5);
        assert_eq!(config.high_randomness_weight, 1.0);
        assert_eq!(config.role_account_weight, 0.3);
        assert_eq!(config.missing_names_weight, 0.2);
        assert_eq!(config.human_names_weight, -0.1);
        assert_eq!(config.min_length_for_randomness, 10);
        assert!(config.enable_syntax_check);
        assert!(config.enable_mx_check);
        assert!(config.treat_unverifiable_as_bot);
        assert_eq!(config.mx_timeout_ms, 5_000);
    }

    #[test]
    fn config_validation_rejects_bad_ratios() {
        let config = DetectionConfig {
            high_digit_ratio: 1.5,
            ..DetectionConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DetectionConfig {
            low_vowel_ratio: -0.1,
            ..DetectionConfig::default()
        };
        assert!(config.validate().is_err());

        assert!(DetectionConfig::default().validate().is_ok());
    }

    #[test]
    fn config_validation_rejects_zero_timeout() {
        let config = DetectionConfig {
            mx_timeout_ms: 0,
            ..DetectionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn status_labels_are_fixed() {
        assert_eq!(EmailStatus::Valid.as_str(), "valid");
        assert_eq!(EmailStatus::InvalidSyntax.as_str(), "invalid_syntax");
        assert_eq!(EmailStatus::NoMx.as_str(), "no_mx");
        assert_eq!(EmailStatus::Unknown.as_str(), "unknown");
    }

    #[test]
    fn bot_labels_are_fixed() {
        assert_eq!(BotLabel::True.as_str(), "TRUE");
        assert_eq!(BotLabel::False.as_str(), "FALSE");
        assert_eq!(BotLabel::Unknown.as_str(), "UNKNOWN");
    }

    #[test]
    fn labels_serialize_to_wire_vocabulary() {
        assert_eq!(
            serde_json::to_string(&EmailStatus::InvalidSyntax).unwrap(),
            "\"invalid_syntax\""
        );
        assert_eq!(
            serde_json::to_string(&BotLabel::Unknown).unwrap(),
            "\"UNKNOWN\""
        );
    }
}
