//! Configuration management for the bot classification API
//!
//! This module handles loading configuration from environment variables
//! and configuration files using the figment crate.

use botsift_core::DetectionConfig;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub detection: DetectionSettings,
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Maximum CSV upload size in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_upload_bytes: 25 * 1024 * 1024, // 25 MB
        }
    }
}

/// Detection engine settings, mapped onto the core config per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSettings {
    /// Bot decision threshold (inclusive)
    pub bot_threshold: f64,
    /// Enable the email syntax check
    pub enable_syntax_check: bool,
    /// Enable the DNS MX record check
    pub enable_mx_check: bool,
    /// Classify unverifiable emails as bots
    pub treat_unverifiable_as_bot: bool,
    /// MX lookup timeout in milliseconds
    pub mx_timeout_ms: u64,
    /// Maximum number of DNS lookup attempts per query
    pub dns_attempts: usize,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        let core = DetectionConfig::default();
        Self {
            bot_threshold: core.bot_threshold,
            enable_syntax_check: core.enable_syntax_check,
            enable_mx_check: core.enable_mx_check,
            treat_unverifiable_as_bot: core.treat_unverifiable_as_bot,
            mx_timeout_ms: core.mx_timeout_ms,
            dns_attempts: core.dns_attempts,
        }
    }
}

impl DetectionSettings {
    /// Build the immutable core configuration for a classification run.
    pub fn to_detection_config(&self) -> DetectionConfig {
        DetectionConfig {
            bot_threshold: self.bot_threshold,
            enable_syntax_check: self.enable_syntax_check,
            enable_mx_check: self.enable_mx_check,
            treat_unverifiable_as_bot: self.treat_unverifiable_as_bot,
            mx_timeout_ms: self.mx_timeout_ms,
            dns_attempts: self.dns_attempts,
            ..DetectionConfig::default()
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Enable JSON structured logging
    pub json_logs: bool,
    /// Log level filter
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            json_logs: false,
            log_level: "info".to_string(),
        }
    }
}
