//! Disposable domain detection
//!
//! Exact, case-insensitive set membership over a list of domains known to
//! provide throwaway inboxes. Membership is deliberately exact-match only;
//! no suffix or substring matching is performed against the set.

use crate::Result;
use anyhow::anyhow;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Domains bundled with the engine. Callers can replace the set with
/// `DisposableDomains::from_list_txt` for larger curated lists.
const DEFAULT_DISPOSABLE_DOMAINS: &[&str] = &[
    "mailinator.com",
    "10minutemail.com",
    "guerrillamail.com",
    "yopmail.com",
    "tempmail.org",
    "temp-mail.org",
    "throwaway.email",
    "fakeinbox.com",
    "sharklasers.com",
    "grr.la",
    "guerrillamailblock.com",
    "pokemail.net",
    "spam4.me",
    "bccto.me",
    "chacuo.net",
    "dispostable.com",
    "mailnesia.com",
    "mailmetrash.com",
    "trashmail.net",
    "maildrop.cc",
    "getairmail.com",
    "mailinator.net",
    "mailinator.org",
    "mailinator.biz",
    "mailinator.info",
    "mailinator.co",
    "mailinator.io",
    "mailinator.me",
    "mailinator.tv",
    "mailinator.us",
    "mailinator.ws",
    "mailinator.mobi",
    "mailinator.name",
];

/// Exact-match disposable domain set.
pub struct DisposableDomains {
    domains: HashSet<String>,
}

impl DisposableDomains {
    /// Create a set from an iterator of domains.
    pub fn new<I>(domains: I) -> Result<Self>
    where
        I: Iterator<Item = String>,
    {
        let domains: HashSet<String> = domains.map(|d| d.to_lowercase()).collect();

        if domains.is_empty() {
            return Err(anyhow!("no domains provided for disposable detection").into());
        }

        debug!("Disposable domain set built with {} entries", domains.len());

        Ok(Self { domains })
    }

    /// Load disposable domains from newline-delimited list content.
    ///
    /// Empty lines and `#` comments are skipped; entries that fail basic
    /// domain-shape validation are dropped with a warning.
    pub fn from_list_txt(list_content: &str) -> Result<Self> {
        let domains = parse_disposable_list(list_content)?;
        Self::new(domains.into_iter())
    }

    /// Check whether a domain is in the disposable set.
    ///
    /// Comparison is case-insensitive and exact: subdomains of listed
    /// domains do not match.
    pub fn contains(&self, domain: &str) -> bool {
        let normalized = domain.to_lowercase();
        let result = self.domains.contains(&normalized);

        if result {
            debug!("Domain '{}' is in the disposable set", domain);
        }

        result
    }

    /// Number of domains in the set.
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Whether the set is empty. Construction rejects empty sets, so this
    /// exists for API completeness.
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

impl Default for DisposableDomains {
    fn default() -> Self {
        Self {
            domains: DEFAULT_DISPOSABLE_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

/// Parse a newline-delimited disposable domain list.
fn parse_disposable_list(content: &str) -> Result<HashSet<String>> {
    let mut domains = HashSet::new();
    let mut line_count = 0;
    let mut invalid_count = 0;

    for line in content.lines() {
        line_count += 1;
        let domain = line.trim();

        // Skip empty lines and comments
        if domain.is_empty() || domain.starts_with('#') {
            continue;
        }

        if is_valid_domain_format(domain) {
            domains.insert(domain.to_lowercase());
        } else {
            invalid_count += 1;
            if invalid_count <= 10 {
                warn!("Invalid domain format at line {}: '{}'", line_count, domain);
            }
        }
    }

    if invalid_count > 10 {
        warn!("... and {} more invalid domain entries", invalid_count - 10);
    }

    info!(
        "Parsed {} valid domains from {} lines ({} invalid entries)",
        domains.len(),
        line_count,
        invalid_count
    );

    if domains.is_empty() {
        return Err(anyhow!("no valid domains found in list").into());
    }

    Ok(domains)
}

/// Basic domain format validation
fn is_valid_domain_format(domain: &str) -> bool {
    if domain.len() > 253 || domain.is_empty() {
        return false;
    }

    // Must contain at least one dot
    if !domain.contains('.') {
        return false;
    }

    // Cannot start or end with dot or hyphen
    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return false;
    }

    for label in domain.split('.') {
        if label.is_empty() || label.len() > 63 {
            return false;
        }

        if label.starts_with('-') || label.ends_with('-') {
            return false;
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return false;
        }
    }

    true
}
