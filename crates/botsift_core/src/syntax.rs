//! Email syntax validation and normalization
//!
//! Wraps the `email_address` crate for RFC 5322 shape checking and applies
//! the normalization the feature extractors rely on: surrounding whitespace
//! stripped, domain lower-cased, local-part case preserved.

use email_address::{EmailAddress, Options};
use tracing::debug;

/// A syntactically valid email address, decomposed once after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEmail {
    /// Full normalized address (`local@domain`, domain lower-cased)
    pub address: String,
    /// Portion before the `@`, case preserved
    pub local_part: String,
    /// Portion after the `@`, lower-cased for domain-list membership checks
    pub domain: String,
}

impl NormalizedEmail {
    /// Full lower-cased form, used by anchored prefix checks.
    pub fn lowercase(&self) -> String {
        self.address.to_lowercase()
    }
}

/// Validate and normalize an email address.
///
/// Rejects anything without the shape `local@domain`: missing `@`,
/// empty local-part, empty domain, or a domain without a TLD. Accepts
/// plus-addressing (`john+work@gmail.com`) as ordinary valid syntax.
///
/// Returns `None` on any syntax failure; the failure category is not
/// surfaced because the caller folds it into a single status.
pub fn normalize(email: &str) -> Option<NormalizedEmail> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return None;
    }

    let options = Options::default().with_required_tld();
    let parsed = match EmailAddress::parse_with_options(trimmed, options) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("Email failed syntax validation: {}", e);
            return None;
        }
    };

    let local_part = parsed.local_part().to_string();
    let domain = parsed.domain().to_lowercase();
    let address = format!("{}@{}", local_part, domain);

    Some(NormalizedEmail {
        address,
        local_part,
        domain,
    })
}

/// Best-effort domain extraction for inputs that failed full validation.
///
/// Used only when the syntax check is disabled but the MX check still
/// needs a domain to resolve. Splits at the last `@`.
pub fn raw_domain(email: &str) -> Option<String> {
    let trimmed = email.trim();
    let at = trimmed.rfind('@')?;
    let domain = &trimmed[at + 1..];
    if domain.is_empty() {
        return None;
    }
    Some(domain.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn accepts_ordinary_addresses() {
        let email = normalize("john.doe@gmail.com").unwrap();
        assert_eq!(email.local_part, "john.doe");
        assert_eq!(email.domain, "gmail.com");
        assert_eq!(email.address, "john.doe@gmail.com");
    }

    #[test]
    fn accepts_plus_addressing() {
        let email = normalize("john+work@gmail.com").unwrap();
        assert_eq!(email.local_part, "john+work");
        assert_eq!(email.domain, "gmail.com");
    }

    #[test]
    fn lowercases_domain_but_preserves_local_part() {
        let email = normalize("John.Doe@GMAIL.Com").unwrap();
        assert_eq!(email.local_part, "John.Doe");
        assert_eq!(email.domain, "gmail.com");
        assert_eq!(email.address, "John.Doe@gmail.com");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let email = normalize("  user@example.com  ").unwrap();
        assert_eq!(email.address, "user@example.com");
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize("invalid-email"), None);
        assert_eq!(normalize("@example.com"), None);
        assert_eq!(normalize("user@"), None);
        assert_eq!(normalize("user@@example.com"), None);
    }

    #[test]
    fn rejects_domain_without_tld() {
        assert_eq!(normalize("user@localhost"), None);
    }

    #[test]
    fn full_lowercase_form() {
        let email = normalize("Admin@Example.com").unwrap();
        assert_eq!(email.lowercase(), "admin@example.com");
    }

    #[test]
    fn raw_domain_extraction() {
        assert_eq!(raw_domain("user@example.com"), Some("example.com".into()));
        assert_eq!(raw_domain("a@b@C.com"), Some("c.com".into()));
        assert_eq!(raw_domain("no-at-sign"), None);
        assert_eq!(raw_domain("trailing@"), None);
    }
}
