//! Feature extractors over the local-part, domain, and optional names
//!
//! Every extractor is a pure function of its inputs plus the read-only
//! `DetectionConfig`; nothing here touches shared mutable state, so rows
//! can be scored concurrently without locking.

use crate::disposable::DisposableDomains;
use crate::syntax::NormalizedEmail;
use crate::DetectionConfig;

/// Substrings in a local-part that indicate an automated or placeholder
/// account. Matched case-insensitively anywhere in the local-part, not
/// just at word boundaries. Organizational role words (admin, support,
/// info, ...) are deliberately absent: those are scored by the lighter
/// role-account rule, not as outright bot indicators.
const BOT_LOCALPART_KEYWORDS: &[&str] = &[
    "bot",
    "test",
    "no-reply",
    "noreply",
    "dummy",
    "example",
    "automation",
    "system",
    "nobody",
    "root",
    "daemon",
    "mail",
    "uucp",
    "operator",
    "games",
    "gopher",
    "ftp",
    "anonymous",
    "guest",
    "demo",
    "sample",
    "trial",
    "temp",
    "temporary",
    "fake",
    "spam",
    "junk",
    "trash",
    "invalid",
    "error",
    "null",
    "void",
];

/// Role-account prefixes, matched against the start of the full
/// lower-cased address.
const ROLE_ACCOUNT_PREFIXES: &[&str] = &[
    "admin@",
    "support@",
    "info@",
    "contact@",
    "help@",
    "service@",
    "sales@",
    "marketing@",
    "hr@",
    "finance@",
    "legal@",
    "pr@",
    "media@",
    "press@",
    "news@",
    "blog@",
    "webmaster@",
    "postmaster@",
    "hostmaster@",
    "abuse@",
    "security@",
    "noreply@",
    "no-reply@",
    "donotreply@",
];

/// Number of bot-indicator keywords (for stats reporting).
pub fn bot_keyword_count() -> usize {
    BOT_LOCALPART_KEYWORDS.len()
}

/// Number of role-account prefixes (for stats reporting).
pub fn role_prefix_count() -> usize {
    ROLE_ACCOUNT_PREFIXES.len()
}

/// Whether the email's domain is an exact member of the disposable set.
pub fn is_disposable_domain(email: &NormalizedEmail, domains: &DisposableDomains) -> bool {
    domains.contains(&email.domain)
}

/// Whether the local-part contains an obvious bot indicator substring.
pub fn has_bot_keyword(local_part: &str) -> bool {
    let local_lower = local_part.to_lowercase();
    BOT_LOCALPART_KEYWORDS
        .iter()
        .any(|keyword| local_lower.contains(keyword))
}

/// Whether the local-part shows high lexical randomness.
///
/// Applies only when the local-part meets the configured minimum length;
/// below that, the answer is always `false` regardless of composition.
/// Above it, any one of four signals triggers: a high digit ratio, a high
/// punctuation ratio, a low vowel ratio, or a long run of consecutive
/// non-vowel letters.
pub fn is_high_randomness(local_part: &str, config: &DetectionConfig) -> bool {
    let len = local_part.chars().count();
    if len < config.min_length_for_randomness {
        return false;
    }

    let mut digit_count = 0usize;
    let mut special_count = 0usize;
    let mut vowel_count = 0usize;
    let mut consonant_run = 0usize;
    let mut max_consonant_run = 0usize;

    for c in local_part.chars() {
        if c.is_ascii_digit() {
            digit_count += 1;
        }
        if c.is_ascii_punctuation() {
            special_count += 1;
        }

        let lower = c.to_ascii_lowercase();
        let is_vowel = matches!(lower, 'a' | 'e' | 'i' | 'o' | 'u');
        if is_vowel {
            vowel_count += 1;
        }

        if lower.is_alphabetic() && !is_vowel {
            consonant_run += 1;
            max_consonant_run = max_consonant_run.max(consonant_run);
        } else {
            consonant_run = 0;
        }
    }

    let len = len as f64;
    let digit_ratio = digit_count as f64 / len;
    let special_ratio = special_count as f64 / len;
    let vowel_ratio = vowel_count as f64 / len;

    digit_ratio > config.high_digit_ratio
        || special_ratio > config.high_special_ratio
        || vowel_ratio < config.low_vowel_ratio
        || max_consonant_run >= config.min_consonant_run
}

/// Whether the full lower-cased address starts with a role-account prefix.
pub fn is_role_account(email: &NormalizedEmail) -> bool {
    let email_lower = email.lowercase();
    ROLE_ACCOUNT_PREFIXES
        .iter()
        .any(|prefix| email_lower.starts_with(prefix))
}

/// Signed name-plausibility adjustment.
///
/// When both names are absent, contributes the missing-names weight only
/// if the local-part also shows high randomness; absence alone is never
/// penalized. When at least one name is present and every present name
/// looks human, contributes the (negative) human-names weight. Otherwise
/// contributes zero.
pub fn name_adjustment(
    first_name: Option<&str>,
    last_name: Option<&str>,
    local_part: &str,
    config: &DetectionConfig,
) -> f64 {
    let first = first_name.map(str::trim).filter(|s| !s.is_empty());
    let last = last_name.map(str::trim).filter(|s| !s.is_empty());

    if first.is_none() && last.is_none() {
        if is_high_randomness(local_part, config) {
            return config.missing_names_weight;
        }
        return 0.0;
    }

    if looks_like_human_names(first, last) {
        return config.human_names_weight;
    }

    0.0
}

/// Whether every present name has a human-like shape: 2 to 20 characters,
/// letters only once hyphens, apostrophes, and spaces are removed.
pub fn looks_like_human_names(first_name: Option<&str>, last_name: Option<&str>) -> bool {
    fn is_human_name(name: &str) -> bool {
        if name.chars().count() < 2 || name.chars().count() > 20 {
            return false;
        }

        let stripped: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '\'' && *c != ' ')
            .collect();

        !stripped.is_empty() && stripped.chars().all(|c| c.is_alphabetic())
    }

    let first_human = first_name.map_or(true, is_human_name);
    let last_human = last_name.map_or(true, is_human_name);

    first_human && last_human
}
