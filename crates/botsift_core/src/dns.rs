//! DNS MX resolution using hickory-resolver
//!
//! This is the only part of the engine that performs network I/O. The
//! lookup is strictly bounded by the configured timeout, and every
//! resolver failure category (NXDOMAIN, no answer, timeout, transport
//! errors) collapses to the same "no MX" outcome so that no resolver
//! error type leaks past this boundary.

use hickory_resolver::{
    config::{ResolverConfig, ResolverOpts},
    AsyncResolver, TokioAsyncResolver,
};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// Narrow interface over the MX existence check.
///
/// The scoring engine only ever needs `domain -> bool`, so tests can
/// substitute a stub and batch runs never see a resolver error type.
pub trait MxLookup {
    /// Resolve whether `domain` has at least one MX record.
    fn has_mx(&self, domain: &str) -> impl Future<Output = bool> + Send;
}

/// MX resolver with bounded per-lookup latency.
pub struct MxResolver {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl MxResolver {
    /// Create a resolver with the given per-lookup timeout and retry budget.
    ///
    /// # Arguments
    /// * `timeout` - Upper bound for a single MX lookup, including retries
    /// * `attempts` - Maximum number of DNS query attempts
    pub fn new(timeout: Duration, attempts: usize) -> Self {
        let config = ResolverConfig::cloudflare();

        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = attempts;
        opts.negative_min_ttl = Some(Duration::from_secs(30)); // Cache NXDOMAIN for 30s
        opts.positive_max_ttl = Some(Duration::from_secs(3600)); // Max 1 hour cache

        let resolver = AsyncResolver::tokio(config, opts);

        info!(
            "MX resolver initialized - timeout: {}ms, attempts: {}",
            timeout.as_millis(),
            attempts
        );

        Self { resolver, timeout }
    }
}

impl MxLookup for MxResolver {
    fn has_mx(&self, domain: &str) -> impl Future<Output = bool> + Send {
        async move {
            // The resolver enforces its own timeout per attempt; the outer
            // bound guarantees a hung lookup can never stall a batch.
            match tokio::time::timeout(self.timeout, self.resolver.mx_lookup(domain)).await {
                Ok(Ok(response)) => {
                    let mx_count = response.iter().count();
                    debug!("Domain {} has {} MX record(s)", domain, mx_count);
                    mx_count > 0
                }
                Ok(Err(e)) => {
                    debug!("MX lookup failed for {}: {}", domain, e);
                    false
                }
                Err(_) => {
                    debug!(
                        "MX lookup for {} timed out after {}ms",
                        domain,
                        self.timeout.as_millis()
                    );
                    false
                }
            }
        }
    }
}
