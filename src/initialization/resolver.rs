//! DNS resolver initialization.
//!
//! This module provides functions to initialize the DNS resolver with proper
//! timeout configuration.

use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;

/// Resolver options shared by the system and fallback configurations.
fn resolver_opts() -> ResolverOpts {
    let mut opts = ResolverOpts::default();
    // Two attempts must fit inside the per-lookup hard timeout
    opts.timeout = Duration::from_secs(crate::config::DNS_TIMEOUT_SECS) / 2;
    opts.attempts = 2;
    // Monitored names are always fully qualified; never append search domains
    opts.ndots = 0;
    opts
}

/// Initializes the DNS resolver used by the DNS and performance probes.
///
/// Prefers the host's resolver configuration (`/etc/resolv.conf` or the
/// platform equivalent) and falls back to the library default upstreams when
/// the system configuration cannot be read.
///
/// # Returns
///
/// A configured `TokioResolver` wrapped in `Arc` for sharing across tasks.
pub fn init_resolver() -> Arc<TokioResolver> {
    let resolver = match TokioResolver::builder_tokio() {
        Ok(builder) => builder.with_options(resolver_opts()).build(),
        Err(e) => {
            log::warn!("System DNS configuration unavailable ({e}), using default upstreams");
            TokioResolver::builder_with_config(
                ResolverConfig::default(),
                TokioConnectionProvider::default(),
            )
            .with_options(resolver_opts())
            .build()
        }
    };
    Arc::new(resolver)
}
