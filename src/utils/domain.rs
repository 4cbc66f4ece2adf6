//! Domain name normalization.
//!
//! Users add domains in many shapes ("Example.com", "https://www.example.com/path",
//! "example.com."). Probes and the per-owner uniqueness check need one canonical
//! hostname.

use anyhow::{Context, Result};

/// Reduces user input to a lowercase hostname without scheme, port, path or
/// trailing dot.
///
/// # Errors
///
/// Returns an error if the input is empty, cannot be parsed as a host, or is
/// an IP address (registrar and certificate checks need a name).
pub fn normalize_domain(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        anyhow::bail!("Domain name is empty");
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = url::Url::parse(&candidate)
        .with_context(|| format!("Failed to parse domain: {trimmed}"))?;

    let host = match parsed.host() {
        Some(url::Host::Domain(host)) => host.to_string(),
        Some(url::Host::Ipv4(_)) | Some(url::Host::Ipv6(_)) => {
            anyhow::bail!("IP addresses cannot be monitored as domains: {trimmed}")
        }
        None => anyhow::bail!("'{trimmed}' has no host component"),
    };

    let host = host.trim_end_matches('.').to_lowercase();
    if host.is_empty() || !host.contains('.') {
        anyhow::bail!("'{trimmed}' is not a fully qualified domain name");
    }

    Ok(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain_domain() {
        assert_eq!(normalize_domain("example.com").unwrap(), "example.com");
    }

    #[test]
    fn test_normalize_lowercases_and_trims() {
        assert_eq!(normalize_domain("  Example.COM ").unwrap(), "example.com");
    }

    #[test]
    fn test_normalize_strips_url_parts() {
        assert_eq!(
            normalize_domain("https://www.example.com:8443/path?q=1").unwrap(),
            "www.example.com"
        );
    }

    #[test]
    fn test_normalize_strips_trailing_dot() {
        assert_eq!(normalize_domain("example.com.").unwrap(), "example.com");
    }

    #[test]
    fn test_normalize_rejects_ip_addresses() {
        assert!(normalize_domain("192.0.2.1").is_err());
        assert!(normalize_domain("https://[2001:db8::1]/").is_err());
    }

    #[test]
    fn test_normalize_rejects_empty_and_single_label() {
        assert!(normalize_domain("").is_err());
        assert!(normalize_domain("   ").is_err());
        assert!(normalize_domain("localhost").is_err());
    }
}
