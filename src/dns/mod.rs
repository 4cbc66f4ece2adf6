//! DNS record probe.
//!
//! This module provides async DNS operations using `hickory-resolver`:
//! - Record resolution across A, AAAA, MX, TXT, CNAME and NS
//! - Nameserver lookup for the realtime snapshot
//!
//! Every record type is queried independently and under its own deadline; a
//! missing or failing type is omitted from the result, never fatal.

mod records;

// Re-export public API
pub use records::{lookup_nameservers, resolve_dns_records};
