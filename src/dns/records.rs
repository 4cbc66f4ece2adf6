//! DNS record queries (A, AAAA, MX, TXT, CNAME, NS).

use std::time::Duration;

use futures::future::join_all;
use hickory_resolver::proto::rr::{RData, Record, RecordType};
use hickory_resolver::TokioResolver;
use strum::IntoEnumIterator;

use crate::config::DNS_TIMEOUT_SECS;
use crate::models::{DnsRecord, RecordKind};

fn record_type(kind: RecordKind) -> RecordType {
    match kind {
        RecordKind::A => RecordType::A,
        RecordKind::AAAA => RecordType::AAAA,
        RecordKind::MX => RecordType::MX,
        RecordKind::TXT => RecordType::TXT,
        RecordKind::CNAME => RecordType::CNAME,
        RecordKind::NS => RecordType::NS,
    }
}

/// Converts a resolver record into a `DnsRecord` when it is of the queried kind.
///
/// Answers can carry records of other types (an A query through a CNAME
/// returns the CNAME too); those are skipped so each group only holds its own
/// type.
pub(crate) fn to_dns_record(kind: RecordKind, record: &Record) -> Option<DnsRecord> {
    let value = match (kind, record.data()) {
        (RecordKind::A, RData::A(a)) => a.to_string(),
        (RecordKind::AAAA, RData::AAAA(aaaa)) => aaaa.to_string(),
        (RecordKind::MX, RData::MX(mx)) => {
            format!("{} {}", mx.preference(), trim_root(&mx.exchange().to_utf8()))
        }
        (RecordKind::TXT, RData::TXT(txt)) => txt
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).to_string())
            .collect::<Vec<String>>()
            .join(""),
        (RecordKind::CNAME, RData::CNAME(cname)) => trim_root(&cname.to_utf8()),
        (RecordKind::NS, RData::NS(ns)) => trim_root(&ns.to_utf8()),
        _ => return None,
    };

    Some(DnsRecord {
        record_type: kind,
        name: trim_root(&record.name().to_utf8()),
        value,
        ttl: record.ttl(),
    })
}

fn trim_root(name: &str) -> String {
    name.trim_end_matches('.').to_string()
}

/// True when the resolver error only means "this type has no records".
fn is_no_records(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("no records found") || lower.contains("nxdomain")
}

/// Queries one record type under the DNS deadline.
async fn lookup_kind(
    domain: &str,
    kind: RecordKind,
    resolver: &TokioResolver,
) -> Result<Vec<DnsRecord>, String> {
    let lookup = tokio::time::timeout(
        Duration::from_secs(DNS_TIMEOUT_SECS),
        resolver.lookup(domain, record_type(kind)),
    )
    .await
    .map_err(|_| format!("{kind} lookup timed out after {DNS_TIMEOUT_SECS}s"))?
    .map_err(|e| e.to_string())?;

    Ok(lookup
        .record_iter()
        .filter_map(|record| to_dns_record(kind, record))
        .collect())
}

/// Merges per-type lookup outcomes into one list grouped by record type.
///
/// Failed types are logged and omitted; "no records" is not worth a warning.
pub(crate) fn collect_records(
    domain: &str,
    outcomes: Vec<(RecordKind, Result<Vec<DnsRecord>, String>)>,
) -> Vec<DnsRecord> {
    let mut outcomes = outcomes;
    outcomes.sort_by_key(|(kind, _)| *kind);

    let mut records = Vec::new();
    for (kind, outcome) in outcomes {
        match outcome {
            Ok(found) => records.extend(found),
            Err(e) if is_no_records(&e) => {
                log::debug!("No {kind} records for {domain}");
            }
            Err(e) => {
                log::warn!("{kind} lookup failed for {domain}: {e}");
            }
        }
    }
    records
}

/// Resolves A, AAAA, MX, TXT, CNAME and NS records for a domain.
///
/// The six lookups run concurrently and fail independently: a missing MX does
/// not abort AAAA. Absent types are simply not present in the result.
///
/// # Arguments
///
/// * `domain` - The domain to query
/// * `resolver` - The DNS resolver instance
///
/// # Returns
///
/// Records grouped by type in the order A, AAAA, MX, TXT, CNAME, NS. Never
/// fails; a domain that does not resolve yields an empty list.
pub async fn resolve_dns_records(domain: &str, resolver: &TokioResolver) -> Vec<DnsRecord> {
    let lookups = RecordKind::iter().map(|kind| async move {
        let outcome = lookup_kind(domain, kind, resolver).await;
        (kind, outcome)
    });
    let outcomes = join_all(lookups).await;
    collect_records(domain, outcomes)
}

/// Queries NS (nameserver) records for a domain.
///
/// # Returns
///
/// Nameserver hostnames without the trailing root dot, or an empty vector if
/// there are none or the query fails.
pub async fn lookup_nameservers(domain: &str, resolver: &TokioResolver) -> Vec<String> {
    match lookup_kind(domain, RecordKind::NS, resolver).await {
        Ok(records) => records.into_iter().map(|r| r.value).collect(),
        Err(e) => {
            if is_no_records(&e) {
                log::debug!("No NS records for {domain}");
            } else {
                log::warn!("Failed to lookup NS records for {domain}: {e}");
            }
            Vec::new()
        }
    }
}
