//! API handlers.

mod checks;
mod domains;

pub use checks::{bulk_ssl_handler, bulk_uptime_handler, health_handler, job_handler, status_handler};
pub use domains::{check_domain_handler, delete_domain_handler, list_domains_handler, register_domain_handler};
