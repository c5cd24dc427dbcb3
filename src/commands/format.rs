//! Output formatting for CLI commands.
//!
//! One line per identifier on stdout; failures are listed inline so the
//! table stays complete. The process exit code reports whether any
//! identifier failed.

use std::sync::Arc;

use xaresolve::recovery::ScanReport;
use xaresolve::remote::{AddressError, RemoteAddress};
use xaresolve::{DescriptorKind, ResolveError, ResourceDescriptor};

pub fn print_classification(identifier: &str, parsed: Result<RemoteAddress, AddressError>) {
    match parsed {
        Ok(addr) => {
            println!("Identifier: {identifier}");
            println!("Class:      remote");
            println!("Host:       {}", addr.host());
            println!("Service:    {}", addr.service());
            println!("Port:       {}", addr.port());
        }
        Err(e) => {
            println!("Identifier: {identifier}");
            println!("Class:      registered name");
            if let AddressError::PortOutOfRange(_) = e {
                println!("Note:       {e}");
            }
        }
    }
}

pub fn print_resolutions(results: &[(String, Result<Arc<ResourceDescriptor>, ResolveError>)]) {
    println!("{:<40} {:<7} DETAIL", "IDENTIFIER", "KIND");
    println!("{}", "-".repeat(72));
    for (identifier, result) in results {
        match result {
            Ok(d) => println!("{:<40} {:<7} {}", identifier, d.kind(), detail(d)),
            Err(e) => println!("{:<40} {:<7} {}", identifier, "error", e),
        }
    }
}

fn detail(d: &ResourceDescriptor) -> String {
    match d.kind() {
        DescriptorKind::Remote => match d.remote_coordinator() {
            Some(c) => format!("service={} endpoint={}", c.address().service(), c.endpoint()),
            None => String::new(),
        },
        DescriptorKind::Common => {
            let managed = d.managed().map_or("-", |m| m.kind());
            match d.degraded() {
                Some(p) => format!("managed={managed} degraded: {p}"),
                None => format!("managed={managed}"),
            }
        }
        DescriptorKind::Local => "-".to_string(),
    }
}

pub fn print_scan(report: &ScanReport) {
    if report.entries.is_empty() {
        println!("Nothing to scan");
        return;
    }

    println!("Scan:      {}", report.scan_id);
    println!("In doubt:  {}", report.in_doubt());
    println!("Failures:  {}", report.failures());
    println!();
    println!("{:<40} {:<7} BRANCHES", "IDENTIFIER", "KIND");
    println!("{}", "-".repeat(72));
    for entry in &report.entries {
        match &entry.outcome {
            Ok(finding) => {
                println!(
                    "{:<40} {:<7} {}",
                    entry.identifier,
                    finding.kind,
                    finding.in_doubt.len()
                );
                for xid in &finding.in_doubt {
                    println!("    {xid}");
                }
            }
            Err(e) => println!("{:<40} {:<7} {}", entry.identifier, "error", e),
        }
    }
}
