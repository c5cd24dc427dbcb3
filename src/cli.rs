use std::time::Duration;

use clap::{Parser, Subcommand};
use xaresolve::ConnectivityConfig;

#[derive(Parser)]
#[command(
    name = "xaresolve",
    about = "Resolve transaction-participant identifiers"
)]
pub struct Cli {
    /// Connect timeout for remote participants, in milliseconds
    #[arg(
        long,
        global = true,
        default_value_t = 5000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub connect_timeout_ms: u64,

    /// Read/write timeout for remote participants, in milliseconds
    #[arg(
        long,
        global = true,
        default_value_t = 30000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub io_timeout_ms: u64,

    /// Send calls for a service to a fixed address (service=host:port)
    #[arg(
        long = "endpoint",
        global = true,
        value_name = "SERVICE=HOST:PORT",
        value_parser = ConnectivityConfig::parse_endpoint_override
    )]
    pub endpoints: Vec<(String, String)>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn connectivity(&self) -> ConnectivityConfig {
        ConnectivityConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            io_timeout: Duration::from_millis(self.io_timeout_ms),
            endpoints: self.endpoints.iter().cloned().collect(),
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Test an identifier against the remote-address pattern
    Classify {
        /// Identifier to classify
        identifier: String,
    },

    /// Resolve identifiers to descriptors
    Resolve {
        /// Identifiers to resolve
        #[arg(required = true)]
        identifiers: Vec<String>,
    },

    /// List the in-doubt branches each participant reports
    Scan {
        /// Identifiers to scan
        #[arg(required = true)]
        identifiers: Vec<String>,
    },
}
