//! # CLI Module
//!
//! The `radixroute` binary loads a YAML route table (see
//! [`RouteTable`](crate::config::RouteTable)) and inspects it.
//!
//! ## Commands
//!
//! ```bash
//! # List registered paths
//! radixroute routes --table routes.yaml
//!
//! # Dump the trie structure as JSON
//! radixroute tree --table routes.yaml
//!
//! # Dispatch one request and print status, body and captured parameters
//! radixroute resolve --table routes.yaml --method POST /user/42
//! ```
//!
//! `--table` may also be given through `RADIXROUTE_TABLE`.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, Cli, Commands};
