//! # CLI Interface
//!
//! Defines the command-line argument structure for `hoplock-node` using
//! `clap` derive. Two subcommands: `demo` and `version`.

use clap::{Parser, Subcommand};

/// Hoplock demo node.
///
/// Runs an in-process network of lock-protocol nodes and drives
/// multi-hop conditional payments across it. The TCP transport that a
/// distributed deployment would use is a separate concern; this binary
/// exists to exercise and measure the protocol engine itself.
#[derive(Parser, Debug)]
#[command(
    name = "hoplock-node",
    about = "Hoplock multi-hop lock demo node",
    version,
    propagate_version = true
)]
pub struct HoplockCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the Hoplock node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an in-process network and push payments through it.
    Demo(DemoArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `demo` subcommand.
#[derive(Parser, Debug)]
pub struct DemoArgs {
    /// Number of nodes, initiator included. The payment path is every
    /// node after the first.
    #[arg(long, env = "HOPLOCK_NODES", default_value_t = 5)]
    pub nodes: usize,

    /// Amount the initiator sends; each relay keeps the per-hop fee.
    #[arg(long, env = "HOPLOCK_AMOUNT", default_value_t = 50)]
    pub amount: u64,

    /// How many sequential transactions to run. Iterations are
    /// serialized through the initiator's idle gate.
    #[arg(long, env = "HOPLOCK_ITER", default_value_t = 1)]
    pub iterations: usize,

    /// Emit logs as JSON lines instead of pretty-printed text.
    #[arg(long, env = "HOPLOCK_LOG_JSON", default_value_t = false)]
    pub json_logs: bool,
}
