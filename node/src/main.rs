// Copyright (c) 2026 Hoplock Contributors. MIT License.
// See LICENSE for details.

//! # Hoplock Demo Node
//!
//! Entry point for the `hoplock-node` binary. Parses CLI arguments,
//! initializes logging, spins up an in-process network of protocol
//! nodes, and drives multi-hop lock transactions across it.
//!
//! The binary supports two subcommands:
//!
//! - `demo`    — run N nodes and push payments through the chain
//! - `version` — print build version information
//!
//! Transport is in-process by design: the engine's contract is envelope
//! in, envelopes out, and the same driver loop would sit behind a TCP
//! acceptor in a distributed deployment.

mod cli;
mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::time::Instant;

use hoplock_protocol::crypto::GroupParams;
use hoplock_protocol::topology::Network;
use hoplock_protocol::wire::NodeAddr;

use cli::{Commands, DemoArgs, HoplockCli};
use logging::LogFormat;

fn main() -> Result<()> {
    let cli = HoplockCli::parse();

    match cli.command {
        Commands::Demo(args) => run_demo(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Builds the network and runs the requested number of sequential
/// transactions, timing each one.
fn run_demo(args: DemoArgs) -> Result<()> {
    let format = if args.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    logging::init_logging("hoplock_node=info,hoplock_protocol=info", format);

    if args.nodes < 3 {
        bail!("need at least 3 nodes (initiator, one relay, recipient); got {}", args.nodes);
    }

    tracing::info!(
        nodes = args.nodes,
        amount = args.amount,
        iterations = args.iterations,
        "starting hoplock demo network"
    );

    // One shared parameter set; every node gets a clone at construction.
    let net = Network::new(GroupParams::generate());
    let addrs: Vec<NodeAddr> = (0..args.nodes)
        .map(|i| net.add_node(format!("node_{i}")))
        .collect();
    let initiator = addrs[0].clone();
    let path = addrs[1..].to_vec();

    let run_started = Instant::now();
    for n in 0..args.iterations {
        let receipt = net
            .begin_blocking(&initiator, args.amount, &path)
            .with_context(|| format!("transaction {} failed", n + 1))?;

        if !receipt.all_keys_valid() {
            bail!("transaction {} released with an invalid key", n + 1);
        }
        println!("{}: {:.2?}", n + 1, run_started.elapsed());
    }

    let total = run_started.elapsed();
    tracing::info!(
        iterations = args.iterations,
        elapsed = ?total,
        "demo complete, all nodes idle"
    );
    println!(
        "{} transaction(s) over {} hop(s) in {:.2?}",
        args.iterations,
        path.len(),
        total
    );
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("hoplock-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol     {}", hoplock_protocol::config::PROTOCOL_VERSION);
}
