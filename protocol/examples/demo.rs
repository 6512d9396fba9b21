//! CLI demo of one full multi-hop lock lifecycle.
//!
//! Spins up five in-process nodes, runs a payment from `node_0` across
//! the other four, and narrates the phases with the receipt the driver
//! hands back.
//!
//! Run with:
//!   cargo run --example demo
//!
//! Set `RUST_LOG=hoplock_protocol=debug` to watch every state transition
//! and message underneath the narration.

use std::time::Instant;

use hoplock_protocol::crypto::GroupParams;
use hoplock_protocol::topology::Network;
use hoplock_protocol::wire::NodeAddr;

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

fn section(title: &str) {
    println!();
    println!("{BOLD}{CYAN}── {title} {RESET}");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    println!("{BOLD}HOPLOCK — multi-hop lock demo{RESET}");

    section("Topology");
    let net = Network::new(GroupParams::generate());
    let addrs: Vec<NodeAddr> = (0..5).map(|i| net.add_node(format!("node_{i}"))).collect();
    println!(
        "  five nodes sharing one parameter set: {}",
        addrs
            .iter()
            .map(NodeAddr::as_str)
            .collect::<Vec<_>>()
            .join(" → ")
    );

    section("Payment");
    let amount = 50;
    println!("  node_0 pays {amount} across node_1..node_4");
    let started = Instant::now();
    let receipt = match net.begin(&addrs[0], amount, &addrs[1..]) {
        Ok(receipt) => receipt,
        Err(err) => {
            println!("  {RED}payment failed: {err}{RESET}");
            std::process::exit(1);
        }
    };
    let elapsed = started.elapsed();

    section("Locks");
    for (node, locked) in &receipt.locks {
        println!("  {node} accepted a lock for {BOLD}{locked}{RESET} {DIM}(fee kept by each relay){RESET}");
    }

    section("Release");
    for (node, valid) in &receipt.release_checks {
        let verdict = if *valid {
            format!("{GREEN}VALID KEY: true{RESET}")
        } else {
            format!("{RED}VALID KEY: false{RESET}")
        };
        println!("  {node}: {verdict}");
    }

    section("Result");
    println!(
        "  session {} finished in {:.2?}; all keys valid: {}",
        receipt.session,
        elapsed,
        if receipt.all_keys_valid() {
            format!("{GREEN}yes{RESET}")
        } else {
            format!("{RED}no{RESET}")
        }
    );
}
