//! CCS Stress Test Runner
//!
//! Command-line interface for running compaction stress tests and
//! scaling analysis for the CCS crate family.

use stress::{stress_compaction, StressParams};
pub mod stress;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "quick" => run_quick(),
            "scaling" => run_scaling(),
            "help" | "--help" | "-h" => print_usage(),
            _ => {
                println!("Unknown test suite: {}", args[1]);
                print_usage();
            }
        }
    } else {
        // Default: run quick tests
        run_quick();
    }
}

fn print_usage() {
    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║            CCS COMPACTION STRESS SUITE                     ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();
    println!("Usage: cargo run [test_suite]");
    println!();
    println!("Available test suites:");
    println!("  quick    - Quick smoke run (default)");
    println!("  scaling  - Scaling analysis over growing batch sizes");
}

fn run_quick() {
    println!("── quick ──────────────────────────────────────────────");
    let report = stress_compaction(StressParams {
        batches: 100,
        txns_per_batch: 50,
        keys: 8,
        updates_per_txn: 4,
    });
    report.print();
}

fn run_scaling() {
    println!("── scaling ────────────────────────────────────────────");
    for txns_per_batch in [10, 50, 100, 500, 1000] {
        let report = stress_compaction(StressParams {
            batches: 20,
            txns_per_batch,
            keys: 16,
            updates_per_txn: 4,
        });
        println!("\nbatch size {}:", txns_per_batch);
        report.print();
    }
}
