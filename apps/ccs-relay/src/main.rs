//! # CCS Relay
//!
//! A standalone CLI walking through the inter-DC relay pipeline: buffer
//! committed transactions per partition, flush on a timer, collapse the
//! batch with CCRDT compaction, and fan the result out to peer
//! datacenters over the in-memory transport.
//!
//! ## Pipeline
//!
//! ```text
//! commit → buffer(partition, txn) → [timer] → compact(batch) → broadcast(dc*)
//! ```

use clap::{Parser, Subcommand};
use colored::*;
use std::sync::Arc;
use std::time::Duration;

use ccs_buffer::{BufferConfigBuilder, BufferVnode, StaticRing};
use ccs_core::{
    Average, Bucket, Counter, DcId, Key, LogOpKind, LogRecord, NodeId, Partition, TopKWithDeletes,
    Txn, TxnId, TypeRegistry, TypeTag,
};
use ccs_publish::{decode, MemoryPubTransport, Publisher, PublishConfigBuilder, StaticMetadata};

// ─── CLI ───────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "ccs-relay")]
#[command(about = "Inter-DC transaction relay demo (CCS crate family)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// End-to-end demo: buffer, flush, compact, broadcast to two DCs
    Demo,
    /// Feed a synthetic batch straight through the compaction engine
    Compact,
    /// Two-tier broadcast: full payload to R-1 random DCs, short to the rest
    Tuple,
}

// ─── Transaction fixtures ──────────────────────────────────────────────────

fn update(op_number: u64, tx: u64, key: &str, tag: &str, op: ccs_core::Op) -> LogRecord {
    LogRecord::update(
        op_number,
        TxnId(tx),
        Key::new(key),
        Bucket::new("bucket"),
        TypeTag::new(tag),
        op,
    )
}

fn txn(tx: u64, prev: u64, updates: Vec<LogRecord>) -> Txn {
    let mut log_records = updates;
    let next = log_records.len() as u64 + 1;
    log_records.push(LogRecord::commit(next, TxnId(tx), 100 + tx, 10));
    Txn {
        dcid: DcId::new("dc-local"),
        partition: Partition(1),
        prev_log_opid: prev,
        snapshot: 10,
        timestamp: 100 + tx,
        log_records,
    }
}

fn describe_record(record: &LogRecord) -> String {
    match &record.operation.kind {
        LogOpKind::Update { key, type_tag, op, .. } => {
            format!("update {}:{} {:?}", type_tag, key.0, op)
        }
        LogOpKind::Prepare { prepare_time } => format!("prepare @{}", prepare_time),
        LogOpKind::Commit { commit_time, .. } => format!("commit @{}", commit_time),
        LogOpKind::Abort => "abort".to_string(),
    }
}

fn print_txn(label: &str, txn: &Txn) {
    println!(
        "  {} {} {}",
        "•".bright_green(),
        label.bold(),
        format!(
            "(tx={} prev={} ts={})",
            txn.tx_id().map(|t| t.0).unwrap_or_default(),
            txn.prev_log_opid,
            txn.timestamp
        )
        .dimmed()
    );
    for record in &txn.log_records {
        println!("      {}", describe_record(record).dimmed());
    }
}

// ─── Pretty printing ───────────────────────────────────────────────────────

fn header(text: &str) {
    let bar = "═".repeat(60);
    println!("\n{}", bar.bright_cyan());
    println!("  {}", text.bold().bright_white());
    println!("{}", bar.bright_cyan());
}

fn section(text: &str) {
    println!("\n{} {}", "▸".bright_yellow(), text.bold());
}

// ─── Subcommands ───────────────────────────────────────────────────────────

async fn run_demo() {
    header("CCS RELAY — END-TO-END PIPELINE");

    let partition = Partition(1);
    let ring = Arc::new(StaticRing::new(NodeId::new("node-1")));
    ring.claim(partition);

    let transport = MemoryPubTransport::new();
    let metadata = Arc::new(StaticMetadata::new([DcId::new("dc-east"), DcId::new("dc-west")]));
    let publisher = Publisher::spawn(
        PublishConfigBuilder::new().pubsub_port(0).build(),
        Box::new(transport.clone()),
        metadata,
    );

    let registry = Arc::new(TypeRegistry::with_builtins());
    let vnode = BufferVnode::spawn(
        partition,
        BufferConfigBuilder::new()
            .txn_timer(Duration::from_millis(100))
            .build(),
        ring,
        registry,
        publisher.clone(),
    );

    section("Buffering three transactions on partition 1");
    let batch = vec![
        txn(1, 0, vec![update(1, 1, "page-views", "counter", Counter::inc(4))]),
        txn(2, 1, vec![update(1, 2, "page-views", "counter", Counter::inc(3))]),
        txn(
            3,
            2,
            vec![
                update(1, 3, "latency", "average", Average::add(110, 3)),
                update(2, 3, "page-views", "counter", Counter::dec(7)),
            ],
        ),
    ];
    for t in &batch {
        print_txn("buffer", t);
    }
    for t in batch {
        vnode.buffer(t).await;
    }

    section("Waiting for the flush timer");
    tokio::time::sleep(Duration::from_millis(400)).await;

    section("Broadcast frames on the wire");
    let frames = transport.frames();
    for frame in &frames {
        let (published, dcid) = decode(frame).expect("frame decodes");
        print_txn(&format!("→ {}", dcid), &published);
    }
    println!(
        "\n  {} the page-views counter ops (4 + 3 - 7) cancelled entirely;",
        "note:".bold().bright_yellow()
    );
    println!("        only the latency average survived compaction.");

    publisher.shutdown().await;
}

fn run_compact() {
    header("CCS RELAY — COMPACTION ENGINE");

    let registry = TypeRegistry::with_builtins();
    let input = vec![
        txn(
            1,
            0,
            vec![
                update(1, 1, "top", "topk_with_deletes", TopKWithDeletes::add("foo", 5)),
                update(2, 1, "avg", "average", Average::add(100, 2)),
            ],
        ),
        txn(
            2,
            1,
            vec![
                update(1, 2, "top", "topk_with_deletes", TopKWithDeletes::del(["foo"])),
                update(2, 2, "avg", "average", Average::add(10, 1)),
            ],
        ),
    ];

    section("Input batch");
    for t in &input {
        print_txn("txn", t);
    }

    let output = ccs_compaction::compact(&registry, input);

    section("Compacted batch");
    for t in &output {
        print_txn("txn", t);
    }
}

async fn run_tuple() {
    header("CCS RELAY — TWO-TIER BROADCAST");

    let transport = MemoryPubTransport::new();
    let metadata = Arc::new(StaticMetadata::new([
        DcId::new("dc1"),
        DcId::new("dc2"),
        DcId::new("dc3"),
        DcId::new("dc4"),
    ]));
    let publisher = Publisher::spawn(
        PublishConfigBuilder::new().replication_factor(3).build(),
        Box::new(transport.clone()),
        metadata,
    );

    let short = txn(1, 0, vec![]);
    let full = txn(
        2,
        0,
        vec![update(1, 2, "k", "counter", Counter::inc(9))],
    );

    section("broadcast_tuple(short, full) with R = 3 over 4 DCs");
    publisher.broadcast_tuple(short, full).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    for frame in transport.frames() {
        let (published, dcid) = decode(&frame).expect("frame decodes");
        let tier = if published.tx_id() == Some(TxnId(2)) {
            "full ".bright_green()
        } else {
            "short".bright_magenta()
        };
        println!("  {} {} → {}", "•".bright_green(), tier, dcid);
    }
    println!(
        "\n  {} R-1 = 2 random DCs received the full payload.",
        "note:".bold().bright_yellow()
    );

    publisher.shutdown().await;
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Demo => run_demo().await,
        Commands::Compact => run_compact(),
        Commands::Tuple => run_tuple().await,
    }
}
