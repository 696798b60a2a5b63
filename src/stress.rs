//! Synthetic-batch stress driver for the compaction engine.
//!
//! Builds deterministic batches of mixed CCRDT and plain updates and
//! measures the engine's throughput and reduction ratio. Uses a small
//! LCG so runs are reproducible without pulling a full RNG into the
//! stress binary.

use ccs_compaction::compact;
use ccs_core::{
    Average, Bucket, Counter, DcId, Key, LogRecord, Op, Partition, TopK, Txn, TxnId, TypeRegistry,
    TypeTag,
};
use std::time::Instant;

/// Parameters for one stress run.
#[derive(Clone, Copy, Debug)]
pub struct StressParams {
    pub batches: usize,
    pub txns_per_batch: usize,
    pub keys: usize,
    pub updates_per_txn: usize,
}

/// Aggregate results of a stress run.
pub struct StressReport {
    pub batches: usize,
    pub input_txns: usize,
    pub input_updates: usize,
    pub output_updates: usize,
    pub elapsed_ms: f64,
}

impl StressReport {
    pub fn print(&self) {
        let reduction = if self.input_updates > 0 {
            100.0 * (1.0 - self.output_updates as f64 / self.input_updates as f64)
        } else {
            0.0
        };
        let txns_per_sec = if self.elapsed_ms > 0.0 {
            self.input_txns as f64 / (self.elapsed_ms / 1000.0)
        } else {
            f64::INFINITY
        };

        println!("  batches:          {}", self.batches);
        println!("  input txns:       {}", self.input_txns);
        println!("  input updates:    {}", self.input_updates);
        println!("  output updates:   {}", self.output_updates);
        println!("  reduction:        {:.1}%", reduction);
        println!("  elapsed:          {:.2} ms", self.elapsed_ms);
        println!("  throughput:       {:.0} txns/s", txns_per_sec);
    }
}

/// Simple LCG for reproducible op generation.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(1103515245).wrapping_add(12345);
        (self.0 >> 16) & 0x7fff
    }
}

fn synthetic_op(rng: &mut Lcg, key_idx: u64) -> (TypeTag, Op) {
    match rng.next() % 4 {
        0 => (TypeTag::new("counter"), Counter::inc((rng.next() % 10) as i64)),
        1 => (TypeTag::new("counter"), Counter::dec((rng.next() % 10) as i64)),
        2 => (
            TypeTag::new("average"),
            Average::add((rng.next() % 100) as i64, 1),
        ),
        _ => (
            TypeTag::new("topk"),
            TopK::add(format!("element-{}", key_idx), (rng.next() % 50) as i64),
        ),
    }
}

fn synthetic_batch(params: &StressParams, rng: &mut Lcg) -> Vec<Txn> {
    (0..params.txns_per_batch)
        .map(|i| {
            let tx = TxnId(i as u64 + 1);
            let mut log_records: Vec<LogRecord> = (0..params.updates_per_txn)
                .map(|j| {
                    let key_idx = rng.next() % params.keys as u64;
                    let (tag, op) = synthetic_op(rng, key_idx);
                    LogRecord::update(
                        j as u64 + 1,
                        tx,
                        Key::new(format!("key-{}", key_idx)),
                        Bucket::new("stress"),
                        tag,
                        op,
                    )
                })
                .collect();
            log_records.push(LogRecord::commit(
                params.updates_per_txn as u64 + 1,
                tx,
                i as u64,
                1,
            ));
            Txn {
                dcid: DcId::new("dc-stress"),
                partition: Partition(1),
                prev_log_opid: i as u64,
                snapshot: 1,
                timestamp: i as u64,
                log_records,
            }
        })
        .collect()
}

/// Run compaction over `batches` synthetic batches and report.
pub fn stress_compaction(params: StressParams) -> StressReport {
    let registry = TypeRegistry::with_builtins();
    let mut rng = Lcg(42);

    let inputs: Vec<Vec<Txn>> = (0..params.batches)
        .map(|_| synthetic_batch(&params, &mut rng))
        .collect();
    let input_txns: usize = inputs.iter().map(Vec::len).sum();
    let input_updates: usize = inputs
        .iter()
        .flatten()
        .map(|t| t.updates().count())
        .sum();

    let start = Instant::now();
    let mut output_updates = 0usize;
    for batch in inputs {
        let out = compact(&registry, batch);
        output_updates += out.iter().map(|t| t.updates().count()).sum::<usize>();
    }
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    StressReport {
        batches: params.batches,
        input_txns,
        input_updates,
        output_updates,
        elapsed_ms,
    }
}
