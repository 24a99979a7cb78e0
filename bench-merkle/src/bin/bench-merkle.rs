// Main file for the merkle tree benchmark.
// Each round generates a fresh set of data blocks, then
// - builds the tree in the configured mode
// - obtains one proof per leaf (recorded while building, or on demand)
// - verifies every proof against the root
// - optionally recomputes every level of the materialized tree
use anyhow::Context;
use bench_merkle::common::{cli, generators, utils};
use chrono::Utc;
use clap::Parser;
use log::{info, warn};
use merkletree::{check, MerkleTree, Proof};
use serde_json::json;
use std::{path::Path, time::Instant};

#[cfg(target_os = "linux")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn run_round(
    args: &cli::BenchmarkCli,
    generator: &mut dyn generators::Generator,
    round: usize,
) -> anyhow::Result<()> {
    let config = args.tree_config()?;
    let blocks = generator.generate(args.leaf_count);

    let start = Instant::now();
    let tree = MerkleTree::new(config, &blocks)?;
    let build_duration = start.elapsed();
    metrics::histogram!("bench-merkle.build.duration_s").record(build_duration.as_secs_f64());

    let start = Instant::now();
    let proofs: Vec<Proof> = if tree.mode().generates_proofs() {
        tree.proofs().to_vec()
    } else {
        tree.leaves()
            .iter()
            .map(|leaf| tree.generate_proof(leaf))
            .collect::<Result<_, _>>()?
    };
    if !tree.mode().generates_proofs() {
        metrics::histogram!("bench-merkle.generate_proofs.duration_s")
            .record(start.elapsed().as_secs_f64());
    }

    let start = Instant::now();
    let mut failures = 0u64;
    for (leaf, proof) in tree.leaves().iter().zip(&proofs) {
        if !tree.verify(leaf, proof)? {
            failures += 1;
        }
    }
    let verify_duration = start.elapsed();
    metrics::histogram!("bench-merkle.verify.duration_s").record(verify_duration.as_secs_f64());
    metrics::counter!("bench-merkle.verify.proofs").increment(proofs.len() as u64);
    metrics::counter!("bench-merkle.verify.failures").increment(failures);

    if args.check {
        if tree.mode().builds_tree() {
            check::check_levels(&tree)?;
        } else {
            warn!("--check ignored: levels are not kept in {} mode", tree.mode());
        }
    }

    info!(
        "Round {}: root {} depth {} built in {:.1?}, {} proofs verified in {:.1?}, {} failures",
        round,
        tree.root_hex(),
        tree.depth(),
        build_duration,
        proofs.len(),
        verify_duration,
        failures
    );
    if failures > 0 {
        anyhow::bail!("{} proofs failed to verify in round {}", failures, round);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    utils::init_logging("info");
    let run_start_ts = Utc::now();
    let metrics_recorder = utils::MetricsRecorder::new()?;
    let args = cli::BenchmarkCli::parse();
    let mut generator = generators::from_name(&args.generator, args.leaf_size)?;

    info!(
        "Starting benchmark: {} rounds of {} blocks ({} bytes each), mode {}",
        args.rounds, args.leaf_count, args.leaf_size, args.mode
    );
    let start = Instant::now();
    for round in 0..args.rounds {
        run_round(&args, &mut *generator, round)?;
    }
    let duration = start.elapsed();
    info!("Time elapsed in all rounds is: {:.1?}", duration);
    metrics::gauge!("bench-merkle.total.duration_s").set(duration.as_secs_f64());

    let metrics_filename = if !args.output.is_empty() {
        args.output.clone()
    } else {
        format!("metrics/bench-merkle_{}.json", generator.get_name())
    };
    let run_end_ts = Utc::now();
    let duration_secs = (run_end_ts - run_start_ts).num_milliseconds() as f64 / 1000.0;

    let output_json = json!({
        "cli": args.clone(),
        "command": std::env::args().collect::<Vec<_>>().join(" "),
        "timestamps": {
            "start": run_start_ts.to_rfc3339(),
            "end": run_end_ts.to_rfc3339(),
            "duration_seconds": duration_secs
        },
        "leaf_count": args.leaf_count,
        "rounds": args.rounds,
        "metrics": metrics_recorder.snapshot_metrics()
    });

    info!("Dumping metrics to {}", metrics_filename);
    if let Some(parent) = Path::new(&metrics_filename).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(
        &metrics_filename,
        serde_json::to_string_pretty(&output_json)?,
    )?;
    Ok(())
}
