use clap::Parser;
use merkletree::config::{Config, Mode};
use serde::Serialize;

#[derive(Parser, Debug, Serialize, Clone)]
pub struct BenchmarkCli {
    /// Number of data blocks per tree
    #[arg(long, default_value_t = 1 << 16)]
    pub leaf_count: usize,

    /// Size in bytes of each generated data block
    #[arg(long, default_value_t = 32)]
    pub leaf_size: usize,

    /// Number of trees to build
    #[arg(long, default_value_t = 3)]
    pub rounds: usize,

    /// Valid choices are "proof-gen", "tree-build" and "proof-gen-and-tree-build".
    #[arg(short, long, default_value = "proof-gen-and-tree-build")]
    pub mode: String,

    /// Block generator. Valid choices are "sequential" and "random".
    #[arg(long, default_value = "sequential")]
    pub generator: String,

    /// Hash on a worker pool, one worker per CPU unless --threads is set
    #[arg(long)]
    pub parallel: bool,

    /// Number of hashing workers; a non-zero value implies --parallel
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Pad odd levels with random nodes instead of duplicating the last node
    #[arg(long)]
    pub no_duplicates: bool,

    #[arg(long)]
    pub sort_leaves: bool,

    #[arg(long)]
    pub sort_pairs: bool,

    /// Recompute every level after building (tree modes only)
    #[arg(long)]
    pub check: bool,

    /// Output filename for metrics
    #[arg(long, default_value = "")]
    pub output: String,
}

impl BenchmarkCli {
    pub fn tree_config(&self) -> anyhow::Result<Config> {
        let mode: Mode = self.mode.parse()?;
        Ok(Config {
            mode,
            run_in_parallel: self.parallel,
            num_threads: self.threads,
            no_duplicates: self.no_duplicates,
            sort_leaves: self.sort_leaves,
            sort_pairs: self.sort_pairs,
            ..Config::default()
        })
    }
}
