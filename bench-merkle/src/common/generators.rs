// Data block generators for the merkle tree benchmark.
// - sequential: deterministic blocks derived from a running counter
// - random: blocks filled from the OS random source

use log::info;
use merkletree::hasher::sha256;
use rand_core::{OsRng, RngCore};

pub trait Generator {
    fn generate(&mut self, count: usize) -> Vec<Vec<u8>>;
    fn get_name(&self) -> String;
}

/// Expands a counter into `leaf_size` bytes by chaining SHA-256.
fn expand_counter(counter: u64, leaf_size: usize) -> Vec<u8> {
    let mut block = Vec::with_capacity(leaf_size);
    let mut seed = sha256(counter.to_le_bytes());
    while block.len() < leaf_size {
        let take = (leaf_size - block.len()).min(seed.len());
        block.extend_from_slice(&seed[..take]);
        seed = sha256(seed);
    }
    block
}

pub struct SequentialGenerator {
    next: u64,
    leaf_size: usize,
}

impl SequentialGenerator {
    pub fn new(leaf_size: usize) -> Self {
        info!("SequentialGenerator(leaf_size={})", leaf_size);
        Self { next: 0, leaf_size }
    }
}

impl Generator for SequentialGenerator {
    fn generate(&mut self, count: usize) -> Vec<Vec<u8>> {
        let start = self.next;
        self.next += count as u64;
        (start..self.next)
            .map(|n| expand_counter(n, self.leaf_size))
            .collect()
    }

    fn get_name(&self) -> String {
        "sequential".to_string()
    }
}

pub struct RandomGenerator {
    leaf_size: usize,
}

impl RandomGenerator {
    pub fn new(leaf_size: usize) -> Self {
        info!("RandomGenerator(leaf_size={})", leaf_size);
        Self { leaf_size }
    }
}

impl Generator for RandomGenerator {
    fn generate(&mut self, count: usize) -> Vec<Vec<u8>> {
        (0..count)
            .map(|_| {
                let mut block = vec![0u8; self.leaf_size];
                OsRng.fill_bytes(&mut block);
                block
            })
            .collect()
    }

    fn get_name(&self) -> String {
        "random".to_string()
    }
}

pub fn from_name(name: &str, leaf_size: usize) -> anyhow::Result<Box<dyn Generator>> {
    if leaf_size == 0 {
        anyhow::bail!("Invalid leaf size: 0");
    }
    match name {
        "sequential" => Ok(Box::new(SequentialGenerator::new(leaf_size))),
        "random" => Ok(Box::new(RandomGenerator::new(leaf_size))),
        _ => anyhow::bail!("Invalid generator: {}", name),
    }
}
