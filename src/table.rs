use hashbrown::HashMap;
use hashbrown::hash_map::Iter;
use std::hash::{BuildHasher, Hasher};

use crate::record::Value;
use crate::stats::Stats;

// (2^64) / \phi
const MAGIC_CONST: u64 = 0x9E3779B97F4A7C15;

/// Multiplicative hash over 8-byte words of the key.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyHasher {
    hash: u64,
}

impl KeyHasher {
    #[inline(always)]
    fn mix(&mut self, word: u64) {
        self.hash = (self.hash.rotate_left(5) ^ word).wrapping_mul(MAGIC_CONST);
    }
}

impl Hasher for KeyHasher {
    #[inline(always)]
    fn write(&mut self, bytes: &[u8]) {
        let mut rest = bytes;
        while let Some((word, tail)) = rest.split_first_chunk::<8>() {
            self.mix(u64::from_le_bytes(*word));
            rest = tail;
        }

        if !rest.is_empty() {
            let mut word = [0u8; 8];
            word[..rest.len()].copy_from_slice(rest);
            self.mix(u64::from_le_bytes(word));
        }
    }

    #[inline(always)]
    fn write_usize(&mut self, n: usize) {
        self.mix(n as u64);
    }

    #[inline(always)]
    fn finish(&self) -> u64 {
        self.hash ^ (self.hash >> 35)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BuildKeyHasher;

impl BuildHasher for BuildKeyHasher {
    type Hasher = KeyHasher;

    fn build_hasher(&self) -> KeyHasher {
        KeyHasher::default()
    }
}

/// Key to running statistics. Keys are raw bytes and only exist once observed.
#[derive(Clone, Debug, Default)]
pub struct Table {
    stations: HashMap<Box<[u8]>, Stats, BuildKeyHasher>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stations: HashMap::with_capacity_and_hasher(capacity, BuildKeyHasher),
        }
    }

    /// Returns the statistics for `key`, inserting an empty entry on first sight.
    #[inline(always)]
    pub fn get_or_insert(&mut self, key: &[u8]) -> &mut Stats {
        self.stations.entry_ref(key).or_insert_with(Stats::new)
    }

    #[inline(always)]
    pub fn record(&mut self, key: &[u8], value: Value) {
        self.get_or_insert(key).record(value);
    }

    pub fn get(&self, key: &[u8]) -> Option<&Stats> {
        self.stations.get(key)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Total number of records folded into the table.
    pub fn records(&self) -> u64 {
        self.stations.values().map(Stats::count).sum()
    }

    pub fn iter(&self) -> Iter<'_, Box<[u8]>, Stats> {
        self.stations.iter()
    }

    /// Folds a partial table into this one.
    pub fn merge(&mut self, mut other: Table) {
        if self.stations.len() < other.stations.len() {
            std::mem::swap(self, &mut other);
        }

        for (key, stats) in other.stations {
            self.stations
                .entry(key)
                .and_modify(|entry| entry.merge(&stats))
                .or_insert(stats);
        }
    }

    /// Consumes the table, returning entries in ascending byte order of key.
    pub fn into_sorted(self) -> Vec<(Box<[u8]>, Stats)> {
        let mut entries: Vec<_> = self.stations.into_iter().collect();
        entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
        entries
    }
}
