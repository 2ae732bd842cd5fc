//! Faster (but not DoS-resistant) hashmaps
use hash_hasher::HashBuildHasher;
use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hash, Hasher};

/// Act like a streaming farmhash
///
/// Farmhash isn't a streaming hash, so every write is folded into the running value by using it
/// as the seed for the next chunk. `str` hashes as its bytes followed by a marker byte, so only
/// hashing the last write would send every string to the same bucket.
pub struct FarmHashLie(u64);

impl Default for FarmHashLie {
    #[inline]
    fn default() -> FarmHashLie {
        FarmHashLie(0)
    }
}

impl Hasher for FarmHashLie {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.0 = farmhash::hash64_with_seed(bytes, self.0);
    }
}

pub type Farm = BuildHasherDefault<FarmHashLie>;
pub type FarmMap<X, Y> = HashMap<X, Y, Farm>;

pub fn new_farm<X: Hash + Eq, Y>() -> FarmMap<X, Y> {
    Default::default()
}

/// For keys that are already well spread integers, like packed cell coordinates
pub type PlainMap<X, Y> = HashMap<X, Y, HashBuildHasher>;

pub fn new_plain<X: Hash + Eq, Y>() -> PlainMap<X, Y> {
    Default::default()
}

/// Pack a (row, column) pair of interned ids into one key
#[inline]
pub fn cell(row: u32, col: u32) -> u64 {
    (u64::from(row) << 32) | u64::from(col)
}

/// Inverse of `cell`
#[inline]
pub fn uncell(key: u64) -> (u32, u32) {
    ((key >> 32) as u32, key as u32)
}
