//! Direct-mapped and two-way set-associative write-back cache model.
//!
//! Implements §4.1 verbatim, including the two corrections noted in §9
//! Design Notes over the original course source: `drain`/install write back
//! to an address rebuilt from the *victim's own* tag (not a stray expression
//! that ignores the address), and LRU state is an explicit per-way rank
//! array updated by "decrement every way whose rank exceeds the touched
//! way's previous rank, then set the touched way to the maximum rank."

use tracing::debug;

use crate::config::CacheConfig;
use crate::error::ConfigError;
use crate::memory::MainMemory;

/// One cache block's metadata and contents.
#[derive(Debug, Clone)]
struct CacheLine {
    tag: u32,
    valid: bool,
    dirty: bool,
    /// Higher = more recently used. Within a set, the ranks of all ways
    /// always form a permutation of `0..associativity`.
    rank: u32,
    /// The cycle at which this line's contents become observable as a hit;
    /// models in-flight miss latency (§4.1 "Latency modelling").
    ready_at_cycle: u64,
    data: Vec<u8>,
}

impl CacheLine {
    fn new(block_size: u32, initial_rank: u32) -> Self {
        Self {
            tag: 0,
            valid: false,
            dirty: false,
            rank: initial_rank,
            ready_at_cycle: 0,
            data: vec![0; block_size as usize],
        }
    }
}

/// A single cache instance (one of the two independent I-cache/D-cache
/// instances the pipeline controller owns).
#[derive(Debug, Clone)]
pub struct Cache {
    config: CacheConfig,
    block_size: u32,
    associativity: u32,
    num_sets: u32,
    offset_bits: u32,
    index_bits: u32,
    sets: Vec<Vec<CacheLine>>,
    hits: u64,
    misses: u64,
}

impl Cache {
    /// Builds a cache from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `block_size`/`cache_size` are not powers
    /// of two with `cache_size` a multiple of `block_size`, the resulting
    /// number of sets is not a power of two, or `associativity` is not 1
    /// or 2.
    pub fn new(config: CacheConfig) -> Result<Self, ConfigError> {
        let associativity = config.associativity;
        if associativity != 1 && associativity != 2 {
            return Err(ConfigError::BadAssociativity { associativity });
        }

        let block_size = config.block_size;
        let cache_size = config.cache_size;
        let bad_size = || ConfigError::BadSize {
            block_size,
            cache_size,
        };
        if block_size == 0 || !block_size.is_power_of_two() {
            return Err(bad_size());
        }
        if cache_size == 0 || cache_size % block_size != 0 {
            return Err(bad_size());
        }
        let num_blocks = cache_size / block_size;
        if num_blocks % associativity != 0 {
            return Err(bad_size());
        }
        let num_sets = num_blocks / associativity;
        if !num_sets.is_power_of_two() {
            return Err(bad_size());
        }

        let offset_bits = block_size.trailing_zeros();
        let index_bits = num_sets.trailing_zeros();
        let sets = (0..num_sets)
            .map(|_| {
                (0..associativity)
                    .map(|way| CacheLine::new(block_size, way))
                    .collect()
            })
            .collect();

        Ok(Self {
            config,
            block_size,
            associativity,
            num_sets,
            offset_bits,
            index_bits,
            sets,
            hits: 0,
            misses: 0,
        })
    }

    /// Splits an address into (tag, set index, byte offset).
    fn decompose(&self, addr: u32) -> (u32, u32, u32) {
        let offset_mask = (1u32 << self.offset_bits) - 1;
        let index_mask = (1u32 << self.index_bits) - 1;
        let offset = addr & offset_mask;
        let index = (addr >> self.offset_bits) & index_mask;
        let tag = addr >> (self.offset_bits + self.index_bits);
        (tag, index, offset)
    }

    fn block_base(&self, tag: u32, index: u32) -> u32 {
        (tag << (self.offset_bits + self.index_bits)) | (index << self.offset_bits)
    }

    /// Rank-based LRU update (§4.1, §9 design note ii): the touched way
    /// becomes most-recently-used; every way that was more recently used
    /// than it *previously was* shifts down by one rank.
    fn update_lru(&mut self, set_index: u32, way: usize) {
        let prev_rank = self.sets[set_index as usize][way].rank;
        for line in &mut self.sets[set_index as usize] {
            if line.rank > prev_rank {
                line.rank -= 1;
            }
        }
        self.sets[set_index as usize][way].rank = self.associativity - 1;
    }

    /// Classifies and resolves the first byte of an access, installing a
    /// block on a true miss. Returns `(way, extra_cycles, in_flight)`, where
    /// `in_flight` is `true` exactly for the "matched but still being
    /// filled" case (§4.1): the way is already correct, but its contents
    /// and LRU state must not be touched until `ready_at_cycle`.
    fn touch(&mut self, addr: u32, cycle: u64, mem: &mut MainMemory) -> (usize, u32, bool) {
        let (tag, index, _offset) = self.decompose(addr);
        let set = &self.sets[index as usize];
        if let Some(way) = set.iter().position(|line| line.valid && line.tag == tag) {
            if self.sets[index as usize][way].ready_at_cycle > cycle {
                self.misses += 1;
                return (way, self.config.miss_latency, true);
            }
            self.hits += 1;
            self.update_lru(index, way);
            return (way, 0, false);
        }

        self.misses += 1;
        let way = self.install(index, tag, addr, cycle, mem);
        (way, self.config.miss_latency, false)
    }

    /// Miss/install procedure (§4.1 steps 1-4).
    fn install(&mut self, index: u32, tag: u32, addr: u32, cycle: u64, mem: &mut MainMemory) -> usize {
        let set = &self.sets[index as usize];
        let victim = set
            .iter()
            .position(|line| !line.valid)
            .unwrap_or_else(|| {
                set.iter()
                    .enumerate()
                    .min_by_key(|(_, line)| line.rank)
                    .map_or(0, |(i, _)| i)
            });

        if self.sets[index as usize][victim].valid && self.sets[index as usize][victim].dirty {
            let victim_tag = self.sets[index as usize][victim].tag;
            let evict_base = self.block_base(victim_tag, index);
            for offset in 0..self.block_size {
                mem.write_byte(evict_base + offset, self.sets[index as usize][victim].data[offset as usize]);
            }
            debug!(set = index, way = victim, base = format_args!("{evict_base:#010x}"), "cache evict");
        }

        let block_base = (addr >> self.offset_bits) << self.offset_bits;
        let mut data = vec![0u8; self.block_size as usize];
        for (offset, slot) in data.iter_mut().enumerate() {
            *slot = mem.read_byte(block_base + offset as u32);
        }

        let line = &mut self.sets[index as usize][victim];
        line.data = data;
        line.tag = tag;
        line.valid = true;
        line.dirty = false;
        line.ready_at_cycle = cycle + u64::from(self.config.miss_latency);

        self.update_lru(index, victim);
        debug!(set = index, way = victim, base = format_args!("{block_base:#010x}"), "cache install");
        victim
    }

    /// Big-endian multi-byte read. `size` is 1, 2, or 4 and the access must
    /// not cross a block boundary. Returns `(value, extra_cycles)`.
    pub fn read(&mut self, addr: u32, size: u32, cycle: u64, mem: &mut MainMemory) -> (u32, u32) {
        let (_, index, _) = self.decompose(addr);
        let (way, extra, _in_flight) = self.touch(addr, cycle, mem);

        let mut value = 0u32;
        for i in 0..size {
            let byte_addr = addr.wrapping_add(i);
            let (_, _, offset) = self.decompose(byte_addr);
            let byte = self.sets[index as usize][way].data[offset as usize];
            value |= u32::from(byte) << ((size - 1 - i) * 8);
        }
        (value, extra)
    }

    /// Big-endian multi-byte write. Sets the dirty flag of the touched
    /// block. Returns `extra_cycles`.
    ///
    /// An access matching an in-flight miss (§4.1) does not update the
    /// block's contents or LRU state — only a clean hit or a newly
    /// installed block may be written.
    pub fn write(&mut self, addr: u32, value: u32, size: u32, cycle: u64, mem: &mut MainMemory) -> u32 {
        let (_, index, _) = self.decompose(addr);
        let (way, extra, in_flight) = self.touch(addr, cycle, mem);
        if in_flight {
            return extra;
        }

        for i in 0..size {
            let byte_addr = addr.wrapping_add(i);
            let (_, _, offset) = self.decompose(byte_addr);
            let shift = (size - 1 - i) * 8;
            let byte = ((value >> shift) & 0xFF) as u8;
            self.sets[index as usize][way].data[offset as usize] = byte;
        }
        self.sets[index as usize][way].dirty = true;
        extra
    }

    /// Writes every valid dirty block back to `mem` byte-wise. Idempotent:
    /// dirty flags are left set, so a repeated drain writes the same bytes.
    pub fn drain(&self, mem: &mut MainMemory) {
        for index in 0..self.num_sets {
            for line in &self.sets[index as usize] {
                if line.valid && line.dirty {
                    let base = self.block_base(line.tag, index);
                    for (offset, &byte) in line.data.iter().enumerate() {
                        mem.write_byte(base + offset as u32, byte);
                    }
                    debug!(set = index, base = format_args!("{base:#010x}"), "cache drain");
                }
            }
        }
    }

    /// Total observed hits since construction.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Total observed misses since construction.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn direct_mapped(block_size: u32, cache_size: u32, miss_latency: u32) -> Cache {
        Cache::new(CacheConfig {
            block_size,
            cache_size,
            associativity: 1,
            miss_latency,
        })
        .unwrap()
    }

    fn two_way(block_size: u32, cache_size: u32, miss_latency: u32) -> Cache {
        Cache::new(CacheConfig {
            block_size,
            cache_size,
            associativity: 2,
            miss_latency,
        })
        .unwrap()
    }

    #[test]
    fn rejects_bad_associativity() {
        let err = Cache::new(CacheConfig {
            block_size: 16,
            cache_size: 64,
            associativity: 3,
            miss_latency: 1,
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::BadAssociativity { associativity: 3 }));
    }

    #[test]
    fn rejects_non_power_of_two_block_size() {
        let err = Cache::new(CacheConfig {
            block_size: 3,
            cache_size: 64,
            associativity: 1,
            miss_latency: 1,
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::BadSize { .. }));
    }

    // Scenario 5 (§8): cache miss latency accounting.
    #[test]
    fn miss_then_hit_accounting() {
        let mut cache = direct_mapped(16, 64, 5);
        let mut mem = MainMemory::new();
        mem.write_byte(0x1000, 0);
        mem.write_byte(0x1001, 0);
        mem.write_byte(0x1002, 0);
        mem.write_byte(0x1003, 9);

        let (value, extra) = cache.read(0x1000, 4, 0, &mut mem);
        assert_eq!(value, 9);
        assert_eq!(extra, 5);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 0);

        // The block is ready once the cycle reaches ready_at_cycle.
        let (value, extra) = cache.read(0x1004, 4, 5, &mut mem);
        assert_eq!(value, 0);
        assert_eq!(extra, 0);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
    }

    // Scenario 6 (§8): write-back on eviction.
    #[test]
    fn dirty_eviction_writes_back() {
        // Two sets, 4-byte blocks -> cache_size = 8.
        let mut cache = direct_mapped(4, 8, 1);
        let mut mem = MainMemory::new();

        cache.write(0x0000, 0xDEAD_BEEF, 4, 0, &mut mem);
        // 0x0008 maps to the same set (index bit from address bit 2) as 0x0000
        // with set count 2: index = (addr >> 2) & 1. 0x0000 -> index 0,
        // 0x0008 -> index 0 as well (bit 2 of 0x8 is 0b1000, >>2 = 0b10 & 1 = 0).
        cache.write(0x0008, 0x1234_5678, 4, 10, &mut mem);

        let mut value = 0u32;
        for i in 0..4u32 {
            value = (value << 8) | u32::from(mem.read_byte(0x0000 + i));
        }
        assert_eq!(value, 0xDEAD_BEEF);
    }

    #[test]
    fn drain_is_idempotent() {
        let mut cache = direct_mapped(4, 16, 1);
        let mut mem = MainMemory::new();
        cache.write(0x40, 0x0000_00FF, 1, 0, &mut mem);

        cache.drain(&mut mem);
        let first = mem.read_byte(0x40);
        cache.drain(&mut mem);
        let second = mem.read_byte(0x40);
        assert_eq!(first, second);
        assert_eq!(first, 0xFF);
    }

    #[test]
    fn two_way_lru_evicts_least_recently_used() {
        let mut cache = two_way(4, 8, 1);
        let mut mem = MainMemory::new();

        // Single set (num_sets = 1). Fill both ways.
        let (_, extra_a) = cache.read(0x00, 4, 0, &mut mem);
        let (_, extra_b) = cache.read(0x04, 4, 2, &mut mem);
        assert_eq!(extra_a, 1);
        assert_eq!(extra_b, 1);

        // Touch way A again so it becomes MRU, leaving B as LRU.
        cache.read(0x00, 4, 4, &mut mem);
        // A third distinct block should evict B, not A.
        cache.read(0x08, 4, 6, &mut mem);
        let (_, extra) = cache.read(0x00, 4, 8, &mut mem);
        assert_eq!(extra, 0, "way holding address 0x00 should still be resident");
    }

    // §4.1: a write that lands on a still-in-flight install must not touch
    // the block's contents or dirty flag.
    #[test]
    fn write_to_in_flight_block_does_not_mutate_contents() {
        let mut cache = direct_mapped(16, 64, 5);
        let mut mem = MainMemory::new();

        let extra_a = cache.write(0x1000, 0x1111_1111, 4, 0, &mut mem);
        assert_eq!(extra_a, 5);
        assert_eq!(cache.misses(), 1);

        // Same block, still before ready_at_cycle (0 + 5): must be
        // classified as in-flight, not overwrite the block with v2.
        let extra_b = cache.write(0x1000, 0x2222_2222, 4, 2, &mut mem);
        assert_eq!(extra_b, 5);
        assert_eq!(cache.misses(), 2);

        // Once ready, the block still holds the first write's value.
        let (value, extra) = cache.read(0x1000, 4, 5, &mut mem);
        assert_eq!(extra, 0);
        assert_eq!(value, 0x1111_1111);
    }

    #[test]
    fn hits_plus_misses_equals_first_byte_accesses() {
        let mut cache = direct_mapped(4, 16, 2);
        let mut mem = MainMemory::new();
        for i in 0..10u32 {
            cache.read(i * 4, 4, u64::from(i), &mut mem);
        }
        assert_eq!(cache.hits() + cache.misses(), 10);
    }
}
