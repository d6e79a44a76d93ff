//! Simulator configuration.
//!
//! Mirrors the hierarchical, serde-backed configuration layer of the crate
//! this simulator is adapted from: every field has a documented, compiled-in
//! default, and the whole tree can be deserialized from a JSON document that
//! overrides only the fields it mentions.
//!
//! ```
//! use mips_pipe_sim::config::Config;
//!
//! let json = r#"{
//!     "general": { "start_pc": 4096 },
//!     "icache": { "miss_latency": 20 }
//! }"#;
//! let config: Config = serde_json::from_str(json).unwrap();
//! assert_eq!(config.general.start_pc, 4096);
//! assert_eq!(config.icache.miss_latency, 20);
//! // Fields not present in the JSON fall back to their compiled-in defaults.
//! assert_eq!(config.dcache.block_size, defaults::BLOCK_SIZE);
//! # use mips_pipe_sim::config::defaults;
//! ```

use serde::Deserialize;

/// Documented compiled-in default values, pulled in by the `#[serde(default = ...)]`
/// attributes below and by `impl Default` for each config struct.
pub mod defaults {
    /// Default cache block size, in bytes.
    pub const BLOCK_SIZE: u32 = 16;
    /// Default total cache size, in bytes.
    pub const CACHE_SIZE: u32 = 4096;
    /// Default associativity (direct-mapped).
    pub const ASSOCIATIVITY: u32 = 1;
    /// Default cache miss latency, in cycles.
    pub const MISS_LATENCY: u32 = 10;
    /// Default program-counter reset value.
    pub const START_PC: u32 = 0;
    /// Default instruction-trace toggle.
    pub const TRACE: bool = false;
}

fn default_block_size() -> u32 {
    defaults::BLOCK_SIZE
}
fn default_cache_size() -> u32 {
    defaults::CACHE_SIZE
}
fn default_associativity() -> u32 {
    defaults::ASSOCIATIVITY
}
fn default_miss_latency() -> u32 {
    defaults::MISS_LATENCY
}
fn default_start_pc() -> u32 {
    defaults::START_PC
}
fn default_trace() -> bool {
    defaults::TRACE
}

/// Geometry and timing for one cache instance (I-cache or D-cache).
///
/// See §4.1: `block_size` and `cache_size` must be powers of two with
/// `cache_size` a multiple of `block_size`; `associativity` must be 1 or 2.
/// These invariants are checked once, at [`crate::cache::Cache::new`], not
/// here — this struct is pure data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Block size in bytes (power of two).
    #[serde(default = "default_block_size")]
    pub block_size: u32,
    /// Total cache size in bytes (multiple of `block_size`).
    #[serde(default = "default_cache_size")]
    pub cache_size: u32,
    /// Associativity: 1 (direct-mapped) or 2 (two-way set-associative).
    #[serde(default = "default_associativity")]
    pub associativity: u32,
    /// Cycles charged on a miss before the block is installed.
    #[serde(default = "default_miss_latency")]
    pub miss_latency: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            block_size: defaults::BLOCK_SIZE,
            cache_size: defaults::CACHE_SIZE,
            associativity: defaults::ASSOCIATIVITY,
            miss_latency: defaults::MISS_LATENCY,
        }
    }
}

/// Driver-level knobs that are not cache geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GeneralConfig {
    /// Initial program counter.
    #[serde(default = "default_start_pc")]
    pub start_pc: u32,
    /// Whether the driver prints the per-cycle pipeline diagram.
    #[serde(default = "default_trace")]
    pub trace: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            start_pc: defaults::START_PC,
            trace: defaults::TRACE,
        }
    }
}

/// Root configuration for a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Driver-level settings.
    pub general: GeneralConfig,
    /// Instruction-cache geometry.
    pub icache: CacheConfig,
    /// Data-cache geometry.
    pub dcache: CacheConfig,
}
