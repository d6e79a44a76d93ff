//! A cycle-accurate simulator for a five-stage, in-order pipelined MIPS32
//! integer core with a two-level split-cache memory hierarchy.
//!
//! [`cpu::Cpu`] owns the architectural and microarchitectural state and
//! advances one cycle per [`cpu::Cpu::tick`] call; [`cache::Cache`] models
//! one direct-mapped or two-way set-associative write-back cache instance;
//! [`memory::MainMemory`] is the single backing store both caches share;
//! [`config::Config`] is the serde-deserializable run configuration.

pub mod cache;
pub mod config;
pub mod cpu;
pub mod error;
pub mod isa;
pub mod memory;
pub mod stats;
