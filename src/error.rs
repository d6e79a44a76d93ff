//! Synchronous exception and configuration-error types.
//!
//! `Trap` is raised internally by decode/execute and consumed by the pipeline
//! controller within the same cycle (it redirects to the exception vector and
//! keeps running); it is never propagated out of [`crate::cpu::Cpu::tick`] as a
//! hard failure. `ConfigError` is the one genuinely fatal condition this crate
//! recognizes, raised once at cache construction.

use std::fmt;

/// A synchronous exception recognized by the core.
///
/// Both variants redirect the next program counter to the exception vector
/// (`0x0000_8000`) and squash already-fetched/decoded instructions behind the
/// faulting one; neither unwinds the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trap {
    /// The decoded opcode, or an R-form's function code, is outside the
    /// recognized set in §6.
    ReservedInstruction {
        /// PC of the faulting instruction.
        pc: u32,
        /// The raw instruction word.
        word: u32,
    },
    /// A signed `add`/`addi`/`sub` overflowed 32-bit two's complement range.
    ArithmeticOverflow {
        /// PC of the faulting instruction.
        pc: u32,
    },
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trap::ReservedInstruction { pc, word } => write!(
                f,
                "reserved instruction {word:#010x} at pc {pc:#010x}"
            ),
            Trap::ArithmeticOverflow { pc } => {
                write!(f, "arithmetic overflow at pc {pc:#010x}")
            }
        }
    }
}

impl std::error::Error for Trap {}

/// The exception vector every `Trap` redirects to.
pub const EXCEPTION_VECTOR: u32 = 0x0000_8000;

/// A programmer error in cache configuration, diagnosed once at construction.
///
/// Per §7, invalid cache parameters are not a simulated machine condition —
/// they indicate the embedding program passed a nonsensical `CacheConfig` and
/// the simulator refuses to start rather than silently misbehaving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `block_size` or `cache_size` was not a power of two, or `cache_size`
    /// was not a multiple of `block_size`.
    BadSize {
        /// The offending block size.
        block_size: u32,
        /// The offending cache size.
        cache_size: u32,
    },
    /// `associativity` was neither 1 (direct-mapped) nor 2 (two-way set
    /// associative).
    BadAssociativity {
        /// The offending associativity.
        associativity: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::BadSize {
                block_size,
                cache_size,
            } => write!(
                f,
                "invalid cache geometry: block_size={block_size}, cache_size={cache_size} \
                 (both must be powers of two and cache_size must be a multiple of block_size)"
            ),
            ConfigError::BadAssociativity { associativity } => write!(
                f,
                "invalid associativity {associativity}: only 1 (direct-mapped) or 2 (two-way) \
                 are supported"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
