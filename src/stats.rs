//! Run statistics: cycle/instruction counts, stall breakdown, instruction
//! mix, and (read directly off the caches at report time) hit/miss counts.
//!
//! Trimmed from the richer multi-level/branch-prediction counters of the
//! simulator this is adapted from: this core has one stall source per
//! pipeline hazard class and two caches, not a full memory hierarchy.

use std::fmt;

use crate::cache::Cache;
use crate::isa::instruction::Instruction;

/// Accumulated counters for one simulation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimStats {
    /// Instructions that reached write-back (including the halt sentinel).
    pub instructions_retired: u64,
    /// Retired R-form instructions.
    pub r_type: u64,
    /// Retired I-form arithmetic/logical instructions (`addi`, `andi`, ...).
    pub i_type_arith: u64,
    /// Retired loads.
    pub loads: u64,
    /// Retired stores.
    pub stores: u64,
    /// Retired branches (taken or not).
    pub branches: u64,
    /// Retired jumps (`j`/`jal`) and `jr`.
    pub jumps: u64,
    /// Cycles decode stalled on the I-cache (structural fetch stall).
    pub fetch_stall_cycles: u64,
    /// Cycles decode stalled on a load-use or branch-operand hazard.
    pub decode_stall_cycles: u64,
    /// Cycles the pipeline stalled on a D-cache miss.
    pub memory_stall_cycles: u64,
    /// Synchronous exceptions taken (reserved instruction or overflow).
    pub exceptions: u64,
}

impl SimStats {
    /// Classifies a retiring instruction into the mix counters.
    pub fn record_retirement(&mut self, instr: &Instruction) {
        self.instructions_retired += 1;
        match instr {
            Instruction::R(r) if r.funct == crate::isa::funct::JR => self.jumps += 1,
            Instruction::R(_) => self.r_type += 1,
            Instruction::I(_) if instr.is_mem_read() => self.loads += 1,
            Instruction::I(_) if instr.is_mem_write() => self.stores += 1,
            Instruction::I(_) if instr.is_branch() => self.branches += 1,
            Instruction::I(_) => self.i_type_arith += 1,
            Instruction::J(_) => self.jumps += 1,
            Instruction::Illegal => {}
        }
    }

    /// Records one cycle's worth of stall flags (§4.3 stall classes).
    pub fn record_cycle(&mut self, stall_if: bool, stall_id: bool, stall_mem: bool) {
        if stall_if {
            self.fetch_stall_cycles += 1;
        }
        if stall_id {
            self.decode_stall_cycles += 1;
        }
        if stall_mem {
            self.memory_stall_cycles += 1;
        }
    }

    /// Renders the full sectioned report, pulling hit/miss counts directly
    /// off the live caches.
    #[must_use]
    pub fn report(&self, cycles: u64, icache: &Cache, dcache: &Cache) -> String {
        use fmt::Write as _;
        let mut out = String::new();
        let _ = writeln!(out, "== Simulation summary ==");
        let _ = writeln!(out, "cycles               : {cycles}");
        let _ = writeln!(out, "instructions retired : {}", self.instructions_retired);
        if cycles > 0 {
            let cpi = cycles as f64 / self.instructions_retired.max(1) as f64;
            let _ = writeln!(out, "cycles per instruction: {cpi:.3}");
        }
        let _ = writeln!(out, "-- instruction mix --");
        let _ = writeln!(out, "r-type     : {}", self.r_type);
        let _ = writeln!(out, "i-type alu : {}", self.i_type_arith);
        let _ = writeln!(out, "loads      : {}", self.loads);
        let _ = writeln!(out, "stores     : {}", self.stores);
        let _ = writeln!(out, "branches   : {}", self.branches);
        let _ = writeln!(out, "jumps      : {}", self.jumps);
        let _ = writeln!(out, "-- stalls --");
        let _ = writeln!(out, "fetch  : {} cycles", self.fetch_stall_cycles);
        let _ = writeln!(out, "decode : {} cycles", self.decode_stall_cycles);
        let _ = writeln!(out, "memory : {} cycles", self.memory_stall_cycles);
        let _ = writeln!(out, "-- exceptions --");
        let _ = writeln!(out, "taken  : {}", self.exceptions);
        let _ = writeln!(out, "-- caches --");
        let _ = writeln!(out, "icache hits/misses : {}/{}", icache.hits(), icache.misses());
        let _ = writeln!(out, "dcache hits/misses : {}/{}", dcache.hits(), dcache.misses());
        out
    }
}

impl fmt::Display for SimStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} instructions retired ({} loads, {} stores, {} branches, {} jumps)",
            self.instructions_retired, self.loads, self.stores, self.branches, self.jumps
        )
    }
}
