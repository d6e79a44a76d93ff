//! The five-stage pipeline controller (§3, §4).
//!
//! [`Cpu::tick`] is the single entry point: every stage reads the previous
//! cycle's latches and writes its own `next_*` scratch latch, write-back
//! runs first so decode sees a same-cycle register update, and
//! [`Cpu::commit`] applies the stall/flush rules exactly once at the end —
//! stages themselves never decide what propagates, only what *would*.

pub mod control;
pub mod pipeline;
mod stages;

use tracing::{debug, trace};

use crate::cache::Cache;
use crate::config::Config;
use crate::cpu::pipeline::{IfId, StageLatch};
use crate::error::{ConfigError, Trap, EXCEPTION_VECTOR};
use crate::isa::HALT_SENTINEL;
use crate::memory::MainMemory;
use crate::stats::SimStats;

/// The full architectural and microarchitectural state of one core.
#[derive(Debug)]
pub struct Cpu {
    /// Architectural program counter.
    pub pc: u32,
    next_pc: u32,

    /// The 32 general-purpose registers; `regs[0]` is never written.
    pub regs: [u32; 32],

    if_id: IfId,
    next_if_id: IfId,
    id_ex: StageLatch,
    next_id_ex: StageLatch,
    ex_mem: StageLatch,
    next_ex_mem: StageLatch,
    mem_wb: StageLatch,
    next_mem_wb: StageLatch,

    halt_seen: bool,
    halted: bool,

    stall_if: bool,
    stall_id: bool,
    stall_mem: bool,

    if_stall: u32,
    if_word: u32,
    mem_stall: u32,
    mem_result: u32,

    pending_exception: Option<Trap>,

    icache: Cache,
    dcache: Cache,
    mem: MainMemory,

    cycle: u64,
    trace: bool,

    /// Accumulated run statistics.
    pub stats: SimStats,
}

impl Cpu {
    /// Builds a core from a validated [`Config`] and a main memory image
    /// (already loaded with the program, per §2).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if either cache's geometry is invalid.
    pub fn new(config: &Config, mem: MainMemory) -> Result<Self, ConfigError> {
        let icache = Cache::new(config.icache)?;
        let dcache = Cache::new(config.dcache)?;
        Ok(Self {
            pc: config.general.start_pc,
            next_pc: config.general.start_pc,
            regs: [0; 32],
            if_id: IfId::default(),
            next_if_id: IfId::default(),
            id_ex: StageLatch::bubble(),
            next_id_ex: StageLatch::bubble(),
            ex_mem: StageLatch::bubble(),
            next_ex_mem: StageLatch::bubble(),
            mem_wb: StageLatch::bubble(),
            next_mem_wb: StageLatch::bubble(),
            halt_seen: false,
            halted: false,
            stall_if: false,
            stall_id: false,
            stall_mem: false,
            if_stall: 0,
            if_word: 0,
            mem_stall: 0,
            mem_result: 0,
            pending_exception: None,
            icache,
            dcache,
            mem,
            cycle: 0,
            trace: config.general.trace,
            stats: SimStats::default(),
        })
    }

    /// `true` once the halt sentinel has retired through write-back.
    #[must_use]
    pub fn halted(&self) -> bool {
        self.halted
    }

    /// The current cycle count.
    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// The instruction cache, for reporting.
    #[must_use]
    pub fn icache(&self) -> &Cache {
        &self.icache
    }

    /// The data cache, for reporting.
    #[must_use]
    pub fn dcache(&self) -> &Cache {
        &self.dcache
    }

    /// Writes back any still-dirty cache blocks to main memory (§4.1
    /// "drain"), for inspecting final memory state after a run.
    pub fn drain_caches(&mut self) {
        self.icache.drain(&mut self.mem);
        self.dcache.drain(&mut self.mem);
    }

    /// Reads a byte of main memory directly, bypassing both caches.
    #[must_use]
    pub fn peek_memory(&self, addr: u32) -> u8 {
        self.mem.read_byte(addr)
    }

    /// Advances the core by exactly one cycle.
    pub fn tick(&mut self) {
        self.cycle += 1;
        self.stall_if = false;
        self.stall_id = false;
        self.stall_mem = false;
        self.pending_exception = None;
        self.next_if_id = IfId::default();
        self.next_id_ex = StageLatch::bubble();
        self.next_ex_mem = StageLatch::bubble();
        self.next_mem_wb = StageLatch::bubble();

        stages::write_back::write_back_stage(self);
        stages::fetch::fetch_stage(self);
        stages::decode::decode_stage(self);
        stages::execute::execute_stage(self);
        stages::mem::mem_stage(self);

        self.commit();

        if self.trace {
            trace!(
                cycle = self.cycle,
                pc = format_args!("{:#010x}", self.pc),
                stall_if = self.stall_if,
                stall_id = self.stall_id,
                stall_mem = self.stall_mem,
                "tick"
            );
        }
    }

    /// Applies the stall/flush rules (§4.3 "Stall resolution") exactly once
    /// per cycle, committing each stage's `next_*` scratch latch — or a
    /// bubble, or the previous value — into its architectural latch.
    fn commit(&mut self) {
        self.stats
            .record_cycle(self.stall_if, self.stall_id, self.stall_mem);

        if let Some(trap) = self.pending_exception {
            debug!(?trap, cycle = self.cycle, "exception");
            self.stats.exceptions += 1;
            self.if_id = IfId::default();
            self.id_ex = StageLatch::bubble();
            if self.stall_mem {
                self.mem_wb = StageLatch::bubble();
            } else {
                self.ex_mem = self.next_ex_mem.clone();
                self.mem_wb = self.next_mem_wb.clone();
            }
            self.halt_seen = false;
            self.if_stall = 0;
            self.pc = EXCEPTION_VECTOR;
            return;
        }

        if !self.stall_if && !self.stall_id && !self.stall_mem {
            self.if_id = self.next_if_id;
            self.pc = self.next_pc;
        }
        if self.stall_if {
            self.if_id = IfId::default();
        }

        if !self.stall_id && !self.stall_mem {
            self.id_ex = self.next_id_ex.clone();
        } else if self.stall_id && !self.stall_mem {
            self.id_ex = StageLatch::bubble();
        }

        if !self.stall_mem {
            self.ex_mem = self.next_ex_mem.clone();
            self.mem_wb = self.next_mem_wb.clone();
        } else {
            self.mem_wb = StageLatch::bubble();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use pretty_assertions::assert_eq;

    fn test_config() -> Config {
        Config {
            general: crate::config::GeneralConfig {
                start_pc: 0,
                trace: false,
            },
            icache: CacheConfig {
                block_size: 16,
                cache_size: 64,
                associativity: 1,
                miss_latency: 2,
            },
            dcache: CacheConfig {
                block_size: 16,
                cache_size: 64,
                associativity: 1,
                miss_latency: 2,
            },
        }
    }

    fn word(opcode: u32, rs: u32, rt: u32, imm: u16) -> u32 {
        (opcode << 26) | (rs << 21) | (rt << 16) | u32::from(imm)
    }

    fn r_word(rs: u32, rt: u32, rd: u32, funct: u32) -> u32 {
        (rs << 21) | (rt << 16) | (rd << 11) | funct
    }

    fn load_program(cpu: &mut Cpu, words: &[u32]) {
        let mut bytes = Vec::with_capacity(words.len() * 4);
        for w in words {
            bytes.extend_from_slice(&w.to_be_bytes());
        }
        cpu.mem.load_image(0, &bytes);
    }

    // Scenario 1 (§8): pure register arithmetic with back-to-back forwarding.
    #[test]
    fn forwarding_resolves_back_to_back_dependency() {
        let mem = MainMemory::new();
        let mut cpu = Cpu::new(&test_config(), mem).unwrap();
        // addi $8, $0, 5 ; addi $9, $8, 10 ; halt
        load_program(
            &mut cpu,
            &[
                word(crate::isa::opcodes::ADDI, 0, 8, 5),
                word(crate::isa::opcodes::ADDI, 8, 9, 10),
                HALT_SENTINEL,
            ],
        );
        for _ in 0..20 {
            if cpu.halted() {
                break;
            }
            cpu.tick();
        }
        assert!(cpu.halted());
        assert_eq!(cpu.regs[8], 5);
        assert_eq!(cpu.regs[9], 15);
    }

    // Scenario 2 (§8): load-use stall.
    #[test]
    fn load_use_hazard_stalls_decode() {
        let mut mem = MainMemory::new();
        mem.write_byte(0x100, 0);
        mem.write_byte(0x101, 0);
        mem.write_byte(0x102, 0);
        mem.write_byte(0x103, 42);
        let mut cpu = Cpu::new(&test_config(), mem).unwrap();
        // addi $8, $0, 0x100 ; lw $9, 0($8) ; add $10, $9, $9 ; halt
        load_program(
            &mut cpu,
            &[
                word(crate::isa::opcodes::ADDI, 0, 8, 0x100),
                word(crate::isa::opcodes::LW, 8, 9, 0),
                r_word(9, 9, 10, crate::isa::funct::ADD),
                HALT_SENTINEL,
            ],
        );
        for _ in 0..30 {
            if cpu.halted() {
                break;
            }
            cpu.tick();
        }
        assert!(cpu.halted());
        assert_eq!(cpu.regs[9], 42);
        assert_eq!(cpu.regs[10], 84);
        assert!(cpu.stats.decode_stall_cycles >= 1);
    }

    // Scenario 4 (§8): arithmetic overflow redirects to the exception vector.
    #[test]
    fn overflow_redirects_and_does_not_write_destination() {
        let mem = MainMemory::new();
        let mut cpu = Cpu::new(&test_config(), mem).unwrap();
        // lui $8, 0x7fff ; ori $8, $8, 0xffff (-> $8 = 0x7fffffff)
        // addi $9, $8, 1  -> overflows
        load_program(
            &mut cpu,
            &[
                word(crate::isa::opcodes::LUI, 0, 8, 0x7FFF),
                word(crate::isa::opcodes::ORI, 8, 8, 0xFFFF),
                word(crate::isa::opcodes::ADDI, 8, 9, 1),
            ],
        );
        for _ in 0..10 {
            cpu.tick();
        }
        assert_eq!(cpu.regs[9], 0);
        assert_eq!(cpu.stats.exceptions, 1);
    }

    // Register 0 is hard-wired to zero regardless of what decode snapshots.
    #[test]
    fn register_zero_is_never_written() {
        let mem = MainMemory::new();
        let mut cpu = Cpu::new(&test_config(), mem).unwrap();
        load_program(&mut cpu, &[word(crate::isa::opcodes::ADDI, 0, 0, 7), HALT_SENTINEL]);
        for _ in 0..10 {
            if cpu.halted() {
                break;
            }
            cpu.tick();
        }
        assert_eq!(cpu.regs[0], 0);
    }
}
