//! End-to-end pipeline scenarios exercised through the public driver surface
//! (`Cpu::new` + `Cpu::tick`), one per documented behavior this core must
//! reproduce exactly.

use mips_pipe_sim::config::{CacheConfig, Config, GeneralConfig};
use mips_pipe_sim::cpu::Cpu;
use mips_pipe_sim::isa::{funct, opcodes, HALT_SENTINEL};
use mips_pipe_sim::memory::MainMemory;
use pretty_assertions::assert_eq;

fn word(opcode: u32, rs: u32, rt: u32, imm: u16) -> u32 {
    (opcode << 26) | (rs << 21) | (rt << 16) | u32::from(imm)
}

fn r_word(rs: u32, rt: u32, rd: u32, funct: u32) -> u32 {
    (rs << 21) | (rt << 16) | (rd << 11) | funct
}

fn j_word(opcode: u32, target: u32) -> u32 {
    (opcode << 26) | (target & 0x03FF_FFFF)
}

fn config_with(block_size: u32, cache_size: u32, associativity: u32, miss_latency: u32) -> Config {
    let cache = CacheConfig {
        block_size,
        cache_size,
        associativity,
        miss_latency,
    };
    Config {
        general: GeneralConfig {
            start_pc: 0,
            trace: false,
        },
        icache: cache,
        dcache: cache,
    }
}

fn run_to_halt(cpu: &mut Cpu, budget: u64) {
    for _ in 0..budget {
        if cpu.halted() {
            return;
        }
        cpu.tick();
    }
    panic!("program did not halt within {budget} cycles");
}

fn load_words(mem: &mut MainMemory, base: u32, words: &[u32]) {
    let mut bytes = Vec::with_capacity(words.len() * 4);
    for w in words {
        bytes.extend_from_slice(&w.to_be_bytes());
    }
    mem.load_image(base, &bytes);
}

// Scenario 3 (§8): a taken branch resolves in decode; the delay-slot
// instruction still executes regardless of the branch outcome.
#[test]
fn taken_branch_executes_its_delay_slot() {
    let mut mem = MainMemory::new();
    load_words(
        &mut mem,
        0,
        &[
            word(opcodes::ADDI, 0, 8, 1),                 // 0x00: addi $8, $0, 1
            word(opcodes::BEQ, 8, 8, 2),                  // 0x04: beq $8, $8, +2 -> target 0x10
            word(opcodes::ADDI, 0, 9, 99),                // 0x08: delay slot, always executes
            word(opcodes::ADDI, 0, 10, 123),               // 0x0c: skipped by the branch
            HALT_SENTINEL,                                // 0x10: branch target
        ],
    );
    let mut cpu = Cpu::new(&config_with(16, 64, 1, 1), mem).unwrap();
    run_to_halt(&mut cpu, 40);

    assert_eq!(cpu.regs[8], 1);
    assert_eq!(cpu.regs[9], 99, "delay slot must execute");
    assert_eq!(cpu.regs[10], 0, "instruction after the delay slot must be skipped");
}

// Scenario 3 variant: jal writes the return address and j/jr round-trip.
#[test]
fn jal_links_return_address_and_jr_returns() {
    let mut mem = MainMemory::new();
    load_words(
        &mut mem,
        0,
        &[
            j_word(opcodes::JAL, 3),                      // 0x00: jal 0x0c
            word(opcodes::ADDI, 0, 9, 1),                 // 0x04: delay slot
            HALT_SENTINEL,                                // 0x08: never reached directly
            r_word(31, 0, 0, funct::JR),                  // 0x0c: jr $31 -> back to 0x08
        ],
    );
    let mut cpu = Cpu::new(&config_with(16, 64, 1, 1), mem).unwrap();
    run_to_halt(&mut cpu, 40);

    assert_eq!(cpu.regs[31], 0x08, "jal must link pc+8");
    assert_eq!(cpu.regs[9], 1);
}

// Scenario 5 (§8): a D-cache miss charges extra cycles at the pipeline
// level, observable as an elevated cycle count relative to an all-hit run.
#[test]
fn dcache_miss_charges_extra_cycles_end_to_end() {
    let mut mem = MainMemory::new();
    load_words(
        &mut mem,
        0,
        &[
            word(opcodes::ADDI, 0, 8, 0x40),
            word(opcodes::LW, 8, 9, 0), // first touch: miss
            word(opcodes::LW, 8, 10, 0), // second touch, same block: hit
            HALT_SENTINEL,
        ],
    );
    let mut cpu = Cpu::new(&config_with(16, 64, 1, 10), mem).unwrap();
    run_to_halt(&mut cpu, 60);

    assert_eq!(cpu.dcache().misses(), 1);
    assert_eq!(cpu.dcache().hits(), 1);
    assert!(cpu.stats.memory_stall_cycles >= 10);
}

// Scenario 6 (§8): a dirty block evicted from a direct-mapped cache writes
// its contents back to main memory, observable after draining.
#[test]
fn store_then_eviction_writes_back_to_memory() {
    let mut mem = MainMemory::new();
    load_words(
        &mut mem,
        0,
        &[
            word(opcodes::ADDI, 0, 8, 0xDE), // $8 = 0xDE (low byte of a marker)
            word(opcodes::ADDI, 0, 9, 0x00), // address 0x00
            word(opcodes::SB, 9, 8, 0),      // sb $8, 0($9) -> dirties set 0
            word(opcodes::ADDI, 0, 10, 0x10), // address 0x10, same set (4-byte blocks, 2 sets)
            word(opcodes::LW, 10, 11, 0),    // lw from a different block in the same set -> evicts
            HALT_SENTINEL,
        ],
    );
    let mut cpu = Cpu::new(&config_with(4, 8, 1, 1), mem).unwrap();
    run_to_halt(&mut cpu, 60);
    cpu.drain_caches();

    assert_eq!(cpu.peek_memory(0x00), 0xDE, "dirty byte must survive eviction");
}

// Scenario 4 variant at pipeline scope: addu does not trap on the same
// operands that trap add.
#[test]
fn addu_does_not_raise_where_add_would() {
    let mut mem = MainMemory::new();
    load_words(
        &mut mem,
        0,
        &[
            word(opcodes::LUI, 0, 8, 0x7FFF),
            word(opcodes::ORI, 8, 8, 0xFFFF),
            word(opcodes::ADDI, 0, 9, 1),
            r_word(8, 9, 10, funct::ADDU),
            HALT_SENTINEL,
        ],
    );
    let mut cpu = Cpu::new(&config_with(16, 64, 1, 1), mem).unwrap();
    run_to_halt(&mut cpu, 40);

    assert_eq!(cpu.regs[10], 0x8000_0000);
    assert_eq!(cpu.stats.exceptions, 0);
}
