//! Instruction Fetch (IF) stage (§4.3 step 2).

use tracing::trace;

use crate::cpu::pipeline::IfId;
use crate::cpu::Cpu;
use crate::isa::HALT_SENTINEL;

/// Fetches the word at `cpu.pc` from the I-cache, charging any miss latency
/// before the fetched word is allowed to latch into IF/ID.
///
/// Once the halt sentinel has been fetched, fetch stops advancing the
/// program counter and presents only bubbles: the sentinel itself was
/// already latched the cycle it was seen and is left to drain through the
/// pipeline on its own.
pub fn fetch_stage(cpu: &mut Cpu) {
    cpu.next_pc = cpu.pc.wrapping_add(4);

    if cpu.halt_seen {
        cpu.next_if_id = IfId::default();
        return;
    }

    if cpu.if_stall == 0 {
        let (word, extra) = cpu.icache.read(cpu.pc, 4, cpu.cycle, &mut cpu.mem);
        cpu.if_word = word;
        cpu.if_stall = extra;
    }

    if cpu.if_stall > 0 {
        cpu.stall_if = true;
        cpu.if_stall -= 1;
        trace!(pc = cpu.pc, remaining = cpu.if_stall, "fetch stall");
        return;
    }

    let word = cpu.if_word;
    if word == HALT_SENTINEL {
        cpu.halt_seen = true;
    }
    trace!(pc = cpu.pc, word = format_args!("{word:#010x}"), "fetch");
    cpu.next_if_id = IfId {
        pc: cpu.pc,
        word,
        bubble: false,
    };
}
