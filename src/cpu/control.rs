//! Hazard detection and operand forwarding (§4.3 "Hazard and stall rules").
//!
//! Forwarding mutates the *input* snapshot held in a latch's instruction
//! record, never the register file (§9 "Forwarding is pure"): latches are
//! the only writable surface each cycle.

use crate::cpu::pipeline::StageLatch;
use crate::isa::instruction::Instruction;

/// *Load-use stall*: the instruction currently in ID/EX is a load whose
/// destination (`rt`) matches a source register of the instruction being
/// decoded.
#[must_use]
pub fn load_use_stall(id_ex_instr: &Instruction, decoding: &Instruction) -> bool {
    if !id_ex_instr.is_mem_read() {
        return false;
    }
    let rt = id_ex_instr.rt();
    rt != 0 && (rt == decoding.rs() || rt == decoding.rt())
}

/// *Branch/JR operand unavailable*: a branch or `jr` being decoded needs an
/// operand that ID/EX hasn't computed yet, or that EX/MEM is still waiting
/// on a load to produce.
///
/// `check_rt` is `false` for `jr`/`blez`/`bgtz` (single-operand tests) and
/// `true` for `beq`/`bne` (both operands compared).
#[must_use]
pub fn branch_operand_stall(
    decoding: &Instruction,
    check_rt: bool,
    id_ex: &StageLatch,
    ex_mem: &StageLatch,
) -> bool {
    let rs = decoding.rs();
    let rt = decoding.rt();

    if rs != 0 && rs == id_ex.dest {
        return true;
    }
    if check_rt && rt != 0 && rt == id_ex.dest {
        return true;
    }

    if ex_mem.instr.is_mem_read() {
        if rs != 0 && rs == ex_mem.dest {
            return true;
        }
        if check_rt && rt != 0 && rt == ex_mem.dest {
            return true;
        }
    }

    false
}

fn apply_forward(instr: &mut Instruction, producer: &StageLatch) {
    if producer.dest == 0 {
        return;
    }
    let Some(value) = producer.pending_value else {
        return;
    };
    if instr.rs() == producer.dest {
        instr.set_rs_value(value);
    }
    if instr.rt() == producer.dest {
        instr.set_rt_value(value);
    }
}

/// Branch-resolution forwarding: EX/MEM's just-computed result into the
/// branch/`jr`/jump-target operands being evaluated in decode.
pub fn branch_forwarding(decoding: &mut Instruction, ex_mem: &StageLatch) {
    apply_forward(decoding, ex_mem);
}

/// Execute-stage operand forwarding: MEM/WB→ID/EX then EX/MEM→ID/EX, so
/// that when both match, the newer (EX/MEM) value wins.
pub fn execute_forwarding(id_ex_instr: &mut Instruction, mem_wb: &StageLatch, ex_mem: &StageLatch) {
    apply_forward(id_ex_instr, mem_wb);
    apply_forward(id_ex_instr, ex_mem);
}

/// Memory-stage store-value forwarding: MEM/WB into EX/MEM's `rt` operand
/// only (the value about to be stored), not `rs` (the address was already
/// resolved in execute).
pub fn mem_store_value_forwarding(ex_mem_instr: &mut Instruction, mem_wb: &StageLatch) {
    if mem_wb.dest == 0 {
        return;
    }
    let Some(value) = mem_wb.pending_value else {
        return;
    };
    if ex_mem_instr.rt() == mem_wb.dest {
        ex_mem_instr.set_rt_value(value);
    }
}
