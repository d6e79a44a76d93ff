//! Execute (EX) stage (§4.3 step 4): applies forwarding to the operand
//! snapshots latched in ID/EX, then invokes the pure ALU semantics in
//! [`crate::isa::execute`].
//!
//! An overflow trap suppresses this instruction's own destination write
//! (`dest` is forced to 0) rather than undoing already-completed older
//! instructions; [`crate::cpu::Cpu::commit`] handles squashing the younger
//! ones still in IF/ID and ID/EX.

use tracing::trace;

use crate::cpu::pipeline::StageLatch;
use crate::cpu::{control, Cpu};
use crate::isa::execute as isa_execute;
use crate::isa::instruction::Instruction;

pub fn execute_stage(cpu: &mut Cpu) {
    let mut instr = cpu.id_ex.instr;
    control::execute_forwarding(&mut instr, &cpu.mem_wb, &cpu.ex_mem);

    let (pending_value, dest) = match &instr {
        Instruction::R(r) => match isa_execute::exec_r(r, cpu.id_ex.pc) {
            Ok(value) => (value, cpu.id_ex.dest),
            Err(trap) => {
                cpu.pending_exception = Some(trap);
                (None, 0)
            }
        },
        Instruction::I(i) => match isa_execute::exec_i(i, cpu.id_ex.pc) {
            Ok(value) => (value, cpu.id_ex.dest),
            Err(trap) => {
                cpu.pending_exception = Some(trap);
                (None, 0)
            }
        },
        Instruction::J(_) => (cpu.id_ex.pending_value, cpu.id_ex.dest),
        Instruction::Illegal => (None, 0),
    };

    if !cpu.id_ex.is_bubble() {
        trace!(pc = cpu.id_ex.pc, dest, ?pending_value, "execute");
    }

    cpu.next_ex_mem = StageLatch {
        word: cpu.id_ex.word,
        pc: cpu.id_ex.pc,
        instr,
        pending_value,
        dest,
        bubble: cpu.id_ex.is_bubble(),
    };
}
