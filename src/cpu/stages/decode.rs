//! Instruction Decode (ID) stage (§4.3 step 3).
//!
//! Branches, `jr`, and jumps are resolved here, against the register file
//! already updated by this cycle's write-back — the only place in the
//! pipeline a control transfer is decided.

use tracing::trace;

use crate::cpu::pipeline::StageLatch;
use crate::cpu::{control, Cpu};
use crate::error::Trap;
use crate::isa::decode::decode;
use crate::isa::instruction::Instruction;
use crate::isa::{execute, funct, is_funct_valid, opcodes};

pub fn decode_stage(cpu: &mut Cpu) {
    if cpu.if_id.is_bubble() {
        return;
    }

    let mut instr = decode(cpu.if_id.word, cpu.if_id.pc, &cpu.regs);

    let illegal = matches!(instr, Instruction::Illegal)
        || matches!(&instr, Instruction::R(r) if !is_funct_valid(r.funct));
    if illegal {
        cpu.pending_exception = Some(Trap::ReservedInstruction {
            pc: cpu.if_id.pc,
            word: cpu.if_id.word,
        });
        return;
    }

    let is_branch_like = instr.is_branch() || instr.is_jr();
    if is_branch_like {
        control::branch_forwarding(&mut instr, &cpu.ex_mem);
    }

    if control::load_use_stall(&cpu.id_ex.instr, &instr) {
        cpu.stall_id = true;
        trace!(pc = cpu.if_id.pc, "decode stall: load-use hazard");
        return;
    }

    if is_branch_like {
        let check_rt =
            matches!(&instr, Instruction::I(i) if matches!(i.opcode, opcodes::BEQ | opcodes::BNE));
        if control::branch_operand_stall(&instr, check_rt, &cpu.id_ex, &cpu.ex_mem) {
            cpu.stall_id = true;
            trace!(pc = cpu.if_id.pc, "decode stall: branch operand unavailable");
            return;
        }
        resolve_branch_or_jr(cpu, &instr);
    } else if let Instruction::J(j) = &instr {
        cpu.next_pc = execute::jump_target(cpu.if_id.pc.wrapping_add(4), j.target);
    }

    let dest = instr.dest();
    let pending_value = match &instr {
        Instruction::J(j) if j.opcode == opcodes::JAL => Some(j.pc.wrapping_add(8)),
        _ => None,
    };

    trace!(pc = cpu.if_id.pc, ?instr, "decode");

    cpu.next_id_ex = StageLatch {
        word: cpu.if_id.word,
        pc: cpu.if_id.pc,
        instr,
        pending_value,
        dest,
        bubble: false,
    };
}

fn resolve_branch_or_jr(cpu: &mut Cpu, instr: &Instruction) {
    match instr {
        Instruction::R(r) if r.funct == funct::JR => {
            cpu.next_pc = r.rs_value;
        }
        Instruction::I(i) => {
            let taken = match i.opcode {
                opcodes::BEQ => i.rs_value == i.rt_value,
                opcodes::BNE => i.rs_value != i.rt_value,
                opcodes::BLEZ => (i.rs_value as i32) <= 0,
                opcodes::BGTZ => (i.rs_value as i32) > 0,
                _ => false,
            };
            if taken {
                cpu.next_pc = execute::branch_target(cpu.if_id.pc, i.se_imm);
            }
        }
        _ => {}
    }
}
