//! Instruction decoder (§4.2, §6): turns a raw 32-bit word plus the current
//! register file into a tagged [`Instruction`].

use crate::isa::instruction::{IData, Instruction, JData, RData};
use crate::isa::{opcodes, opcode_of, HALT_SENTINEL};

fn sign_extend_16(imm: u16) -> u32 {
    (i32::from(imm as i16)) as u32
}

/// Decodes `word`, fetched at `pc`, against the current register file
/// `regs` (used to snapshot `rs`/`rt` values at decode time).
///
/// The halt sentinel decodes as a harmless R-form `sll $0, $0, 0` rather
/// than `Illegal`, matching the source's special case: it must reach
/// write-back as an ordinary (non-exception) instruction for the halt
/// latch to observe it there.
#[must_use]
pub fn decode(word: u32, pc: u32, regs: &[u32; 32]) -> Instruction {
    if word == HALT_SENTINEL {
        return Instruction::R(RData {
            rs: 0,
            rt: 0,
            rd: 0,
            shamt: 0,
            funct: 0,
            rs_value: 0,
            rt_value: 0,
        });
    }

    let opcode = opcode_of(word);
    match opcode {
        opcodes::R_TYPE => {
            let rs = (word >> 21) & 0x1F;
            let rt = (word >> 16) & 0x1F;
            let rd = (word >> 11) & 0x1F;
            let shamt = (word >> 6) & 0x1F;
            let funct = word & 0x3F;
            Instruction::R(RData {
                rs,
                rt,
                rd,
                shamt,
                funct,
                rs_value: regs[rs as usize],
                rt_value: regs[rt as usize],
            })
        }
        opcodes::ADDI
        | opcodes::ADDIU
        | opcodes::ANDI
        | opcodes::BEQ
        | opcodes::BNE
        | opcodes::BLEZ
        | opcodes::BGTZ
        | opcodes::LW
        | opcodes::LBU
        | opcodes::LHU
        | opcodes::LUI
        | opcodes::ORI
        | opcodes::SLTI
        | opcodes::SLTIU
        | opcodes::SB
        | opcodes::SH
        | opcodes::SW => {
            let rs = (word >> 21) & 0x1F;
            let rt = (word >> 16) & 0x1F;
            let imm = (word & 0xFFFF) as u16;
            Instruction::I(IData {
                opcode,
                rs,
                rt,
                imm,
                se_imm: sign_extend_16(imm),
                ze_imm: u32::from(imm),
                rs_value: regs[rs as usize],
                rt_value: regs[rt as usize],
            })
        }
        opcodes::J | opcodes::JAL => Instruction::J(JData {
            opcode,
            target: word & 0x03FF_FFFF,
            pc,
        }),
        _ => Instruction::Illegal,
    }
}
