//! Execute-stage semantics (§4.2).
//!
//! These are pure functions over already-decoded, already-forwarded operand
//! snapshots; they carry no pipeline state. Loads, stores, and already-
//! resolved control transfers produce no pending value here — loads are
//! completed in the memory stage, stores and branches/jumps never write a
//! register.

use crate::error::Trap;
use crate::isa::instruction::{IData, RData};
use crate::isa::{funct, opcodes};

/// Two's-complement add/sub with overflow detection equivalent to the
/// source's explicit same-sign/differing-result-sign check: `i32`'s
/// `overflowing_add`/`overflowing_sub` report exactly the same condition.
fn add_sub_checked(a: u32, b: u32, is_add: bool, pc: u32) -> Result<u32, Trap> {
    let (result, overflow) = if is_add {
        (a as i32).overflowing_add(b as i32)
    } else {
        (a as i32).overflowing_sub(b as i32)
    };
    if overflow {
        Err(Trap::ArithmeticOverflow { pc })
    } else {
        Ok(result as u32)
    }
}

fn add_sub_unchecked(a: u32, b: u32, is_add: bool) -> u32 {
    if is_add {
        a.wrapping_add(b)
    } else {
        a.wrapping_sub(b)
    }
}

/// Computes the architectural effect of an R-form instruction.
///
/// # Errors
///
/// Returns [`Trap::ArithmeticOverflow`] for a signed `add`/`sub` overflow.
///
/// # Panics
///
/// Panics if `funct` is not a recognized function code; the pipeline
/// controller must flush R-forms with an invalid function code in decode
/// before they ever reach this function.
pub fn exec_r(r: &RData, pc: u32) -> Result<Option<u32>, Trap> {
    let value = match r.funct {
        funct::ADD => add_sub_checked(r.rs_value, r.rt_value, true, pc)?,
        funct::ADDU => add_sub_unchecked(r.rs_value, r.rt_value, true),
        funct::SUB => add_sub_checked(r.rs_value, r.rt_value, false, pc)?,
        funct::SUBU => add_sub_unchecked(r.rs_value, r.rt_value, false),
        funct::AND => r.rs_value & r.rt_value,
        funct::OR => r.rs_value | r.rt_value,
        funct::NOR => !(r.rs_value | r.rt_value),
        funct::SLT => u32::from((r.rs_value as i32) < (r.rt_value as i32)),
        funct::SLTU => u32::from(r.rs_value < r.rt_value),
        funct::SLL => r.rt_value << (r.shamt & 0x1F),
        funct::SRL => r.rt_value >> (r.shamt & 0x1F),
        funct::JR => return Ok(None),
        other => unreachable!("invalid function code {other:#x} must be flushed in decode"),
    };
    Ok(Some(value))
}

/// Computes the architectural effect of an I-form instruction.
///
/// Loads report `Ok(None)`: their value is produced by the memory stage.
/// Stores and branches also report `Ok(None)`: they write no register.
///
/// # Errors
///
/// Returns [`Trap::ArithmeticOverflow`] for a signed `addi` overflow.
///
/// # Panics
///
/// Panics on an opcode outside the recognized I-form set; the pipeline
/// controller must flush such words in decode before they reach here.
pub fn exec_i(i: &IData, pc: u32) -> Result<Option<u32>, Trap> {
    let value = match i.opcode {
        opcodes::ADDI => add_sub_checked(i.rs_value, i.se_imm, true, pc)?,
        opcodes::ADDIU => add_sub_unchecked(i.rs_value, i.se_imm, true),
        opcodes::ANDI => i.rs_value & i.ze_imm,
        opcodes::ORI => i.rs_value | i.ze_imm,
        opcodes::LUI => i.ze_imm << 16,
        opcodes::SLTI => u32::from((i.rs_value as i32) < (i.se_imm as i32)),
        opcodes::SLTIU => u32::from(i.rs_value < i.se_imm),
        opcodes::LW
        | opcodes::LBU
        | opcodes::LHU
        | opcodes::SB
        | opcodes::SH
        | opcodes::SW
        | opcodes::BEQ
        | opcodes::BNE
        | opcodes::BLEZ
        | opcodes::BGTZ => return Ok(None),
        other => unreachable!("unrecognized opcode {other:#x} must be flushed in decode"),
    };
    Ok(Some(value))
}

/// Effective address for a load or store: `rs + sign_extend(imm)`.
#[must_use]
pub fn effective_address(i: &IData) -> u32 {
    i.rs_value.wrapping_add(i.se_imm)
}

/// Branch target: `(branch_pc + 4) + (sign_extend(imm) << 2)`.
#[must_use]
pub fn branch_target(branch_pc: u32, se_imm: u32) -> u32 {
    let offset = (se_imm as i32) << 2;
    branch_pc.wrapping_add(4).wrapping_add(offset as u32)
}

/// `j`/`jal` target: `((pc_of_delay_slot) & 0xF000_0000) | (target << 2)`.
#[must_use]
pub fn jump_target(pc_of_delay_slot: u32, target: u32) -> u32 {
    (pc_of_delay_slot & 0xF000_0000) | (target << 2)
}
