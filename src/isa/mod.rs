//! MIPS32 instruction encoding: opcode/function-code tables, the tagged
//! instruction record, the decoder, and execute-stage semantics.

pub mod decode;
pub mod execute;
pub mod instruction;

/// Opcode constants (§6). Opcode 0 is the R-type escape; everything else
/// is either I-form or J-form.
pub mod opcodes {
    /// R-type escape opcode; the actual operation is in `funct`.
    pub const R_TYPE: u32 = 0x00;
    /// `j` — unconditional jump.
    pub const J: u32 = 0x02;
    /// `jal` — jump and link.
    pub const JAL: u32 = 0x03;
    /// `beq` — branch if equal.
    pub const BEQ: u32 = 0x04;
    /// `bne` — branch if not equal.
    pub const BNE: u32 = 0x05;
    /// `blez` — branch if less than or equal to zero.
    pub const BLEZ: u32 = 0x06;
    /// `bgtz` — branch if greater than zero.
    pub const BGTZ: u32 = 0x07;
    /// `addi` — add immediate, signed, overflow-checked.
    pub const ADDI: u32 = 0x08;
    /// `addiu` — add immediate unsigned (no overflow check).
    pub const ADDIU: u32 = 0x09;
    /// `slti` — set less than immediate, signed.
    pub const SLTI: u32 = 0x0A;
    /// `sltiu` — set less than immediate, unsigned.
    pub const SLTIU: u32 = 0x0B;
    /// `andi` — bitwise and immediate (zero-extended).
    pub const ANDI: u32 = 0x0C;
    /// `ori` — bitwise or immediate (zero-extended).
    pub const ORI: u32 = 0x0D;
    /// `lui` — load upper immediate.
    pub const LUI: u32 = 0x0F;
    /// `lw` — load word.
    pub const LW: u32 = 0x23;
    /// `lbu` — load byte unsigned.
    pub const LBU: u32 = 0x24;
    /// `lhu` — load halfword unsigned.
    pub const LHU: u32 = 0x25;
    /// `sb` — store byte.
    pub const SB: u32 = 0x28;
    /// `sh` — store halfword.
    pub const SH: u32 = 0x29;
    /// `sw` — store word.
    pub const SW: u32 = 0x2B;
}

/// R-type function codes (§6), valid only when `opcode == opcodes::R_TYPE`.
pub mod funct {
    /// `sll` — shift left logical.
    pub const SLL: u32 = 0x00;
    /// `srl` — shift right logical.
    pub const SRL: u32 = 0x02;
    /// `jr` — jump register.
    pub const JR: u32 = 0x08;
    /// `add` — add, signed, overflow-checked.
    pub const ADD: u32 = 0x20;
    /// `addu` — add unsigned (no overflow check).
    pub const ADDU: u32 = 0x21;
    /// `sub` — subtract, signed, overflow-checked.
    pub const SUB: u32 = 0x22;
    /// `subu` — subtract unsigned (no overflow check).
    pub const SUBU: u32 = 0x23;
    /// `and` — bitwise and.
    pub const AND: u32 = 0x24;
    /// `or` — bitwise or.
    pub const OR: u32 = 0x25;
    /// `nor` — bitwise nor.
    pub const NOR: u32 = 0x27;
    /// `slt` — set less than, signed.
    pub const SLT: u32 = 0x2A;
    /// `sltu` — set less than, unsigned.
    pub const SLTU: u32 = 0x2B;
}

/// The halt sentinel word (§6): anywhere in the instruction stream, this
/// word signals end-of-program.
pub const HALT_SENTINEL: u32 = 0xFEED_FEED;

/// Returns `true` if `funct` names a recognized R-type operation.
#[must_use]
pub fn is_funct_valid(f: u32) -> bool {
    matches!(
        f,
        funct::SLL
            | funct::SRL
            | funct::JR
            | funct::ADD
            | funct::ADDU
            | funct::SUB
            | funct::SUBU
            | funct::AND
            | funct::OR
            | funct::NOR
            | funct::SLT
            | funct::SLTU
    )
}

/// Extracts the high 6 bits (opcode field) of a 32-bit instruction word.
#[must_use]
pub fn opcode_of(word: u32) -> u32 {
    (word >> 26) & 0x3F
}
