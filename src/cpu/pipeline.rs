//! Inter-stage pipeline latches (§3 "Pipeline latches").

use crate::isa::instruction::Instruction;

/// The IF/ID latch: the fetched word and the PC it was fetched at.
///
/// `word == 0` is a real, decodable instruction (`sll $0, $0, 0`), so
/// "no instruction this cycle" is tracked by `bubble`, not by the word's
/// value.
#[derive(Debug, Clone, Copy)]
pub struct IfId {
    /// PC at which `word` was fetched.
    pub pc: u32,
    /// The raw fetched instruction word.
    pub word: u32,
    /// `true` when no instruction was fetched this cycle (reset, a squash,
    /// or fetch past the halt sentinel).
    pub bubble: bool,
}

impl IfId {
    /// `true` when no instruction was fetched this cycle.
    #[must_use]
    pub fn is_bubble(&self) -> bool {
        self.bubble
    }
}

impl Default for IfId {
    fn default() -> Self {
        Self {
            pc: 0,
            word: 0,
            bubble: true,
        }
    }
}

/// The shape shared by ID/EX, EX/MEM, and MEM/WB (§3): the original word
/// (for display and halt detection), the PC it was fetched at (needed by
/// execute to report an overflow trap's faulting address), the decoded
/// record, an optional pending register write, and the destination register
/// index (0 meaning "no write" regardless of the pending value).
///
/// `dest == 0` means "writes nothing" but is also true of ordinary stores
/// and branches, so it cannot double as "is this latch empty." `bubble`
/// carries that distinction explicitly instead.
#[derive(Debug, Clone)]
pub struct StageLatch {
    /// The raw instruction word; also how write-back recognizes the halt
    /// sentinel reaching the end of the pipeline.
    pub word: u32,
    /// PC at which `word` was fetched.
    pub pc: u32,
    /// The decoded instruction record.
    pub instr: Instruction,
    /// The computed result awaiting write-back, if any.
    pub pending_value: Option<u32>,
    /// Destination register index; 0 means "no write."
    pub dest: u32,
    /// `true` when this latch holds no real instruction.
    pub bubble: bool,
}

impl StageLatch {
    /// A bubble: no instruction, no destination, no pending value.
    #[must_use]
    pub fn bubble() -> Self {
        Self {
            word: 0,
            pc: 0,
            instr: Instruction::Illegal,
            pending_value: None,
            dest: 0,
            bubble: true,
        }
    }

    /// `true` when this latch causes no architectural effect (§ GLOSSARY
    /// "Bubble").
    #[must_use]
    pub fn is_bubble(&self) -> bool {
        self.bubble
    }
}

impl Default for StageLatch {
    fn default() -> Self {
        Self::bubble()
    }
}
