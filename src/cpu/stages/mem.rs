//! Memory (MEM) stage (§4.3 step 5): resolves the effective address for a
//! load or store, forwards MEM/WB's value into a store's data operand, and
//! charges D-cache miss latency before the access is allowed to complete.

use tracing::trace;

use crate::cpu::pipeline::StageLatch;
use crate::cpu::{control, Cpu};
use crate::isa::execute::effective_address;
use crate::isa::instruction::{IData, Instruction};
use crate::isa::opcodes;

fn access_size(opcode: u32) -> u32 {
    match opcode {
        opcodes::LW | opcodes::SW => 4,
        opcodes::LHU | opcodes::SH => 2,
        opcodes::LBU | opcodes::SB => 1,
        other => unreachable!("opcode {other:#x} is not a memory access"),
    }
}

pub fn mem_stage(cpu: &mut Cpu) {
    let mut instr = cpu.ex_mem.instr;

    if instr.is_mem_write() {
        control::mem_store_value_forwarding(&mut instr, &cpu.mem_wb);
    }

    let mut pending_value = cpu.ex_mem.pending_value;

    if instr.is_mem_read() || instr.is_mem_write() {
        let i: IData = match &instr {
            Instruction::I(i) => *i,
            _ => unreachable!("memory access must be an I-form"),
        };
        let addr = effective_address(&i);
        let size = access_size(i.opcode);

        if cpu.mem_stall == 0 {
            if instr.is_mem_read() {
                let (value, extra) = cpu.dcache.read(addr, size, cpu.cycle, &mut cpu.mem);
                cpu.mem_result = value;
                cpu.mem_stall = extra;
            } else {
                cpu.mem_stall = cpu.dcache.write(addr, i.rt_value, size, cpu.cycle, &mut cpu.mem);
            }
        }

        if cpu.mem_stall > 0 {
            cpu.stall_mem = true;
            cpu.mem_stall -= 1;
            trace!(addr = format_args!("{addr:#010x}"), remaining = cpu.mem_stall, "mem stall");
            return;
        }

        if instr.is_mem_read() {
            pending_value = Some(cpu.mem_result);
        }

        trace!(addr = format_args!("{addr:#010x}"), size, write = instr.is_mem_write(), "mem access");
    }

    cpu.next_mem_wb = StageLatch {
        word: cpu.ex_mem.word,
        pc: cpu.ex_mem.pc,
        instr,
        pending_value,
        dest: cpu.ex_mem.dest,
        bubble: cpu.ex_mem.is_bubble(),
    };
}
