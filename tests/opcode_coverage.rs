// This file is part of mos6502dbg.
// Licensed under the GNU Lesser General Public License, v3.0 or later.
// See LICENSE or <https://www.gnu.org/licenses/lgpl-3.0.html> for details.

//! Exhaustive per-opcode property tests, looping the whole opcode table rather than
//! hand-enumerating one test per instruction.

use mos6502dbg::cpu::Cpu;
use mos6502dbg::disassembler::disassemble;
use mos6502dbg::memory::Memory;
use mos6502dbg::opcodes::{CpuVariant, Mnemonic, OPCODE_TABLE};

/// These change PC by something other than the instruction's own length: jumps, calls,
/// returns, interrupts, and every branch (even not-taken branches are exempt here since
/// their displacement byte is picked arbitrarily below).
fn changes_pc_unpredictably(m: Mnemonic) -> bool {
    matches!(
        m,
        Mnemonic::Jmp
            | Mnemonic::Jsr
            | Mnemonic::Rts
            | Mnemonic::Rti
            | Mnemonic::Brk
            | Mnemonic::Bcc
            | Mnemonic::Bcs
            | Mnemonic::Beq
            | Mnemonic::Bmi
            | Mnemonic::Bne
            | Mnemonic::Bpl
            | Mnemonic::Bvc
            | Mnemonic::Bvs
            | Mnemonic::Bra
    )
}

#[test]
fn every_defined_opcode_disassembles_to_its_declared_length() {
    for (byte, slot) in OPCODE_TABLE.iter().enumerate() {
        let Some(entry) = slot else { continue };
        let mut mem = Memory::new();
        mem.write(0x8000, byte as u8);
        // Fill enough operand bytes for the widest mode (2).
        mem.write(0x8001, 0x00);
        mem.write(0x8002, 0x00);

        let inst = disassemble(&mem, 0x8000, None, entry.variant);
        assert_eq!(
            inst.len(),
            entry.mode.instruction_len() as usize,
            "opcode ${byte:02X} ({:?}, {:?}) disassembled to {} bytes, expected {}",
            entry.mnemonic,
            entry.mode,
            inst.len(),
            entry.mode.instruction_len()
        );
    }
}

#[test]
fn every_non_control_flow_opcode_advances_pc_by_its_length() {
    for (byte, slot) in OPCODE_TABLE.iter().enumerate() {
        let Some(entry) = slot else { continue };
        if changes_pc_unpredictably(entry.mnemonic) {
            continue;
        }

        let mut mem = Memory::new();
        mem.write_word(0xFFFC, 0x8000);
        mem.write(0x8000, byte as u8);
        mem.write(0x8001, 0x01);
        mem.write(0x8002, 0x01);

        let mut cpu = Cpu::new(entry.variant);
        cpu.reset(&mem);

        let before = cpu.regs.pc;
        cpu.step(&mut mem, true).unwrap_or_else(|e| panic!("opcode ${byte:02X} ({:?}) failed to decode: {e}", entry.mnemonic));
        let expected = before.wrapping_add(entry.mode.instruction_len());
        assert_eq!(
            cpu.regs.pc, expected,
            "opcode ${byte:02X} ({:?}, {:?}) left PC at ${:04X}, expected ${:04X}",
            entry.mnemonic, entry.mode, cpu.regs.pc, expected
        );
    }
}

#[test]
fn most_of_the_opcode_space_is_defined() {
    let defined = OPCODE_TABLE.iter().filter(|e| e.is_some()).count();
    assert!(defined > 150, "expected most of the opcode space to be defined, got {defined}");
    assert!(defined < 256);
}
