// This file is part of mos6502dbg.
// Licensed under the GNU Lesser General Public License, v3.0 or later.
// See LICENSE or <https://www.gnu.org/licenses/lgpl-3.0.html> for details.

//! ISA definition: the static opcode table shared by the interpreter and the disassembler.
//!
//! An enum names every operation, and a byte-indexed const array pairs each opcode byte with
//! its mnemonic, addressing mode and timing. Since almost every 6502 opcode byte maps to one
//! unique (mnemonic, mode) pair, the table is indexed directly by the opcode byte rather than
//! through an intermediate decode step.

/// Which CPU core an opcode entry requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CpuVariant {
    Mos6502,
    Wdc65c02,
}

/// Addressing modes of the 6502/65C02 ISA.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressingMode {
    /// Implied: no operand.
    Imp,
    /// Operates on the accumulator.
    Acc,
    /// 8-bit immediate operand.
    Imm,
    /// Zero page.
    Zp,
    /// Zero page, X-indexed.
    Zpx,
    /// Zero page, Y-indexed.
    Zpy,
    /// Absolute.
    Abs,
    /// Absolute, X-indexed.
    Abx,
    /// Absolute, Y-indexed.
    Aby,
    /// Indirect (`JMP` only).
    Ind,
    /// Indexed indirect, `(zp,X)`.
    Izx,
    /// Indirect indexed, `(zp),Y`.
    Izy,
    /// Zero page indirect, `(zp)` (65C02).
    Izp,
    /// Absolute indexed indirect, `(abs,X)` (65C02, `JMP` only).
    Iax,
    /// Relative (branches).
    Rel,
}

impl AddressingMode {
    /// Number of bytes the operand occupies, not counting the opcode byte itself.
    #[must_use]
    pub const fn operand_len(self) -> u16 {
        match self {
            AddressingMode::Imp | AddressingMode::Acc => 0,
            AddressingMode::Imm
            | AddressingMode::Zp
            | AddressingMode::Zpx
            | AddressingMode::Zpy
            | AddressingMode::Izx
            | AddressingMode::Izy
            | AddressingMode::Izp
            | AddressingMode::Rel => 1,
            AddressingMode::Abs
            | AddressingMode::Abx
            | AddressingMode::Aby
            | AddressingMode::Ind
            | AddressingMode::Iax => 2,
        }
    }

    /// Total instruction length in bytes, including the opcode byte.
    #[must_use]
    pub const fn instruction_len(self) -> u16 {
        1 + self.operand_len()
    }
}

/// Every mnemonic the interpreter and disassembler know about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[allow(non_camel_case_types)]
pub enum Mnemonic {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor,
    Inc, Inx, Iny, Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora,
    Pha, Php, Pla, Plp, Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei,
    Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
    // 65C02 additions.
    Bra, Phx, Plx, Phy, Ply, Stz, Trb, Tsb,
}

/// One opcode table entry.
#[derive(Clone, Copy, Debug)]
pub struct OpcodeEntry {
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    pub cycles: u32,
    pub variant: CpuVariant,
}

const fn e(mnemonic: Mnemonic, mode: AddressingMode, cycles: u32) -> Option<OpcodeEntry> {
    Some(OpcodeEntry { mnemonic, mode, cycles, variant: CpuVariant::Mos6502 })
}

const fn c(mnemonic: Mnemonic, mode: AddressingMode, cycles: u32) -> Option<OpcodeEntry> {
    Some(OpcodeEntry { mnemonic, mode, cycles, variant: CpuVariant::Wdc65c02 })
}

use AddressingMode::*;
use Mnemonic::*;

/// The opcode table, indexed directly by the opcode byte. `None` marks an undefined opcode.
pub const OPCODE_TABLE: [Option<OpcodeEntry>; 256] = [
    /* 0x00 */ e(Brk, Imp, 7),
    /* 0x01 */ e(Ora, Izx, 6),
    /* 0x02 */ None,
    /* 0x03 */ None,
    /* 0x04 */ c(Tsb, Zp, 5),
    /* 0x05 */ e(Ora, Zp, 3),
    /* 0x06 */ e(Asl, Zp, 5),
    /* 0x07 */ None,
    /* 0x08 */ e(Php, Imp, 3),
    /* 0x09 */ e(Ora, Imm, 2),
    /* 0x0A */ e(Asl, Acc, 2),
    /* 0x0B */ None,
    /* 0x0C */ c(Tsb, Abs, 6),
    /* 0x0D */ e(Ora, Abs, 4),
    /* 0x0E */ e(Asl, Abs, 6),
    /* 0x0F */ None,

    /* 0x10 */ e(Bpl, Rel, 2),
    /* 0x11 */ e(Ora, Izy, 5),
    /* 0x12 */ c(Ora, Izp, 5),
    /* 0x13 */ None,
    /* 0x14 */ c(Trb, Zp, 5),
    /* 0x15 */ e(Ora, Zpx, 4),
    /* 0x16 */ e(Asl, Zpx, 6),
    /* 0x17 */ None,
    /* 0x18 */ e(Clc, Imp, 2),
    /* 0x19 */ e(Ora, Aby, 4),
    /* 0x1A */ c(Inc, Acc, 2),
    /* 0x1B */ None,
    /* 0x1C */ c(Trb, Abs, 6),
    /* 0x1D */ e(Ora, Abx, 4),
    /* 0x1E */ e(Asl, Abx, 7),
    /* 0x1F */ None,

    /* 0x20 */ e(Jsr, Abs, 6),
    /* 0x21 */ e(And, Izx, 6),
    /* 0x22 */ None,
    /* 0x23 */ None,
    /* 0x24 */ e(Bit, Zp, 3),
    /* 0x25 */ e(And, Zp, 3),
    /* 0x26 */ e(Rol, Zp, 5),
    /* 0x27 */ None,
    /* 0x28 */ e(Plp, Imp, 4),
    /* 0x29 */ e(And, Imm, 2),
    /* 0x2A */ e(Rol, Acc, 2),
    /* 0x2B */ None,
    /* 0x2C */ e(Bit, Abs, 4),
    /* 0x2D */ e(And, Abs, 4),
    /* 0x2E */ e(Rol, Abs, 6),
    /* 0x2F */ None,

    /* 0x30 */ e(Bmi, Rel, 2),
    /* 0x31 */ e(And, Izy, 5),
    /* 0x32 */ c(And, Izp, 5),
    /* 0x33 */ None,
    /* 0x34 */ c(Bit, Zpx, 4),
    /* 0x35 */ e(And, Zpx, 4),
    /* 0x36 */ e(Rol, Zpx, 6),
    /* 0x37 */ None,
    /* 0x38 */ e(Sec, Imp, 2),
    /* 0x39 */ e(And, Aby, 4),
    /* 0x3A */ c(Dec, Acc, 2),
    /* 0x3B */ None,
    /* 0x3C */ c(Bit, Abx, 4),
    /* 0x3D */ e(And, Abx, 4),
    /* 0x3E */ e(Rol, Abx, 7),
    /* 0x3F */ None,

    /* 0x40 */ e(Rti, Imp, 6),
    /* 0x41 */ e(Eor, Izx, 6),
    /* 0x42 */ None,
    /* 0x43 */ None,
    /* 0x44 */ None,
    /* 0x45 */ e(Eor, Zp, 3),
    /* 0x46 */ e(Lsr, Zp, 5),
    /* 0x47 */ None,
    /* 0x48 */ e(Pha, Imp, 3),
    /* 0x49 */ e(Eor, Imm, 2),
    /* 0x4A */ e(Lsr, Acc, 2),
    /* 0x4B */ None,
    /* 0x4C */ e(Jmp, Abs, 3),
    /* 0x4D */ e(Eor, Abs, 4),
    /* 0x4E */ e(Lsr, Abs, 6),
    /* 0x4F */ None,

    /* 0x50 */ e(Bvc, Rel, 2),
    /* 0x51 */ e(Eor, Izy, 5),
    /* 0x52 */ c(Eor, Izp, 5),
    /* 0x53 */ None,
    /* 0x54 */ None,
    /* 0x55 */ e(Eor, Zpx, 4),
    /* 0x56 */ e(Lsr, Zpx, 6),
    /* 0x57 */ None,
    /* 0x58 */ e(Cli, Imp, 2),
    /* 0x59 */ e(Eor, Aby, 4),
    /* 0x5A */ c(Phy, Imp, 3),
    /* 0x5B */ None,
    /* 0x5C */ None,
    /* 0x5D */ e(Eor, Abx, 4),
    /* 0x5E */ e(Lsr, Abx, 7),
    /* 0x5F */ None,

    /* 0x60 */ e(Rts, Imp, 6),
    /* 0x61 */ e(Adc, Izx, 6),
    /* 0x62 */ None,
    /* 0x63 */ None,
    /* 0x64 */ c(Stz, Zp, 3),
    /* 0x65 */ e(Adc, Zp, 3),
    /* 0x66 */ e(Ror, Zp, 5),
    /* 0x67 */ None,
    /* 0x68 */ e(Pla, Imp, 4),
    /* 0x69 */ e(Adc, Imm, 2),
    /* 0x6A */ e(Ror, Acc, 2),
    /* 0x6B */ None,
    /* 0x6C */ e(Jmp, Ind, 5),
    /* 0x6D */ e(Adc, Abs, 4),
    /* 0x6E */ e(Ror, Abs, 6),
    /* 0x6F */ None,

    /* 0x70 */ e(Bvs, Rel, 2),
    /* 0x71 */ e(Adc, Izy, 5),
    /* 0x72 */ c(Adc, Izp, 5),
    /* 0x73 */ None,
    /* 0x74 */ c(Stz, Zpx, 4),
    /* 0x75 */ e(Adc, Zpx, 4),
    /* 0x76 */ e(Ror, Zpx, 6),
    /* 0x77 */ None,
    /* 0x78 */ e(Sei, Imp, 2),
    /* 0x79 */ e(Adc, Aby, 4),
    /* 0x7A */ c(Ply, Imp, 4),
    /* 0x7B */ None,
    /* 0x7C */ c(Jmp, Iax, 6),
    /* 0x7D */ e(Adc, Abx, 4),
    /* 0x7E */ e(Ror, Abx, 7),
    /* 0x7F */ None,

    /* 0x80 */ c(Bra, Rel, 3),
    /* 0x81 */ e(Sta, Izx, 6),
    /* 0x82 */ None,
    /* 0x83 */ None,
    /* 0x84 */ e(Sty, Zp, 3),
    /* 0x85 */ e(Sta, Zp, 3),
    /* 0x86 */ e(Stx, Zp, 3),
    /* 0x87 */ None,
    /* 0x88 */ e(Dey, Imp, 2),
    /* 0x89 */ c(Bit, Imm, 2),
    /* 0x8A */ e(Txa, Imp, 2),
    /* 0x8B */ None,
    /* 0x8C */ e(Sty, Abs, 4),
    /* 0x8D */ e(Sta, Abs, 4),
    /* 0x8E */ e(Stx, Abs, 4),
    /* 0x8F */ None,

    /* 0x90 */ e(Bcc, Rel, 2),
    /* 0x91 */ e(Sta, Izy, 6),
    /* 0x92 */ c(Sta, Izp, 5),
    /* 0x93 */ None,
    /* 0x94 */ e(Sty, Zpx, 4),
    /* 0x95 */ e(Sta, Zpx, 4),
    /* 0x96 */ e(Stx, Zpy, 4),
    /* 0x97 */ None,
    /* 0x98 */ e(Tya, Imp, 2),
    /* 0x99 */ e(Sta, Aby, 5),
    /* 0x9A */ e(Txs, Imp, 2),
    /* 0x9B */ None,
    /* 0x9C */ c(Stz, Abs, 4),
    /* 0x9D */ e(Sta, Abx, 5),
    /* 0x9E */ c(Stz, Abx, 5),
    /* 0x9F */ None,

    /* 0xA0 */ e(Ldy, Imm, 2),
    /* 0xA1 */ e(Lda, Izx, 6),
    /* 0xA2 */ e(Ldx, Imm, 2),
    /* 0xA3 */ None,
    /* 0xA4 */ e(Ldy, Zp, 3),
    /* 0xA5 */ e(Lda, Zp, 3),
    /* 0xA6 */ e(Ldx, Zp, 3),
    /* 0xA7 */ None,
    /* 0xA8 */ e(Tay, Imp, 2),
    /* 0xA9 */ e(Lda, Imm, 2),
    /* 0xAA */ e(Tax, Imp, 2),
    /* 0xAB */ None,
    /* 0xAC */ e(Ldy, Abs, 4),
    /* 0xAD */ e(Lda, Abs, 4),
    /* 0xAE */ e(Ldx, Abs, 4),
    /* 0xAF */ None,

    /* 0xB0 */ e(Bcs, Rel, 2),
    /* 0xB1 */ e(Lda, Izy, 5),
    /* 0xB2 */ c(Lda, Izp, 5),
    /* 0xB3 */ None,
    /* 0xB4 */ e(Ldy, Zpx, 4),
    /* 0xB5 */ e(Lda, Zpx, 4),
    /* 0xB6 */ e(Ldx, Zpy, 4),
    /* 0xB7 */ None,
    /* 0xB8 */ e(Clv, Imp, 2),
    /* 0xB9 */ e(Lda, Aby, 4),
    /* 0xBA */ e(Tsx, Imp, 2),
    /* 0xBB */ None,
    /* 0xBC */ e(Ldy, Abx, 4),
    /* 0xBD */ e(Lda, Abx, 4),
    /* 0xBE */ e(Ldx, Aby, 4),
    /* 0xBF */ None,

    /* 0xC0 */ e(Cpy, Imm, 2),
    /* 0xC1 */ e(Cmp, Izx, 6),
    /* 0xC2 */ None,
    /* 0xC3 */ None,
    /* 0xC4 */ e(Cpy, Zp, 3),
    /* 0xC5 */ e(Cmp, Zp, 3),
    /* 0xC6 */ e(Dec, Zp, 5),
    /* 0xC7 */ None,
    /* 0xC8 */ e(Iny, Imp, 2),
    /* 0xC9 */ e(Cmp, Imm, 2),
    /* 0xCA */ e(Dex, Imp, 2),
    /* 0xCB */ None,
    /* 0xCC */ e(Cpy, Abs, 4),
    /* 0xCD */ e(Cmp, Abs, 4),
    /* 0xCE */ e(Dec, Abs, 6),
    /* 0xCF */ None,

    /* 0xD0 */ e(Bne, Rel, 2),
    /* 0xD1 */ e(Cmp, Izy, 5),
    /* 0xD2 */ c(Cmp, Izp, 5),
    /* 0xD3 */ None,
    /* 0xD4 */ None,
    /* 0xD5 */ e(Cmp, Zpx, 4),
    /* 0xD6 */ e(Dec, Zpx, 6),
    /* 0xD7 */ None,
    /* 0xD8 */ e(Cld, Imp, 2),
    /* 0xD9 */ e(Cmp, Aby, 4),
    /* 0xDA */ c(Phx, Imp, 3),
    /* 0xDB */ None,
    /* 0xDC */ None,
    /* 0xDD */ e(Cmp, Abx, 4),
    /* 0xDE */ e(Dec, Abx, 7),
    /* 0xDF */ None,

    /* 0xE0 */ e(Cpx, Imm, 2),
    /* 0xE1 */ e(Sbc, Izx, 6),
    /* 0xE2 */ None,
    /* 0xE3 */ None,
    /* 0xE4 */ e(Cpx, Zp, 3),
    /* 0xE5 */ e(Sbc, Zp, 3),
    /* 0xE6 */ e(Inc, Zp, 5),
    /* 0xE7 */ None,
    /* 0xE8 */ e(Inx, Imp, 2),
    /* 0xE9 */ e(Sbc, Imm, 2),
    /* 0xEA */ e(Nop, Imp, 2),
    /* 0xEB */ None,
    /* 0xEC */ e(Cpx, Abs, 4),
    /* 0xED */ e(Sbc, Abs, 4),
    /* 0xEE */ e(Inc, Abs, 6),
    /* 0xEF */ None,

    /* 0xF0 */ e(Beq, Rel, 2),
    /* 0xF1 */ e(Sbc, Izy, 5),
    /* 0xF2 */ c(Sbc, Izp, 5),
    /* 0xF3 */ None,
    /* 0xF4 */ None,
    /* 0xF5 */ e(Sbc, Zpx, 4),
    /* 0xF6 */ e(Inc, Zpx, 6),
    /* 0xF7 */ None,
    /* 0xF8 */ e(Sed, Imp, 2),
    /* 0xF9 */ e(Sbc, Aby, 4),
    /* 0xFA */ c(Plx, Imp, 4),
    /* 0xFB */ None,
    /* 0xFC */ None,
    /* 0xFD */ e(Sbc, Abx, 4),
    /* 0xFE */ e(Inc, Abx, 7),
    /* 0xFF */ None,
];
