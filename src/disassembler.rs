// This file is part of mos6502dbg.
// Licensed under the GNU Lesser General Public License, v3.0 or later.
// See LICENSE or <https://www.gnu.org/licenses/lgpl-3.0.html> for details.

//! Single-instruction disassembly, optionally substituting symbol names from debug info.
//!
//! One small formatting function per addressing-mode shape, producing an [`Instruction`]
//! that carries its raw bytes, its formatted text, and its length.

use crate::debuginfo::DebugInfo;
use crate::memory::Memory;
use crate::opcodes::{AddressingMode, CpuVariant, Mnemonic, OPCODE_TABLE};

/// One disassembled instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Address the instruction starts at.
    pub addr: u16,
    /// `MNEMONIC operand`, e.g. `"LDA $1234,X"`.
    pub text: String,
    /// The raw opcode + operand bytes.
    pub bytes: Vec<u8>,
}

impl Instruction {
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Disassembles the instruction at `pc`. Undefined opcodes render as `DB $xx`
///
#[must_use]
pub fn disassemble(mem: &Memory, pc: u16, debug: Option<&DebugInfo>, variant: CpuVariant) -> Instruction {
    let byte = mem.read(pc);
    let Some(entry) = OPCODE_TABLE[byte as usize] else {
        return Instruction { addr: pc, text: format!("DB ${byte:02X}"), bytes: vec![byte] };
    };
    if entry.variant == CpuVariant::Wdc65c02 && variant == CpuVariant::Mos6502 {
        return Instruction { addr: pc, text: format!("DB ${byte:02X}"), bytes: vec![byte] };
    }

    let len = entry.mode.instruction_len();
    let mut bytes = Vec::with_capacity(len as usize);
    for i in 0..len {
        bytes.push(mem.read(pc.wrapping_add(i)));
    }

    let mnemonic = mnemonic_str(entry.mnemonic);
    let operand = format_operand(entry.mnemonic, entry.mode, pc, &bytes, debug);
    let text = if operand.is_empty() { mnemonic.to_string() } else { format!("{mnemonic} {operand}") };

    Instruction { addr: pc, text, bytes }
}

fn format_operand(mnemonic: Mnemonic, mode: AddressingMode, pc: u16, bytes: &[u8], debug: Option<&DebugInfo>) -> String {
    let byte_operand = || bytes[1];
    let word_operand = || u16::from_le_bytes([bytes[1], bytes[2]]);
    // A jump target is matched exactly or not at all: a `name+1` label one byte below the
    // target would name the wrong destination, unlike a data operand where `addr - 1` can
    // legitimately be "one past" a label.
    let is_jump = matches!(mnemonic, Mnemonic::Jmp | Mnemonic::Jsr);

    match mode {
        AddressingMode::Imp => String::new(),
        AddressingMode::Acc => "A".to_string(),
        AddressingMode::Imm => format!("#${:02X}", byte_operand()),
        AddressingMode::Zp => symbolic_or_hex(byte_operand() as u16, debug, 2, is_jump),
        AddressingMode::Zpx => format!("{},X", symbolic_or_hex(byte_operand() as u16, debug, 2, is_jump)),
        AddressingMode::Zpy => format!("{},Y", symbolic_or_hex(byte_operand() as u16, debug, 2, is_jump)),
        AddressingMode::Abs => symbolic_or_hex(word_operand(), debug, 4, is_jump),
        AddressingMode::Abx => format!("{},X", symbolic_or_hex(word_operand(), debug, 4, is_jump)),
        AddressingMode::Aby => format!("{},Y", symbolic_or_hex(word_operand(), debug, 4, is_jump)),
        AddressingMode::Ind => format!("({})", symbolic_or_hex(word_operand(), debug, 4, is_jump)),
        AddressingMode::Iax => format!("({},X)", symbolic_or_hex(word_operand(), debug, 4, is_jump)),
        AddressingMode::Izx => format!("({},X)", symbolic_or_hex(byte_operand() as u16, debug, 2, is_jump)),
        AddressingMode::Izy => format!("({}),Y", symbolic_or_hex(byte_operand() as u16, debug, 2, is_jump)),
        AddressingMode::Izp => format!("({})", symbolic_or_hex(byte_operand() as u16, debug, 2, is_jump)),
        AddressingMode::Rel => {
            let disp = byte_operand() as i8;
            let target = (pc as i32 + 2 + disp as i32) as u16;
            symbolic_or_hex(target, debug, 4, true)
        }
    }
}

/// Replaces `addr` by a defined symbol's name when one exists at exactly that address
/// (labels preferred over equates); failing that, if a label is defined at `addr - 1` and
/// `is_jump` is false, emits `name+1`. Otherwise renders as a `$`-prefixed hex literal padded
/// to `width` digits. Jump and branch targets never get the `name+1` treatment: a label one
/// byte below the destination names the wrong place to jump to.
fn symbolic_or_hex(addr: u16, debug: Option<&DebugInfo>, width: usize, is_jump: bool) -> String {
    if let Some(debug) = debug {
        if let Some(sym) = debug.symbol_for(addr) {
            return sym.name.clone();
        }
        if !is_jump {
            if let Some(sym) = debug.symbol_for(addr.wrapping_sub(1)) {
                return format!("{}+1", sym.name);
            }
        }
    }
    format!("${addr:0width$X}")
}

fn mnemonic_str(m: Mnemonic) -> &'static str {
    use Mnemonic::*;
    match m {
        Adc => "ADC", And => "AND", Asl => "ASL", Bcc => "BCC", Bcs => "BCS", Beq => "BEQ",
        Bit => "BIT", Bmi => "BMI", Bne => "BNE", Bpl => "BPL", Brk => "BRK", Bvc => "BVC",
        Bvs => "BVS", Clc => "CLC", Cld => "CLD", Cli => "CLI", Clv => "CLV", Cmp => "CMP",
        Cpx => "CPX", Cpy => "CPY", Dec => "DEC", Dex => "DEX", Dey => "DEY", Eor => "EOR",
        Inc => "INC", Inx => "INX", Iny => "INY", Jmp => "JMP", Jsr => "JSR", Lda => "LDA",
        Ldx => "LDX", Ldy => "LDY", Lsr => "LSR", Nop => "NOP", Ora => "ORA", Pha => "PHA",
        Php => "PHP", Pla => "PLA", Plp => "PLP", Rol => "ROL", Ror => "ROR", Rti => "RTI",
        Rts => "RTS", Sbc => "SBC", Sec => "SEC", Sed => "SED", Sei => "SEI", Sta => "STA",
        Stx => "STX", Sty => "STY", Tax => "TAX", Tay => "TAY", Tsx => "TSX", Txa => "TXA",
        Txs => "TXS", Tya => "TYA",
        Bra => "BRA", Phx => "PHX", Plx => "PLX", Phy => "PHY", Ply => "PLY", Stz => "STZ",
        Trb => "TRB", Tsb => "TSB",
    }
}
