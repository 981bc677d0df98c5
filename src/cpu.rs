// This file is part of mos6502dbg.
// Licensed under the GNU Lesser General Public License, v3.0 or later.
// See LICENSE or <https://www.gnu.org/licenses/lgpl-3.0.html> for details.

//! CPU core: registers, breakpoints, trap hook, and the fetch/decode/execute loop.
//!
//! A plain register struct plus a core struct that owns breakpoints and the current
//! decode/execute state, gated at runtime by a `CpuVariant` tag rather than a generic trait,
//! since the only axis of variation between 6502 and 65C02 is a handful of extra opcodes.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::addressing;
use crate::execute;
use crate::memory::Memory;
use crate::opcodes::{CpuVariant, OPCODE_TABLE};
use crate::status::StatusFlags;

/// 6502/65C02 registers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Registers {
    /// Accumulator.
    pub a: u8,
    /// X index.
    pub x: u8,
    /// Y index.
    pub y: u8,
    /// Stack pointer, an offset into page 1 (effective address = `$0100 + sp`).
    pub sp: u8,
    /// Status flags.
    pub p: StatusFlags,
    /// Program counter.
    pub pc: u16,
}

/// A partial update to the registers, as accepted by [`Cpu::set_registers`]. Every
/// field left `None` is left untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegistersPatch {
    pub a: Option<u8>,
    pub x: Option<u8>,
    pub y: Option<u8>,
    pub sp: Option<u8>,
    pub p: Option<StatusFlags>,
    pub pc: Option<u16>,
}

/// Raised by [`Cpu::step`] on a fatal decode failure
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("undefined opcode ${byte:02X} at ${pc:04X}")]
    UndefinedOpcode { pc: u16, byte: u8 },
    #[error("65C02-only opcode ${byte:02X} at ${pc:04X} rejected under 6502 core")]
    Wdc65c02OpcodeUnder6502 { pc: u16, byte: u8 },
}

/// What a trap hook tells the core to do once it returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookOutcome {
    /// Fall through to fetch/decode/execute as normal.
    Continue,
    /// Abort the step with zero cycles consumed.
    Halt,
}

/// A trap hook consulted before every instruction fetch
pub type TrapHook = Box<dyn FnMut(&mut Registers, &mut Memory) -> HookOutcome>;

/// The 6502/65C02 interpreter core.
pub struct Cpu {
    pub regs: Registers,
    pub variant: CpuVariant,
    /// Running total of elapsed cycles since the last [`Cpu::reset`].
    pub cycles: u64,
    breakpoints: HashMap<u16, HashSet<String>>,
    trap_hook: Option<TrapHook>,
}

impl Cpu {
    /// Creates a core with all registers zeroed and no reset performed yet.
    #[must_use]
    pub fn new(variant: CpuVariant) -> Self {
        Self {
            regs: Registers::default(),
            variant,
            cycles: 0,
            breakpoints: HashMap::new(),
            trap_hook: None,
        }
    }

    /// Installs (or replaces) the trap hook.
    pub fn set_trap_hook(&mut self, hook: TrapHook) {
        self.trap_hook = Some(hook);
    }

    /// Removes the trap hook.
    pub fn clear_trap_hook(&mut self) {
        self.trap_hook = None;
    }

    /// `A=X=Y=0, SP=$FF, P = U | I`, then loads `PC` from the reset vector at `$FFFC`.
    pub fn reset(&mut self, mem: &Memory) {
        self.regs.a = 0;
        self.regs.x = 0;
        self.regs.y = 0;
        self.regs.sp = 0xFF;
        self.regs.p = StatusFlags { i: true, ..StatusFlags::default() };
        self.cycles = 0;
        self.regs.pc = mem.read_word(0xFFFC);
    }

    #[must_use]
    pub fn get_registers(&self) -> Registers {
        self.regs
    }

    pub fn set_registers(&mut self, patch: RegistersPatch) {
        if let Some(a) = patch.a { self.regs.a = a; }
        if let Some(x) = patch.x { self.regs.x = x; }
        if let Some(y) = patch.y { self.regs.y = y; }
        if let Some(sp) = patch.sp { self.regs.sp = sp; }
        if let Some(p) = patch.p { self.regs.p = p; }
        if let Some(pc) = patch.pc { self.regs.pc = pc; }
    }

    pub fn set_cpu_type(&mut self, variant: CpuVariant) {
        self.variant = variant;
    }

    /// Arms `addr` under `group`. An address is armed while its group set is non-empty.
    pub fn add_breakpoint(&mut self, addr: u16, group: &str) {
        self.breakpoints.entry(addr).or_default().insert(group.to_string());
    }

    /// Disarms `addr` for `group`; other groups on the same address remain armed.
    pub fn remove_breakpoint(&mut self, addr: u16, group: &str) {
        if let Some(groups) = self.breakpoints.get_mut(&addr) {
            groups.remove(group);
            if groups.is_empty() {
                self.breakpoints.remove(&addr);
            }
        }
    }

    /// Clears every breakpoint in `group`, or every breakpoint at all if `group` is `None`.
    pub fn clear_breakpoints(&mut self, group: Option<&str>) {
        match group {
            Some(group) => {
                self.breakpoints.retain(|_, groups| {
                    groups.remove(group);
                    !groups.is_empty()
                });
            }
            None => self.breakpoints.clear(),
        }
    }

    #[must_use]
    pub fn is_breakpoint(&self, addr: u16) -> bool {
        self.breakpoints.get(&addr).is_some_and(|groups| !groups.is_empty())
    }

    /// Fetches, decodes and executes the instruction at `PC`. Returns the number of cycles
    /// consumed, or a [`DecodeError`] for an undefined or variant-gated opcode. A breakpoint
    /// hit or a trap hook returning [`HookOutcome::Halt`] both consume zero cycles without
    /// executing anything.
    pub fn step(&mut self, mem: &mut Memory, ignore_bp: bool) -> Result<u32, DecodeError> {
        if !ignore_bp && self.is_breakpoint(self.regs.pc) {
            return Ok(0);
        }

        if let Some(mut hook) = self.trap_hook.take() {
            let outcome = hook(&mut self.regs, mem);
            self.trap_hook = Some(hook);
            if outcome == HookOutcome::Halt {
                return Ok(0);
            }
        }

        let pc_at_fetch = self.regs.pc;
        let byte = mem.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);

        let entry = OPCODE_TABLE[byte as usize].ok_or(DecodeError::UndefinedOpcode { pc: pc_at_fetch, byte })?;
        if entry.variant == CpuVariant::Wdc65c02 && self.variant == CpuVariant::Mos6502 {
            return Err(DecodeError::Wdc65c02OpcodeUnder6502 { pc: pc_at_fetch, byte });
        }

        let ea = addressing::resolve(entry.mode, self.variant, &mut self.regs, mem);
        let extra = execute::execute(entry.mnemonic, ea, &mut self.regs, mem);
        let total = entry.cycles + extra;
        self.cycles += total as u64;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_with(mem: &mut Memory) -> Cpu {
        let mut cpu = Cpu::new(CpuVariant::Mos6502);
        cpu.reset(mem);
        cpu
    }

    #[test]
    fn reset_reads_vector_and_sets_defaults() {
        let mut mem = Memory::new();
        mem.write_word(0xFFFC, 0x8000);
        let cpu = cpu_with(&mut mem);
        assert_eq!(cpu.regs.pc, 0x8000);
        assert_eq!(cpu.regs.sp, 0xFF);
        assert!(cpu.regs.p.i);
        assert_eq!(cpu.cycles, 0);
    }

    #[test]
    fn scenario_lda_immediate() {
        let mut mem = Memory::new();
        mem.write_word(0xFFFC, 0x8000);
        mem.bulk_load(0x8000, &[0xA9, 0x55]);
        let mut cpu = cpu_with(&mut mem);
        cpu.step(&mut mem, false).unwrap();
        assert_eq!(cpu.regs.a, 0x55);
        assert!(!cpu.regs.p.z);
        assert!(!cpu.regs.p.n);
        assert_eq!(cpu.regs.pc, 0x8002);
    }

    #[test]
    fn breakpoint_blocks_execution_until_cleared() {
        let mut mem = Memory::new();
        mem.write_word(0xFFFC, 0x8000);
        mem.bulk_load(0x8000, &[0xA9, 0x55]);
        let mut cpu = cpu_with(&mut mem);
        cpu.add_breakpoint(0x8000, "main.c");
        assert_eq!(cpu.step(&mut mem, false).unwrap(), 0);
        assert_eq!(cpu.regs.pc, 0x8000);
        cpu.remove_breakpoint(0x8000, "main.c");
        assert_eq!(cpu.step(&mut mem, false).unwrap(), 2);
        assert_eq!(cpu.regs.a, 0x55);
    }

    #[test]
    fn undefined_opcode_raises_decode_error() {
        let mut mem = Memory::new();
        mem.write_word(0xFFFC, 0x8000);
        mem.write(0x8000, 0x02);
        let mut cpu = cpu_with(&mut mem);
        let err = cpu.step(&mut mem, false).unwrap_err();
        assert_eq!(err, DecodeError::UndefinedOpcode { pc: 0x8000, byte: 0x02 });
    }

    #[test]
    fn wdc65c02_opcode_rejected_under_6502() {
        let mut mem = Memory::new();
        mem.write_word(0xFFFC, 0x8000);
        mem.write(0x8000, 0x80); // BRA, 65C02-only
        let mut cpu = cpu_with(&mut mem);
        let err = cpu.step(&mut mem, false).unwrap_err();
        assert_eq!(err, DecodeError::Wdc65c02OpcodeUnder6502 { pc: 0x8000, byte: 0x80 });
    }

    #[test]
    fn trap_hook_halting_consumes_no_cycles() {
        let mut mem = Memory::new();
        mem.write_word(0xFFFC, 0xFFF9);
        let mut cpu = cpu_with(&mut mem);
        cpu.set_trap_hook(Box::new(|_, _| HookOutcome::Halt));
        assert_eq!(cpu.step(&mut mem, false).unwrap(), 0);
        assert_eq!(cpu.regs.pc, 0xFFF9);
    }
}
