// This file is part of mos6502dbg.
// Licensed under the GNU Lesser General Public License, v3.0 or later.
// See LICENSE or <https://www.gnu.org/licenses/lgpl-3.0.html> for details.

//! A 6502/65C02 interpreter and cc65 source-level debugging engine.
//!
//! This crate emulates the user-mode instruction set of the 6502 and 65C02, runs programs
//! built against the sim65 paravirtualized host ABI (console I/O, file I/O, argv, exit), and
//! layers a source-level debugger on top by parsing cc65 `.dbg` files: breakpoints by source
//! line, step-in/step-over/step-out, synthetic call-stack reconstruction, and variable lookup
//! by scope.
//!
//! # How to use
//!
//! Load a program with [`loader::load`], build a [`controller::Controller`] for the CPU
//! variant the loader reports, reset it, and drive it with [`controller::Controller::run_slice`]:
//!
//! ```ignore
//! let image = std::fs::read("prog.bin")?;
//! let mut ctl = mos6502dbg::controller::Controller::new(
//!     mos6502dbg::opcodes::CpuVariant::Mos6502, 0, vec![], std::env::current_dir()?,
//! );
//! let result = ctl.load_image(&image, None)?;
//! ctl.set_sp_zp(result.sp_addr as u16);
//! ctl.cpu.reset(&ctl.mem.clone());
//! loop {
//!     match ctl.run_slice(10_000) {
//!         mos6502dbg::controller::SliceResult::Terminated(code) => break,
//!         _ => continue,
//!     }
//! }
//! ```
//!
//! If the program carries cc65 debug info (a `.dbg` file alongside the binary, discoverable
//! with [`debuginfo::resolve_debug_file`]), attach it with
//! [`controller::Controller::attach_debug_info`] to unlock source-level stepping and
//! breakpoints.
//!
//! ## Potential issues
//! - Decimal (BCD) mode is not implemented: `ADC`/`SBC` always use binary arithmetic,
//!   regardless of the D flag (`DESIGN.md`'s resolution of an open question).
//! - There is no cycle-exact bus contention or DMA model; `Cpu::step`'s cycle count is the
//!   nominal 6502/65C02 timing table only.

pub mod addressing;
pub mod controller;
pub mod cpu;
pub mod debuginfo;
pub mod disassembler;
pub mod evaluate;
pub mod execute;
pub mod host;
pub mod loader;
pub mod memory;
pub mod opcodes;
pub mod status;
mod utils;

pub use controller::{Controller, Frame, SliceResult, StepMode, StopReason};
pub use cpu::{Cpu, DecodeError, HookOutcome, Registers, RegistersPatch};
pub use debuginfo::DebugInfo;
pub use evaluate::{EvalResult, NotFound};
pub use host::{HostAbi, HostIoError};
pub use loader::{LoaderError, LoadResult};
pub use memory::Memory;
pub use opcodes::{AddressingMode, CpuVariant, Mnemonic, OpcodeEntry, OPCODE_TABLE};
pub use status::StatusFlags;
