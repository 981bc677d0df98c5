// This file is part of mos6502dbg.
// Licensed under the GNU Lesser General Public License, v3.0 or later.
// See LICENSE or <https://www.gnu.org/licenses/lgpl-3.0.html> for details.

//! The debug controller: the step-mode state machine, synthetic call-stack
//! reconstruction, and source-path resolution.
//!
//! A small prioritized state machine drives the core across instruction boundaries,
//! deciding after each one whether the current step/run-to/breakpoint request is satisfied.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::cpu::{Cpu, DecodeError, HookOutcome};
use crate::debuginfo::DebugInfo;
use crate::host::HostAbi;
use crate::memory::Memory;
use crate::opcodes::{CpuVariant, Mnemonic, OPCODE_TABLE};

/// Why a slice stopped and raised a `stopped` event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Entry,
    Breakpoint,
    Step,
    Pause,
}

/// What a call to [`Controller::run_slice`] produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliceResult {
    /// Ran the whole instruction budget without a stop condition; call again.
    Yielded,
    Stopped(StopReason),
    Terminated(u8),
    WaitingForInput,
    Decode(DecodeError),
}

/// The step-mode state machine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepMode {
    /// Run until breakpoint, trap-halt, or suspend-for-input.
    None,
    /// Keep stepping while PC stays in `allowed`; stop as soon as it leaves.
    StepIn { allowed: (u16, u16) },
    /// Like `StepIn`, but a `JSR` is treated as one line (steps over the call).
    Next { allowed: (u16, u16) },
    /// Run until PC == `target`, then apply `restore`'s check once (`None` just stops).
    RunTo { target: u16, restore: Option<Box<StepMode>> },
    /// Run until the frame entered at `entry_sp` returns.
    StepOut { entry_sp: u8 },
}

enum Decision {
    Stop,
    Run(StepMode),
}

impl StepMode {
    fn in_range(pc: u16, (start, end): (u16, u16)) -> bool {
        pc >= start && pc < end
    }

    fn evaluate(self, pc: u16, mnemonic: Option<Mnemonic>, sp: u8, mem: &Memory) -> Decision {
        match self {
            StepMode::None => Decision::Run(StepMode::None),
            StepMode::StepIn { allowed } => {
                if Self::in_range(pc, allowed) {
                    Decision::Run(StepMode::StepIn { allowed })
                } else {
                    Decision::Stop
                }
            }
            StepMode::Next { allowed } => {
                if mnemonic == Some(Mnemonic::Jsr) {
                    let target = pc.wrapping_add(3);
                    Decision::Run(StepMode::RunTo { target, restore: Some(Box::new(StepMode::Next { allowed })) })
                } else if Self::in_range(pc, allowed) {
                    Decision::Run(StepMode::Next { allowed })
                } else {
                    Decision::Stop
                }
            }
            StepMode::RunTo { target, restore } => {
                if pc == target {
                    match restore {
                        Some(inner) => inner.evaluate(pc, mnemonic, sp, mem),
                        None => Decision::Stop,
                    }
                } else {
                    Decision::Run(StepMode::RunTo { target, restore })
                }
            }
            StepMode::StepOut { entry_sp } => {
                if mnemonic == Some(Mnemonic::Rts) {
                    let sp_after = sp.wrapping_add(2);
                    if sp_after > entry_sp {
                        let lo = mem.read(0x0100 + sp.wrapping_add(1) as u16) as u16;
                        let hi = mem.read(0x0100 + sp.wrapping_add(2) as u16) as u16;
                        let target = (lo | (hi << 8)).wrapping_add(1);
                        return Decision::Run(StepMode::RunTo { target, restore: None });
                    }
                }
                Decision::Run(StepMode::StepOut { entry_sp })
            }
        }
    }
}

/// One synthesized call-stack frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    /// `JSR`'s address for every frame but frame 0, which is the live PC.
    pub pc: u16,
}

/// The debug controller driving the CPU across instruction-boundary decisions.
pub struct Controller {
    pub cpu: Cpu,
    pub mem: Memory,
    host: Rc<RefCell<HostAbi>>,
    debug: Option<DebugInfo>,
    mode: StepMode,
    cwd: PathBuf,
    pause_requested: bool,
}

impl Controller {
    #[must_use]
    pub fn new(variant: CpuVariant, sp_zp: u16, argv: Vec<String>, cwd: PathBuf) -> Self {
        let host = Rc::new(RefCell::new(HostAbi::new(sp_zp, argv)));
        let mut cpu = Cpu::new(variant);
        let hook_host = Rc::clone(&host);
        cpu.set_trap_hook(Box::new(move |regs, mem| hook_host.borrow_mut().dispatch(regs, mem)));

        let mut mem = Memory::new();
        for addr in crate::host::HOOK_BASE..=crate::host::HOOK_END {
            mem.write(addr, crate::host::HOOK_FALLTHROUGH);
        }

        Self { cpu, mem, host, debug: None, mode: StepMode::None, cwd, pause_requested: false }
    }

    /// Reports the `entry` stop an embedder sends right after `configurationDone`, before the
    /// target has executed any instruction, so breakpoints can be set against the loaded image
    /// before the first `continue`.
    #[must_use]
    pub fn stop_at_entry(&self) -> SliceResult {
        SliceResult::Stopped(StopReason::Entry)
    }

    /// Requests that the next call to [`Self::run_slice`] stop at the next instruction
    /// boundary with [`StopReason::Pause`], interrupting a run in progress.
    pub fn request_pause(&mut self) {
        self.pause_requested = true;
    }

    pub fn attach_debug_info(&mut self, debug: DebugInfo) {
        self.debug = Some(debug);
    }

    /// Loads a program image into the controller's own memory, in place. Unlike assigning a
    /// freshly built [`Memory`] over `self.mem`, this preserves the hook-page `RTS`
    /// fallthrough bytes [`Self::new`] pre-filled. Also sets the CPU variant the image (or
    /// its sim65 header) calls for.
    pub fn load_image(
        &mut self,
        image: &[u8],
        forced_load_addr: Option<u16>,
    ) -> Result<crate::loader::LoadResult, crate::loader::LoaderError> {
        let result = crate::loader::load(&mut self.mem, image, forced_load_addr)?;
        self.cpu.set_cpu_type(result.cpu_type);
        Ok(result)
    }

    #[must_use]
    pub fn debug_info(&self) -> Option<&DebugInfo> {
        self.debug.as_ref()
    }

    pub fn feed_console_input(&mut self, bytes: &[u8]) {
        self.host.borrow_mut().feed_console_input(bytes);
    }

    /// Re-points the soft-stack-pointer zero-page address, once it is known: `sp-zp` comes
    /// from the sim65 header, not from the controller's own construction.
    pub fn set_sp_zp(&mut self, sp_zp: u16) {
        self.host.borrow_mut().set_sp_zp(sp_zp);
    }

    pub fn take_output(&mut self) -> Vec<(crate::host::Stream, u8)> {
        self.host.borrow_mut().take_output()
    }

    pub fn set_step_mode(&mut self, mode: StepMode) {
        self.mode = mode;
    }

    /// Begins a step-over: steps the single C line at the current PC, treating any `JSR`
    /// it contains as one step
    pub fn begin_next(&mut self) {
        let allowed = self.current_span_range();
        self.mode = StepMode::Next { allowed };
    }

    /// Begins a step-in: like step-over, but a call is followed into.
    pub fn begin_step_in(&mut self) {
        let allowed = self.current_span_range();
        self.mode = StepMode::StepIn { allowed };
    }

    /// Begins a step-out: runs until the current frame returns.
    pub fn begin_step_out(&mut self) {
        self.mode = StepMode::StepOut { entry_sp: self.cpu.regs.sp };
    }

    /// Begins a run-to-cursor.
    pub fn begin_run_to(&mut self, target: u16) {
        self.mode = StepMode::RunTo { target, restore: None };
    }

    fn current_span_range(&self) -> (u16, u16) {
        let pc = self.cpu.regs.pc;
        let Some(debug) = &self.debug else { return (pc, pc.wrapping_add(1)) };
        let Some(&span_id) = debug.spans_containing(pc).first() else { return (pc, pc.wrapping_add(1)) };
        let Some(span) = debug.span(span_id) else { return (pc, pc.wrapping_add(1)) };
        (span.abs_start as u16, span.abs_end() as u16)
    }

    /// Drives the CPU for up to `max_instructions`, stopping early on a breakpoint,
    /// termination, an input-blocked read, a decode error, or a step-mode-driven stop
    ///
    pub fn run_slice(&mut self, max_instructions: u32) -> SliceResult {
        for i in 0..max_instructions {
            if let Some(code) = self.host.borrow().exit_code() {
                return SliceResult::Terminated(code);
            }

            if std::mem::take(&mut self.pause_requested) {
                return SliceResult::Stopped(StopReason::Pause);
            }

            let pc = self.cpu.regs.pc;
            // The first instruction of a slice is allowed to sit on a standing breakpoint:
            // otherwise `continue` from a `Stopped(Breakpoint)` would immediately re-stop at
            // the same PC forever, with no way to step off it.
            if i > 0 && self.cpu.is_breakpoint(pc) {
                return SliceResult::Stopped(StopReason::Breakpoint);
            }

            let byte = self.mem.read(pc);
            let mnemonic = OPCODE_TABLE[byte as usize].map(|e| e.mnemonic);
            match std::mem::replace(&mut self.mode, StepMode::None).evaluate(pc, mnemonic, self.cpu.regs.sp, &self.mem) {
                Decision::Stop => {
                    self.mode = StepMode::None;
                    return SliceResult::Stopped(StopReason::Step);
                }
                Decision::Run(mode) => self.mode = mode,
            }

            match self.cpu.step(&mut self.mem, true) {
                Ok(_) => {}
                Err(err) => return SliceResult::Decode(err),
            }

            if self.host.borrow().is_waiting_for_input() {
                return SliceResult::WaitingForInput;
            }
            if let Some(code) = self.host.borrow().exit_code() {
                return SliceResult::Terminated(code);
            }
        }
        SliceResult::Yielded
    }

    /// Scans page 1 from `SP+1` upward, synthesizing a frame at each `JSR` return address
    /// found. Frame 0 is always the live PC. Bounded by `max_frames`
    #[must_use]
    pub fn synthetic_frames(&self, max_frames: usize) -> Vec<Frame> {
        let mut frames = vec![Frame { pc: self.cpu.regs.pc }];
        let mut addr = 0x0100u16 + self.cpu.regs.sp as u16 + 1;
        while frames.len() < max_frames && addr <= 0x01FF {
            if addr == 0x01FF {
                break; // no room for a second stack byte
            }
            let lo = self.mem.read(addr) as u16;
            let hi = self.mem.read(addr.wrapping_add(1)) as u16;
            let ret = lo | (hi << 8);
            let jsr_addr = ret.wrapping_sub(2);
            if self.mem.read(jsr_addr) == 0x20 {
                frames.push(Frame { pc: jsr_addr });
                addr = addr.wrapping_add(2);
            } else {
                addr = addr.wrapping_add(1);
            }
        }
        frames.truncate(max_frames);
        frames
    }

    /// Resolves a debug-info file name to a path on disk: absolute names are used as-is;
    /// otherwise joined with the configured CWD, retrying one directory up if not found
    ///
    #[must_use]
    pub fn resolve_source_path(&self, name: &str) -> Option<PathBuf> {
        let p = Path::new(name);
        if p.is_absolute() {
            return Some(p.to_path_buf());
        }
        let joined = self.cwd.join(p);
        if joined.exists() {
            return Some(joined);
        }
        if let Some(parent) = self.cwd.parent() {
            let up = parent.join(p);
            if up.exists() {
                return Some(up);
            }
        }
        None
    }

    /// The display name for the function at `pc`: the innermost function-scope's name with
    /// its leading underscore stripped, or `None` if the owning file is a library
    /// or no scope covers `pc`.
    #[must_use]
    pub fn frame_display_name(&self, pc: u16) -> Option<String> {
        let debug = self.debug.as_ref()?;
        if let Some(line) = debug.line_for(pc) {
            if debug.file(line.file_id).is_some_and(|f| f.is_library) {
                return None;
            }
        }
        let scope = debug.scopes_for(pc).into_iter().find(|s| s.is_function())?;
        Some(scope.name.trim_start_matches('_').to_string())
    }

    /// `set_breakpoints(file, lines)`: re-arms every breakpoint in `group` to
    /// exactly the given source lines, dropping whatever was previously armed under that
    /// group tag (the normal DAP "replace all breakpoints for this file" contract). A line
    /// with no attached span (blank line, comment) simply arms nothing for it.
    pub fn set_breakpoints(&mut self, file: &str, lines: &[u32], group: &str) {
        self.cpu.clear_breakpoints(Some(group));
        let Some(debug) = &self.debug else { return };
        let Some(file_id) = debug.file_by_name(file).map(|f| f.id) else { return };
        for &line in lines {
            for addr in debug.addresses_for_line(file_id, line) {
                self.cpu.add_breakpoint(addr, group);
            }
        }
    }

    /// `evaluate(expr)`
    pub fn evaluate(&self, expr: &str) -> Result<crate::evaluate::EvalResult, crate::evaluate::NotFound> {
        crate::evaluate::evaluate(expr, &self.cpu.regs, &self.mem, self.debug.as_ref())
    }

    /// `stack_trace(start, levels)`: the window `[start, start+levels)` of
    /// [`Self::synthetic_frames`], frame 0 being the live PC.
    #[must_use]
    pub fn stack_trace(&self, start: usize, levels: usize) -> Vec<Frame> {
        self.synthetic_frames(start.saturating_add(levels)).into_iter().skip(start).collect()
    }

    /// `scopes(frame)`
    #[must_use]
    pub fn scopes(&self, frame_pc: u16) -> Vec<&crate::debuginfo::Scope> {
        self.debug.as_ref().map(|d| d.scopes_for(frame_pc)).unwrap_or_default()
    }

    /// `variables(ref)`, keyed by scope id.
    #[must_use]
    pub fn variables(&self, scope_id: u32) -> Vec<&crate::debuginfo::CSymbol> {
        self.debug.as_ref().map(|d| d.variables_for(scope_id)).unwrap_or_default()
    }

    /// `read_memory(segId, offset, count)` `None` if `seg_id` is unknown.
    #[must_use]
    pub fn read_memory(&self, seg_id: u32, offset: u32, count: u32) -> Option<Vec<u8>> {
        let start = self.debug.as_ref()?.segment(seg_id)?.start.wrapping_add(offset) as u16;
        Some((0..count).map(|i| self.mem.read(start.wrapping_add(i as u16))).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_controller() -> Controller {
        Controller::new(CpuVariant::Mos6502, 0x0002, vec![], PathBuf::from("/tmp"))
    }

    #[test]
    fn scenario_synthetic_stack_three_frames() {
        let mut ctl = new_controller();
        ctl.cpu.regs.sp = 0xFB;
        ctl.mem.write(0x01FC, 0x05);
        ctl.mem.write(0x01FD, 0x02);
        ctl.mem.write(0x01FE, 0x56);
        ctl.mem.write(0x01FF, 0x3D);
        ctl.mem.write(0x0203, 0x20);
        ctl.mem.write(0x3D54, 0x20);
        let frames = ctl.synthetic_frames(10);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1].pc, 0x0203);
        assert_eq!(frames[2].pc, 0x3D54);
    }

    #[test]
    fn set_breakpoints_resolves_file_and_line_to_addresses() {
        let mut ctl = new_controller();
        let debug = crate::debuginfo::DebugInfo::parse(
            r#"
file id=1,name="main.c",size=10
seg id=1,name="CODE",start=0x8000,size=256
span id=1,seg=1,start=0,size=3
line file=1,line=5,span=1
"#,
        );
        ctl.attach_debug_info(debug);
        ctl.set_breakpoints("main.c", &[5], "main.c");
        assert!(ctl.cpu.is_breakpoint(0x8000));

        ctl.set_breakpoints("main.c", &[], "main.c");
        assert!(!ctl.cpu.is_breakpoint(0x8000));
    }

    #[test]
    fn evaluate_reads_through_debug_symbol() {
        let mut ctl = new_controller();
        let debug = crate::debuginfo::DebugInfo::parse(r#"sym id=1,name="counter",addr=0x0300,size=1,type="lab""#);
        ctl.attach_debug_info(debug);
        ctl.mem.write(0x0300, 0x2A);
        let result = ctl.evaluate("counter").unwrap();
        assert_eq!(result.address, 0x0300);
        assert_eq!(result.bytes, vec![0x2A]);
    }

    #[test]
    fn read_memory_resolves_segment_relative_offset() {
        let mut ctl = new_controller();
        let debug = crate::debuginfo::DebugInfo::parse(r#"seg id=1,name="CODE",start=0x8000,size=256"#);
        ctl.attach_debug_info(debug);
        ctl.mem.bulk_load(0x8010, &[1, 2, 3]);
        assert_eq!(ctl.read_memory(1, 0x10, 3), Some(vec![1, 2, 3]));
        assert_eq!(ctl.read_memory(99, 0, 1), None);
    }

    #[test]
    fn scenario_step_over_jsr_runs_to_return_then_restores() {
        let mut ctl = new_controller();
        ctl.mem.write_word(0xFFFC, 0x0200);
        ctl.cpu.reset(&ctl.mem.clone());
        ctl.mem.bulk_load(0x0200, &[0x20, 0x00, 0x03]); // JSR $0300
        ctl.mem.bulk_load(0x0300, &[0x60]); // RTS
        ctl.set_step_mode(StepMode::Next { allowed: (0x0200, 0x0203) });
        let result = ctl.run_slice(10);
        assert_eq!(result, SliceResult::Stopped(StopReason::Step));
        assert_eq!(ctl.cpu.regs.pc, 0x0203);
    }

    #[test]
    fn scenario_paravirt_exit() {
        let mut ctl = new_controller();
        ctl.mem.write_word(0xFFFC, 0x7FFE);
        ctl.cpu.reset(&ctl.mem.clone());
        ctl.mem.bulk_load(0x7FFE, &[0xA9, 0x01]); // LDA #1
        ctl.mem.write(0x8000, 0xEA); // NOP filler
        ctl.mem.bulk_load(0x8001, &[0x4C, 0xF9, 0xFF]); // JMP $FFF9
        let result = ctl.run_slice(10);
        assert_eq!(result, SliceResult::Terminated(1));
    }
}
