// This file is part of mos6502dbg.
// Licensed under the GNU Lesser General Public License, v3.0 or later.
// See LICENSE or <https://www.gnu.org/licenses/lgpl-3.0.html> for details.

//! Minimal runner: loads a raw or sim65-headered program image and runs it to completion,
//! wiring its console I/O to the terminal. Demonstrates the library's basic usage.
//!
//! Usage: `run <image file> [arg...]`

use std::io::{Read, Write};

use mos6502dbg::controller::{Controller, SliceResult};

fn main() {
    let mut args = std::env::args();
    let exec = args.next().unwrap();
    let Some(path) = args.next() else {
        eprintln!("Usage: {exec} <image file> [arg...]");
        std::process::exit(1);
    };
    let argv: Vec<String> = std::iter::once(path.clone()).chain(args).collect();

    let mut file = std::fs::File::open(&path).unwrap_or_else(|e| panic!("failed to open {path}: {e}"));
    let mut image = Vec::new();
    file.read_to_end(&mut image).unwrap_or_else(|e| panic!("failed to read {path}: {e}"));

    let cwd = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
    // sp_addr isn't known until the image (and its optional sim65 header) is loaded, so the
    // controller is built with a placeholder and re-pointed at the real one below.
    let mut ctl = Controller::new(mos6502dbg::opcodes::CpuVariant::Mos6502, 0x0000, argv, cwd);
    let result = ctl.load_image(&image, None).unwrap_or_else(|e| panic!("failed to load {path}: {e}"));
    ctl.set_sp_zp(u16::from(result.sp_addr));
    ctl.cpu.reset(&ctl.mem.clone());

    let exit_code = loop {
        match ctl.run_slice(100_000) {
            SliceResult::Yielded => {}
            SliceResult::Stopped(_) => {}
            SliceResult::Terminated(code) => break code,
            SliceResult::WaitingForInput => {
                let mut line = String::new();
                std::io::stdin().read_line(&mut line).ok();
                ctl.feed_console_input(line.as_bytes());
            }
            SliceResult::Decode(err) => {
                eprintln!("decode error: {err}");
                break 1;
            }
        }

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let stderr = std::io::stderr();
        let mut err = stderr.lock();
        for (stream, byte) in ctl.take_output() {
            match stream {
                mos6502dbg::host::Stream::Stdout => out.write_all(&[byte]).ok(),
                mos6502dbg::host::Stream::Stderr => err.write_all(&[byte]).ok(),
            };
        }
    };

    std::process::exit(i32::from(exit_code));
}
