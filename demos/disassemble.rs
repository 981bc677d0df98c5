// This file is part of mos6502dbg.
// Licensed under the GNU Lesser General Public License, v3.0 or later.
// See LICENSE or <https://www.gnu.org/licenses/lgpl-3.0.html> for details.

//! Disassembles a raw or sim65-headered program image over a given address range, with
//! source-line annotations if a matching cc65 `.dbg` file is found.
//!
//! Usage: `disassemble <image file> [-b <beginning addr>] [-e <ending addr>]`

use std::io::Read;

use mos6502dbg::debuginfo::{resolve_debug_file, DebugInfo};
use mos6502dbg::disassembler::disassemble;
use mos6502dbg::memory::Memory;
use mos6502dbg::loader;

fn main() {
    let mut args = std::env::args();
    let exec = args.next().unwrap();
    let Some(path) = args.next() else {
        println!("Disassembles the instructions in the given input binary file, starting and ending at the given addresses.");
        println!("Usage: {exec} <image file> [-b <beginning addr>] [-e <ending addr>]");
        std::process::exit(1);
    };

    let mut beg: Option<u16> = None;
    let mut end: Option<u16> = None;
    while let Some(arg) = args.next() {
        match &arg[..] {
            "-b" => beg = Some(parse_addr(&args.next().expect("-b needs an address"))),
            "-e" => end = Some(parse_addr(&args.next().expect("-e needs an address"))),
            other => panic!("unknown argument {other}"),
        }
    }

    let mut file = std::fs::File::open(&path).unwrap_or_else(|e| panic!("failed to open {path}: {e}"));
    let mut image = Vec::new();
    file.read_to_end(&mut image).unwrap_or_else(|e| panic!("failed to read {path}: {e}"));

    let mut mem = Memory::new();
    let result = loader::load(&mut mem, &image, None).unwrap_or_else(|e| panic!("failed to load {path}: {e}"));

    let debug = resolve_debug_file(std::path::Path::new(&path))
        .and_then(|p| std::fs::read_to_string(p).ok())
        .map(|text| DebugInfo::parse(&text));

    let start = beg.unwrap_or(result.load_addr);
    let stop = end.unwrap_or(start.wrapping_add(0x100));

    let mut pc = start;
    while pc < stop {
        let inst = disassemble(&mem, pc, debug.as_ref(), result.cpu_type);
        println!("${pc:04X}: {}", inst.text);
        pc = pc.wrapping_add(inst.len() as u16);
    }
}

fn parse_addr(s: &str) -> u16 {
    let s = s.trim_start_matches('$');
    u16::from_str_radix(s, 16).unwrap_or_else(|_| s.parse().unwrap_or_else(|_| panic!("bad address {s}")))
}
