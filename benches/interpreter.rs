// This file is part of mos6502dbg.
// Licensed under the GNU Lesser General Public License, v3.0 or later.
// See LICENSE or <https://www.gnu.org/licenses/lgpl-3.0.html> for details.

//! Benchmark for the interpreter's hot path: stepping a tight branch loop.
//!
//! Make sure the result of the benchmarked function is used, whether by sending it to
//! black_box, or by returning it from the closure.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use mos6502dbg::cpu::Cpu;
use mos6502dbg::memory::Memory;
use mos6502dbg::opcodes::CpuVariant;

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut mem = Memory::new();
    mem.write_word(0xFFFC, 0x8000);
    mem.bulk_load(0x8000, &[0x4C, 0x00, 0x80]); // JMP $8000, an infinite tight loop

    let mut cpu = Cpu::new(CpuVariant::Mos6502);
    cpu.reset(&mem);

    c.bench_function("step_jmp_loop", |b| {
        b.iter(|| black_box(cpu.step(black_box(&mut mem), true).unwrap()));
    });

    let mut mem_lda = Memory::new();
    mem_lda.write_word(0xFFFC, 0x8000);
    mem_lda.bulk_load(0x8000, &[0xA9, 0x42]); // LDA #$42

    let mut cpu_lda = Cpu::new(CpuVariant::Mos6502);
    cpu_lda.reset(&mem_lda);

    c.bench_function("step_lda_immediate", |b| {
        b.iter(|| {
            cpu_lda.regs.pc = 0x8000;
            black_box(cpu_lda.step(black_box(&mut mem_lda), true).unwrap())
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
