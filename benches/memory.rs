// This file is part of mos6502dbg.
// Licensed under the GNU Lesser General Public License, v3.0 or later.
// See LICENSE or <https://www.gnu.org/licenses/lgpl-3.0.html> for details.

//! Benchmark for the flat-memory read/write/word helpers.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use mos6502dbg::memory::Memory;

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut mem = Memory::new();
    mem.bulk_load(0x0000, &[0xAA; 0x1000]);

    c.bench_function("read", |b| {
        b.iter(|| black_box(mem.read(black_box(0x1234))));
    });

    c.bench_function("write", |b| {
        b.iter(|| mem.write(black_box(0x1234), black_box(0x55)));
    });

    c.bench_function("read_word", |b| {
        b.iter(|| black_box(mem.read_word(black_box(0x1234))));
    });

    c.bench_function("bulk_load_4k", |b| {
        let payload = [0x42u8; 0x1000];
        b.iter(|| mem.bulk_load(black_box(0x0000), black_box(&payload)));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
