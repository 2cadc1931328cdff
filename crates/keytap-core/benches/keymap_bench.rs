//! Criterion benchmarks for the per-keystroke hot path.
//!
//! Every captured key goes through `KeyCode::from_vk`, a queue push from the
//! hook callback, and one rendering on the consumer side.  The push must stay
//! far below the ~300ms timeout Windows gives a low-level hook procedure.
//!
//! Run with:
//! ```bash
//! cargo bench --package keytap-core --bench keymap_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use keytap_core::{key_queue, KeyCode, OutputFormat, OverflowPolicy};

/// VK codes covering letters, controls, function keys and Latin-1 escapes.
const BENCH_VK_CODES: &[u32] = &[
    0x41,  // 'A'
    0x5A,  // 'Z'
    0x0D,  // VK_RETURN
    0x1B,  // VK_ESCAPE
    0x20,  // VK_SPACE
    0x70,  // VK_F1
    0xA0,  // VK_LSHIFT
    0xBA,  // VK_OEM_1
    0x100, // truncates to 0
];

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    for format in [
        OutputFormat::Quoted,
        OutputFormat::Decimal,
        OutputFormat::Hex,
        OutputFormat::Name,
    ] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{format:?}")),
            &format,
            |b, &format| {
                b.iter(|| {
                    for &vk in BENCH_VK_CODES {
                        black_box(KeyCode::from_vk(black_box(vk)).render(format));
                    }
                })
            },
        );
    }

    group.finish();
}

fn bench_queue_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_push");

    for policy in [OverflowPolicy::DropNewest, OverflowPolicy::DropOldest] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{policy:?}")),
            &policy,
            |b, &policy| {
                // A full queue exercises the overflow branch on every push.
                let (tx, _rx) = key_queue(16, policy).expect("capacity is non-zero");
                b.iter(|| {
                    for &vk in BENCH_VK_CODES {
                        black_box(tx.push(KeyCode::from_vk(black_box(vk))));
                    }
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_render, bench_queue_push);
criterion_main!(benches);
