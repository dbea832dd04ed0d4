//! Parser benchmarks.
//!
//! Run with: `cargo bench --package vextc-par`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use vextc_lex::tokenize;
use vextc_par::parse;
use vextc_util::Handler;

fn parse_count(source: &str) -> usize {
    let handler = Handler::new();
    let tokens = tokenize(source, &handler);
    parse(tokens, &handler).len()
}

fn bench_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");

    let program = r#"
        int sq(int n) { return n * n; }

        int total = 0;
        for (int i = 0; i < 50; i++) {
            if (i % 3 == 0 && i % 5 == 0) {
                total += sq(i);
            } else if (i % 3 == 0) {
                total += i;
            } else {
                total -= 1;
            }
        }
        print("total=" + total);
    "#;

    group.throughput(Throughput::Bytes(program.len() as u64));

    group.bench_function("declaration", |b| {
        b.iter(|| parse_count(black_box("int x = 1 + 2 * 3;")))
    });

    group.bench_function("expression_heavy", |b| {
        b.iter(|| {
            parse_count(black_box(
                "bool z = (1 < 2) || (3 >= 4) && !(5 == 6) || 2 ** 3 ** 2 > 100;",
            ))
        })
    });

    group.bench_function("full_program", |b| {
        b.iter(|| parse_count(black_box(program)))
    });

    group.finish();
}

criterion_group!(benches, bench_parser);
criterion_main!(benches);
