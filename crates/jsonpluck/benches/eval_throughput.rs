//! Throughput of extracting values from a large document, from memory and
//! from chunked streams.
#![expect(missing_docs)]
use std::{fmt::Write, hint::black_box};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use jsonpluck::{PathProgram, chunk_utils::ChunkedReader, compile, eval_bytes, eval_reader};

fn build_payload(items: usize) -> String {
    let mut out = String::from("{\"kind\": \"listing\", \"items\": [\n");
    for i in 0..items {
        if i > 0 {
            out.push_str(",\n");
        }
        let name = ["alpha", "bravo", "charlie"][i % 3];
        write!(
            out,
            "  {{\"id\": {i}, \"value\": {}, \"tags\": [\"t{}\", \"x\\\"y\"], \"name\": \"{name}\", \"meta\": {{\"ok\": {}}}}}",
            i * 7,
            i % 11,
            i % 2 == 0
        )
        .unwrap();
    }
    out.push_str("\n]}\n");
    out
}

const PATHS: [(&str, &str); 4] = [
    ("key", "$.kind+"),
    ("wildcard", "$.items[*].value+"),
    ("filter_after_field", r#"$.items[?(@.name == "bravo")].value+"#),
    ("containers", "$.items[*]+"),
];

fn run_bytes(payload: &[u8], program: &PathProgram) -> usize {
    eval_bytes(payload, program).unwrap().count()
}

fn run_chunks(chunks: &[&[u8]], program: &PathProgram) -> usize {
    eval_reader(ChunkedReader::new(chunks.iter().copied()), program)
        .unwrap()
        .count()
}

fn bench_eval_throughput(c: &mut Criterion) {
    let payload = build_payload(5_000);
    let mut group = c.benchmark_group("eval_throughput");
    group.throughput(Throughput::Bytes(payload.len() as u64));

    for (name, path) in PATHS {
        let program = compile(path).unwrap();
        group.bench_with_input(BenchmarkId::new("bytes", name), &program, |b, program| {
            b.iter(|| black_box(run_bytes(black_box(payload.as_bytes()), program)));
        });

        for &parts in &[100usize, 5_000] {
            let chunks = jsonpluck::chunk_utils::produce_chunks(payload.as_bytes(), parts);
            group.bench_with_input(
                BenchmarkId::new(format!("reader_{name}"), parts),
                &chunks,
                |b, chunks| {
                    b.iter(|| black_box(run_chunks(black_box(chunks), &program)));
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_eval_throughput);
criterion_main!(benches);
