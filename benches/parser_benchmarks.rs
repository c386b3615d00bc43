// ABOUTME: Benchmark suite for the incremental parser and the serializer.
// ABOUTME: Measures append/try_parse throughput across frame shapes and chunk sizes, plus serializer cost.

use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use respio::serialize::{encode_command, Arg};
use respio::Parser;
use std::time::Duration;

fn bulk_frame_bytes(size: usize) -> Bytes {
    let payload = "A".repeat(size);
    Bytes::from(format!("${}\r\n{}\r\n", size, payload))
}

fn array_frame_bytes(items: usize) -> Bytes {
    let mut buf = format!("*{}\r\n", items);
    for i in 0..items {
        let s = i.to_string();
        buf.push_str(&format!("${}\r\n{}\r\n", s.len(), s));
    }
    Bytes::from(buf)
}

fn parse_whole(bytes: &Bytes) {
    let mut parser = Parser::new();
    parser.append(bytes);
    while parser.try_parse().unwrap().is_some() {}
}

fn bench_parse_simple(c: &mut Criterion) {
    let bytes = Bytes::from_static(b"+OK\r\n");
    c.bench_function("parse/simple", |b| b.iter(|| parse_whole(black_box(&bytes))));
}

fn bench_parse_bulk_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse/bulk");
    group.measurement_time(Duration::from_secs(5));

    for &size in &[16usize, 256, 4096, 65536] {
        let bytes = bulk_frame_bytes(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, bytes| {
            b.iter(|| parse_whole(black_box(bytes)))
        });
    }
    group.finish();
}

fn bench_parse_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse/array");
    group.measurement_time(Duration::from_secs(5));

    for &items in &[4usize, 64, 1024] {
        let bytes = array_frame_bytes(items);
        group.bench_with_input(BenchmarkId::from_parameter(items), &bytes, |b, bytes| {
            b.iter(|| parse_whole(black_box(bytes)))
        });
    }
    group.finish();
}

fn bench_parse_chunked(c: &mut Criterion) {
    let bytes = bulk_frame_bytes(65536);
    let mut group = c.benchmark_group("parse/chunked_vs_whole");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("whole", |b| b.iter(|| parse_whole(black_box(&bytes))));

    group.bench_function("chunks_of_512", |b| {
        b.iter(|| {
            let mut parser = Parser::new();
            for chunk in bytes.chunks(512) {
                parser.append(black_box(chunk));
                while parser.try_parse().unwrap().is_some() {}
            }
        })
    });
    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let args = vec![
        Arg::from("SET"),
        Arg::from("key"),
        Arg::from("a moderately sized value that stands in for a typical payload"),
    ];
    c.bench_function("serialize/set", |b| b.iter(|| encode_command(black_box(&args))));
}

criterion_group!(
    benches,
    bench_parse_simple,
    bench_parse_bulk_sizes,
    bench_parse_array,
    bench_parse_chunked,
    bench_serialize,
);
criterion_main!(benches);
