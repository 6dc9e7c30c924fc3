//! Streaming pipeline benchmarks.
//!
//! Measures end-to-end row throughput of `merge` and `slice` over in-memory CSV and text,
//! and how the stage channel capacity affects a multi-stage chain.

use std::io::{self, Cursor};

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hose::execution::{ExecutionOptions, Pipeline};
use hose::formats::{CsvReader, CsvWriter, JsonWriter, RowReader, TextReader, TextWriter};
use hose::ops::{RunOptions, Window, merge, slice};
use hose::processing::{ColumnSelect, Predicate};

const ROWS: usize = 20_000;

fn csv_input(rows: usize) -> Vec<u8> {
    let mut out = String::from("id,group,x,y,label\n");
    for i in 0..rows {
        out.push_str(&format!("{i},{},{}.5,,{}\n", i % 4, i % 97, i % 2));
    }
    out.into_bytes()
}

fn text_input(rows: usize) -> Vec<u8> {
    (0..rows).map(|i| format!("line {i}\n")).collect::<String>().into_bytes()
}

fn csv_reader(data: &[u8]) -> Box<dyn RowReader> {
    Box::new(CsvReader::new(Cursor::new(data.to_vec())))
}

fn bench_merge_csv(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_csv");
    group.sample_size(20);
    let data = csv_input(ROWS);
    group.throughput(Throughput::Elements((ROWS * 2) as u64));

    group.bench_function("passthrough", |b| {
        b.iter(|| {
            let mut writer = CsvWriter::new(io::sink());
            let summary = merge(
                vec![csv_reader(&data), csv_reader(&data)],
                Pipeline::new(ExecutionOptions::default()),
                &mut writer,
                &RunOptions::default(),
            )
            .unwrap();
            black_box(summary.rows_written)
        })
    });

    group.bench_function("filter_select_json", |b| {
        b.iter(|| {
            let mut writer = JsonWriter::new(io::sink());
            let pipeline = Pipeline::new(ExecutionOptions::default())
                .with_stage(Predicate::new("group=1").unwrap())
                .with_stage(ColumnSelect::new("label,x".parse().unwrap()));
            let summary = merge(
                vec![csv_reader(&data), csv_reader(&data)],
                pipeline,
                &mut writer,
                &RunOptions::default(),
            )
            .unwrap();
            black_box(summary.rows_written)
        })
    });

    group.finish();
}

fn bench_stage_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("stage_capacity");
    group.sample_size(20);
    let data = csv_input(ROWS);
    group.throughput(Throughput::Elements(ROWS as u64));

    for capacity in [0usize, 1, 64, 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                b.iter(|| {
                    let opts = ExecutionOptions {
                        stage_capacity: capacity,
                        ..Default::default()
                    };
                    let pipeline = Pipeline::new(opts)
                        .with_stage(ColumnSelect::new("y,x,id".parse().unwrap()))
                        .with_stage(ColumnSelect::new("x,id".parse().unwrap()))
                        .with_stage(ColumnSelect::new("id".parse().unwrap()));
                    let mut writer = CsvWriter::new(io::sink());
                    let summary =
                        merge(vec![csv_reader(&data)], pipeline, &mut writer, &RunOptions::default())
                            .unwrap();
                    black_box(summary.rows_written)
                })
            },
        );
    }

    group.finish();
}

fn bench_slice_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("slice_text");
    group.sample_size(20);
    let data = text_input(ROWS);

    for (from, to) in [(0i64, 100i64), (ROWS as i64 / 2, -1), (ROWS as i64 - 100, -1)] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{from}..{to}")),
            &(from, to),
            |b, &(from, to)| {
                b.iter(|| {
                    let reader: Box<dyn RowReader> =
                        Box::new(TextReader::new(Cursor::new(data.clone())));
                    let mut writer = TextWriter::new(io::sink());
                    let summary = slice(
                        reader,
                        Window::new(from, to).unwrap(),
                        Pipeline::new(ExecutionOptions::default()),
                        &mut writer,
                        &RunOptions::default(),
                    )
                    .unwrap();
                    black_box(summary.rows_written)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_merge_csv, bench_stage_capacity, bench_slice_text);
criterion_main!(benches);
