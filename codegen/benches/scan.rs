//! Benchmarks for the block scan and serialization.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use unibitmap_codegen::{
    index, BlockBitmapBuilder, SerializeOptions, TableSerializer, TransitionCompressor,
};
use unibitmap_test_helpers::ToyOracle;
use unibitmap_ucd::{PropertyOracle, WidthClass};

fn toy() -> ToyOracle {
    ToyOracle::new()
        .set(0x41..0x5B)
        .set(0x61..0x7B)
        .set(0x400..0x800)
        .set(0x4E00..0x9FFF)
        .width(0x1100..0x1160, WidthClass::Wide)
        .width(0x2E80..0xA4D0, WidthClass::Wide)
}

fn bench_block_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_scan");
    let toy = toy();
    let sel = toy.resolve("TOY").unwrap();

    for end in [0x1_0000u32, 0x3_0000, 0x11_0000].iter() {
        group.throughput(Throughput::Elements(u64::from(*end)));
        let builder = BlockBitmapBuilder::new().domain_end(*end);
        group.bench_with_input(BenchmarkId::from_parameter(format!("{end:#x}")), end, |b, _| {
            b.iter(|| black_box(builder.build(&toy, &sel).unwrap()));
        });
    }

    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let toy = toy();
    let sel = toy.resolve("TOY").unwrap();
    let (table, data) = BlockBitmapBuilder::new()
        .domain_end(0x2_0000)
        .build(&toy, &sel)
        .unwrap();
    let index = index::encode(&table);
    let serializer = TableSerializer::new(toy.description(), sel, SerializeOptions::default());

    c.bench_function("serialize_bytes", |b| {
        b.iter(|| black_box(serializer.serialize(&table, &data, &index)));
    });
}

fn bench_transitions(c: &mut Criterion) {
    let toy = toy();
    let compressor = TransitionCompressor::new().domain_end(0x2_0000);

    c.bench_function("compress_widths", |b| {
        b.iter(|| black_box(compressor.compress(&toy).unwrap()));
    });
}

criterion_group!(benches, bench_block_scan, bench_serialize, bench_transitions);
criterion_main!(benches);
