//! Value codec benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hostlink_codepage::TextCodec;
use hostlink_types::{RowLayout, SqlInput, SqlType, SqlValue};

fn bench_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_set");

    group.bench_function("varchar", |b| {
        b.iter(|| {
            black_box(
                SqlValue::set(SqlType::VarChar(64), SqlInput::Text("SHIPPED TO WAREHOUSE 7"), None)
                    .unwrap(),
            )
        });
    });
    group.bench_function("bit_data_hex", |b| {
        b.iter(|| {
            black_box(
                SqlValue::set(SqlType::CharForBitData(8), SqlInput::Text("0A1B2C3D4E5F6071"), None)
                    .unwrap(),
            )
        });
    });
    group.bench_function("integer_from_text", |b| {
        b.iter(|| {
            black_box(SqlValue::set(SqlType::Integer, SqlInput::Text("123456"), None).unwrap())
        });
    });

    group.finish();
}

fn bench_field_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_field");
    let codec = TextCodec::for_ccsid(37).unwrap();

    for len in [16u16, 256, 4096] {
        let ty = SqlType::VarChar(len);
        let text = "X".repeat(len as usize);
        let value = SqlValue::set(ty, SqlInput::Text(&text), None).unwrap();
        let mut raw = vec![0u8; ty.wire_size()];

        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::new("encode", len), &value, |b, value| {
            b.iter(|| black_box(value.encode(&mut raw, 0, &codec).unwrap()));
        });

        value.encode(&mut raw, 0, &codec).unwrap();
        group.bench_with_input(BenchmarkId::new("decode", len), &raw, |b, raw| {
            b.iter(|| black_box(SqlValue::decode(ty, raw, 0, &codec).unwrap()));
        });
    }

    group.finish();
}

fn bench_rows(c: &mut Criterion) {
    let codec = TextCodec::for_ccsid(37).unwrap();
    let types = [
        SqlType::Integer,
        SqlType::Char(10),
        SqlType::VarChar(50),
        SqlType::BigInt,
        SqlType::VarBinary(16),
    ];
    let layout = RowLayout::new(types.iter().map(|ty| (*ty, codec.clone())));
    let row = vec![
        SqlValue::set(types[0], SqlInput::Int(42), None).unwrap(),
        SqlValue::set(types[1], SqlInput::Text("PART"), None).unwrap(),
        SqlValue::set(types[2], SqlInput::Text("STAINLESS HEX NUT M8"), None).unwrap(),
        SqlValue::set(types[3], SqlInput::Int(9_000_000_000), None).unwrap(),
        SqlValue::set(types[4], SqlInput::Bytes(&[0xDE, 0xAD, 0xBE, 0xEF]), None).unwrap(),
    ];
    let encoded = layout.encode_row(&row).unwrap();

    let mut group = c.benchmark_group("row");
    group.throughput(Throughput::Bytes(layout.row_len() as u64));
    group.bench_function("encode", |b| {
        b.iter(|| black_box(layout.encode_row(&row).unwrap()));
    });
    group.bench_function("decode", |b| {
        b.iter(|| black_box(layout.decode_row(&encoded).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_set, bench_field_roundtrip, bench_rows);
criterion_main!(benches);
