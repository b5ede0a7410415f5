//! Benchmark: decode a stream of encoded messages through a generated-shape
//! record, and a descriptor-set decode of a synthetic schema. Measures the
//! dispatch loop, varint/fixed reads, and submessage recursion; no I/O.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pbwire::{DecodeError, DecodeMessage, ProtoDecoder};

#[derive(Debug, Clone, Default)]
struct Sample {
    timestamp: u64,
    level: i32,
    ratio: f64,
    tag: String,
    readings: Vec<u32>,

    has_timestamp: bool,
    has_level: bool,
    has_ratio: bool,
    has_tag: bool,
}

impl DecodeMessage for Sample {
    fn merge_from(&mut self, pb: &mut ProtoDecoder<'_>) -> Result<(), DecodeError> {
        while let Some((field_num, wire_type)) = pb.next_field()? {
            match field_num {
                1 => pb.parse_integral_field(wire_type, &mut self.timestamp, &mut self.has_timestamp)?,
                2 => pb.parse_zigzag_field(wire_type, &mut self.level, &mut self.has_level)?,
                3 => pb.parse_fp_field(wire_type, &mut self.ratio, &mut self.has_ratio)?,
                4 => pb.parse_bytearray_field(wire_type, &mut self.tag, &mut self.has_tag)?,
                5 => pb.parse_repeated_integral_field(wire_type, &mut self.readings)?,
                _ => pb.skip_field(wire_type)?,
            }
        }
        Ok(())
    }
}

fn encode_varint(mut val: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (val & 0x7f) as u8;
        val >>= 7;
        if val == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

fn encode_sample(seed: u64, out: &mut Vec<u8>) {
    out.push(0x08);
    encode_varint(1_700_000_000 + seed, out);
    out.push(0x10);
    encode_varint(((seed as i64 % 7 - 3) << 1 ^ ((seed as i64 % 7 - 3) >> 63)) as u64, out);
    out.push(0x19);
    out.extend((seed as f64 / 97.0).to_le_bytes());
    out.push(0x22);
    let tag = format!("sensor-{}", seed % 32);
    encode_varint(tag.len() as u64, out);
    out.extend(tag.as_bytes());
    for i in 0..4 {
        out.push(0x28);
        encode_varint(seed.wrapping_mul(31).wrapping_add(i) & 0xffff, out);
    }
}

fn bench_decode(c: &mut Criterion) {
    // One length-prefixed record per message, 4k messages per iteration.
    let mut frames: Vec<Vec<u8>> = Vec::new();
    for seed in 0..4096u64 {
        let mut body = Vec::new();
        encode_sample(seed, &mut body);
        frames.push(body);
    }
    let total: usize = frames.iter().map(Vec::len).sum();

    let mut group = c.benchmark_group("decode");
    group.throughput(criterion::Throughput::Bytes(total as u64));
    group.bench_function("sample_stream", |b| {
        b.iter(|| {
            let mut decoded = 0usize;
            for frame in &frames {
                let sample = Sample::decode(black_box(frame)).expect("decode");
                decoded += sample.readings.len();
            }
            black_box(decoded)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
