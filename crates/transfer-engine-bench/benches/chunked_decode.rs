use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use transfer_engine::buffer::ByteBuf;
use transfer_engine::codec::chunked::{ChunkState, decode_chunk};
use transfer_engine_bench::{TestCase, TestFile};

fn build_chunked_body(chunk_len: usize, chunk_count: usize) -> Vec<u8> {
    let payload = vec![b'x'; chunk_len];
    let mut out = Vec::new();
    for _ in 0..chunk_count {
        out.extend_from_slice(format!("{chunk_len:x}\r\n").as_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out
}

fn create_test_cases() -> Vec<(TestCase, Vec<u8>)> {
    let small = build_chunked_body(16, 4);
    let normal = build_chunked_body(512, 32);
    let large = build_chunked_body(8192, 64);

    vec![
        (TestCase::small("small_chunked_body", TestFile::new("small.chunked", &[])), small),
        (TestCase::normal("normal_chunked_body", TestFile::new("normal.chunked", &[])), normal),
        (TestCase::large("large_chunked_body", TestFile::new("large.chunked", &[])), large),
    ]
}

fn benchmark_chunked_decoder(criterion: &mut Criterion) {
    let cases = create_test_cases();
    let mut group = criterion.benchmark_group("chunked_decode");

    for (case, body) in cases {
        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &body, |b, body| {
            b.iter_batched_ref(
                || {
                    let mut buf = ByteBuf::new();
                    buf.append(body);
                    (buf, ChunkState::default())
                },
                |(buf, state)| {
                    let progress = decode_chunk(buf, state).expect("input should be valid chunked framing");
                    black_box(progress);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(chunked_decode, benchmark_chunked_decoder);
criterion_main!(chunked_decode);
