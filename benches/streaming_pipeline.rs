//! Benchmarks for streaming pipeline performance
//!
//! This benchmark measures:
//! - Line decoding over whole and fragmented input
//! - Chunk typing and content accumulation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flowwrite::pipeline::SseLineDecoder;
use flowwrite::types::{StreamAccumulator, StreamChunk};

/// Sample frames as a DeepSeek chat stream delivers them
const FRAMES: &[&str] = &[
    r#"data: {"id":"c1","object":"chat.completion.chunk","created":1700000000,"model":"deepseek-chat","choices":[{"index":0,"delta":{"role":"assistant","content":""},"finish_reason":null}]}"#,
    r#"data: {"id":"c1","object":"chat.completion.chunk","created":1700000000,"model":"deepseek-chat","choices":[{"index":0,"delta":{"content":"Rust "},"finish_reason":null}]}"#,
    r#"data: {"id":"c1","object":"chat.completion.chunk","created":1700000000,"model":"deepseek-chat","choices":[{"index":0,"delta":{"content":"is "},"finish_reason":null}]}"#,
    r#"data: {"id":"c1","object":"chat.completion.chunk","created":1700000000,"model":"deepseek-chat","choices":[{"index":0,"delta":{"content":"fast."},"finish_reason":null}]}"#,
    r#"data: {"id":"c1","object":"chat.completion.chunk","created":1700000000,"model":"deepseek-chat","choices":[{"index":0,"delta":{},"finish_reason":"stop"}],"usage":{"prompt_tokens":12,"completion_tokens":3,"total_tokens":15}}"#,
    "data: [DONE]",
];

fn body(repeat: usize) -> Vec<u8> {
    let one = FRAMES.join("\n\n") + "\n\n";
    one.repeat(repeat).into_bytes()
}

fn bench_line_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_decoding");
    let input = body(50);
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("single_push", |b| {
        b.iter(|| {
            let mut decoder = SseLineDecoder::new();
            decoder.push(black_box(&input))
        })
    });

    for size in [7usize, 64, 1024] {
        group.bench_with_input(BenchmarkId::new("fragmented", size), &size, |b, &size| {
            b.iter(|| {
                let mut decoder = SseLineDecoder::new();
                let mut events = 0;
                for piece in black_box(&input).chunks(size) {
                    events += decoder.push(piece).len();
                }
                events
            })
        });
    }

    group.finish();
}

fn bench_accumulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulation");
    let mut decoder = SseLineDecoder::new();
    let events = decoder.push(&body(50));
    group.throughput(Throughput::Elements(events.len() as u64));

    group.bench_function("type_and_accumulate", |b| {
        b.iter(|| {
            let mut acc = StreamAccumulator::new();
            for event in black_box(&events) {
                if let Ok(chunk) = serde_json::from_value::<StreamChunk>(event.clone()) {
                    acc.push(&chunk);
                }
            }
            acc.finish()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_line_decoding, bench_accumulation);
criterion_main!(benches);
