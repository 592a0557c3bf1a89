use core_text::TextBuffer;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn long_lines(lines: usize, len: usize) -> String {
    let line: String = "lorem ipsum dolor sit amet ".chars().cycle().take(len).collect();
    vec![line; lines].join("\n")
}

fn bench_rewrap(c: &mut Criterion) {
    let mut group = c.benchmark_group("rewrap");
    for len in [80usize, 1_000, 10_000] {
        let text = long_lines(200, len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &text, |b, text| {
            let mut buf = TextBuffer::from_text(text);
            let mut width = 40;
            b.iter(|| {
                // Alternate widths so every iteration rebuilds the index.
                width = if width == 40 { 41 } else { 40 };
                buf.set_wrap_width(Some(width));
                black_box(buf.display_len());
            });
        });
    }
    group.finish();
}

fn bench_append_stream(c: &mut Criterion) {
    let chunk = "\x1b[32mok\x1b[0m line of streamed output\n".repeat(64);
    c.bench_function("append_stream", |b| {
        b.iter(|| {
            let mut buf = TextBuffer::new();
            buf.append_str(black_box(&chunk), core_terminal::OutputMode::Normal);
            black_box(buf.line_count());
        });
    });
}

criterion_group!(benches, bench_rewrap, bench_append_stream);
criterion_main!(benches);
