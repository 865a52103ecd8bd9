use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gcode_replay::{parse_line, ParsedLine};

/// Generate G-code content of different patterns for benchmarking
fn generate_gcode_content(lines: usize, pattern: &str) -> String {
    let mut content = String::new();

    match pattern {
        "movement_heavy" => {
            for i in 0..lines {
                content.push_str(&format!(
                    "G1 X{:.3} Y{:.3} Z{:.3} F1500\n",
                    (i as f32) * 0.1,
                    (i as f32) * 0.2,
                    (i as f32) * 0.05
                ));
            }
        }
        "packed" => {
            for i in 0..lines {
                content.push_str(&format!(
                    "G1X{:.3}Y{:.3}F1500\n",
                    (i as f32) * 0.1,
                    (i as f32) * 0.2
                ));
            }
        }
        "comment_heavy" => {
            for i in 0..lines {
                content.push_str(&format!(
                    "G1 X{:.1} Y{:.1} ; Move to position {}, segment {}\n",
                    (i as f32) * 0.1,
                    (i as f32) * 0.1,
                    i,
                    i % 100
                ));
            }
        }
        "mixed" => {
            for i in 0..lines {
                match i % 4 {
                    0 => content.push_str(&format!(
                        "G1 X{:.3} Y{:.3} F1500\n",
                        (i as f32) * 0.1,
                        (i as f32) * 0.2
                    )),
                    1 => content.push_str(&format!("; pass {}\n", i / 4)),
                    2 => content.push_str(&format!("M3 S{}\n", 8000 + (i % 50))),
                    3 => content.push_str(&format!("G0 Z{:.2}\n", (i as f32) * 0.1)),
                    _ => unreachable!(),
                }
            }
        }
        _ => {
            for i in 0..lines {
                content.push_str(&format!("G1 X{} Y{}\n", i, i));
            }
        }
    }

    content
}

/// Benchmark parsing single lines with different shapes
fn bench_single_line_parsing(c: &mut Criterion) {
    let test_lines = vec![
        ("simple_move", "G1 X10 Y20"),
        ("complex_move", "G1 X123.456 Y789.012 Z0.3 F1500"),
        ("packed_move", "G1X123.456Y789.012Z0.3F1500"),
        ("with_comment", "G1 X10 Y20 ; Move to next position"),
        ("comment_only", "; just a comment line"),
        ("offset_line", "G10 L20 P1 X0 Y0 Z0"),
    ];

    let mut group = c.benchmark_group("single_line_parsing");
    for (name, line) in test_lines {
        group.bench_with_input(BenchmarkId::from_parameter(name), line, |b, line| {
            b.iter(|| {
                let parsed = parse_line(black_box(line));
                black_box(parsed)
            })
        });
    }
    group.finish();
}

/// Benchmark parsing whole documents of different patterns
fn bench_document_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("document_parsing");

    for pattern in ["movement_heavy", "packed", "comment_heavy", "mixed"] {
        let content = generate_gcode_content(10_000, pattern);
        group.throughput(Throughput::Elements(10_000));
        group.bench_with_input(
            BenchmarkId::from_parameter(pattern),
            &content,
            |b, content| {
                b.iter(|| {
                    let mut words = 0usize;
                    for line in content.lines() {
                        if let ParsedLine::Words(parsed) = parse_line(black_box(line)) {
                            words += parsed.words.len();
                        }
                    }
                    black_box(words)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(parsing_benches, bench_single_line_parsing, bench_document_parsing);
criterion_main!(parsing_benches);
