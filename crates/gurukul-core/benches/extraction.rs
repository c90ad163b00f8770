use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gurukul_core::grading::extract_score;

const SHORT: &str = "Score: 87/100\nStrengths: clear structure.";

fn long_feedback() -> String {
    let mut text = String::new();
    for i in 0..200 {
        text.push_str(&format!(
            "Section {i}: the score breakdown follows below.\nGood use of evidence in paragraph {i}.\n"
        ));
    }
    text.push_str("Final Score - 74 out of 100\n");
    text
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_score");
    let long = long_feedback();

    group.bench_function("short", |b| b.iter(|| extract_score(black_box(SHORT))));
    group.bench_function("long_late_match", |b| {
        b.iter(|| extract_score(black_box(&long)))
    });
    group.bench_function("no_match", |b| {
        b.iter(|| extract_score(black_box("Excellent work overall, 95 points.")))
    });

    group.finish();
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
