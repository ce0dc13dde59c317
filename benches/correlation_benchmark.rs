use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use csv_eda::{Column, CorrelationMethod, Dataset, summarize_correlation};

/// Deterministic pseudo-random dataset with every 17th cell missing
fn synthetic(columns: usize, rows: usize) -> Dataset {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % 10_000) as f64 / 100.0
    };

    let cols = (0..columns)
        .map(|c| {
            let values = (0..rows)
                .map(|r| if (r + c) % 17 == 0 { None } else { Some(next()) })
                .collect();
            Column::numeric(format!("col_{}", c), values)
        })
        .collect();

    Dataset::from_columns(cols).expect("columns have equal length")
}

fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize_correlation");

    for &(columns, rows) in &[(5, 1_000), (20, 1_000), (20, 10_000)] {
        let dataset = synthetic(columns, rows);
        for method in [CorrelationMethod::Pearson, CorrelationMethod::Spearman] {
            group.bench_with_input(
                BenchmarkId::new(method.as_str(), format!("{}x{}", columns, rows)),
                &dataset,
                |b, ds| b.iter(|| summarize_correlation(black_box(ds), method)),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_summarize);
criterion_main!(benches);
