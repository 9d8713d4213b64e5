//! Performance benchmarks for ferro-mave
//!
//! Run with: cargo bench
//! Run specific benchmark: cargo bench -- parsing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ferro_mave::offset::{check_offset, OffsetResolver};
use ferro_mave::protein::one_to_three;
use ferro_mave::variant::{parse_identifier, ParsedVariant};
use ferro_mave::{AggregationEngine, Experiment, NoProvider, ScaleEngine, ScoreSet, ScoreTable};

/// Deterministic pseudo-random protein of `len` residues.
fn protein(len: usize) -> String {
    const RESIDUES: &[u8] = b"ACDEFGHIKLMNPQRSTVWY";
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            RESIDUES[(state % RESIDUES.len() as u64) as usize] as char
        })
        .collect()
}

/// One substitution per position, numbered with `delta` subtracted.
fn identifiers(seq: &str, delta: i64) -> Vec<String> {
    seq.chars()
        .enumerate()
        .map(|(i, wt)| {
            let alt = if wt == 'A' { "Gly" } else { "Ala" };
            format!("p.{}{}{}", one_to_three(wt).unwrap_or("Xaa"), i as i64 + 1 - delta, alt)
        })
        .filter(|id| !id.contains('-'))
        .collect()
}

// =============================================================================
// Parsing benchmarks
// =============================================================================

fn bench_parsing(c: &mut Criterion) {
    let variants = vec![
        ("sub", "p.Leu11Pro"),
        ("nonsense", "p.Arg5Ter"),
        ("synonymous", "p.Met12="),
        ("accession", "NP_000509.1:p.Glu6Val"),
        ("fs", "p.Arg97Glyfs*16"),
        ("delins", "p.Lys2_Met4delinsTrpAla"),
        ("multi", "p.[Leu11Pro;Glu12Gly]"),
        ("invalid", "p.Met1?"),
    ];

    let mut group = c.benchmark_group("parsing");

    for (name, variant) in &variants {
        group.bench_with_input(BenchmarkId::new("type", name), variant, |b, v| {
            b.iter(|| parse_identifier(black_box(v)))
        });
    }

    group.finish();
}

fn bench_apply_offset(c: &mut Criterion) {
    let variant = parse_identifier("p.[Leu11Pro;Glu12Gly]");
    c.bench_function("apply_offset/multi", |b| {
        b.iter(|| variant.apply_offset(black_box(-10)))
    });
}

// =============================================================================
// Offset benchmarks
// =============================================================================

fn bench_check_offset(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_offset");

    for len in [100usize, 1000, 5000] {
        let seq = protein(len);
        let variants: Vec<ParsedVariant> = identifiers(&seq, 0)
            .iter()
            .map(|id| parse_identifier(id))
            .collect();
        group.throughput(Throughput::Elements(variants.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &variants, |b, v| {
            b.iter(|| check_offset(black_box(&seq), 0, v))
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let resolver = OffsetResolver::default();

    for len in [100usize, 500] {
        let seq = protein(len);
        let variants: Vec<ParsedVariant> = identifiers(&seq, 7)
            .iter()
            .map(|id| parse_identifier(id))
            .collect();

        group.bench_with_input(BenchmarkId::new("declared", len), &variants, |b, v| {
            b.iter(|| resolver.resolve(black_box(&seq), 7, v, None))
        });
        // wrong declared offset forces the alignment strategy
        group.bench_with_input(BenchmarkId::new("alignment", len), &variants, |b, v| {
            b.iter(|| resolver.resolve(black_box(&seq), 250, v, None))
        });
    }

    group.finish();
}

// =============================================================================
// Aggregation and scaling benchmarks
// =============================================================================

fn bench_aggregate_and_scale(c: &mut Criterion) {
    let seq = protein(300);
    let rows: Vec<(String, Option<f64>)> = identifiers(&seq, 0)
        .into_iter()
        .enumerate()
        .map(|(i, id)| (id, Some((i % 17) as f64 / 4.0 - 2.0)))
        .collect();
    let experiment = Experiment::new("bench", "Benchmark")
        .with_score_set(ScoreSet::new(ScoreTable::from_rows("t1", rows.clone())).with_target_sequence(seq.clone()))
        .with_score_set(ScoreSet::new(ScoreTable::from_rows("t2", rows)).with_target_sequence(seq.clone()));

    let engine = AggregationEngine::new(NoProvider);
    c.bench_function("aggregate/two_tables", |b| {
        b.iter(|| engine.aggregate(black_box(&experiment)))
    });

    let aggregate = match engine.aggregate(&experiment) {
        Ok(aggregate) => aggregate,
        Err(reason) => panic!("benchmark experiment rejected: {}", reason.reason()),
    };
    let scaler = ScaleEngine::default();
    c.bench_function("scale/300_positions", |b| {
        b.iter(|| scaler.scale(black_box(&aggregate)))
    });
}

criterion_group!(
    benches,
    bench_parsing,
    bench_apply_offset,
    bench_check_offset,
    bench_resolve,
    bench_aggregate_and_scale,
);
criterion_main!(benches);
