//! End-to-end pipeline tests
//!
//! Datasets are built in memory or read from temporary files, aggregated,
//! scaled and written out the way the `run` subcommand does it.

use std::fs;
use std::io::{BufReader, Write};

use flate2::write::GzEncoder;
use flate2::Compression;
use ferro_mave::domainome::{build_domain_experiments, read_domainome_table};
use ferro_mave::output::{write_dataset_statistics, write_filtered_entries, write_scaled_fasta, FastaOptions};
use ferro_mave::protein::{one_to_three, AminoAcid};
use ferro_mave::{
    AggregationEngine, AggregationPolicy, Dataset, Experiment, InMemoryProvider, NoProvider,
    RejectionCause, ScaleEngine, ScalePolicy, ScoreSet, ScoreTable,
};
use tempfile::TempDir;

fn table(id: &str, rows: &[(&str, f64)]) -> ScoreTable {
    ScoreTable::from_rows(id, rows.iter().map(|(i, s)| (*i, Some(*s))))
}

/// Loss-of-function experiment on `MACD` with a well-populated synonymous class.
fn lof_experiment() -> Experiment {
    let scores = table(
        "urn:mavedb:00000001-a-1",
        &[
            ("p.Met6Leu", -2.0),
            ("p.Ala7Gly", -1.0),
            ("p.Cys8Ser", 0.5),
            ("p.Met6=", 0.0),
            ("p.Ala7=", 0.0),
            ("p.Cys8=", 0.0),
            ("p.Asp9=", 0.0),
            ("_wt", 0.0),
        ],
    );
    Experiment::new("urn:mavedb:00000001-a", "Example protein")
        .with_function_type("Activity")
        .with_score_set(ScoreSet::new(scores).with_offset(-5).with_target_sequence("MACD"))
}

// =============================================================================
// Scaling
// =============================================================================

#[test]
fn test_scaling_scenario() {
    let mut dataset = Dataset::new(vec![lof_experiment()]);
    let filtered = dataset.aggregate_all(&AggregationEngine::new(NoProvider), None);
    assert!(filtered.is_empty());
    assert_eq!(dataset.scale_all(&ScaleEngine::default()), 1);

    let experiment = dataset.get("urn:mavedb:00000001-a").unwrap();
    let scaled = experiment.scaled.as_ref().unwrap();
    assert_eq!(scaled.anchors.neutral, 0.0);
    assert_eq!(scaled.anchors.bottom, -2.0);
    assert_eq!(scaled.anchors.top, 0.5);
    assert_eq!(scaled.get("p.Met1Leu"), Some(0.0));
    assert_eq!(scaled.get("p.Ala2Gly"), Some(0.5));
    assert_eq!(scaled.get("p.Cys3Ser"), Some(2.0));
}

#[test]
fn test_negative_second_scale_shift_disables_second_pass() {
    let aggregate = AggregationEngine::new(NoProvider)
        .aggregate(&lof_experiment())
        .unwrap();
    let engine = ScaleEngine::new(ScalePolicy {
        second_scale_shift: Some(-1.0),
        ..Default::default()
    });
    let scaled = engine.scale(&aggregate).unwrap();
    assert_eq!(scaled.get("p.Met1Leu"), Some(0.0));
    assert_eq!(scaled.get("p.Ala2Gly"), Some(0.5));
    assert_eq!(scaled.get("p.Cys3Ser"), Some(2.0));
}

#[test]
fn test_sparse_synonymous_uses_nonsense_anchor() {
    let scores = table(
        "t1",
        &[
            ("p.Met1Leu", -0.5),
            ("p.Ala2Gly", -1.5),
            ("p.Cys3Ser", 0.0),
            ("p.Cys3Ter", -3.0),
            ("p.Met1=", 0.0),
        ],
    );
    let experiment = Experiment::new("exp", "Sparse")
        .with_score_set(ScoreSet::new(scores).with_target_sequence("MACD"));
    let aggregate = AggregationEngine::new(NoProvider)
        .aggregate(&experiment)
        .unwrap();
    let anchors = ScaleEngine::default().anchors(&aggregate).unwrap();
    assert_eq!(anchors.neutral, 0.0);
    assert_eq!(anchors.bottom, -3.0);
    assert_eq!(anchors.scale(-3.0), 0.0);
}

// =============================================================================
// Coverage
// =============================================================================

/// Every standard substitution at every position of `seq`, each scored 1.0.
fn saturated_rows(seq: &str) -> Vec<(String, Option<f64>)> {
    let mut rows = Vec::new();
    for (i, wt) in seq.chars().enumerate() {
        let Some(wt_three) = one_to_three(wt) else {
            continue;
        };
        for alt in AminoAcid::ALL.iter().filter(|aa| aa.is_standard()) {
            if alt.to_one_letter() != wt {
                rows.push((format!("p.{}{}{}", wt_three, i + 1, alt.to_three_letter()), Some(1.0)));
            }
        }
    }
    rows
}

#[test]
fn test_saturated_coverage_is_one() {
    let rows = saturated_rows("MACD");
    assert_eq!(rows.len(), 4 * 19);
    let experiment = Experiment::new("exp", "Saturated")
        .with_score_set(ScoreSet::new(ScoreTable::from_rows("t", rows)).with_target_sequence("MACD"));
    let aggregate = AggregationEngine::new(NoProvider)
        .aggregate(&experiment)
        .unwrap();
    assert_eq!(aggregate.coverage(), 1.0);
    assert_eq!(aggregate.length_coverage(), 1.0);
}

#[test]
fn test_missing_substitution_lowers_coverage() {
    let mut rows = saturated_rows("MACD");
    rows.pop();
    let experiment = Experiment::new("exp", "Almost saturated")
        .with_score_set(ScoreSet::new(ScoreTable::from_rows("t", rows)).with_target_sequence("MACD"));
    let aggregate = AggregationEngine::new(NoProvider)
        .aggregate(&experiment)
        .unwrap();
    assert!(aggregate.coverage() < 1.0);
    assert_eq!(aggregate.length_coverage(), 1.0);
}

#[test]
fn test_length_coverage_filter_respects_reasonable_count() {
    let experiment = Experiment::new("exp", "Half covered").with_score_set(
        ScoreSet::new(table("t", &[("p.Met1Leu", 1.0), ("p.Ala2Gly", 0.0)]))
            .with_target_sequence("MACD"),
    );
    let strict = AggregationEngine::new(NoProvider).with_policy(AggregationPolicy {
        min_length_coverage: Some(0.75),
        ..Default::default()
    });
    let reason = strict.aggregate(&experiment).unwrap_err();
    assert!(matches!(
        reason.cause,
        RejectionCause::LowLengthCoverage { covered: 2, .. }
    ));

    let lenient = AggregationEngine::new(NoProvider).with_policy(AggregationPolicy {
        min_length_coverage: Some(0.75),
        reasonable_length_coverage: 2,
        ..Default::default()
    });
    assert!(lenient.aggregate(&experiment).is_ok());
}

// =============================================================================
// Outputs
// =============================================================================

#[test]
fn test_write_outputs() {
    let failing = Experiment::new("urn:mavedb:00000002-a", "Nothing measured");
    let mut dataset = Dataset::new(vec![lof_experiment(), failing]);
    let filtered = dataset.aggregate_all(&AggregationEngine::new(NoProvider), None);
    dataset.scale_all(&ScaleEngine::default());

    let dir = TempDir::new().unwrap();
    let fasta_path = dir.path().join("scaled.fasta");
    let sequences_path = dir.path().join("sequences.fasta");
    let stats_path = dir.path().join("statistics.tsv");
    let filtered_path = dir.path().join("filtered.tsv");

    let mut fasta = fs::File::create(&fasta_path).unwrap();
    let mut sequences = fs::File::create(&sequences_path).unwrap();
    let written = write_scaled_fasta(
        &mut fasta,
        Some(&mut sequences as &mut dyn Write),
        &dataset,
        FastaOptions::default(),
    )
    .unwrap();
    assert_eq!(written, 1);
    drop(fasta);
    drop(sequences);

    let mut stats = fs::File::create(&stats_path).unwrap();
    assert_eq!(write_dataset_statistics(&mut stats, &dataset).unwrap(), 1);
    drop(stats);

    let mut filtered_out = fs::File::create(&filtered_path).unwrap();
    write_filtered_entries(&mut filtered_out, &filtered).unwrap();
    drop(filtered_out);

    let header =
        ">Example_protein_urn:mavedb:00000001-a\t<urn:mavedb:00000001-a,None,function_type=Activity";
    let fasta_text = fs::read_to_string(&fasta_path).unwrap();
    let lines: Vec<&str> = fasta_text.lines().collect();
    assert_eq!(
        lines,
        vec![
            header,
            "<p.Met1Leu #scaled_effect:0",
            "<p.Ala2Gly #scaled_effect:0.5",
            "<p.Cys3Ser #scaled_effect:2",
            "MACD",
        ]
    );

    let sequences_text = fs::read_to_string(&sequences_path).unwrap();
    assert_eq!(sequences_text, format!("{}\nMACD\n", header));

    let stats_text = fs::read_to_string(&stats_path).unwrap();
    let rows: Vec<Vec<&str>> = stats_text.lines().map(|l| l.split('\t').collect()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].len(), 14);
    assert_eq!(rows[1][0], "Example_protein_urn:mavedb:00000001-a");
    assert_eq!(rows[1][1], "4");
    assert_eq!(rows[1][2], "3");
    assert_eq!(rows[1][5], "[-2 : 0.5]");
    assert_eq!(rows[1][9], "None");

    let filtered_text = fs::read_to_string(&filtered_path).unwrap();
    assert_eq!(
        filtered_text,
        "urn:mavedb:00000002-a\tNothing measured\texperiment has no score sets\n"
    );
}

#[test]
fn test_unscaled_fasta_writes_averages() {
    let mut dataset = Dataset::new(vec![lof_experiment()]);
    dataset.aggregate_all(&AggregationEngine::new(NoProvider), None);

    let mut out = Vec::new();
    let options = FastaOptions {
        write_unscaled: true,
    };
    assert_eq!(write_scaled_fasta(&mut out, None, &dataset, options).unwrap(), 1);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("<p.Met1Leu #scaled_effect:-2\n"));
    assert!(text.contains("<p.Cys3Ser #scaled_effect:0.5\n"));
}

// =============================================================================
// Inputs
// =============================================================================

const BUNDLE: &str = r#"{
    "experiments": [
        {
            "urn": "urn:mavedb:00000003-a",
            "name": "Bundled",
            "score_sets": [
                {
                    "urn": "urn:mavedb:00000003-a-1",
                    "offset": 10,
                    "scores": [
                        {"hgvs_pro": "NP_TEST.1:p.Lys2Arg", "score": -1.0},
                        {"hgvs_pro": "NP_TEST.1:p.Trp3Gly", "score": 0.5},
                        {"hgvs_pro": "NP_TEST.1:p.Tyr4=", "score": 0.0}
                    ]
                }
            ]
        }
    ]
}"#;

#[test]
fn test_gzip_bundle_with_fasta_reference() {
    let dir = TempDir::new().unwrap();
    let bundle_path = dir.path().join("dataset.json.gz");
    let mut encoder = GzEncoder::new(fs::File::create(&bundle_path).unwrap(), Compression::default());
    encoder.write_all(BUNDLE.as_bytes()).unwrap();
    encoder.finish().unwrap();

    let fasta_path = dir.path().join("proteins.fa");
    fs::write(&fasta_path, ">NP_TEST.1 test protein\nmakwy\n").unwrap();

    let mut dataset = Dataset::from_path(&bundle_path).unwrap();
    let provider = InMemoryProvider::from_fasta(&fasta_path).unwrap();
    assert_eq!(provider.len(), 1);

    let filtered = dataset.aggregate_all(&AggregationEngine::new(provider), None);
    assert!(filtered.is_empty());

    let aggregate = dataset.experiments[0].aggregate.as_ref().unwrap();
    assert_eq!(aggregate.sequence, "MAKWY");
    // declared offset 10 is wrong; the alignment recovers +1
    assert_eq!(aggregate.tables[0].offset, 1);
    assert_eq!(aggregate.missense.get("NP_TEST.1:p.Lys3Arg"), Some(-1.0));
    assert_eq!(aggregate.missense.get("NP_TEST.1:p.Trp4Gly"), Some(0.5));
    assert_eq!(aggregate.synonymous.get("NP_TEST.1:p.Tyr5="), Some(0.0));
}

#[test]
fn test_missing_bundle_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = Dataset::from_path(&dir.path().join("missing.json")).unwrap_err();
    assert!(err.to_string().contains("missing.json"));
}

#[test]
fn test_domainome_table() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("domainome.tsv");
    fs::write(
        &path,
        "domain_ID\tpos\tmut_ID\taa_seq\tx\ty\tscaled_fitness\n\
         P1_SH3_1\t20\tP1_M20L\tLACD\t.\t.\t-0.8\n\
         P1_SH3_1\t21\tP1_A21G\tMGCD\t.\t.\t-0.1\n\
         P1_SH3_1\t23\tP1_D23E\tMACE\t.\t.\t0.05\n\
         P1_SH3_1\t22\tP1_C22*\tMA*D\t.\t.\t-1.0\n",
    )
    .unwrap();

    let rows = read_domainome_table(BufReader::new(fs::File::open(&path).unwrap())).unwrap();
    assert_eq!(rows.len(), 4);
    let mut dataset = Dataset::new(build_domain_experiments(&rows));
    assert_eq!(dataset.len(), 1);

    let filtered = dataset.aggregate_all(&AggregationEngine::new(NoProvider), None);
    assert!(filtered.is_empty());
    assert_eq!(dataset.scale_all(&ScaleEngine::default()), 1);

    let scaled = dataset.experiments[0].scaled.as_ref().unwrap();
    assert_eq!(scaled.anchors.bottom, -1.0);
    assert!((scaled.get("p.Met1Leu").unwrap() - 0.2).abs() < 1e-12);
    assert!((scaled.get("p.Asp4Glu").unwrap() - 1.05).abs() < 1e-12);
}
