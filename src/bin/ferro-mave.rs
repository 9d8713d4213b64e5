// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! ferro-mave CLI
//!
//! Command-line interface for harmonizing MAVE score tables.

use clap::{Parser, Subcommand};
use ferro_mave::domainome::{build_domain_experiments, read_domainome_table};
use ferro_mave::output::{write_dataset_statistics, write_filtered_entries, write_scaled_fasta, FastaOptions};
use ferro_mave::variant::parse_identifier_strict;
use ferro_mave::{
    get_variant_type, parse_identifier, AggregationEngine, Dataset, InMemoryProvider, OffsetResolver,
    PipelineConfig, ScaleEngine,
};
use flate2::read::MultiGzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "ferro-mave")]
#[command(author, version, about = "MAVE score table harmonizer")]
#[command(
    long_about = "Place MAVE score tables on their reference proteins, pool, filter and rescale them.

Examples:
  ferro-mave parse 'p.[Leu11Pro;Glu12Gly]'
  ferro-mave classify -i identifiers.txt
  ferro-mave resolve --sequence MACDEFG --offset 5 'p.Met6Leu' 'p.Cys8Ser'
  ferro-mave run --dataset scoresets.json.gz --fasta scaled.fasta --statistics stats.tsv"
)]
struct Cli {
    /// Log level or filter directive (e.g. debug, ferro_mave=trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decompose variant identifiers
    Parse {
        /// Identifiers to parse
        identifiers: Vec<String>,

        /// Input file (one identifier per line, use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long, default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Shift every position by this amount before printing
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i64,
    },

    /// Classify variant identifiers
    Classify {
        /// Identifiers to classify
        identifiers: Vec<String>,

        /// Input file (one identifier per line, use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Find the offset placing identifiers on a reference sequence
    Resolve {
        /// Reference protein sequence (one-letter codes)
        #[arg(long)]
        sequence: String,

        /// Declared offset
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i64,

        /// Fallback target sequence
        #[arg(long)]
        fallback: Option<String>,

        /// Identifiers to place
        identifiers: Vec<String>,

        /// Input file (one identifier per line, use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Configuration file (defaults to .ferro-mave.toml, then ~/.config/ferro/mave.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Aggregate, filter and scale a dataset
    Run {
        /// Dataset JSON bundle (.json or .json.gz)
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Domain stability screen (tab-separated, optionally gzipped)
        #[arg(long)]
        domainome: Option<PathBuf>,

        /// Reference proteins FASTA keyed by accession
        #[arg(long)]
        proteins: Option<PathBuf>,

        /// Configuration file (defaults to .ferro-mave.toml, then ~/.config/ferro/mave.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Scaled FASTA output
        #[arg(long)]
        fasta: PathBuf,

        /// Headers and sequences only FASTA output
        #[arg(long)]
        sequences_only: Option<PathBuf>,

        /// Dataset statistics table output
        #[arg(long)]
        statistics: Option<PathBuf>,

        /// Filtered experiments output
        #[arg(long)]
        filtered: Option<PathBuf>,

        /// Write averaged raw scores instead of scaled ones
        #[arg(long)]
        unscaled: bool,

        /// Minimum protein length
        #[arg(long)]
        min_protein_length: Option<usize>,

        /// Minimum substitution coverage
        #[arg(long)]
        min_coverage: Option<f64>,

        /// Minimum position coverage
        #[arg(long)]
        min_length_coverage: Option<f64>,

        /// Minimum normalized missense standard deviation
        #[arg(long)]
        std_filter: Option<f64>,

        /// Reject experiments with widely spread nonsense scores
        #[arg(long)]
        nonsense_std_filter: bool,

        /// Show a progress bar
        #[arg(long)]
        progress: bool,

        /// Aggregate experiments on all cores (requires the `parallel` feature)
        #[arg(long)]
        parallel: bool,
    },
}

/// Initialize tracing with the given filter, logging to stderr.
fn init_tracing(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_new(level).map_err(|e| format!("Invalid log level '{}': {}", level, e))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    Ok(())
}

/// Open a file for reading, decompressing `.gz` files.
fn open_input(path: &Path) -> io::Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path)?;
    let is_gzipped = path.extension().map(|ext| ext == "gz").unwrap_or(false);
    if is_gzipped {
        Ok(Box::new(BufReader::with_capacity(
            1024 * 1024,
            MultiGzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(1024 * 1024, file)))
    }
}

fn create_output(path: &Path) -> io::Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

/// Identifiers from the command line, or else from the input file.
fn collect_identifiers(
    identifiers: Vec<String>,
    input: Option<&PathBuf>,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    if !identifiers.is_empty() {
        return Ok(identifiers);
    }
    let path = input.ok_or("No identifiers given (pass them as arguments or with --input)")?;
    let mut collected = Vec::new();
    for line in open_input(path)?.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        collected.push(line.to_string());
    }
    Ok(collected)
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(PipelineConfig::load_from_path(path)?),
        None => Ok(PipelineConfig::load().unwrap_or_default()),
    }
}

fn run_parse(
    identifiers: Vec<String>,
    input: Option<&PathBuf>,
    format: &str,
    offset: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = io::stdout().lock();
    for identifier in collect_identifiers(identifiers, input)? {
        match format {
            "json" => {
                let parsed = parse_identifier_strict(&identifier)?;
                writeln!(out, "{}", serde_json::to_string(&parsed)?)?;
            }
            _ => {
                let parsed = parse_identifier(&identifier);
                writeln!(out, "{}\t{}", identifier, parsed.apply_offset(offset))?;
            }
        }
    }
    Ok(())
}

fn run_classify(identifiers: Vec<String>, input: Option<&PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = io::stdout().lock();
    for identifier in collect_identifiers(identifiers, input)? {
        writeln!(out, "{}\t{}", identifier, get_variant_type(&identifier))?;
    }
    Ok(())
}

fn run_resolve(
    sequence: &str,
    offset: i64,
    fallback: Option<&str>,
    identifiers: Vec<String>,
    input: Option<&PathBuf>,
    config: Option<&PathBuf>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let identifiers = collect_identifiers(identifiers, input)?;
    let resolver = OffsetResolver::new(config.resolver);
    let resolution = resolver.resolve_identifiers(sequence, offset, &identifiers, fallback);

    let mut out = io::stdout().lock();
    match format {
        "json" => writeln!(out, "{}", serde_json::to_string_pretty(&resolution)?)?,
        _ => {
            let offset = resolution
                .offset
                .map_or_else(|| "unresolved".to_string(), |o| o.to_string());
            writeln!(out, "offset\t{}", offset)?;
            writeln!(out, "hit_rate\t{:.4}", resolution.hit_rate)?;
            writeln!(out, "used_fallback\t{}", resolution.used_fallback)?;
            if let Some(strategy) = resolution.strategy {
                writeln!(out, "strategy\t{}", strategy)?;
            }
            if let Some(seq) = &resolution.corrected_seq {
                writeln!(out, "sequence\t{}", seq)?;
            }
        }
    }
    Ok(())
}

struct RunArgs {
    dataset: Option<PathBuf>,
    domainome: Option<PathBuf>,
    proteins: Option<PathBuf>,
    config: Option<PathBuf>,
    fasta: PathBuf,
    sequences_only: Option<PathBuf>,
    statistics: Option<PathBuf>,
    filtered: Option<PathBuf>,
    unscaled: bool,
    min_protein_length: Option<usize>,
    min_coverage: Option<f64>,
    min_length_coverage: Option<f64>,
    std_filter: Option<f64>,
    nonsense_std_filter: bool,
    progress: bool,
    parallel: bool,
}

fn run_pipeline(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(args.config.as_ref())?;
    let policy = &mut config.aggregation;
    policy.min_protein_length = args.min_protein_length.or(policy.min_protein_length);
    policy.min_coverage = args.min_coverage.or(policy.min_coverage);
    policy.min_length_coverage = args.min_length_coverage.or(policy.min_length_coverage);
    policy.std_filter = args.std_filter.or(policy.std_filter);
    policy.nonsense_std_filter |= args.nonsense_std_filter;
    config.validate()?;

    let mut dataset = match &args.dataset {
        Some(path) => Dataset::from_path(path)?,
        None => Dataset::default(),
    };
    if let Some(path) = &args.domainome {
        let rows = read_domainome_table(open_input(path)?)?;
        for experiment in build_domain_experiments(&rows) {
            dataset.push(experiment);
        }
    }
    if dataset.is_empty() {
        return Err("No experiments to process (pass --dataset and/or --domainome)".into());
    }

    let provider = match &args.proteins {
        Some(path) => InMemoryProvider::from_fasta_reader(open_input(path)?)?,
        None => InMemoryProvider::new(),
    };
    info!(
        "Processing {} experiments against {} reference proteins",
        dataset.len(),
        provider.len()
    );

    let engine = AggregationEngine::from_config(provider, &config);
    let filtered = if args.parallel {
        aggregate_parallel(&mut dataset, &engine)
    } else {
        let pb = if args.progress {
            let pb = ProgressBar::new(dataset.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")?
                    .progress_chars("##-"),
            );
            Some(pb)
        } else {
            None
        };
        let filtered = dataset.aggregate_all(&engine, pb.as_ref());
        if let Some(pb) = pb {
            pb.finish_with_message("aggregated");
        }
        filtered
    };

    let scaled = dataset.scale_all(&ScaleEngine::new(config.scaling.clone()));
    info!("{} experiments scaled", scaled);

    let mut fasta = create_output(&args.fasta)?;
    let mut sequences_only = args
        .sequences_only
        .as_deref()
        .map(create_output)
        .transpose()?;
    write_scaled_fasta(
        &mut fasta,
        sequences_only.as_mut().map(|w| w as &mut dyn Write),
        &dataset,
        FastaOptions {
            write_unscaled: args.unscaled,
        },
    )?;
    fasta.flush()?;
    if let Some(mut w) = sequences_only {
        w.flush()?;
    }

    if let Some(path) = &args.statistics {
        let mut out = create_output(path)?;
        write_dataset_statistics(&mut out, &dataset)?;
        out.flush()?;
    }

    if let Some(path) = &args.filtered {
        let mut out = create_output(path)?;
        write_filtered_entries(&mut out, &filtered)?;
        out.flush()?;
    }

    Ok(())
}

#[cfg(feature = "parallel")]
fn aggregate_parallel(
    dataset: &mut Dataset,
    engine: &AggregationEngine<InMemoryProvider>,
) -> Vec<ferro_mave::FilterReason> {
    dataset.aggregate_all_parallel(engine)
}

#[cfg(not(feature = "parallel"))]
fn aggregate_parallel(
    dataset: &mut Dataset,
    engine: &AggregationEngine<InMemoryProvider>,
) -> Vec<ferro_mave::FilterReason> {
    tracing::warn!("Built without the parallel feature, aggregating sequentially");
    dataset.aggregate_all(engine, None)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Commands::Parse {
            identifiers,
            input,
            format,
            offset,
        } => run_parse(identifiers, input.as_ref(), &format, offset),
        Commands::Classify { identifiers, input } => run_classify(identifiers, input.as_ref()),
        Commands::Resolve {
            sequence,
            offset,
            fallback,
            identifiers,
            input,
            config,
            format,
        } => run_resolve(
            &sequence,
            offset,
            fallback.as_deref(),
            identifiers,
            input.as_ref(),
            config.as_ref(),
            &format,
        ),
        Commands::Run {
            dataset,
            domainome,
            proteins,
            config,
            fasta,
            sequences_only,
            statistics,
            filtered,
            unscaled,
            min_protein_length,
            min_coverage,
            min_length_coverage,
            std_filter,
            nonsense_std_filter,
            progress,
            parallel,
        } => run_pipeline(RunArgs {
            dataset,
            domainome,
            proteins,
            config,
            fasta,
            sequences_only,
            statistics,
            filtered,
            unscaled,
            min_protein_length,
            min_coverage,
            min_length_coverage,
            std_filter,
            nonsense_std_filter,
            progress,
            parallel,
        }),
    }
}
