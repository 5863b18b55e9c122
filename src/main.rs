use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

use gpsa::inputs::AlignmentInputs;
use gpsa::io::{load_first_sequence, load_substitution_matrix, write_score_matrix, FillReport};
use gpsa::scoring::SubstitutionTable;
use gpsa::wavefront::{SchedulerConfig, Strategy, WavefrontScheduler};

mod cli;

use cli::{AlignArgs, BenchArgs, CliArgs, CliSubcommand, ScoringArgs};

/// Set up stderr logging. `RUST_LOG` takes precedence over the verbosity flag.
fn init_logging(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("Invalid log filter")?;

    let stderr_log = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_filter(filter_layer);

    Registry::default().with(stderr_log).init();

    Ok(())
}

fn load_inputs(x_path: &Path, y_path: &Path, scoring: &ScoringArgs) -> Result<AlignmentInputs> {
    let x = load_first_sequence(x_path)
        .with_context(|| format!("Could not load sequence X from {}", x_path.display()))?;
    let y = load_first_sequence(y_path)
        .with_context(|| format!("Could not load sequence Y from {}", y_path.display()))?;

    info!("X: {} ({} bp), Y: {} ({} bp)", x.name, x.sequence.len(), y.name, y.sequence.len());

    let (table, cmap) = match &scoring.matrix {
        Some(path) => load_substitution_matrix(path)
            .with_context(|| format!("Could not load substitution matrix {}", path.display()))?,
        None => SubstitutionTable::match_mismatch(
            scoring.alphabet.to_ascii_uppercase().as_bytes(),
            scoring.match_score,
            scoring.mismatch,
            scoring.gap,
        )?,
    };

    Ok(AlignmentInputs::new(x.sequence, y.sequence, table, cmap)?)
}

fn align_subcommand(args: &AlignArgs) -> Result<()> {
    let inputs = load_inputs(&args.x, &args.y, &args.scoring)?;
    let strategy = Strategy::from(args.strategy);

    let config = SchedulerConfig {
        threads: args.num_threads,
        track_commits: args.check_commits,
    };
    let scheduler = WavefrontScheduler::from_config(&config)?;

    info!("Filling {}x{} matrix with {strategy} (granularity {}, {} threads)...",
        inputs.rows(), inputs.cols(), args.granularity, scheduler.num_threads());

    let start = Instant::now();
    let result = scheduler.fill(&inputs, strategy, args.granularity)
        .context("Could not fill the score matrix")?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    info!("Done in {elapsed_ms:.3} ms. Alignment score: {}", result.matrix.final_score());

    if let Some(path) = &args.output {
        let file = File::create(path)
            .with_context(|| format!("Could not create output file {}", path.display()))?;
        let mut writer = BufWriter::new(file);

        write_score_matrix(&mut writer, &result.matrix, inputs.x(), inputs.y())?;
        writer.flush()?;
    }

    let mut stdout = io::stdout().lock();
    if args.json {
        let report = FillReport::new(&result, strategy, args.granularity, scheduler.num_threads(), elapsed_ms);
        writeln!(stdout, "{}", report.to_json()?)?;
    } else {
        writeln!(stdout, "{}", result.matrix.final_score())?;
    }

    Ok(())
}

fn bench_subcommand(args: &BenchArgs) -> Result<()> {
    if args.repeats == 0 {
        bail!("Number of repeats must be at least 1.");
    }

    let inputs = load_inputs(&args.x, &args.y, &args.scoring)?;
    let config = SchedulerConfig {
        threads: args.num_threads,
        track_commits: false,
    };
    let scheduler = WavefrontScheduler::from_config(&config)?;
    let threads = scheduler.num_threads();

    let reference = scheduler.fill(&inputs, Strategy::Sequential, 1)?;
    let mut stdout = io::stdout().lock();

    for strategy in Strategy::ALL {
        // The sequential fill has no granularity to vary
        let granularities = if strategy == Strategy::Sequential {
            &args.granularity[..1.min(args.granularity.len())]
        } else {
            &args.granularity[..]
        };

        for &granularity in granularities {
            let mut best = None;
            for _ in 0..args.repeats {
                let start = Instant::now();
                let result = scheduler.fill(&inputs, strategy, granularity)
                    .with_context(|| format!("{strategy} failed with granularity {granularity}"))?;
                let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

                if best.as_ref().map_or(true, |(ms, _)| elapsed_ms < *ms) {
                    best = Some((elapsed_ms, result));
                }
            }

            let Some((elapsed_ms, result)) = best else {
                continue;
            };

            let mut report = FillReport::new(&result, strategy, granularity, threads, elapsed_ms);
            let matches = result.matrix == reference.matrix;
            report.matches_reference = Some(matches);

            if !matches {
                warn!(%strategy, granularity, "Score matrix differs from the sequential fill!");
            }

            debug!(%strategy, granularity, elapsed_ms, "Benchmark run done.");
            writeln!(stdout, "{}", report.to_json()?)?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.verbose)?;

    match &args.command {
        Some(CliSubcommand::Align(v)) => align_subcommand(v)?,
        Some(CliSubcommand::Bench(v)) => bench_subcommand(v)?,
        None => bail!("No subcommand given."),
    };

    Ok(())
}
