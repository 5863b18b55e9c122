use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use gpsa::wavefront::Strategy;

/// Fill orders selectable on the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Single threaded, row-major
    Sequential,

    /// Parallel boundary, row-major interior
    RowTaskloop,

    /// One parallel wave per anti-diagonal
    AntiDiagonal,

    /// One parallel wave per diagonal of square tiles
    Tiled,
}

impl From<StrategyArg> for Strategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Sequential => Strategy::Sequential,
            StrategyArg::RowTaskloop => Strategy::RowTaskloop,
            StrategyArg::AntiDiagonal => Strategy::AntiDiagonal,
            StrategyArg::Tiled => Strategy::TiledBlockDiagonal,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliArgs {
    /// Set verbosity level. Use multiple times to increase the verbosity level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<CliSubcommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliSubcommand {
    /// Fill the global alignment score matrix of two sequences
    Align(AlignArgs),

    /// Run every strategy and compare it against the sequential fill
    Bench(BenchArgs),
}

#[derive(Args, Debug)]
pub struct ScoringArgs {
    /// Substitution matrix in NCBI format. Its row 0, '*' column defines the gap penalty.
    #[arg(short = 'M', long)]
    #[clap(help_heading = "Scoring")]
    pub matrix: Option<PathBuf>,

    /// Alphabet of the built-in match/mismatch matrix, used when no matrix file is given
    #[arg(long, default_value = "ACGTUN")]
    #[clap(help_heading = "Scoring")]
    pub alphabet: String,

    /// Score for matching symbols
    #[arg(long = "match", default_value = "1", allow_negative_numbers = true)]
    #[clap(help_heading = "Scoring")]
    pub match_score: f32,

    /// Score for mismatching symbols
    #[arg(long, default_value = "-1", allow_negative_numbers = true)]
    #[clap(help_heading = "Scoring")]
    pub mismatch: f32,

    /// Gap penalty
    #[arg(long, default_value = "-2", allow_negative_numbers = true)]
    #[clap(help_heading = "Scoring")]
    pub gap: f32,
}

#[derive(Args, Debug)]
pub struct AlignArgs {
    /// Sequence laid out along the matrix rows (FASTA, optionally gzipped)
    #[clap(help_heading = "Inputs")]
    pub x: PathBuf,

    /// Sequence laid out along the matrix columns (FASTA, optionally gzipped)
    #[clap(help_heading = "Inputs")]
    pub y: PathBuf,

    #[command(flatten)]
    pub scoring: ScoringArgs,

    /// Fill strategy
    #[arg(value_enum, short, long, default_value = "tiled")]
    #[clap(help_heading = "Processing")]
    pub strategy: StrategyArg,

    /// Grain size (cells per task) or tile size, depending on the strategy
    #[arg(short, long, default_value = "64")]
    #[clap(help_heading = "Processing")]
    pub granularity: usize,

    /// Number of worker threads. Defaults to one per CPU.
    #[arg(short = 'j', long = "threads")]
    #[clap(help_heading = "Processing")]
    pub num_threads: Option<usize>,

    /// Check every cell for double writes and reads before commit
    #[arg(long)]
    #[clap(help_heading = "Processing")]
    pub check_commits: bool,

    /// Write the filled matrix as TSV to this file
    #[arg(short, long)]
    #[clap(help_heading = "Outputs")]
    pub output: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    #[clap(help_heading = "Outputs")]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct BenchArgs {
    /// Sequence laid out along the matrix rows (FASTA, optionally gzipped)
    #[clap(help_heading = "Inputs")]
    pub x: PathBuf,

    /// Sequence laid out along the matrix columns (FASTA, optionally gzipped)
    #[clap(help_heading = "Inputs")]
    pub y: PathBuf,

    #[command(flatten)]
    pub scoring: ScoringArgs,

    /// Grain and tile sizes to run
    #[arg(short, long, value_delimiter = ',', default_values_t = vec![1, 4, 16, 64])]
    #[clap(help_heading = "Processing")]
    pub granularity: Vec<usize>,

    /// Number of worker threads. Defaults to one per CPU.
    #[arg(short = 'j', long = "threads")]
    #[clap(help_heading = "Processing")]
    pub num_threads: Option<usize>,

    /// Number of timed repetitions per configuration; the fastest is reported
    #[arg(short, long, default_value = "3")]
    #[clap(help_heading = "Processing")]
    pub repeats: usize,
}
