use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

/// Identifies which input a failed character lookup came from
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SequenceId {
    /// The sequence laid out along the matrix rows
    X,

    /// The sequence laid out along the matrix columns
    Y,

    /// The wildcard/gap symbol used to derive the gap penalty
    Wildcard,
}

impl Display for SequenceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X => write!(f, "X"),
            Self::Y => write!(f, "Y"),
            Self::Wildcard => write!(f, "wildcard"),
        }
    }
}

#[derive(Debug)]
pub enum GpsaError {
    /// A sequence character has no entry in the character map
    KeyNotFound { symbol: u8, sequence: SequenceId, position: usize },

    /// Grain or tile size must be positive
    InvalidGranularity(usize),

    /// The score matrix does not have the dimensions implied by the inputs
    DimensionMismatch { expected: (usize, usize), actual: (usize, usize) },

    /// A dedicated thread pool needs at least one thread
    InvalidThreadCount(usize),

    /// The rayon thread pool could not be built
    ThreadPool { source: rayon::ThreadPoolBuildError },

    /// The substitution table is not a well formed square table
    InvalidTable(String),

    /// A substitution matrix file could not be parsed
    MatrixParse { line: usize, reason: String },

    /// The FASTA input did not contain any records
    NoSequences { path: PathBuf },

    /// Error variant when we couldn't read from a file
    FileRead { path: PathBuf, source: io::Error },

    /// Other IO errors
    IOError(io::Error),
}

impl Error for GpsaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            Self::ThreadPool { ref source } => Some(source),
            Self::FileRead { ref source, .. } => Some(source),
            Self::IOError(ref source) => Some(source),
            _ => None
        }
    }
}

impl From<io::Error> for GpsaError {
    fn from(value: io::Error) -> Self {
        Self::IOError(value)
    }
}

impl From<rayon::ThreadPoolBuildError> for GpsaError {
    fn from(value: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool {
            source: value
        }
    }
}

impl Display for GpsaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::KeyNotFound { symbol, sequence, position } =>
                write!(f, "Character {:?} at position {position} of sequence {sequence} is not in the character map!", symbol as char),
            Self::InvalidGranularity(size) =>
                write!(f, "Grain/tile size must be a positive integer, got {size}!"),
            Self::DimensionMismatch { expected, actual } =>
                write!(f, "Score matrix is {}x{}, but the inputs require {}x{}!", actual.0, actual.1, expected.0, expected.1),
            Self::InvalidThreadCount(n) =>
                write!(f, "Invalid number of threads: {n}"),
            Self::ThreadPool { source: _ } =>
                write!(f, "Could not build the thread pool!"),
            Self::InvalidTable(ref reason) =>
                write!(f, "Invalid substitution table: {reason}"),
            Self::MatrixParse { line, ref reason } =>
                write!(f, "Could not parse substitution matrix (line {line}): {reason}"),
            Self::NoSequences { ref path } =>
                write!(f, "No sequences found in {}!", path.display()),
            Self::FileRead { ref path, source: _ } =>
                write!(f, "Could not read from file {}!", path.display()),
            Self::IOError(ref err) =>
                err.fmt(f),
        }
    }
}
