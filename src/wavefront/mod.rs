//! Dependency-respecting fills of the global alignment score matrix.
//!
//! Every interior cell depends on its upper-left, upper and left neighbours. The strategies
//! in this module differ in how they order the work such that these dependencies are
//! committed before they are read:
//!
//! * [`Strategy::Sequential`]: boundary, then row-major interior. The reference result.
//! * [`Strategy::RowTaskloop`]: parallel boundary in grain-sized batches, row-major interior.
//! * [`Strategy::AntiDiagonal`]: parallel boundary, then one wave per anti-diagonal with the
//!   cells of a diagonal split into grain-sized tasks.
//! * [`Strategy::TiledBlockDiagonal`]: parallel boundary, then one wave per diagonal of
//!   square tiles, with an inner anti-diagonal sweep inside each tile.
//!
//! Consecutive waves are separated by a fork-join barrier; within a wave all tasks write
//! disjoint cells.

use std::fmt::{Display, Formatter};
use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, trace};

use crate::errors::GpsaError;
use crate::inputs::{AlignmentInputs, EncodedInputs};
use crate::matrix::ScoreMatrix;

pub mod anti_diagonal;
pub mod boundary;
pub mod commits;
pub mod row_taskloop;
pub mod sequential;
pub mod tiled;
pub mod visited;

mod shared;

use anti_diagonal::AntiDiagonal;
pub use commits::CommitTracker;
use row_taskloop::RowTaskloop;
pub use sequential::SequentialFiller;
use shared::SharedMatrix;
use tiled::TiledBlockDiagonal;
pub use visited::VisitedCounter;

/// The available fill orders.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    Sequential,
    RowTaskloop,
    AntiDiagonal,
    TiledBlockDiagonal,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Sequential,
        Strategy::RowTaskloop,
        Strategy::AntiDiagonal,
        Strategy::TiledBlockDiagonal,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::RowTaskloop => "row-taskloop",
            Self::AntiDiagonal => "anti-diagonal",
            Self::TiledBlockDiagonal => "tiled-block-diagonal",
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Progress of a single fill. Waves are identified by a key (the diagonal or tile-diagonal
/// index) that must strictly increase.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FillPhase {
    Uninitialized,
    BoundaryFilled,
    Wave { key: usize },
    Complete,
}

/// Tracks the phase of a fill and hands out wave numbers. Wave 1 is the boundary, interior
/// waves are numbered consecutively from 2 in the order they are opened.
#[derive(Debug)]
pub(crate) struct WaveClock {
    phase: FillPhase,
    waves: u32,
}

impl WaveClock {
    pub fn new() -> Self {
        Self { phase: FillPhase::Uninitialized, waves: 0 }
    }

    pub fn phase(&self) -> FillPhase {
        self.phase
    }

    pub fn waves(&self) -> u32 {
        self.waves
    }

    pub fn open_boundary(&mut self) -> u32 {
        assert_eq!(self.phase, FillPhase::Uninitialized, "Boundary can only be filled once, before any interior wave!");

        self.waves += 1;
        self.phase = FillPhase::BoundaryFilled;

        self.waves
    }

    pub fn open_wave(&mut self, key: usize) -> u32 {
        match self.phase {
            FillPhase::BoundaryFilled => (),
            FillPhase::Wave { key: prev } =>
                assert!(key > prev, "Wave {key} opened after wave {prev}, waves must strictly increase!"),
            other => panic!("Can't open wave {key} in phase {other:?}!"),
        }

        self.waves += 1;
        self.phase = FillPhase::Wave { key };
        trace!(key, wave = self.waves, "open wave");

        self.waves
    }

    pub fn complete(&mut self) {
        assert!(
            matches!(self.phase, FillPhase::BoundaryFilled | FillPhase::Wave { .. }),
            "Can't complete a fill in phase {:?}!", self.phase
        );

        self.phase = FillPhase::Complete;
    }
}

/// Everything the tasks of a parallel fill share.
pub(crate) struct FillJob<'a> {
    inputs: &'a EncodedInputs<'a>,
    matrix: SharedMatrix<'a>,
    visited: &'a VisitedCounter,
}

impl<'a> FillJob<'a> {
    pub fn dims(&self) -> (usize, usize) {
        (self.inputs.rows(), self.inputs.cols())
    }

    pub fn visited(&self) -> &VisitedCounter {
        self.visited
    }

    /// Write boundary cell `(i, 0)` or `(0, j)`.
    ///
    /// # Safety
    /// No other task may write the same cell concurrently.
    #[inline]
    pub unsafe fn write_boundary(&self, i: usize, j: usize, wave: u32) {
        debug_assert!(i == 0 || j == 0);
        self.matrix.write(i, j, self.inputs.boundary(i + j), wave);
    }

    /// Compute interior cell `(i, j)` from its committed predecessors.
    ///
    /// # Safety
    /// The three predecessors must be committed in an earlier wave (or earlier in the same
    /// task), and no other task may write or read `(i, j)` in the current wave.
    #[inline]
    pub unsafe fn compute_cell(&self, i: usize, j: usize, wave: u32) {
        let diag = self.matrix.read(i - 1, j - 1);
        let up = self.matrix.read(i - 1, j);
        let left = self.matrix.read(i, j - 1);

        self.matrix.write(i, j, self.inputs.cell(i, j, diag, up, left), wave);
    }
}

/// A parallel fill order over a [`FillJob`].
pub(crate) trait FillStrategy {
    fn run(&self, job: &FillJob<'_>, clock: &mut WaveClock);
}

/// Run `f` for every index in `cells`, bundling `grain_size` consecutive indices into one
/// task. Returns the number of indices processed, summed over all tasks.
pub(crate) fn par_batches<F>(cells: Range<usize>, grain_size: usize, f: F) -> u64
where
    F: Fn(usize) + Sync,
{
    let Range { start, end } = cells;
    let batches = (end - start).div_ceil(grain_size);

    (0..batches).into_par_iter()
        .map(|batch| {
            let lo = start + batch * grain_size;
            let hi = (lo + grain_size).min(end);
            (lo..hi).for_each(&f);

            (hi - lo) as u64
        })
        .sum()
}

/// Scheduler configuration.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Number of worker threads. `None` runs on the global rayon pool.
    pub threads: Option<usize>,

    /// Record the wave that committed each cell and panic on double writes or reads of
    /// uncommitted cells.
    pub track_commits: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            threads: None,
            track_commits: cfg!(debug_assertions),
        }
    }
}

/// Counters of a completed fill.
#[derive(Debug)]
pub struct FillSummary {
    /// Number of cell writes, always `rows * cols`.
    pub visited: u64,

    /// Number of barrier-delimited phases, including the boundary phase.
    pub waves: u32,

    /// Per-cell wave numbers, if commit tracking was enabled for a parallel strategy.
    pub commits: Option<CommitTracker>,
}

#[derive(Debug)]
pub struct FillResult {
    pub matrix: ScoreMatrix,
    pub summary: FillSummary,
}

impl FillResult {
    pub fn visited(&self) -> u64 {
        self.summary.visited
    }
}

/// Fork-join scheduler running the fill strategies.
#[derive(Debug)]
pub struct WavefrontScheduler {
    pool: Option<rayon::ThreadPool>,
    track_commits: bool,
}

impl Default for WavefrontScheduler {
    fn default() -> Self {
        Self {
            pool: None,
            track_commits: SchedulerConfig::default().track_commits,
        }
    }
}

impl WavefrontScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SchedulerConfig) -> Result<Self, GpsaError> {
        let scheduler = Self::new().with_commit_tracking(config.track_commits);

        match config.threads {
            Some(threads) => scheduler.with_threads(threads),
            None => Ok(scheduler),
        }
    }

    /// Run on a dedicated pool of `threads` workers instead of the global pool.
    pub fn with_threads(mut self, threads: usize) -> Result<Self, GpsaError> {
        if threads == 0 {
            return Err(GpsaError::InvalidThreadCount(threads));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|ix| format!("gpsa-worker-{ix}"))
            .build()?;

        self.pool = Some(pool);
        Ok(self)
    }

    pub fn with_commit_tracking(mut self, enabled: bool) -> Self {
        self.track_commits = enabled;
        self
    }

    pub fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Allocate and fill the score matrix for `inputs`.
    pub fn fill(
        &self,
        inputs: &AlignmentInputs,
        strategy: Strategy,
        granularity: usize,
    ) -> Result<FillResult, GpsaError> {
        check_granularity(granularity)?;
        let encoded = inputs.encode()?;

        let mut matrix = ScoreMatrix::new(inputs.rows(), inputs.cols());
        let summary = self.run(&encoded, &mut matrix, strategy, granularity);

        Ok(FillResult { matrix, summary })
    }

    /// Fill a caller allocated matrix, which must have the dimensions implied by `inputs`.
    /// On error the matrix is left untouched.
    pub fn fill_into(
        &self,
        inputs: &AlignmentInputs,
        matrix: &mut ScoreMatrix,
        strategy: Strategy,
        granularity: usize,
    ) -> Result<FillSummary, GpsaError> {
        check_granularity(granularity)?;

        if matrix.dims() != inputs.dims() {
            return Err(GpsaError::DimensionMismatch { expected: inputs.dims(), actual: matrix.dims() });
        }

        let encoded = inputs.encode()?;
        Ok(self.run(&encoded, matrix, strategy, granularity))
    }

    fn run(
        &self,
        inputs: &EncodedInputs<'_>,
        matrix: &mut ScoreMatrix,
        strategy: Strategy,
        granularity: usize,
    ) -> FillSummary {
        let (rows, cols) = (inputs.rows(), inputs.cols());
        let span = debug_span!("fill", %strategy, granularity, rows, cols);
        let _enter = span.enter();

        let visited = VisitedCounter::new();
        let mut clock = WaveClock::new();
        let mut commits = None;

        if strategy == Strategy::Sequential {
            visited.add(SequentialFiller::fill_encoded(inputs, matrix));
        } else {
            commits = self.track_commits.then(|| CommitTracker::new(rows, cols));

            let job = FillJob {
                inputs,
                matrix: SharedMatrix::new(matrix, commits.as_ref()),
                visited: &visited,
            };

            let clock = &mut clock;
            let mut run = move || match strategy {
                Strategy::RowTaskloop => RowTaskloop::new(granularity).run(&job, clock),
                Strategy::AntiDiagonal => AntiDiagonal::new(granularity).run(&job, clock),
                Strategy::TiledBlockDiagonal => TiledBlockDiagonal::new(granularity).run(&job, clock),
                Strategy::Sequential => unreachable!(),
            };

            match &self.pool {
                Some(pool) => pool.install(run),
                None => run(),
            }
        }

        let visited = visited.total();
        assert_eq!(visited, (rows * cols) as u64,
            "{strategy} visited {visited} cells of a {rows}x{cols} matrix, the schedule is broken!");

        if let Some(tracker) = &commits {
            assert!(tracker.is_complete(), "{strategy} left cells uncommitted!");
        }

        // The sequential fill is a single phase
        let waves = if strategy == Strategy::Sequential { 1 } else { clock.waves() };
        debug!(visited, waves, "Fill complete.");

        FillSummary { visited, waves, commits }
    }
}

fn check_granularity(granularity: usize) -> Result<(), GpsaError> {
    if granularity == 0 {
        Err(GpsaError::InvalidGranularity(granularity))
    } else {
        Ok(())
    }
}

/// Fill the score matrix for `inputs` on the global thread pool.
pub fn fill(inputs: &AlignmentInputs, strategy: Strategy, granularity: usize) -> Result<FillResult, GpsaError> {
    WavefrontScheduler::new().fill(inputs, strategy, granularity)
}

#[cfg(test)]
pub(crate) mod tests {
    use itertools::iproduct;

    use super::*;
    use crate::errors::SequenceId;
    use crate::scoring::SubstitutionTable;

    pub fn dna_inputs(x: &str, y: &str) -> AlignmentInputs {
        let (table, cmap) = SubstitutionTable::match_mismatch(b"ACGTU", 1.0, -1.0, -2.0).unwrap();
        AlignmentInputs::new(x, y, table, cmap).unwrap()
    }

    /// Deterministic pseudo-random DNA sequence
    pub fn pseudo_random_seq(len: usize, seed: u64) -> String {
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                b"ACGT"[(state >> 33) as usize % 4] as char
            })
            .collect()
    }

    fn scheduler() -> WavefrontScheduler {
        WavefrontScheduler::new().with_commit_tracking(true)
    }

    fn assert_laws(inputs: &AlignmentInputs, matrix: &ScoreMatrix) {
        let encoded = inputs.encode().unwrap();
        let gap = inputs.gap_penalty();

        assert_eq!(matrix[(0, 0)], 0.0);
        for i in 0..matrix.rows() {
            assert_eq!(matrix[(i, 0)], i as f32 * gap);
        }
        for j in 0..matrix.cols() {
            assert_eq!(matrix[(0, j)], j as f32 * gap);
        }

        for (i, j) in iproduct!(1..matrix.rows(), 1..matrix.cols()) {
            let expected = (matrix[(i - 1, j - 1)] + encoded.substitution(i, j))
                .max(matrix[(i - 1, j)] + gap)
                .max(matrix[(i, j - 1)] + gap);

            assert_eq!(matrix[(i, j)], expected, "Recurrence violated at ({i}, {j})");
        }
    }

    #[test]
    fn test_golden_score() {
        let inputs = dna_inputs("GATTACA", "GCATGCU");
        let scheduler = scheduler();

        for (strategy, size) in iproduct!(Strategy::ALL, [1, 4, 16]) {
            let result = scheduler.fill(&inputs, strategy, size).unwrap();
            assert_eq!(result.matrix.final_score(), -1.0, "{strategy} with size {size}");
            assert_eq!(result.visited(), 64);
        }
    }

    #[test]
    fn test_cross_strategy_equivalence() {
        let scheduler = scheduler();
        let shapes = [(1, 1), (1, 9), (9, 1), (13, 13), (7, 40), (40, 7), (33, 35), (64, 17)];

        for (seed, (x_len, y_len)) in shapes.into_iter().enumerate() {
            let x = pseudo_random_seq(x_len, seed as u64);
            let y = pseudo_random_seq(y_len, seed as u64 + 100);
            let inputs = dna_inputs(&x, &y);

            let reference = scheduler.fill(&inputs, Strategy::Sequential, 1).unwrap();
            assert_laws(&inputs, &reference.matrix);

            for (strategy, size) in iproduct!(Strategy::ALL, [1, 4, 16]) {
                let result = scheduler.fill(&inputs, strategy, size).unwrap();

                assert_eq!(result.matrix, reference.matrix, "{strategy} with size {size} on {x_len}x{y_len}");
                assert_eq!(result.visited(), ((x_len + 1) * (y_len + 1)) as u64);
                assert_laws(&inputs, &result.matrix);
            }
        }
    }

    #[test]
    fn test_empty_sequence() {
        let scheduler = scheduler();

        for (x, y) in [("", "GATTACA"), ("GATTACA", ""), ("", "")] {
            let inputs = dna_inputs(x, y);
            let (rows, cols) = inputs.dims();

            for strategy in Strategy::ALL {
                let result = scheduler.fill(&inputs, strategy, 4).unwrap();
                assert_eq!(result.visited(), (rows + cols - 1) as u64);
                assert_laws(&inputs, &result.matrix);
            }
        }
    }

    #[test]
    fn test_tile_size_one_matches_anti_diagonal() {
        let scheduler = scheduler();
        let inputs = dna_inputs(&pseudo_random_seq(11, 1), &pseudo_random_seq(23, 2));

        let anti = scheduler.fill(&inputs, Strategy::AntiDiagonal, 3).unwrap();
        let tiled = scheduler.fill(&inputs, Strategy::TiledBlockDiagonal, 1).unwrap();

        assert_eq!(anti.matrix, tiled.matrix);
        assert_eq!(anti.summary.waves, tiled.summary.waves);
        assert_eq!(
            anti.summary.commits.unwrap().wave_map(),
            tiled.summary.commits.unwrap().wave_map()
        );
    }

    #[test]
    fn test_wave_counts() {
        let scheduler = scheduler();
        let inputs = dna_inputs("GATTACA", "GCATGCU");

        // 8x8 matrix: diagonals 2..=14 hold interior cells
        let anti = scheduler.fill(&inputs, Strategy::AntiDiagonal, 1).unwrap();
        assert_eq!(anti.summary.waves, 1 + 13);

        // Tiles of size 4 start at 0 and 4 in both directions, giving tile diagonals 0, 4, 8
        let tiled = scheduler.fill(&inputs, Strategy::TiledBlockDiagonal, 4).unwrap();
        assert_eq!(tiled.summary.waves, 1 + 3);

        let rows = scheduler.fill(&inputs, Strategy::RowTaskloop, 4).unwrap();
        assert_eq!(rows.summary.waves, 2);

        let commits = tiled.summary.commits.unwrap();
        assert_eq!(commits.wave_of(0, 5), Some(1));
        assert_eq!(commits.wave_of(1, 1), Some(2));
        assert_eq!(commits.wave_of(5, 1), Some(3));
        assert_eq!(commits.wave_of(7, 7), Some(4));
    }

    #[test]
    fn test_dedicated_pool() {
        let scheduler = WavefrontScheduler::from_config(&SchedulerConfig { threads: Some(3), track_commits: true }).unwrap();
        assert_eq!(scheduler.num_threads(), 3);

        let inputs = dna_inputs(&pseudo_random_seq(50, 7), &pseudo_random_seq(45, 8));
        let reference = scheduler.fill(&inputs, Strategy::Sequential, 1).unwrap();
        let tiled = scheduler.fill(&inputs, Strategy::TiledBlockDiagonal, 8).unwrap();

        assert_eq!(reference.matrix, tiled.matrix);
    }

    #[test]
    fn test_invalid_configuration() {
        let inputs = dna_inputs("GATTACA", "GCATGCU");

        for strategy in Strategy::ALL {
            assert!(matches!(fill(&inputs, strategy, 0), Err(GpsaError::InvalidGranularity(0))));
        }

        let mut wrong_dims = ScoreMatrix::new(8, 7);
        assert!(matches!(
            scheduler().fill_into(&inputs, &mut wrong_dims, Strategy::AntiDiagonal, 1),
            Err(GpsaError::DimensionMismatch { expected: (8, 8), actual: (8, 7) })
        ));

        assert!(matches!(WavefrontScheduler::new().with_threads(0), Err(GpsaError::InvalidThreadCount(0))));
    }

    #[test]
    fn test_lookup_failure_leaves_matrix_untouched() {
        let inputs = dna_inputs("GATTACA", "GCANGCU");
        let mut matrix = ScoreMatrix::new(8, 8);
        matrix.set(3, 3, 42.0);

        for strategy in Strategy::ALL {
            let result = scheduler().fill_into(&inputs, &mut matrix, strategy, 2);
            assert!(matches!(
                result,
                Err(GpsaError::KeyNotFound { symbol: b'N', sequence: SequenceId::Y, position: 3 })
            ));
        }

        assert_eq!(matrix[(3, 3)], 42.0);
        assert_eq!(matrix[(0, 7)], 0.0);
    }

    #[test]
    fn test_par_batches() {
        use std::sync::atomic::{AtomicU64, Ordering};

        let sum = AtomicU64::new(0);
        let processed = par_batches(3..103, 7, |k| {
            sum.fetch_add(k as u64, Ordering::Relaxed);
        });

        assert_eq!(processed, 100);
        assert_eq!(sum.load(Ordering::Relaxed), (3..103).sum::<u64>());
        assert_eq!(par_batches(5..5, 4, |_| ()), 0);
    }

    #[test]
    fn test_wave_clock() {
        let mut clock = WaveClock::new();
        assert_eq!(clock.phase(), FillPhase::Uninitialized);
        assert_eq!(clock.open_boundary(), 1);
        assert_eq!(clock.open_wave(2), 2);
        assert_eq!(clock.open_wave(5), 3);
        assert_eq!(clock.phase(), FillPhase::Wave { key: 5 });
        clock.complete();
        assert_eq!(clock.phase(), FillPhase::Complete);
    }

    #[test]
    #[should_panic]
    fn test_wave_clock_rejects_repeated_wave() {
        let mut clock = WaveClock::new();
        clock.open_boundary();
        clock.open_wave(3);
        clock.open_wave(3);
    }

    #[test]
    #[should_panic]
    fn test_wave_clock_requires_boundary() {
        let mut clock = WaveClock::new();
        clock.open_wave(1);
    }
}
