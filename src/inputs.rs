use tracing::warn;

use crate::errors::{GpsaError, SequenceId};
use crate::scoring::{CharacterMap, SubstitutionTable};

/// The read-only inputs of a fill: the two sequences, the substitution table and the
/// character map indexing it.
///
/// `x` is laid out along the rows of the score matrix and `y` along its columns, so the
/// matrix has `x.len() + 1` rows and `y.len() + 1` columns.
#[derive(Clone, Debug)]
pub struct AlignmentInputs {
    x: Vec<u8>,
    y: Vec<u8>,
    table: SubstitutionTable,
    cmap: CharacterMap,
    gap_penalty: f32,
}

impl AlignmentInputs {
    pub fn new(
        x: impl AsRef<[u8]>,
        y: impl AsRef<[u8]>,
        table: SubstitutionTable,
        cmap: CharacterMap,
    ) -> Result<Self, GpsaError> {
        table.check_map(&cmap)?;
        let gap_penalty = table.gap_penalty(&cmap)?;

        let min_score = table.min_score();
        if gap_penalty > min_score {
            warn!(gap_penalty, min_score, "Gap penalty is not the minimum substitution score.");
        }

        Ok(Self {
            x: x.as_ref().to_vec(),
            y: y.as_ref().to_vec(),
            table,
            cmap,
            gap_penalty,
        })
    }

    pub fn x(&self) -> &[u8] {
        &self.x
    }

    pub fn y(&self) -> &[u8] {
        &self.y
    }

    pub fn table(&self) -> &SubstitutionTable {
        &self.table
    }

    pub fn cmap(&self) -> &CharacterMap {
        &self.cmap
    }

    pub fn gap_penalty(&self) -> f32 {
        self.gap_penalty
    }

    pub fn rows(&self) -> usize {
        self.x.len() + 1
    }

    pub fn cols(&self) -> usize {
        self.y.len() + 1
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    /// Resolve every sequence character to its table index. Done once, before any matrix
    /// cell is written, so lookup failures never leave a partially filled matrix behind.
    pub fn encode(&self) -> Result<EncodedInputs<'_>, GpsaError> {
        Ok(EncodedInputs {
            x: self.cmap.encode(&self.x, SequenceId::X)?,
            y: self.cmap.encode(&self.y, SequenceId::Y)?,
            table: &self.table,
            gap_penalty: self.gap_penalty,
        })
    }
}

/// Sequences translated to substitution table indices.
#[derive(Debug)]
pub struct EncodedInputs<'a> {
    x: Vec<usize>,
    y: Vec<usize>,
    table: &'a SubstitutionTable,
    gap_penalty: f32,
}

impl EncodedInputs<'_> {
    pub fn rows(&self) -> usize {
        self.x.len() + 1
    }

    pub fn cols(&self) -> usize {
        self.y.len() + 1
    }

    pub fn gap_penalty(&self) -> f32 {
        self.gap_penalty
    }

    /// Substitution score for matrix cell `(i, j)`, i.e., `sub(X[i-1], Y[j-1])`.
    #[inline]
    pub fn substitution(&self, i: usize, j: usize) -> f32 {
        self.table.score(self.x[i - 1], self.y[j - 1])
    }

    /// Boundary value of row or column `k`.
    #[inline]
    pub fn boundary(&self, k: usize) -> f32 {
        // Keep the origin at +0, a negative penalty would make it -0
        if k == 0 {
            0.0
        } else {
            k as f32 * self.gap_penalty
        }
    }

    /// The recurrence for an interior cell, given its three predecessors.
    #[inline]
    pub fn cell(&self, i: usize, j: usize, diag: f32, up: f32, left: f32) -> f32 {
        let matched = diag + self.substitution(i, j);
        let deleted = up + self.gap_penalty;
        let inserted = left + self.gap_penalty;

        matched.max(deleted).max(inserted)
    }
}
