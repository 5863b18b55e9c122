use std::ops::Index;

/// Dense, row-major `rows x cols` table of alignment scores.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl ScoreMatrix {
    /// Allocate a zeroed matrix. Both dimensions are at least one, because row and column 0
    /// always hold the boundary.
    pub fn new(rows: usize, cols: usize) -> Self {
        assert!(rows > 0 && cols > 0, "Score matrix needs at least one row and one column!");

        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i < self.rows && j < self.cols {
            Some(self.data[i * self.cols + j])
        } else {
            None
        }
    }

    pub fn set(&mut self, i: usize, j: usize, value: f32) {
        assert!(i < self.rows && j < self.cols, "Cell ({i}, {j}) is out of bounds for a {}x{} matrix!", self.rows, self.cols);
        self.data[i * self.cols + j] = value;
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.data.chunks_exact(self.cols)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// The global alignment score, stored in the bottom-right cell.
    pub fn final_score(&self) -> f32 {
        self.data[self.data.len() - 1]
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

impl Index<(usize, usize)> for ScoreMatrix {
    type Output = f32;

    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        assert!(i < self.rows && j < self.cols, "Cell ({i}, {j}) is out of bounds for a {}x{} matrix!", self.rows, self.cols);
        &self.data[i * self.cols + j]
    }
}
