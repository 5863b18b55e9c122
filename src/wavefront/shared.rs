use std::marker::PhantomData;

use crate::matrix::ScoreMatrix;
use crate::wavefront::commits::CommitTracker;

/// A view of a mutably borrowed [`ScoreMatrix`] that can be shared by the tasks of a wave.
///
/// Reads and writes are bounds checked. Writes are unsafe: the schedule must guarantee that
/// within a wave every cell is written by at most one task and that no task reads a cell
/// another task is writing in the same wave. When a [`CommitTracker`] is attached, both
/// conditions are checked and violations panic.
pub(crate) struct SharedMatrix<'a> {
    cells: *mut f32,
    rows: usize,
    cols: usize,
    commits: Option<&'a CommitTracker>,
    _borrow: PhantomData<&'a mut [f32]>,
}

// Concurrent access is restricted to disjoint cells by the wave structure of the schedules.
unsafe impl Send for SharedMatrix<'_> {}
unsafe impl Sync for SharedMatrix<'_> {}

impl<'a> SharedMatrix<'a> {
    pub fn new(matrix: &'a mut ScoreMatrix, commits: Option<&'a CommitTracker>) -> Self {
        let (rows, cols) = matrix.dims();
        if let Some(tracker) = commits {
            assert_eq!(tracker.dims(), (rows, cols), "Commit tracker does not match the matrix dimensions!");
        }

        Self {
            cells: matrix.as_mut_slice().as_mut_ptr(),
            rows,
            cols,
            commits,
            _borrow: PhantomData,
        }
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        assert!(i < self.rows && j < self.cols, "Cell ({i}, {j}) is out of bounds for a {}x{} matrix!", self.rows, self.cols);
        i * self.cols + j
    }

    #[inline]
    pub fn read(&self, i: usize, j: usize) -> f32 {
        let offset = self.offset(i, j);
        if let Some(tracker) = self.commits {
            tracker.assert_committed(i, j);
        }

        // SAFETY: in bounds, and the cell was committed before the current wave started or
        // by the current task.
        unsafe { self.cells.add(offset).read() }
    }

    /// # Safety
    /// No other task may access cell `(i, j)` while this write happens.
    #[inline]
    pub unsafe fn write(&self, i: usize, j: usize, value: f32, wave: u32) {
        let offset = self.offset(i, j);
        if let Some(tracker) = self.commits {
            tracker.commit(i, j, wave);
        }

        self.cells.add(offset).write(value)
    }
}

#[cfg(test)]
mod tests {
    use super::SharedMatrix;
    use crate::matrix::ScoreMatrix;
    use crate::wavefront::commits::CommitTracker;

    #[test]
    fn test_write_then_read() {
        let mut matrix = ScoreMatrix::new(2, 2);
        let tracker = CommitTracker::new(2, 2);

        {
            let shared = SharedMatrix::new(&mut matrix, Some(&tracker));
            unsafe { shared.write(1, 0, -2.0, 1) };
            assert_eq!(shared.read(1, 0), -2.0);
        }

        assert_eq!(matrix[(1, 0)], -2.0);
        assert_eq!(tracker.wave_of(1, 0), Some(1));
        assert_eq!(tracker.wave_of(0, 0), None);
    }

    #[test]
    #[should_panic(expected = "read before it was committed")]
    fn test_read_before_commit() {
        let mut matrix = ScoreMatrix::new(2, 2);
        let tracker = CommitTracker::new(2, 2);
        let shared = SharedMatrix::new(&mut matrix, Some(&tracker));

        shared.read(1, 1);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_out_of_bounds_write() {
        let mut matrix = ScoreMatrix::new(2, 2);
        let shared = SharedMatrix::new(&mut matrix, None);

        unsafe { shared.write(2, 0, 1.0, 1) };
    }
}
