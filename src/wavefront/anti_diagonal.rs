use std::ops::Range;

use crate::wavefront::boundary::fill_boundary;
use crate::wavefront::{par_batches, FillJob, FillStrategy, WaveClock};

/// One wave per anti-diagonal `d = i + j`.
///
/// Cells on an anti-diagonal only depend on cells of the two previous diagonals, so the
/// cells of a diagonal are independent and are split in tasks of `grain_size` cells.
/// Diagonal `d + 1` starts after every task of diagonal `d` has joined.
pub(crate) struct AntiDiagonal {
    grain_size: usize,
}

impl AntiDiagonal {
    pub fn new(grain_size: usize) -> Self {
        Self { grain_size }
    }
}

/// Rows `i` of the interior cells `(i, d - i)` on anti-diagonal `d`, i.e.,
/// `max(1, d - cols + 1) <= i <= min(d - 1, rows - 1)`. Empty for diagonals without interior
/// cells.
pub(crate) fn diagonal_rows(d: usize, rows: usize, cols: usize) -> Range<usize> {
    let lo = (d + 1).saturating_sub(cols).max(1);
    let hi = d.min(rows);

    lo..hi.max(lo)
}

impl FillStrategy for AntiDiagonal {
    fn run(&self, job: &FillJob<'_>, clock: &mut WaveClock) {
        let wave = clock.open_boundary();
        fill_boundary(job, self.grain_size, wave);

        let (rows, cols) = job.dims();
        for d in 2..(rows + cols - 1) {
            let cells = diagonal_rows(d, rows, cols);
            if cells.is_empty() {
                continue;
            }

            let wave = clock.open_wave(d);

            // SAFETY: the cells of one diagonal are distinct, and their predecessors lie on
            // diagonals d - 1 and d - 2, both committed by earlier waves.
            let written = par_batches(cells, self.grain_size, |i| unsafe {
                job.compute_cell(i, d - i, wave)
            });

            job.visited().add(written);
        }

        clock.complete();
    }
}
