use std::ops::Range;

use rayon::prelude::*;

use crate::wavefront::boundary::fill_boundary;
use crate::wavefront::{par_batches, FillJob, FillStrategy, WaveClock};

/// Inner diagonals with at least this many cells are split across tasks.
const INNER_GRAIN: usize = 64;

/// Two-level wavefront over square tiles of the interior.
///
/// Tile `(p, q)` covers interior cells `(p + 1 ..= p + tile_size, q + 1 ..= q + tile_size)`,
/// clipped to the matrix. Tiles with `p + q = D` form a tile-diagonal; the outer sweep
/// visits tile-diagonals in increasing `D` (in steps of `tile_size`) with a barrier between
/// them, and runs the tiles of one tile-diagonal as concurrent tasks. Inside a tile, cells
/// are visited in anti-diagonal order; a tile only depends on the tiles above, to the left
/// and to the upper left, which all belong to earlier tile-diagonals.
pub(crate) struct TiledBlockDiagonal {
    tile_size: usize,
}

impl TiledBlockDiagonal {
    pub fn new(tile_size: usize) -> Self {
        Self { tile_size }
    }

    /// Tile rows `p` on tile-diagonal `outer`, such that `q = outer - p` is a valid tile column.
    fn tile_rows(&self, outer: usize, max_p: usize, max_q: usize) -> Range<usize> {
        let lo = outer.saturating_sub(max_q).next_multiple_of(self.tile_size);
        let hi = outer.min(max_p) + 1;

        lo..hi.max(lo)
    }

    /// Fill the cells of tile `(p, q)`. Returns the number of cells written.
    fn fill_tile(&self, job: &FillJob<'_>, p: usize, q: usize, wave: u32) -> u64 {
        let (rows, cols) = job.dims();
        let last = self.tile_size - 1;

        // Largest in-tile offsets that still map inside the matrix
        let max_i = last.min(rows - 2 - p);
        let max_j = last.min(cols - 2 - q);

        let mut written = 0;
        for inner in 0..=(max_i + max_j) {
            let lo = inner.saturating_sub(max_j);
            let hi = inner.min(max_i) + 1;
            let compute = |i: usize| {
                let (m, n) = (i + p + 1, inner - i + q + 1);
                debug_assert!(m < rows && n < cols);

                // SAFETY: tiles of one tile-diagonal are disjoint, cells of one inner diagonal
                // are distinct, and their predecessors were committed by earlier inner
                // diagonals of this tile or by earlier tile-diagonals.
                unsafe { job.compute_cell(m, n, wave) }
            };

            if hi - lo > INNER_GRAIN {
                written += par_batches(lo..hi, INNER_GRAIN, compute);
            } else {
                (lo..hi).for_each(compute);
                written += (hi - lo) as u64;
            }
        }

        written
    }
}

impl FillStrategy for TiledBlockDiagonal {
    fn run(&self, job: &FillJob<'_>, clock: &mut WaveClock) {
        let wave = clock.open_boundary();
        fill_boundary(job, self.tile_size, wave);

        let (rows, cols) = job.dims();
        if rows < 2 || cols < 2 {
            clock.complete();
            return;
        }

        // Tile origins lie in [0, rows - 2] x [0, cols - 2]
        let (max_p, max_q) = (rows - 2, cols - 2);

        for outer in (0..=(max_p + max_q)).step_by(self.tile_size) {
            let tile_rows = self.tile_rows(outer, max_p, max_q);
            if tile_rows.is_empty() {
                continue;
            }

            let wave = clock.open_wave(outer);
            let tiles = (tile_rows.end - tile_rows.start).div_ceil(self.tile_size);

            let written: u64 = (0..tiles).into_par_iter()
                .map(|k| {
                    let p = tile_rows.start + k * self.tile_size;
                    self.fill_tile(job, p, outer - p, wave)
                })
                .sum();

            job.visited().add(written);
        }

        clock.complete();
    }
}
