use crate::wavefront::{par_batches, FillJob};

/// Fill row 0 and column 0 in parallel.
///
/// The boundary has no dependencies besides the gap penalty, so both loops run concurrently
/// and each is split into batches of `grain_size` cells. Returns once every boundary cell is
/// committed.
pub(crate) fn fill_boundary(job: &FillJob<'_>, grain_size: usize, wave: u32) {
    let (rows, cols) = job.dims();

    // SAFETY: the column covers (1..rows, 0) and the row (0, 0..cols), every index lands in
    // exactly one batch.
    let (column, row) = rayon::join(
        || par_batches(1..rows, grain_size, |i| unsafe { job.write_boundary(i, 0, wave) }),
        || par_batches(0..cols, grain_size, |j| unsafe { job.write_boundary(0, j, wave) }),
    );

    job.visited().add(column + row);
}
