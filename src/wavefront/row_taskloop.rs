use crate::wavefront::boundary::fill_boundary;
use crate::wavefront::{FillJob, FillStrategy, WaveClock};

/// Parallel boundary, row-major interior.
///
/// Only the boundary is split into tasks. The interior runs as a single task because every
/// row depends on the previous one, which makes this the partially parallel baseline.
/// The variant that splits each anti-diagonal of the interior into parallel tasks is [`AntiDiagonal`].
///
/// [`AntiDiagonal`]: crate::wavefront::anti_diagonal::AntiDiagonal
pub(crate) struct RowTaskloop {
    grain_size: usize,
}

impl RowTaskloop {
    pub fn new(grain_size: usize) -> Self {
        Self { grain_size }
    }
}

impl FillStrategy for RowTaskloop {
    fn run(&self, job: &FillJob<'_>, clock: &mut WaveClock) {
        let wave = clock.open_boundary();
        fill_boundary(job, self.grain_size, wave);

        let (rows, cols) = job.dims();
        if rows > 1 && cols > 1 {
            let wave = clock.open_wave(1);

            for i in 1..rows {
                for j in 1..cols {
                    // SAFETY: single task, cells are visited in dependency order.
                    unsafe { job.compute_cell(i, j, wave) };
                }
            }

            job.visited().add(((rows - 1) * (cols - 1)) as u64);
        }

        clock.complete();
    }
}

#[cfg(test)]
mod tests {
    use crate::wavefront::tests::{dna_inputs, pseudo_random_seq};
    use crate::wavefront::{Strategy, WavefrontScheduler};

    #[test]
    fn test_grain_sizes() {
        let inputs = dna_inputs(&pseudo_random_seq(30, 3), &pseudo_random_seq(12, 4));
        let scheduler = WavefrontScheduler::new().with_commit_tracking(true);
        let reference = scheduler.fill(&inputs, Strategy::Sequential, 1).unwrap();

        // Grain sizes below, at and above the boundary lengths
        for grain_size in [1, 2, 13, 31, 100] {
            let result = scheduler.fill(&inputs, Strategy::RowTaskloop, grain_size).unwrap();
            assert_eq!(result.matrix, reference.matrix);

            let commits = result.summary.commits.unwrap();
            assert_eq!(commits.wave_of(30, 0), Some(1));
            assert_eq!(commits.wave_of(30, 12), Some(2));
        }
    }
}
