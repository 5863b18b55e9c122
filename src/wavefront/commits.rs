use std::sync::atomic::{AtomicU32, Ordering};

const UNCOMMITTED: u32 = 0;

/// Records, for every cell, the wave in which it was written.
///
/// Used to catch broken schedules: writing a cell twice, or reading a cell that no earlier
/// wave has committed, panics with the offending coordinates. Relaxed atomics suffice, the
/// barriers between waves order the accesses.
#[derive(Debug)]
pub struct CommitTracker {
    rows: usize,
    cols: usize,
    waves: Vec<AtomicU32>,
}

impl CommitTracker {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            waves: (0..rows * cols).map(|_| AtomicU32::new(UNCOMMITTED)).collect(),
        }
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub(crate) fn commit(&self, i: usize, j: usize, wave: u32) {
        debug_assert_ne!(wave, UNCOMMITTED);

        let prev = self.waves[i * self.cols + j].swap(wave, Ordering::Relaxed);
        assert_eq!(prev, UNCOMMITTED,
            "Concurrency violation: cell ({i}, {j}) written in wave {wave} was already committed in wave {prev}!");
    }

    pub(crate) fn assert_committed(&self, i: usize, j: usize) {
        let wave = self.waves[i * self.cols + j].load(Ordering::Relaxed);
        assert_ne!(wave, UNCOMMITTED, "Concurrency violation: cell ({i}, {j}) read before it was committed!");
    }

    /// The wave that wrote cell `(i, j)`, if any.
    pub fn wave_of(&self, i: usize, j: usize) -> Option<u32> {
        if i >= self.rows || j >= self.cols {
            return None;
        }

        match self.waves[i * self.cols + j].load(Ordering::Relaxed) {
            UNCOMMITTED => None,
            wave => Some(wave),
        }
    }

    /// Row-major wave numbers, `0` for cells never written.
    pub fn wave_map(&self) -> Vec<u32> {
        self.waves.iter()
            .map(|wave| wave.load(Ordering::Relaxed))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.waves.iter()
            .all(|wave| wave.load(Ordering::Relaxed) != UNCOMMITTED)
    }
}

#[cfg(test)]
mod tests {
    use super::CommitTracker;

    #[test]
    fn test_commit_tracking() {
        let tracker = CommitTracker::new(2, 3);
        assert!(!tracker.is_complete());

        for i in 0..2 {
            for j in 0..3 {
                tracker.commit(i, j, (i + j + 1) as u32);
            }
        }

        assert!(tracker.is_complete());
        assert_eq!(tracker.wave_map(), vec![1, 2, 3, 2, 3, 4]);
        assert_eq!(tracker.wave_of(1, 2), Some(4));
        assert_eq!(tracker.wave_of(2, 0), None);
    }

    #[test]
    #[should_panic(expected = "already committed")]
    fn test_double_write() {
        let tracker = CommitTracker::new(2, 2);
        tracker.commit(1, 1, 2);
        tracker.commit(1, 1, 3);
    }
}
