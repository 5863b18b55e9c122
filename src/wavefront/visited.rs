use std::sync::atomic::{AtomicU64, Ordering};

/// Number of cell writes of a fill. Tasks reduce their local counts at each barrier and add
/// the sum here, so no update is lost.
#[derive(Debug, Default)]
pub struct VisitedCounter {
    count: AtomicU64,
}

impl VisitedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, cells: u64) {
        self.count.fetch_add(cells, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
