//! Row completion counter for one image.
//!
//! Purely observational: row tasks bump it when they finish, and the batch
//! driver samples it to print progress. Completion of the gradient pass is
//! signalled by the pool join, never by this counter.
//!
//! Counts are in image rows. The top and bottom border rows have no row task
//! (they stay zero), so they are counted as complete from the start and a
//! finished image reads `height` out of `height`.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct RowProgress {
    completed: AtomicUsize,
    total: usize,
}

impl RowProgress {
    /// Counter for an image `height` pixels tall, with the border rows
    /// already complete.
    pub fn for_height(height: usize) -> Self {
        let row_tasks = height.saturating_sub(2);
        Self {
            completed: AtomicUsize::new(height - row_tasks),
            total: height,
        }
    }

    pub fn complete_row(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total
    }
}
