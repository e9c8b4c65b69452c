//! Lookup tracking for the progress display.

use super::progress::Progress;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use owo_colors::OwoColorize;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct TrackerState {
    total: AtomicU64,
    started: AtomicU64,
    finished: AtomicBool,
    current: Mutex<String>,
}

/// Tracks the serial lookups of an enrichment run and feeds the progress display.
///
/// Cloning is cheap; all clones share the same counters.
#[derive(Clone)]
pub struct LookupTracker {
    state: Arc<TrackerState>,
    progress: Arc<dyn Progress>,
}

impl core::fmt::Debug for LookupTracker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LookupTracker")
            .field("state", &self.state)
            .field("progress", &"<dyn Progress>")
            .finish()
    }
}

impl LookupTracker {
    /// Create a new tracker that drives the given progress reporter.
    #[must_use]
    pub fn new(progress: &Arc<dyn Progress>) -> Self {
        let state: Arc<TrackerState> = Arc::default();

        let state_clone = Arc::clone(&state);
        let use_colors = progress.use_colors();
        progress.set_determinate(Box::new(move || Self::progress_reporter_callback(&state_clone, use_colors)));

        Self {
            state,
            progress: Arc::clone(progress),
        }
    }

    /// Record that lookup `index` (1-based) of `total` is starting for `raw_name`.
    pub fn begin_lookup(&self, index: usize, total: usize, raw_name: &str) {
        self.state.total.store(total as u64, Ordering::Relaxed);
        self.state.started.store(index as u64, Ordering::Relaxed);
        *self.state.current.lock().expect("lock poisoned") = raw_name.to_string();
    }

    /// Record that no further lookups will be issued.
    pub fn finish(&self) {
        self.state.finished.store(true, Ordering::Relaxed);
    }

    /// Finish and clear the underlying progress indicator.
    pub fn done(&self) {
        self.finish();
        self.progress.done();
    }

    /// Compute current progress state.
    ///
    /// Returns (`total_length`, `current_position`, `message_string`).
    fn progress_reporter_callback(state: &TrackerState, use_colors: bool) -> (u64, u64, String) {
        let total = state.total.load(Ordering::Relaxed);
        let started = state.started.load(Ordering::Relaxed);

        if total == 0 {
            return (0, 0, "No lookups".to_string());
        }

        if state.finished.load(Ordering::Relaxed) {
            let text = format!("{started}/{total} extensions");
            let message = if use_colors { format!("{}", text.green()) } else { text };
            return (total, started, message);
        }

        let current = state.current.lock().expect("lock poisoned").clone();

        // The lookup in flight has not completed yet
        (total, started.saturating_sub(1), format!("{started}/{total} {current}"))
    }
}
