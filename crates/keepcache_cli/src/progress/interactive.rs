use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use keepcache::sync::SyncProgress;

const TICK: Duration = Duration::from_millis(100);

/// Consolidated progress state to avoid multiple mutex locks.
#[derive(Default)]
struct ProgressState {
    /// Spinner for fetching and reconciling the lists.
    lists_bar: Option<ProgressBar>,
    /// One step per list.
    bookmarks_bar: Option<ProgressBar>,
    /// Bookmarks written so far in this cycle.
    written: usize,
    /// Bookmarks deleted so far in this cycle.
    deleted: usize,
}

/// Interactive progress reporter using indicatif.
pub struct InteractiveReporter {
    multi: MultiProgress,
    state: Mutex<ProgressState>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            state: Mutex::new(ProgressState::default()),
        }
    }

    pub fn handle(&self, event: SyncProgress) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            SyncProgress::CycleStarted { kind } => {
                *state = ProgressState::default();
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::spinner_style());
                pb.set_prefix(format!("{:10}", "Lists"));
                pb.set_message(format!("Starting {kind} sync..."));
                pb.enable_steady_tick(TICK);
                state.lists_bar = Some(pb);
            }

            SyncProgress::CycleSkipped { kind } => {
                self.multi
                    .println(format!("· {kind} sync skipped, another cycle is running"))
                    .ok();
            }

            SyncProgress::FetchingLists => {
                if let Some(ref pb) = state.lists_bar {
                    pb.set_message("Fetching lists...");
                }
            }

            SyncProgress::FetchedPage {
                endpoint,
                page,
                count,
            } => {
                let bar = state.bookmarks_bar.as_ref().or(state.lists_bar.as_ref());
                if let Some(pb) = bar
                    && page > 1
                {
                    pb.set_message(format!("{endpoint} page {page} ({count} items)"));
                }
            }

            SyncProgress::ListsReconciled { count, stats } => {
                if let Some(ref pb) = state.lists_bar {
                    let msg = if stats.deleted > 0 {
                        format!(
                            "✓ {} lists ({} new, {} removed)",
                            count, stats.inserted, stats.deleted
                        )
                    } else {
                        format!("✓ {} lists ({} new)", count, stats.inserted)
                    };
                    pb.finish_with_message(msg);
                }

                let pb = self.multi.add(ProgressBar::new(count as u64));
                pb.set_style(Self::bar_style());
                pb.set_prefix(format!("{:10}", "Bookmarks"));
                state.bookmarks_bar = Some(pb);
            }

            SyncProgress::SyncingList { name, index, .. } => {
                if let Some(ref pb) = state.bookmarks_bar {
                    pb.set_position(index as u64);
                    pb.set_message(name);
                }
            }

            SyncProgress::ListSynced { stats, .. } => {
                state.written += stats.inserted + stats.updated;
                state.deleted += stats.deleted;
                if let Some(ref pb) = state.bookmarks_bar {
                    pb.inc(1);
                }
            }

            SyncProgress::FetchRetry {
                endpoint,
                attempt,
                retry_after_ms,
                error,
            } => {
                self.multi
                    .println(format!(
                        "⚠ {endpoint} attempt {attempt} failed ({error}), retrying in {:.1}s",
                        retry_after_ms as f64 / 1000.0
                    ))
                    .ok();
            }

            SyncProgress::Warning { message } => {
                self.multi.println(format!("⚠ {message}")).ok();
            }

            SyncProgress::CycleComplete { report } => {
                if let Some(ref pb) = state.bookmarks_bar {
                    pb.finish_with_message(format!(
                        "✓ {} written, {} unchanged since last sync, {} removed",
                        state.written, report.bookmarks_skipped, state.deleted
                    ));
                }
            }

            SyncProgress::CycleFailed { error, .. } => {
                for pb in [&state.lists_bar, &state.bookmarks_bar].into_iter().flatten() {
                    if !pb.is_finished() {
                        pb.abandon_with_message(format!("✗ {error}"));
                    }
                }
            }

            _ => {}
        }
    }

    pub fn finish(&self) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for pb in [&state.lists_bar, &state.bookmarks_bar].into_iter().flatten() {
            if !pb.is_finished() {
                pb.finish();
            }
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
