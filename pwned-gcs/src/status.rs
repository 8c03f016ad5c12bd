//! Staged progress reporting for long-running builds.
//!
//! Purely a logging concern: the builder drives it through named stages and
//! per-item increments, and it emits a rate line every 5% of the declared
//! work. It never affects correctness.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::info;

pub struct Status {
    stage: Option<String>,
    work: u64,
    done: AtomicU64,
    /// Log every `step` increments (work / 20); 0 disables progress lines.
    step: u64,
    start: Instant,
    stage_start: Instant,
}

impl Default for Status {
    fn default() -> Self {
        Self::new()
    }
}

impl Status {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            stage: None,
            work: 0,
            done: AtomicU64::new(0),
            step: 0,
            start: now,
            stage_start: now,
        }
    }

    /// Starts a named stage, finishing the previous one with its elapsed
    /// time.
    pub fn stage(&mut self, name: &str) {
        self.finish_stage();
        info!("{} starting...", name);
        self.stage = Some(name.to_string());
        self.stage_start = Instant::now();
        self.done.store(0, Ordering::Relaxed);
        self.work = 0;
        self.step = 0;
    }

    /// Declares the total work for the current stage.
    pub fn set_work(&mut self, count: u64) {
        self.work = count;
        self.step = count / 20;
    }

    /// Starts a stage with a known work total.
    pub fn stage_work(&mut self, name: &str, work: u64) {
        self.stage(name);
        self.set_work(work);
    }

    /// Records `count` finished items. Safe to call from worker threads.
    pub fn add_work(&self, count: u64) {
        let done = self.done.fetch_add(count, Ordering::Relaxed) + count;
        if self.step > 0 && done % self.step < count {
            self.print_progress(done);
        }
    }

    pub fn incr(&self) {
        self.add_work(1);
    }

    fn print_progress(&self, done: u64) {
        let Some(stage) = &self.stage else { return };
        let elapsed = self.start.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 { done as f64 / elapsed } else { 0.0 };
        info!(
            "{}: {} of {}, {:.2}%, {:.0}/s",
            stage,
            done,
            self.work,
            done as f64 / self.work as f64 * 100.0,
            rate,
        );
    }

    fn finish_stage(&mut self) {
        if let Some(stage) = self.stage.take() {
            info!("{} complete in {:?}", stage, self.stage_start.elapsed());
        }
    }

    /// Finishes the current stage and logs the total elapsed time.
    pub fn done(&mut self) {
        self.finish_stage();
        info!("complete in {:?}", self.start.elapsed());
    }
}
