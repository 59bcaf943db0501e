//! Progress reporting (SPEC_FULL §3): a non-blocking call-out that MUST NOT
//! mutate index state (§5, "Suspension points"). [`BuildObserver`] in
//! `builder.rs` is the hook it plugs into; this module supplies the
//! CLI-facing implementation built on `indicatif`.

use crate::builder::BuildObserver;
use indicatif::{ProgressBar, ProgressStyle};

/// Drives an `indicatif` progress bar from build-loop callbacks.
pub struct IndicatifObserver {
    bar: ProgressBar,
}

impl IndicatifObserver {
    /// Creates a bar sized for `total` points, labeled with `stage`.
    #[must_use]
    pub fn new(total: usize, stage: &str) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{prefix} [{bar:40}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.set_prefix(stage.to_string());
        Self { bar }
    }
}

impl BuildObserver for IndicatifObserver {
    fn on_point_built(&mut self, done: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(done as u64);
        if done == total {
            self.bar.finish_and_clear();
        }
    }
}
