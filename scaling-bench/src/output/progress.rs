//! Progress bar output using indicatif.

use indicatif::{ProgressBar, ProgressStyle};
use scaling_sweep::TrialProgress;

/// A progress reporter that advances one tick per completed trial.
pub struct SweepProgress {
    bar: ProgressBar,
}

impl SweepProgress {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { bar }
    }

    pub fn update(&self, p: &TrialProgress) {
        self.bar.set_position((p.trial.ordinal + 1) as u64);
        self.bar.set_message(format!(
            "local={} global={} {:.3} ms",
            p.trial.local_size, p.trial.global_size, p.elapsed_ms
        ));
    }

    /// Finish and clear the progress bar.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Return a callback closure for use with `SweepEngine::run`.
    pub fn callback(&self) -> impl Fn(&TrialProgress) + '_ {
        move |p: &TrialProgress| self.update(p)
    }
}
