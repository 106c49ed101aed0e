use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporting for a batch run.
///
/// The engine calls `begin` once, `item_done` once per completed file in
/// completion order, then `finish`.
pub trait Progress {
    fn begin(&mut self, _total: usize) {}

    fn item_done(&mut self, _path: &Path) {}

    fn finish(&mut self) {}
}

/// Terminal progress bar.
pub struct BarProgress {
    label: String,
    bar: Option<ProgressBar>,
}

impl BarProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            bar: None,
        }
    }
}

impl Progress for BarProgress {
    fn begin(&mut self, total: usize) {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} (ETA: {eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        bar.set_message(self.label.clone());
        self.bar = Some(bar);
    }

    fn item_done(&mut self, _path: &Path) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}
