//! Progress reporting for a pipeline run.

use indicatif::{ProgressBar, ProgressStyle};

/// Receives progress as the pipeline advances. Calls arrive in pipeline order.
pub trait ProgressSink {
    /// `completed` of `total` segments are done
    fn report(&self, completed: usize, total: usize);

    /// A short description of the current step
    fn status(&self, message: &str);
}

/// Terminal progress bar.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new(0))
    }

    /// A bar that draws nothing
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarProgress {
    fn report(&self, completed: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
    }

    fn status(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_tracks_reported_position() {
        let progress = BarProgress::hidden();

        progress.report(1, 3);
        progress.report(2, 3);
        assert_eq!(progress.bar.position(), 2);
        assert_eq!(progress.bar.length(), Some(3));

        progress.status("Polishing");
        progress.finish("done");
    }
}
