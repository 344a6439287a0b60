//! Terminal progress bar observer.

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};

use super::{DeviceCompleted, ProgressSink};

/// Live progress counter for interactive runs.
///
/// Completion lines print through the bar so they do not tear it.
pub struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    /// Creates a bar sized to the selected device set.
    #[must_use]
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} devices ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░  ");
        bar.set_style(style);
        bar.set_message("Running tasks...");
        Self { bar }
    }

    /// A bar that renders nothing, for non-interactive output.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Finishes the bar with a run summary.
    pub fn finish(&self, failed: usize) {
        let message = if failed == 0 {
            "All devices completed".to_string()
        } else {
            format!("{failed} device(s) completed with errors")
        };
        self.bar.finish_with_message(message);
    }

    fn bump(&self, event: &DeviceCompleted) {
        let line = if event.failed {
            format!("{}: Completed with Error!", event.device)
        } else {
            format!("{}: Completed Successfully!", event.device)
        };
        self.bar.println(line);
        self.bar.inc(1);
    }
}

#[async_trait]
impl ProgressSink for ProgressBarSink {
    async fn emit(&self, event: &DeviceCompleted) {
        self.bump(event);
    }

    fn try_emit(&self, event: &DeviceCompleted) {
        self.bump(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hidden_bar_accepts_events() {
        let sink = ProgressBarSink::hidden();
        sink.try_emit(&DeviceCompleted {
            device: "SW1".to_string(),
            hostname: "10.0.0.1".to_string(),
            failed: false,
            kind: None,
        });
        sink.finish(0);
    }
}
