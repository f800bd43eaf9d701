use crate::models::{ExclusionReason, Outcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Counters collected while replaying revisions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayStats {
    pub pages_committed: u64,
    pub redirects_committed: u64,
    pub media_committed: u64,
    pub skipped: u64,
    pub excluded_whitelist: u64,
    pub excluded_namespace: u64,
}

impl ReplayStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Committed => self.pages_committed += 1,
            Outcome::Redirected => self.redirects_committed += 1,
            Outcome::MediaCommitted => self.media_committed += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Excluded(ExclusionReason::NotWhitelisted) => self.excluded_whitelist += 1,
            Outcome::Excluded(_) => self.excluded_namespace += 1,
        }
    }

    pub fn commits(&self) -> u64 {
        self.pages_committed + self.redirects_committed + self.media_committed
    }

    pub fn excluded(&self) -> u64 {
        self.excluded_whitelist + self.excluded_namespace
    }

    pub fn total(&self) -> u64 {
        self.commits() + self.skipped + self.excluded()
    }
}

pub fn make_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(msg.to_string());
    pb
}

pub fn make_progress_bar(total: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.cyan}} {label:<10} [{{bar:30.cyan/blue}}] {{pos}}/{{len}} revisions"
            ))
            .unwrap()
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
