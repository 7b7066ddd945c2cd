use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};

/// Pages completed so far. Advanced only by the batch driver.
#[derive(Debug, Clone)]
pub struct Progress {
    pages_done: u32,
    total_pages: u32,
    start_time: DateTime<Local>,
}

impl Progress {
    pub fn new(total_pages: u32, start_time: DateTime<Local>) -> Self {
        Self {
            pages_done: 0,
            total_pages,
            start_time,
        }
    }

    pub fn advance(&mut self, pages: u32) {
        self.pages_done = self.pages_done.saturating_add(pages).min(self.total_pages);
    }

    pub fn pages_done(&self) -> u32 {
        self.pages_done
    }

    pub fn report(&self, now: DateTime<Local>) -> ProgressReport {
        report(self.pages_done, self.total_pages, self.start_time, now)
    }
}

/// Snapshot of the run printed after every batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub pages_done: u32,
    pub total_pages: u32,
    /// Fraction in `0.0..=1.0`.
    pub percent: f64,
    pub elapsed: Duration,
    /// `None` until at least one page finished.
    pub eta: Option<Duration>,
}

pub fn report(
    pages_done: u32,
    total_pages: u32,
    start_time: DateTime<Local>,
    now: DateTime<Local>,
) -> ProgressReport {
    let elapsed = (now - start_time).to_std().unwrap_or_default();
    let percent = if total_pages == 0 {
        1.0
    } else {
        pages_done as f64 / total_pages as f64
    };
    let eta = (percent > 0.0)
        .then(|| Duration::from_secs_f64(elapsed.as_secs_f64() * (1.0 - percent) / percent));

    ProgressReport {
        pages_done,
        total_pages,
        percent,
        elapsed,
        eta,
    }
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eta = self
            .eta
            .map(|eta| format_hms(eta.as_secs()))
            .unwrap_or_else(|| "N/A".to_string());
        write!(
            f,
            "Pages fetched: {}/{} ({:.2}%) | ETA: {}",
            self.pages_done,
            self.total_pages,
            self.percent * 100.0,
            eta
        )
    }
}

/// `HH:MM:SS`, hours keep growing past 99.
pub fn format_hms(secs: u64) -> String {
    let (hours, minutes) = (secs / 3600, secs / 60 % 60);
    format!("{:02}:{:02}:{:02}", hours, minutes, secs % 60)
}
