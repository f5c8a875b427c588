//! Upload progress tracking
//!
//! [`ProgressState`] is owned by a single upload call. It decides when an
//! observation is due and computes throughput and time remaining.
//! Observations go to the log ([`LogObserver`]) or to a terminal progress
//! bar ([`BarObserver`]).

use super::types::LoaderConfig;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::time::{Duration, Instant};

/// One progress observation
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Share of rows processed, 0-100
    pub percent: f64,
    /// Rows processed (stored or rejected)
    pub rows_done: usize,
    /// Rows confirmed as stored
    pub rows_succeeded: usize,
    /// Rows in the dataset
    pub rows_total: usize,
    /// Stored rows per second so far
    pub rows_per_second: f64,
    /// Time since the upload started
    pub elapsed: Duration,
    /// Estimated time until every row is stored, if throughput is known
    pub eta: Option<Duration>,
}

impl fmt::Display for ProgressUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Progress: {:.1}% ({}/{} rows) | Rate: {:.1} rows/sec | Elapsed: {}",
            self.percent,
            group_thousands(self.rows_succeeded),
            group_thousands(self.rows_total),
            self.rows_per_second,
            format_duration(self.elapsed),
        )?;
        if let Some(eta) = self.eta {
            write!(f, " | Remaining: ~{}", format_duration(eta))?;
        }
        Ok(())
    }
}

/// Receives progress observations
pub trait ProgressObserver: Send {
    /// Called each time an observation is due
    fn observe(&mut self, update: &ProgressUpdate);
}

impl<F> ProgressObserver for F
where
    F: FnMut(&ProgressUpdate) + Send,
{
    fn observe(&mut self, update: &ProgressUpdate) {
        self(update);
    }
}

/// Observer that writes each observation to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn observe(&mut self, update: &ProgressUpdate) {
        tracing::info!("  {}", update);
    }
}

/// Observer that drives a terminal progress bar
#[derive(Debug, Clone)]
pub struct BarObserver {
    bar: ProgressBar,
}

impl BarObserver {
    /// Create a bar over `total` rows, drawn to stderr
    pub fn new(total: usize, message: &str) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] \
                     {pos}/{len} rows ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.set_message(message.to_string());
        Self::with_bar(bar)
    }

    /// Drive an existing bar
    pub fn with_bar(bar: ProgressBar) -> Self {
        Self { bar }
    }

    /// The underlying bar
    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    /// Remove the bar from the terminal
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for BarObserver {
    fn observe(&mut self, update: &ProgressUpdate) {
        self.bar.set_position(update.rows_done as u64);
        self.bar.set_message(format!(
            "{} stored | {:.1} rows/sec",
            group_thousands(update.rows_succeeded),
            update.rows_per_second
        ));
    }
}

/// Mutable counters for one upload
#[derive(Debug)]
pub(crate) struct ProgressState {
    total: usize,
    done: usize,
    succeeded: usize,
    started: Instant,
    last_percent: f64,
    step_percent: f64,
    row_interval: usize,
}

impl ProgressState {
    pub(crate) fn new(total: usize, config: &LoaderConfig) -> Self {
        Self {
            total,
            done: 0,
            succeeded: 0,
            started: Instant::now(),
            last_percent: 0.0,
            step_percent: config.progress_step_percent,
            row_interval: config.progress_row_interval,
        }
    }

    /// Count `attempted` more rows, `succeeded` of them stored
    ///
    /// Returns an observation when completion advanced by at least the step
    /// since the last one, processed rows crossed a row-interval multiple, or
    /// the last row was processed.
    pub(crate) fn record(&mut self, attempted: usize, succeeded: usize) -> Option<ProgressUpdate> {
        let before = self.done;
        self.done = (self.done + attempted).min(self.total);
        self.succeeded = (self.succeeded + succeeded).min(self.total);

        let percent = self.percent();
        let stepped = percent - self.last_percent >= self.step_percent;
        let crossed =
            self.row_interval > 0 && before / self.row_interval != self.done / self.row_interval;
        let finished = before < self.total && self.done == self.total;

        if stepped || crossed || finished {
            self.last_percent = percent;
            Some(self.snapshot())
        } else {
            None
        }
    }

    pub(crate) fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.done as f64 * 100.0 / self.total as f64
        }
    }

    pub(crate) fn snapshot(&self) -> ProgressUpdate {
        let elapsed = self.elapsed();
        let secs = elapsed.as_secs_f64();
        let rows_per_second = if secs > 0.0 {
            self.succeeded as f64 / secs
        } else {
            0.0
        };
        let eta = (rows_per_second > 0.0).then(|| {
            Duration::from_secs_f64((self.total - self.succeeded) as f64 / rows_per_second)
        });

        ProgressUpdate {
            percent: self.percent(),
            rows_done: self.done,
            rows_succeeded: self.succeeded,
            rows_total: self.total,
            rows_per_second,
            elapsed,
            eta,
        }
    }
}

/// Format a duration as `Xm Ys`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}

/// Format a count with thousands separators
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
