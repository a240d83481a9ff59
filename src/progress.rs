//! # Progress Reporting Module
//!
//! Questo modulo disaccoppia lo scheduler da COME il progresso viene mostrato.
//!
//! ## Responsabilità:
//! - Definisce il trait `ProgressSink` pilotato dallo scheduler
//! - `ConsoleProgress`: progress bar `indicatif` per la CLI
//! - `ChannelProgress`: inoltra eventi su un canale mpsc per consumer
//!   su thread GUI (equivalente dei signal progress/finished/error)
//! - `NullProgress`: scarta tutto (test, embedding come libreria)
//!
//! ## Contratto:
//! - `job_completed` viene chiamato esattamente una volta per job completato,
//!   in ordine di completamento (non di submission)
//! - `percent = completed * 100 / total`
//! - `batch_finished` / `batch_error` chiudono il ciclo di vita del batch
//!
//! ## Visual feedback CLI:
//! ```text
//! ⠋ [00:02:15] [========================>---] 5/8 (62%) ✅ clip_005_10s.mp4
//! ```

use crate::job::RenderOutcome;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::mpsc::Sender;
use std::time::Duration;

/// Callback interface the scheduler drives as jobs complete
pub trait ProgressSink: Send + Sync {
    /// Called once per completed job, in completion order
    fn job_completed(&self, completed: usize, total: usize, outcome: &RenderOutcome);

    /// Called once when every job has an outcome
    fn batch_finished(&self, _summary: &str, _outcomes: &[RenderOutcome]) {}

    /// Called when an infrastructure failure prevented the batch from running
    fn batch_error(&self, _message: &str) {}
}

/// Percentage contract shared by every sink implementation
pub fn percent_complete(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((completed * 100) / total) as u8
}

/// Indicatif-backed progress bar for line-mode callers
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new(total_jobs: u64) -> Self {
        let bar = ProgressBar::new(total_jobs);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }
}

impl ProgressSink for ConsoleProgress {
    fn job_completed(&self, _completed: usize, _total: usize, outcome: &RenderOutcome) {
        self.bar.inc(1);
        self.bar.set_message(outcome.message.clone());
    }

    fn batch_finished(&self, summary: &str, _outcomes: &[RenderOutcome]) {
        self.bar.finish_with_message(summary.to_string());
    }

    fn batch_error(&self, message: &str) {
        self.bar.abandon_with_message(message.to_string());
    }
}

/// Event stream for channel-based consumers (GUI threads)
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// One job completed: percent 0-100 plus that job's message
    Progress {
        percent: u8,
        completed: usize,
        total: usize,
        message: String,
    },
    /// All jobs have an outcome
    Finished {
        summary: String,
        outcomes: Vec<RenderOutcome>,
    },
    /// The batch could not run at all
    Error { message: String },
}

/// Forwards batch events over an mpsc channel; send failures are ignored
/// (a disappeared receiver must not take the batch down with it).
pub struct ChannelProgress {
    sender: Sender<BatchEvent>,
}

impl ChannelProgress {
    pub fn new(sender: Sender<BatchEvent>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelProgress {
    fn job_completed(&self, completed: usize, total: usize, outcome: &RenderOutcome) {
        let _ = self.sender.send(BatchEvent::Progress {
            percent: percent_complete(completed, total),
            completed,
            total,
            message: outcome.message.clone(),
        });
    }

    fn batch_finished(&self, summary: &str, outcomes: &[RenderOutcome]) {
        let _ = self.sender.send(BatchEvent::Finished {
            summary: summary.to_string(),
            outcomes: outcomes.to_vec(),
        });
    }

    fn batch_error(&self, message: &str) {
        let _ = self.sender.send(BatchEvent::Error {
            message: message.to_string(),
        });
    }
}

/// Discards every event
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn job_completed(&self, _completed: usize, _total: usize, _outcome: &RenderOutcome) {}
}
