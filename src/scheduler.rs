//! # Render Scheduler Module
//!
//! Questo è il cuore del crate: fan-out dei job su un worker pool limitato.
//!
//! ## Responsabilità:
//! - Distribuisce i `RenderJob` su task paralleli cappati da un semaforo
//! - Raccoglie gli esiti in ORDINE DI COMPLETAMENTO (non di submission)
//! - Notifica il `ProgressSink` esattamente una volta per job completato
//! - Converte i guasti infrastrutturali (task panic) in esiti falliti
//! - Cancellazione cooperativa: flag condiviso, i job non ancora partiti
//!   terminano subito con esito "cancelled", quelli in volo drenano
//!
//! ## Gestione concorrenza:
//! - `tokio::sync::Semaphore` limita i runner simultanei al cap richiesto
//! - Cap clampato a [1, parallelismo disponibile]: è l'unico knob di
//!   admission control verso ffmpeg (CPU/GPU/memoria)
//! - Ogni invocazione ffmpeg è comunque un processo OS separato: il crash
//!   di un encode non può corrompere lo stato degli altri job
//!
//! ## Invarianti:
//! - N job in ingresso → esattamente N esiti e N chiamate al sink
//! - Nessun job eseguito due volte, nessuno perso silenziosamente
//! - Il fallimento di un job non cancella, blocca o contamina gli altri
//!
//! ## Esempio:
//! ```rust,ignore
//! let scheduler = Scheduler::new(FfmpegRunner::new(), settings.workers);
//! let outcomes = scheduler.run(jobs, &ConsoleProgress::new(total)).await;
//! ```

use crate::job::{RenderJob, RenderOutcome};
use crate::progress::ProgressSink;
use crate::runner::RunJob;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Shared cooperative cancellation signal.
///
/// Setting it stops not-yet-started jobs from dispatching; in-flight
/// invocations are left to drain.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fans render jobs out across a bounded worker pool
pub struct Scheduler<R> {
    runner: Arc<R>,
    workers: usize,
    cancel: CancelFlag,
}

impl<R: RunJob + 'static> Scheduler<R> {
    /// Create a scheduler with the given concurrency cap.
    ///
    /// The cap is clamped to at least 1 and at most the machine's available
    /// parallelism.
    pub fn new(runner: R, workers: usize) -> Self {
        let max_workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let clamped = workers.clamp(1, max_workers);
        if clamped != workers {
            warn!(
                "Clamped worker count from {} to {} (available parallelism: {})",
                workers, clamped, max_workers
            );
        }

        Self {
            runner: Arc::new(runner),
            workers: clamped,
            cancel: CancelFlag::new(),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Handle callers can use to abort the batch from another task
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Render every job, at most `workers` simultaneously.
    ///
    /// Returns one outcome per input job, in completion order; the sink is
    /// notified once per completion with the same ordering. Never fails:
    /// per-job errors and infrastructure faults both land in the outcome
    /// list.
    pub async fn run(&self, jobs: Vec<RenderJob>, progress: &dyn ProgressSink) -> Vec<RenderOutcome> {
        let total = jobs.len();
        if total == 0 {
            return Vec::new();
        }

        info!("🚀 Dispatching {} render job(s) with {} worker(s)", total, self.workers);

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut pending = FuturesUnordered::new();

        for job in jobs {
            let semaphore = semaphore.clone();
            let runner = self.runner.clone();
            let cancel = self.cancel.clone();
            // Identity survives even if the worker task panics
            let clip_name = job.clip_name();
            let log_path = job.log_path.clone();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return RenderOutcome::failure(
                            format!("❌ {} (worker pool error: {})", job.clip_name(), e),
                            job.log_path.clone(),
                        );
                    }
                };

                if cancel.is_cancelled() {
                    return RenderOutcome::failure(
                        format!("❌ {} (cancelled)", job.clip_name()),
                        job.log_path.clone(),
                    );
                }

                runner.run(job).await
            });

            pending.push(async move {
                match handle.await {
                    Ok(outcome) => outcome,
                    // Infrastructure fault: the slot still gets an outcome
                    Err(e) => {
                        error!("Worker task failed for {}: {}", clip_name, e);
                        RenderOutcome::failure(
                            format!("❌ {} (worker error: {})", clip_name, e),
                            log_path,
                        )
                    }
                }
            });
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = pending.next().await {
            let completed = outcomes.len() + 1;
            progress.job_completed(completed, total, &outcome);
            outcomes.push(outcome);
        }

        outcomes
    }
}
