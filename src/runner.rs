//! # Job Runner Module
//!
//! Questo modulo esegue UN job come singola invocazione ffmpeg esterna.
//!
//! ## Responsabilità:
//! - Lancia esattamente un processo ffmpeg per job (unit di failure isolation)
//! - Converte OGNI modalità di fallimento in un `RenderOutcome` fallito:
//!   tool mancante, exit code non-zero, timeout, errore I/O sul log
//! - Persiste command line + output completo del tool nel log per-job
//! - Timeout generoso proporzionale alla durata del clip (20x, floor 30s)
//!
//! ## Contratto:
//! - `run()` non ritorna MAI errore al chiamante: il batch non deve
//!   interrompersi per il fallimento di un singolo clip
//! - Il log viene scritto in una guarded region separata: se la scrittura
//!   fallisce l'esito resta valido e il messaggio lo annota
//! - Il timeout produce un esito taggato distintamente da un fallimento
//!   riportato dal tool
//!
//! ## Formato log per-job:
//! ```text
//! COMMAND:
//! ffmpeg -y -stream_loop 1 -i overlay.mov ...
//!
//! Started: 2024-01-15 18:30:00
//!
//! <merged stdout/stderr>
//!
//! Finished: 2024-01-15 18:30:41
//! Return code: 0
//! ```

use crate::job::{RenderJob, RenderOutcome};
use crate::platform::PlatformCommands;
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, info};

/// Contract for anything that can execute a render job.
///
/// Implementations never raise: every failure mode becomes a failed outcome.
pub trait RunJob: Send + Sync {
    fn run(&self, job: RenderJob) -> impl Future<Output = RenderOutcome> + Send;
}

/// Timestamp format used in per-job logs
const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Lines of tool output echoed into failure messages
const FAILURE_TAIL_LINES: usize = 20;

/// Worst-case bound: 20x the clip duration, never below 30 seconds
const TIMEOUT_FACTOR: u32 = 20;
const TIMEOUT_FLOOR: Duration = Duration::from_secs(30);

/// Executes render jobs by shelling out to ffmpeg
pub struct FfmpegRunner {
    command: String,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    pub fn new() -> Self {
        let platform = PlatformCommands::instance();
        Self {
            command: platform.get_command("ffmpeg").to_string(),
        }
    }

    /// Use a specific encoder binary (custom ffmpeg builds, test doubles)
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn timeout_for(job: &RenderJob) -> Duration {
        let generous = Duration::from_secs(u64::from(job.clip_length) * u64::from(TIMEOUT_FACTOR));
        generous.max(TIMEOUT_FLOOR)
    }

    async fn run_inner(&self, job: &RenderJob) -> RenderOutcome {
        let clip_name = job.clip_name();
        let args = job.ffmpeg_args();
        let command_line = format!("{} {}", self.command, args.join(" "));
        let started = chrono::Local::now();

        info!("Starting render: {}", clip_name);
        debug!("Render command: {}", command_line);

        let spawned = Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match spawned {
            Ok(child) => child,
            Err(e) => {
                error!("Failed to start {} for {}: {}", self.command, clip_name, e);
                let body = format!("Failed to start {}: {}", self.command, e);
                let message = format!("❌ {} failed to run {}: {}", clip_name, self.command, e);
                return self.finish(job, &clip_name, &command_line, started, &body, None, message, false);
            }
        };

        let timeout = Self::timeout_for(job);
        let waited = tokio::time::timeout(timeout, child.wait_with_output()).await;

        match waited {
            // Timeout: the dropped child is killed via kill_on_drop
            Err(_) => {
                error!("Timeout rendering {} after {:?}", clip_name, timeout);
                let body = format!("TIMEOUT: killed after {} seconds", timeout.as_secs());
                let message = format!("❌ {} (timeout)", clip_name);
                self.finish(job, &clip_name, &command_line, started, &body, None, message, false)
            }
            Ok(Err(e)) => {
                error!("I/O error waiting for {}: {}", clip_name, e);
                let body = format!("I/O error waiting for ffmpeg: {}", e);
                let message = format!("❌ {} (error: {})", clip_name, e);
                self.finish(job, &clip_name, &command_line, started, &body, None, message, false)
            }
            Ok(Ok(output)) => {
                let mut merged = String::from_utf8_lossy(&output.stdout).to_string();
                if !output.stderr.is_empty() {
                    merged.push_str(&String::from_utf8_lossy(&output.stderr));
                }
                let code = output.status.code();

                if output.status.success() {
                    info!("Successfully rendered: {}", clip_name);
                    let message = format!("✅ {}", clip_name);
                    self.finish(job, &clip_name, &command_line, started, &merged, code, message, true)
                } else {
                    error!("Failed to render {} ({})", clip_name, output.status);
                    let tail = tail_lines(&merged, FAILURE_TAIL_LINES);
                    let message = match &job.log_path {
                        Some(log) => format!(
                            "❌ {} failed (log: {}). Last lines:\n{}",
                            clip_name,
                            log.display(),
                            tail
                        ),
                        None => format!("❌ {} failed. Last lines:\n{}", clip_name, tail),
                    };
                    self.finish(job, &clip_name, &command_line, started, &merged, code, message, false)
                }
            }
        }
    }

    /// Write the per-job log (if configured) and build the final outcome.
    ///
    /// The log write sits in its own guarded region: its failure is noted in
    /// the message but never changes the outcome or propagates.
    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        job: &RenderJob,
        clip_name: &str,
        command_line: &str,
        started: chrono::DateTime<chrono::Local>,
        body: &str,
        return_code: Option<i32>,
        mut message: String,
        succeeded: bool,
    ) -> RenderOutcome {
        if let Some(ref log_path) = job.log_path {
            let finished = chrono::Local::now();
            let code_line = match return_code {
                Some(code) => format!("Return code: {}\n", code),
                None => "Return code: none\n".to_string(),
            };
            let contents = format!(
                "COMMAND:\n{}\n\nStarted: {}\n\n{}\n\nFinished: {}\n{}",
                command_line,
                started.format(LOG_TIME_FORMAT),
                body,
                finished.format(LOG_TIME_FORMAT),
                code_line
            );

            if let Err(e) = std::fs::write(log_path, contents) {
                error!("Failed to write log for {}: {}", clip_name, e);
                message.push_str(&format!(" (log write failed: {})", e));
            }
        }

        if succeeded {
            RenderOutcome::success(message, job.log_path.clone())
        } else {
            RenderOutcome::failure(message, job.log_path.clone())
        }
    }
}

impl RunJob for FfmpegRunner {
    fn run(&self, job: RenderJob) -> impl Future<Output = RenderOutcome> + Send {
        async move { self.run_inner(&job).await }
    }
}

/// Last `count` lines of a text blob, for failure diagnostics
fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn job_with_log(log_path: Option<PathBuf>) -> RenderJob {
        RenderJob {
            index: 0,
            clip_length: 10,
            overlay_video: PathBuf::from("overlay.mov"),
            background_video: PathBuf::from("bg.mp4"),
            music_file: PathBuf::from("music.mp3"),
            background_offset: 0.0,
            audio_offset: 0.0,
            output_path: PathBuf::from("clip_001_10s.mp4"),
            codec: "libx264".to_string(),
            normalize_audio: false,
            log_path,
        }
    }

    #[test]
    fn test_tail_lines() {
        let text = "a\nb\nc\nd";
        assert_eq!(tail_lines(text, 2), "c\nd");
        assert_eq!(tail_lines(text, 10), "a\nb\nc\nd");
        assert_eq!(tail_lines("", 5), "");
    }

    #[test]
    fn test_timeout_is_generous_with_floor() {
        let mut job = job_with_log(None);
        job.clip_length = 1;
        assert_eq!(FfmpegRunner::timeout_for(&job), Duration::from_secs(30));

        job.clip_length = 60;
        assert_eq!(FfmpegRunner::timeout_for(&job), Duration::from_secs(1200));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_run_writes_log() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("clip_001_10s.mp4.log");

        // `true` ignores the ffmpeg-style arguments and exits 0
        let runner = FfmpegRunner::with_command("true");
        let outcome = runner.run(job_with_log(Some(log_path.clone()))).await;

        assert!(outcome.succeeded);
        assert!(outcome.message.contains("clip_001_10s.mp4"));
        assert_eq!(outcome.log_path, Some(log_path.clone()));

        let log = std::fs::read_to_string(&log_path).unwrap();
        assert!(log.starts_with("COMMAND:\ntrue -y"));
        assert!(log.contains("Return code: 0"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_becomes_failed_outcome() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("clip_001_10s.mp4.log");

        let runner = FfmpegRunner::with_command("false");
        let outcome = runner.run(job_with_log(Some(log_path.clone()))).await;

        assert!(!outcome.succeeded);
        assert!(outcome.message.starts_with("❌ clip_001_10s.mp4"));

        let log = std::fs::read_to_string(&log_path).unwrap();
        assert!(log.contains("Return code: 1"));
    }

    #[tokio::test]
    async fn test_missing_tool_becomes_failed_outcome() {
        let runner = FfmpegRunner::with_command("/no/such/binary/anywhere");
        let outcome = runner.run(job_with_log(None)).await;

        assert!(!outcome.succeeded);
        assert!(outcome.message.contains("clip_001_10s.mp4"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_log_write_failure_is_noted_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        // Using a directory as the log path makes the write fail
        let bad_log = temp_dir.path().to_path_buf();

        let runner = FfmpegRunner::with_command("true");
        let outcome = runner.run(job_with_log(Some(bad_log))).await;

        assert!(outcome.succeeded);
        assert!(outcome.message.contains("log write failed"));
    }
}
