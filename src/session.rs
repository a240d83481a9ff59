//! # Render Session Module
//!
//! Questo modulo gestisce la directory scope di una singola invocazione batch.
//!
//! ## Responsabilità:
//! - Genera un session id univoco e human-sortable (timestamp-based)
//! - Crea la session directory e la log directory annidata
//! - Genera filename deterministici e collision-free per i clip
//! - Fornisce i path per i log per-job e per il summary
//!
//! ## Layout su disco:
//! ```text
//! <output_base>/session_2024-01-15_18-30-00/
//!   clip_001_10s.mp4
//!   clip_002_10s.mp4
//!   logs/
//!     clip_001_10s.mp4.log
//!     clip_002_10s.mp4.log
//!   summary.txt
//! ```
//!
//! ## Error handling:
//! - La creazione fallita della directory è FATALE per il batch: viene
//!   riportata subito, prima di lanciare qualsiasi job.

use crate::error::RenderError;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory scope and identity for one batch invocation
#[derive(Debug, Clone)]
pub struct RenderSession {
    session_name: String,
    session_dir: PathBuf,
    log_dir: PathBuf,
}

impl RenderSession {
    /// Create a new session under the given output base directory.
    ///
    /// Fails immediately if the directories cannot be created; the batch
    /// must never start against an unwritable session.
    pub fn create(output_base: &Path) -> Result<Self> {
        let session_name = chrono::Local::now()
            .format("session_%Y-%m-%d_%H-%M-%S")
            .to_string();
        Self::create_named(output_base, session_name)
    }

    fn create_named(output_base: &Path, session_name: String) -> Result<Self> {
        let session_dir = output_base.join(&session_name);
        let log_dir = session_dir.join("logs");

        std::fs::create_dir_all(&log_dir).map_err(|e| {
            RenderError::Session(format!(
                "could not create session directory {}: {}",
                session_dir.display(),
                e
            ))
        })?;

        info!("🗂️  Session folder created: {}", session_dir.display());

        Ok(Self {
            session_name,
            session_dir,
            log_dir,
        })
    }

    pub fn name(&self) -> &str {
        &self.session_name
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Deterministic output path for a clip: zero-padded index plus a
    /// length-seconds suffix, injective over indices within the session.
    pub fn generate_clip_filename(&self, index: usize, clip_length: u32) -> PathBuf {
        self.session_dir
            .join(format!("clip_{:03}_{}s.mp4", index + 1, clip_length))
    }

    /// Per-job log file path for a given output clip
    pub fn log_path_for(&self, output_path: &Path) -> PathBuf {
        let clip_name = output_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy();
        self.log_dir.join(format!("{}.log", clip_name))
    }

    /// Path of the session summary report
    pub fn summary_path(&self) -> PathBuf {
        self.session_dir.join("summary.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[test]
    fn test_create_session_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let session = RenderSession::create(temp_dir.path()).unwrap();

        assert!(session.session_dir().is_dir());
        assert!(session.log_dir().is_dir());
        assert!(session.session_dir().starts_with(temp_dir.path()));
        assert!(session.name().starts_with("session_"));
    }

    #[test]
    fn test_create_fails_on_unwritable_base() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file cannot be used as a directory base
        let blocker = temp_dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"x").unwrap();

        let result = RenderSession::create(&blocker);
        assert!(result.is_err());
    }

    #[test]
    fn test_clip_filenames_are_injective() {
        let temp_dir = TempDir::new().unwrap();
        let session = RenderSession::create(temp_dir.path()).unwrap();

        let mut seen = HashSet::new();
        for i in 0..250 {
            assert!(seen.insert(session.generate_clip_filename(i, 10)));
        }
    }

    #[test]
    fn test_clip_filename_format() {
        let temp_dir = TempDir::new().unwrap();
        let session =
            RenderSession::create_named(temp_dir.path(), "session_test".to_string()).unwrap();

        let path = session.generate_clip_filename(0, 10);
        assert_eq!(
            path,
            temp_dir.path().join("session_test").join("clip_001_10s.mp4")
        );
    }

    #[test]
    fn test_log_path_for() {
        let temp_dir = TempDir::new().unwrap();
        let session = RenderSession::create(temp_dir.path()).unwrap();

        let clip = session.generate_clip_filename(4, 12);
        let log = session.log_path_for(&clip);
        assert_eq!(log, session.log_dir().join("clip_005_12s.mp4.log"));
    }
}
