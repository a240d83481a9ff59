//! # Session Summary Module
//!
//! Questo modulo persiste il report finale di una session.
//!
//! ## Responsabilità:
//! - Rende settings + esiti in un report plain-text condivisibile
//! - Redige i path dei settings al solo file name (il report non deve
//!   rivelare la struttura del filesystem locale)
//! - Conta i successi e elenca un esito per riga, nell'ordine ritornato
//!   dallo scheduler
//!
//! ## Error handling:
//! - La scrittura fallita è NON-fatale: i clip renderizzati sono il
//!   deliverable primario, il summary è best-effort (il chiamante logga
//!   un warning e prosegue)
//!
//! ## Stabilità:
//! - A parità di input il contenuto è byte-identico salvo la riga Date

use crate::config::Settings;
use crate::job::RenderOutcome;
use crate::session::RenderSession;
use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

/// Redacted, ordered snapshot of the settings a batch ran with
#[derive(Debug, Clone)]
pub struct SettingsSnapshot {
    entries: Vec<(String, String)>,
}

impl SettingsSnapshot {
    /// Capture settings with every path reduced to its file name
    pub fn capture(settings: &Settings) -> Self {
        let entries = vec![
            ("Background".to_string(), redact_path(&settings.background_video)),
            ("Overlay".to_string(), redact_path(&settings.overlay_video)),
            ("Music".to_string(), redact_path(&settings.music_file)),
            ("Music Start".to_string(), format!("{}s", settings.music_start)),
            ("Clip Length".to_string(), format!("{}s", settings.clip_length)),
            ("Clips per Background".to_string(), settings.num_clips.to_string()),
            ("Codec".to_string(), settings.codec.clone()),
            ("Audio Normalization".to_string(), settings.normalize_audio.to_string()),
            ("Workers".to_string(), settings.workers.to_string()),
        ];

        Self { entries }
    }
}

fn redact_path(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "(none)".to_string())
}

/// Count of succeeded outcomes
pub fn success_count(outcomes: &[RenderOutcome]) -> usize {
    outcomes.iter().filter(|o| o.succeeded).count()
}

/// Render the report body for a session
fn render_report(
    session_name: &str,
    date: &str,
    snapshot: &SettingsSnapshot,
    outcomes: &[RenderOutcome],
) -> String {
    let rule_heavy = "=".repeat(50);
    let rule_light = "-".repeat(50);

    let mut report = String::new();
    let _ = writeln!(report, "AutoCutter Render Session");
    let _ = writeln!(report, "{}\n", rule_heavy);
    let _ = writeln!(report, "Session: {}", session_name);
    let _ = writeln!(report, "Date: {}\n", date);

    let _ = writeln!(report, "Settings:");
    let _ = writeln!(report, "{}", rule_light);
    for (key, value) in &snapshot.entries {
        let _ = writeln!(report, "{}: {}", key, value);
    }

    let _ = writeln!(report, "\n{}", rule_heavy);
    let _ = writeln!(report, "Results:");
    let _ = writeln!(report, "{}", rule_light);
    let _ = writeln!(report, "\nSuccess: {}/{}\n", success_count(outcomes), outcomes.len());

    for outcome in outcomes {
        let _ = writeln!(report, "{}", outcome.message);
    }

    report
}

/// Write the session summary to `<session>/summary.txt`.
///
/// Callers treat a write failure as non-fatal.
pub fn write(
    session: &RenderSession,
    snapshot: &SettingsSnapshot,
    outcomes: &[RenderOutcome],
) -> Result<()> {
    let date = chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let report = render_report(session.name(), &date, snapshot, outcomes);
    std::fs::write(session.summary_path(), report)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn sample_snapshot() -> SettingsSnapshot {
        SettingsSnapshot::capture(&Settings {
            background_video: PathBuf::from("/home/user/media/bg.mp4"),
            overlay_video: PathBuf::from("/home/user/media/overlay.mov"),
            music_file: PathBuf::from("/home/user/music/track.mp3"),
            ..Default::default()
        })
    }

    fn sample_outcomes() -> Vec<RenderOutcome> {
        vec![
            RenderOutcome::success("✅ clip_001_10s.mp4", None),
            RenderOutcome::failure("❌ clip_002_10s.mp4 (timeout)", None),
            RenderOutcome::success("✅ clip_003_10s.mp4", None),
        ]
    }

    #[test]
    fn test_snapshot_redacts_paths() {
        let snapshot = sample_snapshot();
        let values: Vec<&str> = snapshot.entries.iter().map(|(_, v)| v.as_str()).collect();

        assert!(values.contains(&"bg.mp4"));
        assert!(values.contains(&"track.mp3"));
        assert!(!values.iter().any(|v| v.contains("/home/user")));
    }

    #[test]
    fn test_report_counts_and_lists_every_outcome() {
        let report = render_report("session_test", "2024-01-15 18:30:00", &sample_snapshot(), &sample_outcomes());

        assert!(report.contains("Session: session_test"));
        assert!(report.contains("Success: 2/3"));
        assert!(report.contains("✅ clip_001_10s.mp4"));
        assert!(report.contains("❌ clip_002_10s.mp4 (timeout)"));
        assert!(report.contains("✅ clip_003_10s.mp4"));
    }

    #[test]
    fn test_report_stable_except_for_date() {
        let snapshot = sample_snapshot();
        let outcomes = sample_outcomes();

        let a = render_report("s", "2024-01-15 18:30:00", &snapshot, &outcomes);
        let b = render_report("s", "2025-06-01 09:00:00", &snapshot, &outcomes);

        let strip = |r: &str| -> String {
            r.lines()
                .filter(|l| !l.starts_with("Date: "))
                .collect::<Vec<_>>()
                .join("\n")
        };
        assert_ne!(a, b);
        assert_eq!(strip(&a), strip(&b));
    }

    #[test]
    fn test_write_persists_summary() {
        let temp_dir = TempDir::new().unwrap();
        let session = RenderSession::create(temp_dir.path()).unwrap();

        write(&session, &sample_snapshot(), &sample_outcomes()).unwrap();

        let contents = std::fs::read_to_string(session.summary_path()).unwrap();
        assert!(contents.starts_with("AutoCutter Render Session"));
        assert!(contents.contains("Success: 2/3"));
    }

    #[test]
    fn test_success_count() {
        assert_eq!(success_count(&sample_outcomes()), 2);
        assert_eq!(success_count(&[]), 0);
    }
}
