//! # File Discovery Module
//!
//! Questo modulo gestisce la discovery dei media sorgente per la CLI.
//!
//! ## Responsabilità:
//! - Elenca i video/audio candidati in una directory sorgente
//! - Determinazione formato file per estensione
//! - Formattazione human-readable delle durate
//!
//! ## Formati supportati:
//! - **Video**: MP4, MOV, MKV, AVI, WebM
//! - **Audio**: MP3, WAV, AAC, M4A, FLAC, OGG

use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Check if a file is a video by extension
pub fn is_video(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            matches!(ext_lower.as_str(), "mp4" | "mov" | "mkv" | "avi" | "webm")
        }
        None => false,
    }
}

/// Check if a file is an audio track by extension
pub fn is_audio(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            matches!(
                ext_lower.as_str(),
                "mp3" | "wav" | "aac" | "m4a" | "flac" | "ogg"
            )
        }
        None => false,
    }
}

/// List video files directly inside a directory, sorted by name
pub fn find_videos(dir: &Path) -> Result<Vec<PathBuf>> {
    find_matching(dir, is_video)
}

/// List audio files directly inside a directory, sorted by name
pub fn find_audio(dir: &Path) -> Result<Vec<PathBuf>> {
    find_matching(dir, is_audio)
}

fn find_matching(dir: &Path, predicate: fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if predicate(path) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Format a duration in seconds to a human readable string (e.g. "2m 30s")
pub fn format_duration(seconds: f64) -> String {
    if seconds <= 0.0 {
        return "0s".to_string();
    }

    let total = seconds as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{}s", secs));
    }

    parts.join(" ")
}
