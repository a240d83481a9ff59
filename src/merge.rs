//! # Clip Merge Module
//!
//! Questo modulo concatena i clip renderizzati di una session in un file unico.
//!
//! ## Responsabilità:
//! - Elenca i clip `.mp4` della session directory in ordine alfabetico
//! - Scrive la concat list (`concat.txt`) nel formato del demuxer ffmpeg
//! - Invoca `ffmpeg -f concat` in stream-copy (nessuna ricodifica)
//!
//! ## Contratto:
//! - Operazione POST-batch e best-effort: il chiamante logga il fallimento
//!   e prosegue, i clip già renderizzati restano il deliverable primario
//! - `final_merged.mp4` di un run precedente non viene mai incluso tra
//!   gli input del merge
//!
//! ## Layout:
//! ```text
//! <session_dir>/concat.txt        lista input, una riga `file '<path>'`
//! <session_dir>/final_merged.mp4  risultato del merge
//! ```

use crate::error::RenderError;
use crate::platform::PlatformCommands;
use crate::session::RenderSession;
use anyhow::Result;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Name of the merged output inside the session directory
const MERGED_FILENAME: &str = "final_merged.mp4";

/// Concatenates a session's rendered clips via the ffmpeg concat demuxer
pub struct ClipMerger {
    command: String,
}

impl Default for ClipMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipMerger {
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

    /// Merge every rendered clip of the session into one file.
    ///
    /// Returns `Ok(None)` when the session holds no clips to merge.
    pub async fn merge_session(&self, session: &RenderSession) -> Result<Option<PathBuf>> {
        let clips = session_clips(session)?;
        if clips.is_empty() {
            return Ok(None);
        }

        let concat_list = session.session_dir().join("concat.txt");
        let mut listing = String::new();
        for clip in &clips {
            listing.push_str(&format!("file '{}'\n", clip.display()));
        }
        std::fs::write(&concat_list, listing)?;
        debug!("Concat list written: {}", concat_list.display());

        let merged = session.session_dir().join(MERGED_FILENAME);
        info!("Merging {} clip(s) into {}", clips.len(), merged.display());

        let output = Command::new(&self.command)
            .args([
                "-y",
                "-f",
                "concat",
                "-safe",
                "0",
                "-i",
            ])
            .arg(&concat_list)
            .args(["-c", "copy"])
            .arg(&merged)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let mut merged_output = String::from_utf8_lossy(&output.stdout).to_string();
            merged_output.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(RenderError::FFmpeg(format!(
                "merge failed ({}): {}",
                output.status,
                merged_output.trim()
            ))
            .into());
        }

        Ok(Some(merged))
    }
}

/// Sorted `.mp4` clips of a session, excluding a previous merge result
fn session_clips(session: &RenderSession) -> Result<Vec<PathBuf>> {
    let mut clips = Vec::new();

    for entry in std::fs::read_dir(session.session_dir())? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_mp4 = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase() == "mp4")
            .unwrap_or(false);
        let is_merge_result = path
            .file_name()
            .map(|name| name == MERGED_FILENAME)
            .unwrap_or(false);
        if is_mp4 && !is_merge_result {
            clips.push(path);
        }
    }

    clips.sort();
    Ok(clips)
}
