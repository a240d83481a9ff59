//! # Media Probing Module
//!
//! Questo modulo interroga i tool esterni PRIMA che il batch parta.
//!
//! ## Responsabilità:
//! - Durata dei media via ffprobe (i chiamanti la precalcolano per
//!   costruire i job: scheduler e runner non probano mai)
//! - Rilevamento encoder disponibili (h264_nvenc vs libx264)
//! - Verifica presenza di ffmpeg/ffprobe in PATH (errore fatale pre-batch)
//!
//! ## Contratto durata:
//! - `media_duration` ritorna `None` per durata sconosciuta: ffprobe
//!   fallito, output non parsabile o durata non positiva

use crate::error::RenderError;
use crate::platform::PlatformCommands;
use anyhow::Result;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Probe timeout: ffprobe on a local file should answer well within this
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Get the duration of a media file in seconds.
///
/// Returns `None` when the duration cannot be determined.
pub async fn media_duration(path: &Path) -> Option<f64> {
    let platform = PlatformCommands::instance();
    let ffprobe = platform.get_command("ffprobe");

    let output = tokio::time::timeout(
        PROBE_TIMEOUT,
        Command::new(ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "csv=p=0",
            ])
            .arg(path)
            .output(),
    )
    .await;

    let output = match output {
        Ok(Ok(out)) => out,
        Ok(Err(e)) => {
            warn!("ffprobe failed for {}: {}", path.display(), e);
            return None;
        }
        Err(_) => {
            warn!("ffprobe timed out for {}", path.display());
            return None;
        }
    };

    if !output.status.success() {
        debug!(
            "ffprobe returned {} for {}",
            output.status,
            path.display()
        );
        return None;
    }

    let duration = String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse::<f64>()
        .ok()?;

    (duration > 0.0).then_some(duration)
}

/// Check whether a specific encoder is compiled into the local ffmpeg
pub async fn encoder_available(encoder_name: &str) -> bool {
    let platform = PlatformCommands::instance();
    let ffmpeg = platform.get_command("ffmpeg");

    let output = tokio::time::timeout(
        PROBE_TIMEOUT,
        Command::new(ffmpeg)
            .args(["-hide_banner", "-encoders"])
            .output(),
    )
    .await;

    match output {
        Ok(Ok(out)) => String::from_utf8_lossy(&out.stdout).contains(encoder_name),
        _ => false,
    }
}

/// Pick the best available codec: NVENC when requested and present,
/// otherwise CPU x264.
pub async fn best_codec(prefer_gpu: bool) -> String {
    if prefer_gpu && encoder_available("h264_nvenc").await {
        info!("Using GPU encoder: h264_nvenc");
        return "h264_nvenc".to_string();
    }

    info!("Using CPU encoder: libx264");
    "libx264".to_string()
}

/// Check that the external tools the batch depends on are present.
///
/// Fatal pre-batch error: nothing is dispatched when this fails.
pub async fn check_dependencies() -> Result<()> {
    let platform = PlatformCommands::instance();

    for tool in ["ffmpeg", "ffprobe"] {
        if !platform.is_command_available(tool).await {
            return Err(RenderError::MissingDependency(format!(
                "{} is required for rendering, install ffmpeg and re-run",
                tool
            ))
            .into());
        }
    }

    Ok(())
}
