//! # Render Job Module
//!
//! Questo modulo definisce la descrizione immutabile di un singolo clip da
//! produrre e l'esito della sua renderizzazione.
//!
//! ## Responsabilità:
//! - Definisce `RenderJob`: record immutabile con tutti i parametri del clip
//! - Definisce `RenderOutcome`: esito success/failure con messaggio
//! - Costruisce la argument list ffmpeg in modo deterministico
//!
//! ## Pipeline di compositing (filter_complex):
//! 1. Overlay video: trim alla durata del clip, reset PTS, formato RGBA
//! 2. Background video: trim, reset PTS, crop 9:16, scale 1080x1920
//! 3. Overlay centrato sul background con `shortest=1`
//! 4. Audio dalla traccia musicale (input index 2)
//!
//! ## Determinismo:
//! - A parità di `RenderJob` la argument list è byte-identica: ordine fisso,
//!   formattazione numerica stabile. Richiesto per riproducibilità dei log.
//!
//! ## Invariante:
//! - I job non vengono mai mutati dopo la creazione: scheduler e runner li
//!   leggono soltanto. Gli offset sono campi precalcolati dal chiamante,
//!   mai derivati qui.

use std::path::PathBuf;

/// Immutable description of one clip to render
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Ordinal among the session's jobs; used only for output naming
    pub index: usize,
    /// Clip length in seconds
    pub clip_length: u32,
    /// Looping overlay/animation video
    pub overlay_video: PathBuf,
    /// Background video to window into
    pub background_video: PathBuf,
    /// Music track
    pub music_file: PathBuf,
    /// Seek offset into the background video, in seconds
    pub background_offset: f64,
    /// Seek offset into the music track, in seconds
    pub audio_offset: f64,
    /// Output clip path (unique per session, caller's responsibility)
    pub output_path: PathBuf,
    /// Video codec name passed through to ffmpeg
    pub codec: String,
    /// Apply loudnorm audio normalization
    pub normalize_audio: bool,
    /// Where to persist the full ffmpeg output, if anywhere
    pub log_path: Option<PathBuf>,
}

impl RenderJob {
    /// Short clip identity used in messages and logs
    pub fn clip_name(&self) -> String {
        self.output_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }

    /// Build the full ffmpeg argument list for this job.
    ///
    /// The order and formatting are fixed: the same job always produces the
    /// same arguments.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let duration = self.clip_length.to_string();

        let filter_complex = format!(
            "[0:v]trim=duration={d},setpts=PTS-STARTPTS,format=rgba[main];\
             [1:v]trim=duration={d},setpts=PTS-STARTPTS,\
             crop=ih*9/16:ih,scale=1080:1920[bg];\
             [bg][main]overlay=(W-w)/2:(H-h)/2:shortest=1[v]",
            d = duration
        );

        let mut args = vec![
            "-y".to_string(),
            // Overlay video - loop once to ensure coverage
            "-stream_loop".to_string(),
            "1".to_string(),
            "-i".to_string(),
            self.overlay_video.to_string_lossy().to_string(),
            // Background video - seek to this job's window
            "-ss".to_string(),
            format_seconds(self.background_offset),
            "-t".to_string(),
            duration.clone(),
            "-i".to_string(),
            self.background_video.to_string_lossy().to_string(),
            // Music - seek to the caller-chosen start
            "-ss".to_string(),
            format_seconds(self.audio_offset),
            "-t".to_string(),
            duration.clone(),
            "-i".to_string(),
            self.music_file.to_string_lossy().to_string(),
            "-filter_complex".to_string(),
            filter_complex,
            "-map".to_string(),
            "[v]".to_string(),
            // Audio from music (input index 2)
            "-map".to_string(),
            "2:a".to_string(),
            "-t".to_string(),
            duration,
            "-c:v".to_string(),
            self.codec.clone(),
            "-b:v".to_string(),
            "3500k".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
        ];

        if self.normalize_audio {
            args.push("-af".to_string());
            args.push("loudnorm=I=-16:LRA=11:TP=-1.5".to_string());
        }

        args.push("-c:a".to_string());
        args.push("aac".to_string());
        args.push("-b:a".to_string());
        args.push("192k".to_string());

        args.push(self.output_path.to_string_lossy().to_string());

        args
    }
}

/// Terminal success/failure record for one job
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub succeeded: bool,
    pub message: String,
    pub log_path: Option<PathBuf>,
}

impl RenderOutcome {
    pub fn success(message: impl Into<String>, log_path: Option<PathBuf>) -> Self {
        Self {
            succeeded: true,
            message: message.into(),
            log_path,
        }
    }

    pub fn failure(message: impl Into<String>, log_path: Option<PathBuf>) -> Self {
        Self {
            succeeded: false,
            message: message.into(),
            log_path,
        }
    }
}

/// Stable textual form for seek offsets: up to three decimals, no trailing
/// zeros, integral values without a decimal point.
fn format_seconds(value: f64) -> String {
    let formatted = format!("{:.3}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> RenderJob {
        RenderJob {
            index: 0,
            clip_length: 10,
            overlay_video: PathBuf::from("/media/overlay.mov"),
            background_video: PathBuf::from("/media/bg.mp4"),
            music_file: PathBuf::from("/media/music.mp3"),
            background_offset: 20.0,
            audio_offset: 5.5,
            output_path: PathBuf::from("/out/clip_001_10s.mp4"),
            codec: "libx264".to_string(),
            normalize_audio: false,
            log_path: None,
        }
    }

    #[test]
    fn test_args_are_deterministic() {
        let job = sample_job();
        assert_eq!(job.ffmpeg_args(), job.ffmpeg_args());
    }

    #[test]
    fn test_args_structure() {
        let job = sample_job();
        let args = job.ffmpeg_args();

        assert_eq!(args[0], "-y");
        // Three inputs: overlay, background, music
        assert_eq!(args.iter().filter(|a| a.as_str() == "-i").count(), 3);
        // Background window and music offset
        assert!(args.windows(2).any(|w| w[0] == "-ss" && w[1] == "20"));
        assert!(args.windows(2).any(|w| w[0] == "-ss" && w[1] == "5.5"));
        // Codec passthrough and output last
        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "libx264"));
        assert_eq!(args.last().unwrap(), "/out/clip_001_10s.mp4");
        // No normalization requested
        assert!(!args.iter().any(|a| a.starts_with("loudnorm")));
    }

    #[test]
    fn test_loudnorm_toggle() {
        let mut job = sample_job();
        job.normalize_audio = true;
        let args = job.ffmpeg_args();

        let af = args.iter().position(|a| a == "-af").expect("-af present");
        assert_eq!(args[af + 1], "loudnorm=I=-16:LRA=11:TP=-1.5");
        // Audio codec still comes after the filter
        assert!(args.iter().position(|a| a == "-c:a").unwrap() > af);
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "0");
        assert_eq!(format_seconds(12.0), "12");
        assert_eq!(format_seconds(1.25), "1.25");
        assert_eq!(format_seconds(0.333_333), "0.333");
    }

    #[test]
    fn test_clip_name() {
        assert_eq!(sample_job().clip_name(), "clip_001_10s.mp4");
    }
}
