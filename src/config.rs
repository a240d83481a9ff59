//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Settings` con tutti i parametri di rendering
//! - Fornisce validazione robusta dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri:
//! - `background_video`: Video di sfondo (o directory di video)
//! - `overlay_video`: Video overlay/animazione da loopare
//! - `music_file`: Traccia musicale
//! - `output_dir`: Directory base per le session (default: "./rendered")
//! - `clip_length`: Durata clip in secondi (default: 10)
//! - `num_clips`: Clip richiesti per ogni background (default: 1)
//! - `music_start`: Offset nella traccia musicale in secondi (default: 0.0)
//! - `codec`: Codec video ffmpeg (default: "libx264")
//! - `normalize_audio`: Applica loudnorm (default: true)
//! - `workers`: Worker paralleli (default: 2)
//! - `prefer_gpu`: Preferisce h264_nvenc se disponibile (default: false)
//!
//! ## Persistenza:
//! - Ogni campo ha un default serde: file di config scritti da versioni
//!   precedenti (chiavi mancanti) si caricano senza errori, come il merge
//!   con i default
//! - File di default: `~/.autocutter/config.json`
//!
//! ## Validazione:
//! - clip_length > 0, num_clips > 0, workers >= 1, music_start >= 0
//!
//! ## Esempio:
//! ```rust,ignore
//! let settings = Settings {
//!     clip_length: 15,
//!     workers: 4,
//!     ..Default::default()
//! };
//! settings.validate()?;
//! ```

use anyhow::Result;
use crate::error::RenderError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_output_dir() -> PathBuf {
    PathBuf::from("./rendered")
}

fn default_clip_length() -> u32 {
    10
}

fn default_num_clips() -> usize {
    1
}

fn default_codec() -> String {
    "libx264".to_string()
}

fn default_normalize_audio() -> bool {
    true
}

fn default_workers() -> usize {
    2
}

/// Typed rendering settings for one batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Background video file, or a directory of background videos
    #[serde(default)]
    pub background_video: PathBuf,
    /// Overlay/animation video looped on top of the background
    #[serde(default)]
    pub overlay_video: PathBuf,
    /// Music track
    #[serde(default)]
    pub music_file: PathBuf,
    /// Base directory for render sessions
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Clip length in seconds
    #[serde(default = "default_clip_length")]
    pub clip_length: u32,
    /// Number of clips to render per background video
    #[serde(default = "default_num_clips")]
    pub num_clips: usize,
    /// Start offset into the music track, in seconds
    #[serde(default)]
    pub music_start: f64,
    /// Video codec passed to ffmpeg
    #[serde(default = "default_codec")]
    pub codec: String,
    /// Apply loudnorm audio normalization
    #[serde(default = "default_normalize_audio")]
    pub normalize_audio: bool,
    /// Number of parallel render workers
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Prefer GPU encoding (h264_nvenc) when available
    #[serde(default)]
    pub prefer_gpu: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            background_video: PathBuf::new(),
            overlay_video: PathBuf::new(),
            music_file: PathBuf::new(),
            output_dir: default_output_dir(),
            clip_length: default_clip_length(),
            num_clips: default_num_clips(),
            music_start: 0.0,
            codec: default_codec(),
            normalize_audio: default_normalize_audio(),
            workers: default_workers(),
            prefer_gpu: false,
        }
    }
}

impl Settings {
    /// Validate settings parameters
    pub fn validate(&self) -> Result<()> {
        if self.clip_length == 0 {
            return Err(RenderError::Validation(
                "Clip length must be greater than 0".to_string(),
            )
            .into());
        }

        if self.num_clips == 0 {
            return Err(RenderError::Validation(
                "Number of clips must be greater than 0".to_string(),
            )
            .into());
        }

        if self.workers == 0 {
            return Err(RenderError::Validation(
                "Number of workers must be greater than 0".to_string(),
            )
            .into());
        }

        if self.music_start < 0.0 {
            return Err(RenderError::Validation(
                "Music start offset cannot be negative".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Default persisted config location (`~/.autocutter/config.json`)
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".autocutter").join("config.json"))
    }

    /// Load settings from file, falling back to defaults when missing.
    ///
    /// Unknown keys are ignored and missing keys take their defaults, so
    /// config files written by older versions keep loading.
    pub async fn from_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to file
    pub async fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.clip_length = 0;
        assert!(settings.validate().is_err());

        settings.clip_length = 10;
        settings.workers = 0;
        assert!(settings.validate().is_err());

        settings.workers = 2;
        settings.music_start = -1.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.clip_length, 10);
        assert_eq!(settings.num_clips, 1);
        assert_eq!(settings.codec, "libx264");
        assert!(settings.normalize_audio);
        assert_eq!(settings.workers, 2);
        assert!(!settings.prefer_gpu);
    }

    #[tokio::test]
    async fn test_settings_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original = Settings {
            background_video: PathBuf::from("/media/bg.mp4"),
            clip_length: 15,
            num_clips: 6,
            music_start: 30.5,
            codec: "h264_nvenc".to_string(),
            workers: 8,
            ..Default::default()
        };

        original.save_to_file(&config_path).await.unwrap();
        let loaded = Settings::from_file(&config_path).await.unwrap();

        assert_eq!(loaded.background_video, PathBuf::from("/media/bg.mp4"));
        assert_eq!(loaded.clip_length, 15);
        assert_eq!(loaded.num_clips, 6);
        assert_eq!(loaded.music_start, 30.5);
        assert_eq!(loaded.codec, "h264_nvenc");
        assert_eq!(loaded.workers, 8);
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nope.json");

        let loaded = Settings::from_file(&config_path).await.unwrap();
        assert_eq!(loaded.clip_length, Settings::default().clip_length);
    }

    #[tokio::test]
    async fn test_partial_file_merges_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.json");
        tokio::fs::write(&config_path, r#"{"clip_length": 25}"#)
            .await
            .unwrap();

        let loaded = Settings::from_file(&config_path).await.unwrap();
        assert_eq!(loaded.clip_length, 25);
        assert_eq!(loaded.codec, "libx264");
        assert_eq!(loaded.workers, 2);
    }
}
