//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `RenderError` enum per categorizzare tutti gli errori possibili
//! - Fornisce messaggi di errore descrittivi e strutturati
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `FFmpeg`: Errore riportato da un'invocazione ffmpeg post-batch
//!   (il merge dei clip; i fallimenti per-job NON passano di qui)
//! - `Session`: Errori di creazione/gestione della session directory
//!   (permessi, directory non creabili, etc.)
//! - `MissingDependency`: Tool esterno mancante (ffmpeg, ffprobe)
//! - `Validation`: Errori di validazione settings
//!
//! ## Policy di propagazione:
//! - Errori pre-batch (session, dipendenze, validazione) sono fatali e
//!   risalgono al chiamante con `?`
//! - Errori per-job NON usano questi tipi: vengono convertiti in
//!   `RenderOutcome` falliti dal runner e non interrompono mai il batch
//!
//! ## Esempio:
//! ```rust,ignore
//! if !tool_exists {
//!     return Err(RenderError::MissingDependency("ffmpeg".to_string()));
//! }
//! ```

/// Custom error types for the render pipeline
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("FFmpeg error: {0}")]
    FFmpeg(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Settings validation error: {0}")]
    Validation(String),
}
