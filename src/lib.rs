//! # AutoCutter Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!   (es. un frontend GUI che consuma `BatchEvent` via canale)
//!
//! ## Architettura dei moduli:
//! - `config`: Settings tipizzati, validazione e persistenza JSON
//! - `error`: Tipi di errore custom per le diverse operazioni
//! - `job`: Descrizione immutabile dei clip e costruzione argomenti ffmpeg
//! - `runner`: Esecuzione di un job come processo ffmpeg esterno
//! - `session`: Directory scope e identity di un batch
//! - `scheduler`: Worker pool limitato, raccolta esiti, cancellazione
//! - `merge`: Concatenazione post-batch dei clip in un file unico
//! - `progress`: Interfaccia di progress reporting (bar, canale, null)
//! - `summary`: Report finale di session
//! - `probe`: Durate media, encoder detection, verifica dipendenze
//! - `files`: Discovery dei media sorgente
//! - `platform`: Nomi comando cross-platform
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use autocutter::{FfmpegRunner, RenderSession, Scheduler};
//!
//! let session = RenderSession::create(&output_dir)?;
//! let scheduler = Scheduler::new(FfmpegRunner::new(), workers);
//! let outcomes = scheduler.run(jobs, &progress).await;
//! ```

pub mod config;
pub mod error;
pub mod files;
pub mod job;
pub mod merge;
pub mod platform;
pub mod probe;
pub mod progress;
pub mod runner;
pub mod scheduler;
pub mod session;
pub mod summary;

pub use config::Settings;
pub use error::RenderError;
pub use job::{RenderJob, RenderOutcome};
pub use merge::ClipMerger;
pub use progress::{BatchEvent, ChannelProgress, ConsoleProgress, NullProgress, ProgressSink};
pub use runner::{FfmpegRunner, RunJob};
pub use scheduler::{CancelFlag, Scheduler};
pub use session::RenderSession;
pub use summary::SettingsSnapshot;
