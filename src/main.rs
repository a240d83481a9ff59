//! # AutoCutter - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Merge settings persistiti + override CLI, con validazione
//! - Probe delle durate media e derivazione dei segmenti per background
//! - Costruzione dei job, avvio dello scheduler, scrittura del summary
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (overlay, background, music, workers, etc.)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose)
//! 3. Verifica che ffmpeg/ffprobe siano disponibili (fatale se assenti)
//! 4. Proba le durate e calcola quanti clip ogni background può produrre
//! 5. Crea la session directory e lancia lo scheduler con progress bar
//! 6. Scrive il summary (best-effort) e logga il report finale
//! 7. Con `--merge`, concatena i clip riusciti in `final_merged.mp4`
//!
//! ## Esempio di utilizzo:
//! ```bash
//! autocutter --overlay main.mov --background ./background \
//!     --music music/track.mp3 --clip-length 10 --all --workers 4
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use autocutter::{
    config::Settings,
    files, probe,
    job::RenderJob,
    merge::ClipMerger,
    progress::{ConsoleProgress, ProgressSink},
    runner::FfmpegRunner,
    scheduler::Scheduler,
    session::RenderSession,
    summary::{self, SettingsSnapshot},
};

#[derive(Parser)]
#[command(name = "autocutter")]
#[command(about = "Batch-render short vertical clips from a background video, a looping overlay and a music track")]
struct Args {
    /// Overlay/animation video looped on top of every clip
    #[arg(long)]
    overlay: PathBuf,

    /// Background video file, or a directory of background videos
    #[arg(long)]
    background: PathBuf,

    /// Music track, or a directory of audio files (first one, by name, is used)
    #[arg(long)]
    music: PathBuf,

    /// Base directory for render sessions
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Clip length in seconds
    #[arg(short = 'l', long)]
    clip_length: Option<u32>,

    /// Clips to render per background video (capped by its duration)
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Render every available segment of each background video
    #[arg(long)]
    all: bool,

    /// Start offset into the music track, in seconds
    #[arg(long)]
    music_start: Option<f64>,

    /// Number of parallel render workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Force a specific ffmpeg video codec
    #[arg(long)]
    codec: Option<String>,

    /// Prefer GPU encoding (h264_nvenc) when available
    #[arg(long)]
    gpu: bool,

    /// Disable loudnorm audio normalization
    #[arg(long)]
    no_normalize: bool,

    /// Concatenate the rendered clips into final_merged.mp4 after the batch
    #[arg(long)]
    merge: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Fatal pre-batch check: the batch never starts without the tools
    probe::check_dependencies().await?;

    let settings = build_settings(&args).await?;
    settings.validate()?;

    info!("🎬 Overlay: {}", settings.overlay_video.display());
    info!("🎵 Music: {} (start: {}s)", settings.music_file.display(), settings.music_start);
    if settings.normalize_audio {
        info!("🔊 Audio normalization: loudnorm enabled");
    }

    // Resolve background candidates: a single file or every video in a directory
    let backgrounds = if settings.background_video.is_dir() {
        files::find_videos(&settings.background_video)?
    } else {
        vec![settings.background_video.clone()]
    };

    if backgrounds.is_empty() {
        return Err(anyhow::anyhow!(
            "No background videos found in: {}",
            settings.background_video.display()
        ));
    }

    // Session creation failure is fatal before any job is dispatched
    let session = RenderSession::create(&settings.output_dir)?;

    let jobs = build_jobs(&settings, &backgrounds, &session, args.all).await?;
    if jobs.is_empty() {
        return Err(anyhow::anyhow!("No clips selected for rendering"));
    }

    let scheduler = Scheduler::new(FfmpegRunner::new(), settings.workers);

    // Ctrl-C stops dispatching new jobs; in-flight encodes drain
    let cancel = scheduler.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received: finishing in-flight clips, skipping the rest");
            cancel.cancel();
        }
    });

    info!(
        "🚀 Starting rendering with {} worker(s). Codec: {}. Loudnorm: {}",
        scheduler.workers(),
        settings.codec,
        settings.normalize_audio
    );

    let total = jobs.len();
    let progress = ConsoleProgress::new(total as u64);
    let outcomes = scheduler.run(jobs, &progress).await;

    let succeeded = summary::success_count(&outcomes);
    let final_message = format!(
        "Rendered {}/{} clips successfully! Output: {}",
        succeeded,
        total,
        session.session_dir().display()
    );
    progress.batch_finished(&final_message, &outcomes);

    // Summary is best-effort: the rendered clips are the deliverable
    let snapshot = SettingsSnapshot::capture(&settings);
    if let Err(e) = summary::write(&session, &snapshot, &outcomes) {
        warn!("Failed to write summary: {}", e);
    } else {
        info!("📝 Summary saved: {}", session.summary_path().display());
    }

    // Merge is best-effort too: a failed concat leaves the clips untouched
    if args.merge && succeeded > 0 {
        info!("Merging clips (ffmpeg concat)... this may take a while.");
        match ClipMerger::new().merge_session(&session).await {
            Ok(Some(merged)) => info!("✅ Merged output: {}", merged.display()),
            Ok(None) => warn!("No clips found to merge"),
            Err(e) => warn!("Failed to merge clips: {}", e),
        }
    }

    info!("=== Rendering Complete ===");
    info!("Clips rendered: {}/{}", succeeded, total);
    for outcome in &outcomes {
        // Keep the one-line fate of every job in the terminal log too
        debug!("{}", outcome.message.lines().next().unwrap_or_default());
    }
    info!("✅ All outputs in: {}", session.session_dir().display());

    // Remember this run's settings for the next invocation
    if let Ok(config_path) = Settings::default_path() {
        if let Err(e) = settings.save_to_file(&config_path).await {
            debug!("Could not persist settings: {}", e);
        }
    }

    Ok(())
}

/// Merge persisted settings with CLI overrides
async fn build_settings(args: &Args) -> Result<Settings> {
    let mut settings = match Settings::default_path() {
        Ok(path) => Settings::from_file(&path).await.unwrap_or_default(),
        Err(_) => Settings::default(),
    };

    settings.overlay_video = args.overlay.clone();
    settings.background_video = args.background.clone();

    // A directory of tracks resolves to its first audio file, by name
    settings.music_file = if args.music.is_dir() {
        let candidates = files::find_audio(&args.music)?;
        let first = candidates.into_iter().next().ok_or_else(|| {
            anyhow::anyhow!("No audio files found in: {}", args.music.display())
        })?;
        info!("🎵 Using music track: {}", first.display());
        first
    } else {
        args.music.clone()
    };

    if let Some(ref output_dir) = args.output_dir {
        settings.output_dir = output_dir.clone();
    }
    if let Some(clip_length) = args.clip_length {
        settings.clip_length = clip_length;
    }
    if let Some(count) = args.count {
        settings.num_clips = count;
    }
    if let Some(music_start) = args.music_start {
        settings.music_start = music_start;
    }
    if let Some(workers) = args.workers {
        settings.workers = workers;
    }
    settings.prefer_gpu = settings.prefer_gpu || args.gpu;
    if args.no_normalize {
        settings.normalize_audio = false;
    }

    settings.codec = match &args.codec {
        Some(codec) => codec.clone(),
        None => probe::best_codec(settings.prefer_gpu).await,
    };

    Ok(settings)
}

/// Probe each background video and expand it into render jobs.
///
/// Offsets are derived here, on the caller side: the scheduler and runner
/// treat them as opaque precomputed fields.
async fn build_jobs(
    settings: &Settings,
    backgrounds: &[PathBuf],
    session: &RenderSession,
    render_all: bool,
) -> Result<Vec<RenderJob>> {
    let mut jobs = Vec::new();
    let clip_length = settings.clip_length;

    for background in backgrounds {
        let duration = match probe::media_duration(background).await {
            Some(duration) => duration,
            None => {
                warn!("⚠️ Skipping {}: duration unreadable", background.display());
                continue;
            }
        };

        let max_segments = (duration / f64::from(clip_length)) as usize;
        if max_segments == 0 {
            warn!(
                "⚠️ {} is shorter than the clip length ({}); skipping",
                background.display(),
                files::format_duration(duration)
            );
            continue;
        }

        let count = if render_all {
            max_segments
        } else {
            settings.num_clips.min(max_segments)
        };

        info!(
            "{} ({}) → rendering {} of {} available segment(s)",
            background.file_name().unwrap_or_default().to_string_lossy(),
            files::format_duration(duration),
            count,
            max_segments
        );

        for segment in 0..count {
            let index = jobs.len();
            let output_path = session.generate_clip_filename(index, clip_length);
            let log_path = session.log_path_for(&output_path);

            jobs.push(RenderJob {
                index,
                clip_length,
                overlay_video: settings.overlay_video.clone(),
                background_video: background.clone(),
                music_file: settings.music_file.clone(),
                background_offset: (segment as f64) * f64::from(clip_length),
                audio_offset: settings.music_start,
                output_path,
                codec: settings.codec.clone(),
                normalize_audio: settings.normalize_audio,
                log_path: Some(log_path),
            });
        }
    }

    Ok(jobs)
}
