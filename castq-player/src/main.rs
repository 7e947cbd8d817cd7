//! castq - command-line front end for the playback engine
//!
//! Loads a playlist file, plays it through the engine in real time (or
//! faster, with `--speed-ms`), logs every transition and exits when the
//! queue is exhausted or on Ctrl+C / SIGTERM.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use castq_common::config::PlayerConfig;
use castq_common::human_time::{format_progress, format_speed};
use castq_common::PlayerEvent;
use castq_player::PlaybackEngine;
use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for castq
#[derive(Parser, Debug)]
#[command(name = "castq")]
#[command(about = "Simulated podcast episode playback")]
#[command(version)]
struct Args {
    /// Playlist file (TOML, [[episode]] entries)
    #[arg(short, long, env = "CASTQ_PLAYLIST")]
    playlist: PathBuf,

    /// Config file (overrides CASTQ_CONFIG and the platform default)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Media milliseconds per wall-clock second (1000 = real time)
    #[arg(long)]
    speed_ms: Option<u64>,

    /// Override the progress tick interval in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Print the final player state as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = PlayerConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(tick_ms) = args.tick_ms {
        config.player.tick_interval_ms = tick_ms;
    }

    // Initialize tracing
    let default_filter = format!(
        "castq={level},castq_player={level},castq_common={level}",
        level = config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Loading playlist {}", args.playlist.display());
    let engine = PlaybackEngine::from_playlist(&config.player, &args.playlist)
        .context("Failed to load playlist")?;

    let initial = engine.state();
    if initial.current_episode.is_none() {
        bail!("Playlist {} has no episodes", args.playlist.display());
    }
    info!("{} episode(s) loaded", initial.queue.len() + 1);

    // Subscribe before play so no transition is missed
    let mut events = engine.subscribe_events();
    let progress = tokio::spawn(log_progress(engine.clone()));

    if let Some(speed_ms) = args.speed_ms {
        engine.set_speed(Duration::from_millis(speed_ms));
    }
    engine.play();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(PlayerEvent::QueueExhausted { uri, .. }) => {
                    info!("Finished {}, queue exhausted", uri);
                    break;
                }
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(missed)) => {
                    warn!("Event listener lagged, {} event(s) missed", missed);
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut shutdown => break,
        }
    }

    engine.pause();
    engine.sync().await.context("Playback engine stopped unexpectedly")?;
    let final_state = engine.state();
    engine.shutdown();
    progress.abort();

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&final_state).context("Failed to serialize state")?
        );
    }

    info!("Shutdown complete");
    Ok(())
}

fn log_event(event: &PlayerEvent) {
    match event {
        PlayerEvent::EpisodeStarted { uri, .. } => info!("Now playing {}", uri),
        PlayerEvent::EpisodeCompleted { uri, completed, .. } => {
            if *completed {
                info!("Completed {}", uri);
            } else {
                info!("Skipped {}", uri);
            }
        }
        PlayerEvent::PlaybackStateChanged { playing, .. } => {
            info!("Playback {}", if *playing { "running" } else { "paused" });
        }
        PlayerEvent::SpeedChanged { speed_ms, .. } => {
            info!("Speed {}", format_speed(Duration::from_millis(*speed_ms)));
        }
        other => debug!("{} event", other.event_type()),
    }
}

/// Log the position once per elapsed second of media time
async fn log_progress(engine: PlaybackEngine) {
    let mut states = engine.state_stream();
    let mut last_second = None;

    while let Some(state) = states.next().await {
        let Some(episode) = &state.current_episode else {
            continue;
        };
        let second = (episode.uri().to_string(), state.time_elapsed.as_secs());
        if last_second.as_ref() == Some(&second) {
            continue;
        }
        debug!(
            "{} {} [{} queued]",
            episode.display_name(),
            format_progress(state.time_elapsed, episode.duration()),
            state.queue.len()
        );
        last_second = Some(second);
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
