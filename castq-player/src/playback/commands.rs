//! Internal engine commands (not part of the public API)
//!
//! `PlaybackEngine` handle methods turn into `Command`s sent to the engine
//! task, which applies them one at a time against `PlayerCore`.

use castq_common::Episode;
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Debug)]
pub(crate) enum Command {
    SetCurrentEpisode(Episode),
    Play,
    PlayEpisodes(Vec<Episode>),
    Pause,
    Stop,
    Next,
    Previous,
    AddToQueue(Episode),
    RemoveAllFromQueue,
    SeekTo(Duration),
    SeekToMillis(i64),
    AdvanceBy(Duration),
    RewindBy(Duration),
    SeekingStarted,
    SeekingFinished(Duration),
    IncreaseSpeed(Duration),
    DecreaseSpeed(Duration),
    SetSpeed(Duration),

    /// Barrier: answered once every earlier command has been applied
    Sync(oneshot::Sender<()>),

    /// Stop the engine task
    Shutdown,
}

impl Command {
    /// Short name for logging
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Command::SetCurrentEpisode(_) => "set_current_episode",
            Command::Play => "play",
            Command::PlayEpisodes(_) => "play_episodes",
            Command::Pause => "pause",
            Command::Stop => "stop",
            Command::Next => "next",
            Command::Previous => "previous",
            Command::AddToQueue(_) => "add_to_queue",
            Command::RemoveAllFromQueue => "remove_all_from_queue",
            Command::SeekTo(_) => "seek_to",
            Command::SeekToMillis(_) => "seek_to_millis",
            Command::AdvanceBy(_) => "advance_by",
            Command::RewindBy(_) => "rewind_by",
            Command::SeekingStarted => "on_seeking_started",
            Command::SeekingFinished(_) => "on_seeking_finished",
            Command::IncreaseSpeed(_) => "increase_speed",
            Command::DecreaseSpeed(_) => "decrease_speed",
            Command::SetSpeed(_) => "set_speed",
            Command::Sync(_) => "sync",
            Command::Shutdown => "shutdown",
        }
    }
}
