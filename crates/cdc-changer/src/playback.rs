//! ---
//! cdc_section: "05-changer-application"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "Playback engine boundary."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
//! Playback engine boundary.
//!
//! The audio side lives behind this trait; the changer task only issues
//! commands and consumes the asynchronous [`PlaybackEvent`]s that flow back
//! through its event channel.

use async_trait::async_trait;
use strum::Display;
use tokio::sync::mpsc;
use tracing::debug;

use crate::ChangerEvent;

/// Commands the changer issues to the audio side.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Stop,
    ChangeDisc(u8),
    SeekNext,
    SeekPrev,
}

/// Asynchronous status from the audio side.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Playing,
    Paused,
    Stopped,
    EndOfSong,
    Error,
}

/// The audio engine as the changer sees it.
#[async_trait]
pub trait PlaybackEngine: Send + Sync + 'static {
    async fn command(&self, command: PlaybackCommand);
}

/// Engine stand-in that confirms every command immediately.
///
/// Useful for bench runs without audio hardware: a `Play` comes back as
/// `Playing` on the changer's own event channel, and so on.
pub struct EchoPlayback {
    events: mpsc::Sender<ChangerEvent>,
}

impl EchoPlayback {
    pub fn new(events: mpsc::Sender<ChangerEvent>) -> Self {
        Self { events }
    }

    fn feed_back(&self, event: PlaybackEvent) {
        // The changer task may be mid-dispatch when this runs; never wait on
        // its own channel or the pair deadlocks.
        if self.events.try_send(ChangerEvent::Playback(event)).is_err() {
            debug!(%event, "changer event channel full; dropping echo");
        }
    }
}

#[async_trait]
impl PlaybackEngine for EchoPlayback {
    async fn command(&self, command: PlaybackCommand) {
        debug!(%command, "echo playback command");
        match command {
            PlaybackCommand::Play => self.feed_back(PlaybackEvent::Playing),
            PlaybackCommand::Pause => self.feed_back(PlaybackEvent::Paused),
            PlaybackCommand::Stop => self.feed_back(PlaybackEvent::Stopped),
            PlaybackCommand::ChangeDisc(_)
            | PlaybackCommand::SeekNext
            | PlaybackCommand::SeekPrev => self.feed_back(PlaybackEvent::Playing),
        }
    }
}

/// Engine stand-in that swallows every command. Test helper.
pub struct NullPlayback;

#[async_trait]
impl PlaybackEngine for NullPlayback {
    async fn command(&self, _command: PlaybackCommand) {}
}
