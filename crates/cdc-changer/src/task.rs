//! ---
//! cdc_section: "05-changer-application"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "The changer application state machine task."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
//! The changer task.
//!
//! Owns all changer state and is the only producer of status reports. Until
//! the radio speaks it re-announces on a retry timer; after the first valid
//! inbound frame it waits on its event channel without any timeout at all.

use std::sync::Arc;

use cdc_common::ChangerConfig;
use cdc_radio::{
    AudioState, ChangerReport, DiscCheck, RadioCommand, SeekDirection, DISC_ANY, MAGAZINE_PRESENT,
};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::playback::{PlaybackCommand, PlaybackEngine, PlaybackEvent};
use crate::state::{ChangerState, DiscState, Lifecycle, PlayState};
use crate::ChangerEvent;

/// The changer application state machine.
pub struct Changer {
    state: ChangerState,
    reports: mpsc::Sender<ChangerReport>,
    engine: Arc<dyn PlaybackEngine>,
    config: ChangerConfig,
    announces_left: u32,
}

impl Changer {
    pub fn new(
        reports: mpsc::Sender<ChangerReport>,
        engine: Arc<dyn PlaybackEngine>,
        config: ChangerConfig,
    ) -> Self {
        let announces_left = config.announce_retry_budget;
        Self {
            state: ChangerState::default(),
            reports,
            engine,
            config,
            announces_left,
        }
    }

    /// Run until the event channel closes.
    pub async fn run(mut self, mut events: mpsc::Receiver<ChangerEvent>) {
        info!("changer task starting; announcing to the radio");
        self.announce().await;

        loop {
            match self.state.lifecycle {
                Lifecycle::NotConnected => {
                    match timeout(self.config.announce_retry_interval, events.recv()).await {
                        Ok(Some(event)) => self.handle_event(event).await,
                        Ok(None) => break,
                        Err(_) => self.announce().await,
                    }
                }
                Lifecycle::Connected => match events.recv().await {
                    Some(event) => self.handle_event(event).await,
                    None => break,
                },
            }
        }
        info!("changer event channel closed; task exiting");
    }

    async fn announce(&mut self) {
        if self.announces_left == 0 {
            debug!("announce budget exhausted; staying quiet until the radio speaks");
            return;
        }
        self.announces_left -= 1;
        self.emit(ChangerReport::Announce).await;
    }

    async fn handle_event(&mut self, event: ChangerEvent) {
        match event {
            ChangerEvent::Bus(command) => {
                if self.state.lifecycle == Lifecycle::NotConnected {
                    info!(%command, "radio spoke; changer connected");
                    self.state.lifecycle = Lifecycle::Connected;
                }
                self.handle_command(command).await;
            }
            ChangerEvent::DiscStatus(bitmap) => self.handle_disc_status(bitmap).await,
            ChangerEvent::Playback(event) => self.handle_playback(event).await,
        }
    }

    async fn handle_command(&mut self, command: RadioCommand) {
        debug!(%command, "dispatching radio command");
        match command {
            RadioCommand::Status => self.emit_play_state().await,
            RadioCommand::Stop => {
                self.engine.command(PlaybackCommand::Stop).await;
                self.state.play = PlayState::Stopped;
                self.state.audio_state = AudioState::Stopped;
                self.emit_play_state().await;
            }
            RadioCommand::Pause => {
                self.engine.command(PlaybackCommand::Pause).await;
                self.state.play = PlayState::Paused;
                self.state.audio_state = AudioState::Paused;
                self.emit_play_state().await;
            }
            RadioCommand::Play => {
                self.engine.command(PlaybackCommand::Play).await;
                self.state.play = PlayState::Playing;
                self.state.audio_state = AudioState::Playing;
                self.emit_play_state().await;
            }
            RadioCommand::FastPlay(direction) => {
                self.state.play = PlayState::Playing;
                self.state.audio_state = AudioState::Playing;
                self.emit(ChangerReport::FastPlaying(direction, self.state.deck()))
                    .await;
            }
            RadioCommand::Seek(direction) | RadioCommand::AltSeek(direction) => {
                let engine_command = match direction {
                    SeekDirection::Next => PlaybackCommand::SeekNext,
                    SeekDirection::Previous => PlaybackCommand::SeekPrev,
                };
                self.engine.command(engine_command).await;
                self.emit(ChangerReport::Seeking(Some(direction), self.state.deck()))
                    .await;
            }
            RadioCommand::ChangeDisc(disc) => {
                self.engine.command(PlaybackCommand::ChangeDisc(disc)).await;
                self.state.current_disc = disc;
                self.state.current_track = 1;
                self.emit_play_state().await;
            }
            RadioCommand::ScanDisc(_) | RadioCommand::Randomize(_) => {
                // No engine interface for these; acknowledge with status.
                self.emit_play_state().await;
            }
            RadioCommand::Poll => self.emit(ChangerReport::PollResponse).await,
            RadioCommand::Traffic => {}
        }
    }

    async fn handle_playback(&mut self, event: PlaybackEvent) {
        debug!(%event, "playback engine event");
        match event {
            PlaybackEvent::Playing => {
                self.state.play = PlayState::Playing;
                self.state.audio_state = AudioState::Playing;
                self.emit_play_state().await;
            }
            PlaybackEvent::Paused => {
                self.state.play = PlayState::Paused;
                self.state.audio_state = AudioState::Paused;
                self.emit_play_state().await;
            }
            PlaybackEvent::Stopped => {
                self.state.play = PlayState::Stopped;
                self.state.audio_state = AudioState::Stopped;
                self.emit_play_state().await;
            }
            PlaybackEvent::EndOfSong => {
                self.engine.command(PlaybackCommand::SeekNext).await;
            }
            PlaybackEvent::Error => {
                warn!("playback engine reported an error; stopping");
                self.state.play = PlayState::Stopped;
                self.state.audio_state = AudioState::Stopped;
                self.emit_play_state().await;
            }
        }
    }

    async fn handle_disc_status(&mut self, bitmap: u8) {
        if bitmap == self.state.disc_bitmap && self.state.disc != DiscState::NoMagazine {
            return;
        }
        info!(bitmap = %format_args!("{bitmap:#010b}"), "disc presence changed");

        if bitmap & MAGAZINE_PRESENT == 0 {
            self.reset_deck(DiscState::NoMagazine, bitmap).await;
        } else if bitmap & DISC_ANY == 0 {
            self.reset_deck(DiscState::NoDiscs, bitmap).await;
        } else {
            self.enumerate_discs(bitmap).await;
        }
    }

    async fn reset_deck(&mut self, disc_state: DiscState, bitmap: u8) {
        self.engine.command(PlaybackCommand::Stop).await;
        self.state.disc = disc_state;
        self.state.disc_bitmap = bitmap;
        self.state.play = PlayState::Stopped;
        self.state.audio_state = AudioState::Stopped;
        self.state.current_disc = 0;
        self.state.current_track = 0;
        self.emit(ChangerReport::Stopped(self.state.deck())).await;
    }

    /// Probe all six slots, reporting each one twice: first with the mask of
    /// discs found so far, then with the probed slot folded in and the flag
    /// set when the probe came up empty. The radio animates its display off
    /// this exact two-message sequence.
    async fn enumerate_discs(&mut self, bitmap: u8) {
        self.state.disc = DiscState::Enumerating;
        self.state.disc_bitmap = bitmap;

        for disc in 1u8..=6 {
            let before_mask: u8 = (1 << (disc - 1)) - 1;
            let cumulative_mask: u8 = ((1u16 << disc) - 1) as u8;
            let present = bitmap & (1 << (disc - 1)) != 0;

            self.emit(ChangerReport::CheckingForDisc(DiscCheck {
                audio_state: self.state.audio_state,
                mask: before_mask & bitmap,
                disc,
                last_failed: false,
            }))
            .await;

            tokio::time::sleep(self.config.disc_probe_delay).await;

            self.emit(ChangerReport::CheckingForDisc(DiscCheck {
                audio_state: self.state.audio_state,
                mask: cumulative_mask & bitmap,
                disc,
                last_failed: !present,
            }))
            .await;

            tokio::time::sleep(self.config.disc_probe_delay).await;
        }

        // Resume position is fixed at slot 2, track 1, whether or not a
        // disc is actually present there.
        self.state.disc = DiscState::DiscsPresent;
        self.state.current_disc = 2;
        self.state.current_track = 1;
        self.state.play = PlayState::Stopped;
        self.emit(ChangerReport::Stopped(self.state.deck())).await;
    }

    async fn emit_play_state(&mut self) {
        let report = match self.state.play {
            PlayState::Stopped => ChangerReport::Stopped(self.state.deck()),
            PlayState::Playing => ChangerReport::Playing(self.state.deck()),
            PlayState::Paused => ChangerReport::Paused(self.state.deck()),
        };
        self.emit(report).await;
    }

    async fn emit(&mut self, report: ChangerReport) {
        if self.reports.send(report).await.is_err() {
            warn!("report channel closed; dropping report");
        }
    }
}
