//! ---
//! cdc_section: "05-changer-application"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "Changer state vocabulary."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
//! Changer-owned state.
//!
//! The whole struct is owned by the changer task alone; other tasks only ever
//! see copies carried inside typed messages.

use cdc_radio::{AudioState, DeckStatus, DISC_ANY, MAGAZINE_PRESENT};
use strum::Display;

/// Whether the radio has acknowledged our existence yet.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    NotConnected,
    Connected,
}

/// Magazine and disc availability.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscState {
    #[default]
    NoMagazine,
    NoDiscs,
    Enumerating,
    DiscsPresent,
}

/// Playback section state.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// The complete state owned by the changer task.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangerState {
    pub lifecycle: Lifecycle,
    pub disc: DiscState,
    pub play: PlayState,
    /// Bit 7 magazine present, bits 0..=5 disc 1..=6 present.
    pub disc_bitmap: u8,
    pub current_disc: u8,
    pub current_track: u8,
    pub audio_state: AudioState,
}

impl ChangerState {
    /// Snapshot of the fields every status report carries.
    pub fn deck(&self) -> DeckStatus {
        DeckStatus {
            audio_state: self.audio_state,
            disc_bitmap: self.disc_bitmap,
            current_disc: self.current_disc,
            current_track: self.current_track,
        }
    }

    pub fn magazine_present(&self) -> bool {
        self.disc_bitmap & MAGAZINE_PRESENT != 0
    }

    pub fn any_disc_present(&self) -> bool {
        self.disc_bitmap & DISC_ANY != 0
    }
}
