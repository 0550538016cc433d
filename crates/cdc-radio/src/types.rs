//! ---
//! cdc_section: "04-radio-protocol"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "Typed command and status vocabulary of the radio dialect."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
//! Typed vocabulary of the radio dialect.
//!
//! Commands are only ever produced by [`crate::decode`], reports are only
//! ever consumed by [`crate::encode`]; nothing else constructs wire bytes.

use strum::Display;

/// Fixed device addresses on the bus.
pub mod address {
    pub const CD_CHANGER: u8 = 0x18;
    pub const RADIO: u8 = 0x68;
    pub const BROADCAST_LOW: u8 = 0x00;
    pub const BROADCAST_HIGH: u8 = 0xFF;
}

/// Bit 7 of the disc bitmap: the magazine cartridge is inserted.
pub const MAGAZINE_PRESENT: u8 = 0x80;

/// Bits 0..=5 of the disc bitmap: one bit per disc slot.
pub const DISC_ANY: u8 = 0x3F;

/// Fast-play direction.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Reverse,
    Forward,
}

/// Track seek direction.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum SeekDirection {
    Next,
    Previous,
}

/// On/off toggle carried by scan and randomize commands.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    Off,
    On,
}

/// A command the radio sent us, decoded from a frame.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum RadioCommand {
    /// Report current status without changing anything.
    Status,
    Stop,
    Pause,
    Play,
    FastPlay(Direction),
    Seek(SeekDirection),
    /// Steering-wheel seek variant; same effect as [`RadioCommand::Seek`].
    AltSeek(SeekDirection),
    /// Switch to disc 1..=6.
    ChangeDisc(u8),
    ScanDisc(Switch),
    Randomize(Switch),
    /// Device poll; answered without touching state.
    Poll,
    /// Valid traffic addressed to another device.
    Traffic,
}

/// Audio section state as encoded on the wire.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AudioState {
    #[default]
    Stopped = 0x02,
    Playing = 0x09,
    Paused = 0x0C,
}

/// Deck snapshot carried by every steady-state report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeckStatus {
    pub audio_state: AudioState,
    /// Bit 7 magazine present, bits 0..=5 disc 1..=6 present.
    pub disc_bitmap: u8,
    pub current_disc: u8,
    pub current_track: u8,
}

impl DeckStatus {
    pub fn magazine_present(&self) -> bool {
        self.disc_bitmap & MAGAZINE_PRESENT != 0
    }

    pub fn any_disc_present(&self) -> bool {
        self.disc_bitmap & DISC_ANY != 0
    }
}

/// One step of the progressive disc enumeration report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscCheck {
    pub audio_state: AudioState,
    /// Cumulative presence mask; see [`crate::encode`] for the
    /// before/after dialect.
    pub mask: u8,
    /// Slot being probed, 1..=6.
    pub disc: u8,
    /// The most recent completed probe found no disc.
    pub last_failed: bool,
}

/// A status report for the radio, to be encoded into a frame.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ChangerReport {
    Stopped(DeckStatus),
    Paused(DeckStatus),
    Playing(DeckStatus),
    FastPlaying(Direction, DeckStatus),
    Seeking(Option<SeekDirection>, DeckStatus),
    LoadingDisc(DeckStatus),
    CheckingForDisc(DiscCheck),
    /// Self-identification broadcast sent until the radio speaks.
    Announce,
    PollResponse,
}
