//! ---
//! cdc_section: "05-changer-application"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "Lifecycle, disc-magazine and playback state machine of the changer."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
//! The changer application.
//!
//! Everything that can happen to the changer arrives as one
//! [`ChangerEvent`]: a decoded bus command, a disc-presence reading, or an
//! asynchronous playback engine report. The [`task::Changer`] consumes them
//! and emits [`cdc_radio::ChangerReport`]s.

pub mod bridge;
pub mod playback;
pub mod state;
pub mod task;

use cdc_radio::RadioCommand;
use playback::PlaybackEvent;

pub use bridge::{spawn_decode, spawn_encode};
pub use playback::{EchoPlayback, NullPlayback, PlaybackCommand, PlaybackEngine};
pub use state::{ChangerState, DiscState, Lifecycle, PlayState};
pub use task::Changer;

/// Everything the changer task can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangerEvent {
    /// A decoded command from the radio.
    Bus(RadioCommand),
    /// Disc-presence bitmask from the magazine sensor.
    DiscStatus(u8),
    /// Asynchronous status from the playback engine.
    Playback(PlaybackEvent),
}
