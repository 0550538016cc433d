//! ---
//! cdc_section: "04-radio-protocol"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "Stateless translation between bus frames and typed changer messages."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
//! Radio protocol translator.
//!
//! Pure functions between [`cdc_physical::Frame`] and the typed vocabulary
//! in [`types`]. No I/O, no state; the changer task owns all behaviour.

pub mod bcd;
pub mod decode;
pub mod encode;
pub mod types;

pub use bcd::bcd_track;
pub use decode::decode;
pub use encode::encode;
pub use types::{
    address, AudioState, ChangerReport, DeckStatus, Direction, DiscCheck, RadioCommand,
    SeekDirection, Switch, DISC_ANY, MAGAZINE_PRESENT,
};
