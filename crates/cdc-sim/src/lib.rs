//! ---
//! cdc_section: "06-simulator"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "Scripted radio head-unit simulator."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
//! Radio head-unit simulator.
//!
//! Drives the far end of a [`LoopbackPort`] the way a real head unit would:
//! polls, playback commands, pauses between them. Bench runs and integration
//! tests observe the changer's replies through [`RadioSimulator::next_reply`].

use std::sync::Arc;
use std::time::Duration;

use cdc_physical::{Frame, LoopbackPort};
use cdc_radio::{address, Direction, RadioCommand, SeekDirection, Switch};
use tracing::{debug, warn};

/// One step of a simulated radio session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimStep {
    /// Put a radio command on the wire.
    Send(RadioCommand),
    /// Let the bus breathe.
    Wait(Duration),
}

/// Build the radio-side frame for a command, the inverse of the changer's
/// decoder. `Traffic` has no single wire form and returns `None`.
pub fn command_frame(command: RadioCommand) -> Option<Frame> {
    let payload = match command {
        RadioCommand::Poll => vec![0x01],
        RadioCommand::Status => vec![0x38, 0x00, 0x00],
        RadioCommand::Stop => vec![0x38, 0x01, 0x00],
        RadioCommand::Pause => vec![0x38, 0x02, 0x00],
        RadioCommand::Play => vec![0x38, 0x03, 0x00],
        RadioCommand::FastPlay(Direction::Reverse) => vec![0x38, 0x04, 0x00],
        RadioCommand::FastPlay(Direction::Forward) => vec![0x38, 0x04, 0x01],
        RadioCommand::Seek(SeekDirection::Next) => vec![0x38, 0x05, 0x00],
        RadioCommand::Seek(SeekDirection::Previous) => vec![0x38, 0x05, 0x01],
        RadioCommand::AltSeek(SeekDirection::Next) => vec![0x38, 0x0A, 0x00],
        RadioCommand::AltSeek(SeekDirection::Previous) => vec![0x38, 0x0A, 0x01],
        RadioCommand::ChangeDisc(disc) => vec![0x38, 0x06, disc],
        RadioCommand::ScanDisc(Switch::Off) => vec![0x38, 0x07, 0x00],
        RadioCommand::ScanDisc(Switch::On) => vec![0x38, 0x07, 0x01],
        RadioCommand::Randomize(Switch::Off) => vec![0x38, 0x08, 0x00],
        RadioCommand::Randomize(Switch::On) => vec![0x38, 0x08, 0x01],
        RadioCommand::Traffic => return None,
    };
    Some(
        Frame::new(address::RADIO, address::CD_CHANGER, payload)
            .expect("command payloads are fixed-size and within bounds"),
    )
}

/// The radio end of a loopback bus.
pub struct RadioSimulator {
    port: Arc<LoopbackPort>,
}

impl RadioSimulator {
    pub fn new(port: Arc<LoopbackPort>) -> Self {
        Self { port }
    }

    /// Put one command on the wire as received traffic for the changer.
    pub fn send(&self, command: RadioCommand) {
        match command_frame(command) {
            Some(frame) => {
                debug!(?command, "simulator sending radio command");
                self.port.inject_frame(&frame);
            }
            None => warn!(?command, "command has no wire form; skipped"),
        }
    }

    /// Wait for the changer's next transmission and parse it.
    pub async fn next_reply(&self) -> Frame {
        loop {
            let wire = self.port.next_transmission().await;
            match Frame::parse(&wire) {
                Ok(frame) => return frame,
                Err(err) => warn!(%err, "changer transmitted an unparseable frame"),
            }
        }
    }

    /// Play a scripted session.
    pub async fn run_script(&self, script: &[SimStep]) {
        for step in script {
            match step {
                SimStep::Send(command) => self.send(*command),
                SimStep::Wait(pause) => tokio::time::sleep(*pause).await,
            }
        }
    }

    /// The canned bench session: poll, load a playlist-ish command mix.
    pub fn demo_script() -> Vec<SimStep> {
        vec![
            SimStep::Send(RadioCommand::Poll),
            SimStep::Wait(Duration::from_millis(200)),
            SimStep::Send(RadioCommand::Status),
            SimStep::Wait(Duration::from_millis(200)),
            SimStep::Send(RadioCommand::Play),
            SimStep::Wait(Duration::from_secs(2)),
            SimStep::Send(RadioCommand::Seek(SeekDirection::Next)),
            SimStep::Wait(Duration::from_secs(1)),
            SimStep::Send(RadioCommand::Pause),
            SimStep::Wait(Duration::from_secs(1)),
            SimStep::Send(RadioCommand::Stop),
        ]
    }
}
