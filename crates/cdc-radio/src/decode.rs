//! ---
//! cdc_section: "04-radio-protocol"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "Frame to typed-command translation."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
//! Inbound translation.
//!
//! Checksum and length validation already happened in the transport; this
//! layer judges addressing and the command dialect. Anything it cannot place
//! is dropped silently, the bus is shared and unknown chatter is normal.

use cdc_physical::Frame;
use tracing::trace;

use crate::types::{address, Direction, RadioCommand, SeekDirection, Switch};

const SUB_STATUS: u8 = 0x00;
const SUB_STOP: u8 = 0x01;
const SUB_PAUSE: u8 = 0x02;
const SUB_PLAY: u8 = 0x03;
const SUB_FAST_PLAY: u8 = 0x04;
const SUB_SEEK: u8 = 0x05;
const SUB_CHANGE_DISC: u8 = 0x06;
const SUB_SCAN_DISC: u8 = 0x07;
const SUB_RANDOMIZE: u8 = 0x08;
const SUB_ALT_SEEK: u8 = 0x0A;

/// Translate a validated frame into a radio command.
///
/// `None` covers both our own echoes and frames addressed to us that the
/// dialect does not recognise.
pub fn decode(frame: &Frame) -> Option<RadioCommand> {
    // The bus echoes our own transmissions back at us.
    if frame.source == address::CD_CHANGER {
        return None;
    }

    if frame.destination != address::CD_CHANGER
        && frame.destination != address::BROADCAST_LOW
        && frame.destination != address::BROADCAST_HIGH
    {
        return Some(RadioCommand::Traffic);
    }

    let payload = frame.payload.as_slice();
    let command = match payload {
        [0x01] => RadioCommand::Poll,
        [0x38, sub, data] => decode_sub_command(*sub, *data)?,
        _ => return None,
    };

    trace!(%command, source = frame.source, "radio command decoded");
    Some(command)
}

fn decode_sub_command(sub: u8, data: u8) -> Option<RadioCommand> {
    match sub {
        SUB_STATUS => Some(RadioCommand::Status),
        SUB_STOP => Some(RadioCommand::Stop),
        SUB_PAUSE => Some(RadioCommand::Pause),
        SUB_PLAY => Some(RadioCommand::Play),
        SUB_FAST_PLAY => match data {
            0 => Some(RadioCommand::FastPlay(Direction::Reverse)),
            1 => Some(RadioCommand::FastPlay(Direction::Forward)),
            _ => None,
        },
        SUB_SEEK => match data {
            0 => Some(RadioCommand::Seek(SeekDirection::Next)),
            1 => Some(RadioCommand::Seek(SeekDirection::Previous)),
            _ => None,
        },
        SUB_ALT_SEEK => match data {
            0 => Some(RadioCommand::AltSeek(SeekDirection::Next)),
            1 => Some(RadioCommand::AltSeek(SeekDirection::Previous)),
            _ => None,
        },
        SUB_CHANGE_DISC => (1..=6).contains(&data).then_some(RadioCommand::ChangeDisc(data)),
        SUB_SCAN_DISC => match data {
            0 => Some(RadioCommand::ScanDisc(Switch::Off)),
            1 => Some(RadioCommand::ScanDisc(Switch::On)),
            _ => None,
        },
        SUB_RANDOMIZE => match data {
            0 => Some(RadioCommand::Randomize(Switch::Off)),
            1 => Some(RadioCommand::Randomize(Switch::On)),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn radio_frame(payload: Vec<u8>) -> Frame {
        Frame::new(address::RADIO, address::CD_CHANGER, payload).expect("frame")
    }

    #[test]
    fn own_echo_is_ignored() {
        let echo = Frame::new(address::CD_CHANGER, address::RADIO, vec![0x39, 0x00]).expect("frame");
        assert_eq!(decode(&echo), None);
    }

    #[test]
    fn foreign_traffic_is_reported_not_decoded() {
        let other = Frame::new(0x44, 0x50, vec![0x38, 0x03, 0x00]).expect("frame");
        assert_eq!(decode(&other), Some(RadioCommand::Traffic));
    }

    #[test]
    fn poll_decodes_from_the_short_form() {
        assert_eq!(decode(&radio_frame(vec![0x01])), Some(RadioCommand::Poll));
    }

    #[test]
    fn broadcast_destinations_are_for_us() {
        let low = Frame::new(address::RADIO, address::BROADCAST_LOW, vec![0x01]).expect("frame");
        let high = Frame::new(address::RADIO, address::BROADCAST_HIGH, vec![0x01]).expect("frame");
        assert_eq!(decode(&low), Some(RadioCommand::Poll));
        assert_eq!(decode(&high), Some(RadioCommand::Poll));
    }

    #[test]
    fn the_full_sub_command_table_decodes() {
        let cases: Vec<(Vec<u8>, RadioCommand)> = vec![
            (vec![0x38, 0x00, 0x00], RadioCommand::Status),
            (vec![0x38, 0x01, 0x00], RadioCommand::Stop),
            (vec![0x38, 0x02, 0x00], RadioCommand::Pause),
            (vec![0x38, 0x03, 0x00], RadioCommand::Play),
            (vec![0x38, 0x04, 0x00], RadioCommand::FastPlay(Direction::Reverse)),
            (vec![0x38, 0x04, 0x01], RadioCommand::FastPlay(Direction::Forward)),
            (vec![0x38, 0x05, 0x00], RadioCommand::Seek(SeekDirection::Next)),
            (vec![0x38, 0x05, 0x01], RadioCommand::Seek(SeekDirection::Previous)),
            (vec![0x38, 0x0A, 0x00], RadioCommand::AltSeek(SeekDirection::Next)),
            (vec![0x38, 0x0A, 0x01], RadioCommand::AltSeek(SeekDirection::Previous)),
            (vec![0x38, 0x06, 0x01], RadioCommand::ChangeDisc(1)),
            (vec![0x38, 0x06, 0x06], RadioCommand::ChangeDisc(6)),
            (vec![0x38, 0x07, 0x00], RadioCommand::ScanDisc(Switch::Off)),
            (vec![0x38, 0x07, 0x01], RadioCommand::ScanDisc(Switch::On)),
            (vec![0x38, 0x08, 0x00], RadioCommand::Randomize(Switch::Off)),
            (vec![0x38, 0x08, 0x01], RadioCommand::Randomize(Switch::On)),
        ];
        for (payload, expected) in cases {
            assert_eq!(decode(&radio_frame(payload.clone())), Some(expected), "{payload:02X?}");
        }
    }

    #[test]
    fn out_of_range_data_bytes_are_rejected() {
        for payload in [
            vec![0x38, 0x04, 0x02],
            vec![0x38, 0x05, 0x02],
            vec![0x38, 0x0A, 0x02],
            vec![0x38, 0x06, 0x00],
            vec![0x38, 0x06, 0x07],
            vec![0x38, 0x07, 0x02],
            vec![0x38, 0x08, 0xFF],
            vec![0x38, 0x09, 0x00],
        ] {
            assert_eq!(decode(&radio_frame(payload.clone())), None, "{payload:02X?}");
        }
    }

    #[test]
    fn unknown_shapes_addressed_to_us_are_dropped() {
        assert_eq!(decode(&radio_frame(vec![0x02])), None);
        assert_eq!(decode(&radio_frame(vec![0x38, 0x03])), None);
        assert_eq!(decode(&radio_frame(vec![0x38, 0x03, 0x00, 0x00])), None);
    }
}
