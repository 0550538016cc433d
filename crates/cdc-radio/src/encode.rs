//! ---
//! cdc_section: "04-radio-protocol"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "Typed-status to frame translation."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
//! Outbound translation.
//!
//! Every report maps to a fixed eight-byte status template (or the short
//! announce/poll forms). The byte layouts are the radio's dialect and must
//! not drift; tests pin them against captured traffic.

use cdc_physical::Frame;

use crate::bcd::bcd_track;
use crate::types::{
    address, ChangerReport, DeckStatus, Direction, DiscCheck, SeekDirection, AudioState, DISC_ANY,
};

// Wire state codes in the status template's second byte.
const STATE_STOPPED: u8 = 0x00;
const STATE_PAUSED: u8 = 0x01;
const STATE_PLAYING: u8 = 0x02;
const STATE_FAST_PLAYING: u8 = 0x03;
const STATE_REWINDING: u8 = 0x04;
const STATE_SEEKING_NEXT: u8 = 0x05;
const STATE_SEEKING_PREV: u8 = 0x06;
const STATE_SEEKING: u8 = 0x07;
const STATE_LOADING_DISC: u8 = 0x08;
const STATE_CHECKING_FOR_DISC: u8 = 0x09;
const STATE_NO_MAGAZINE: u8 = 0x0A;

// Magazine flag byte values used by the degenerate status templates.
const FLAG_NO_DISCS: u8 = 0x10;
const FLAG_NO_MAGAZINE: u8 = 0x18;

/// Encode a report into a ready-to-send frame.
pub fn encode(report: &ChangerReport) -> Frame {
    match report {
        ChangerReport::Stopped(deck) => deck_status(STATE_STOPPED, deck),
        ChangerReport::Paused(deck) => deck_status(STATE_PAUSED, deck),
        ChangerReport::Playing(deck) => deck_status(STATE_PLAYING, deck),
        ChangerReport::FastPlaying(Direction::Forward, deck) => {
            deck_status(STATE_FAST_PLAYING, deck)
        }
        ChangerReport::FastPlaying(Direction::Reverse, deck) => deck_status(STATE_REWINDING, deck),
        ChangerReport::Seeking(Some(SeekDirection::Next), deck) => {
            deck_status(STATE_SEEKING_NEXT, deck)
        }
        ChangerReport::Seeking(Some(SeekDirection::Previous), deck) => {
            deck_status(STATE_SEEKING_PREV, deck)
        }
        ChangerReport::Seeking(None, deck) => deck_status(STATE_SEEKING, deck),
        ChangerReport::LoadingDisc(deck) => deck_status(STATE_LOADING_DISC, deck),
        ChangerReport::CheckingForDisc(check) => disc_check(check),
        ChangerReport::Announce => to_broadcast(vec![0x02, 0x01]),
        ChangerReport::PollResponse => to_broadcast(vec![0x02, 0x00]),
    }
}

/// The steady-state status template. A missing magazine or an empty
/// magazine overrides whatever state the deck claims; the radio expects the
/// dedicated degenerate templates in those cases.
fn deck_status(state: u8, deck: &DeckStatus) -> Frame {
    let payload = if !deck.magazine_present() {
        vec![0x39, STATE_NO_MAGAZINE, AudioState::Stopped as u8, FLAG_NO_MAGAZINE, 0, 0, 0, 0]
    } else if !deck.any_disc_present() {
        vec![0x39, STATE_LOADING_DISC, AudioState::Stopped as u8, FLAG_NO_DISCS, 0, 0, 0, 0]
    } else {
        vec![
            0x39,
            state,
            deck.audio_state as u8,
            0,
            DISC_ANY & deck.disc_bitmap,
            0,
            deck.current_disc,
            bcd_track(deck.current_track),
        ]
    };
    to_radio(payload)
}

/// The enumeration dialect: each probe is announced with the mask of discs
/// found so far (not counting the slot in question) and closed out with the
/// mask including it, flagging a failed probe in the fourth byte.
fn disc_check(check: &DiscCheck) -> Frame {
    to_radio(vec![
        0x39,
        STATE_CHECKING_FOR_DISC,
        check.audio_state as u8,
        if check.last_failed { 0x08 } else { 0x00 },
        DISC_ANY & check.mask,
        0,
        check.disc,
        0,
    ])
}

fn to_radio(payload: Vec<u8>) -> Frame {
    Frame::new(address::CD_CHANGER, address::RADIO, payload)
        .expect("status payloads are fixed-size and within bounds")
}

fn to_broadcast(payload: Vec<u8>) -> Frame {
    Frame::new(address::CD_CHANGER, address::BROADCAST_HIGH, payload)
        .expect("broadcast payloads are fixed-size and within bounds")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;
    use crate::types::MAGAZINE_PRESENT;

    fn deck(bitmap: u8, disc: u8, track: u8, audio: AudioState) -> DeckStatus {
        DeckStatus {
            audio_state: audio,
            disc_bitmap: bitmap,
            current_disc: disc,
            current_track: track,
        }
    }

    #[test]
    fn announce_and_poll_response_pin_their_wire_bytes() {
        assert_eq!(
            encode(&ChangerReport::Announce).to_wire(),
            vec![0x18, 0x04, 0xFF, 0x02, 0x01, 0xE0]
        );
        assert_eq!(
            encode(&ChangerReport::PollResponse).to_wire(),
            vec![0x18, 0x04, 0xFF, 0x02, 0x00, 0xE1]
        );
    }

    #[test]
    fn playing_status_carries_deck_fields() {
        let frame = encode(&ChangerReport::Playing(deck(
            MAGAZINE_PRESENT | 0b000101,
            3,
            42,
            AudioState::Playing,
        )));
        assert_eq!(frame.destination, address::RADIO);
        assert_eq!(
            frame.payload,
            vec![0x39, 0x02, 0x09, 0x00, 0b000101, 0x00, 0x03, 0x42]
        );
    }

    #[test]
    fn state_codes_cover_the_whole_table() {
        let d = deck(MAGAZINE_PRESENT | 0b1, 1, 1, AudioState::Playing);
        let cases: Vec<(ChangerReport, u8)> = vec![
            (ChangerReport::Stopped(d), 0x00),
            (ChangerReport::Paused(d), 0x01),
            (ChangerReport::Playing(d), 0x02),
            (ChangerReport::FastPlaying(Direction::Forward, d), 0x03),
            (ChangerReport::FastPlaying(Direction::Reverse, d), 0x04),
            (ChangerReport::Seeking(Some(SeekDirection::Next), d), 0x05),
            (ChangerReport::Seeking(Some(SeekDirection::Previous), d), 0x06),
            (ChangerReport::Seeking(None, d), 0x07),
            (ChangerReport::LoadingDisc(d), 0x08),
        ];
        for (report, state) in cases {
            assert_eq!(encode(&report).payload[1], state, "{report}");
        }
    }

    #[test]
    fn missing_magazine_overrides_the_state() {
        let frame = encode(&ChangerReport::Playing(deck(0, 0, 0, AudioState::Playing)));
        assert_eq!(
            frame.payload,
            vec![0x39, 0x0A, 0x02, 0x18, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn empty_magazine_overrides_the_state() {
        let frame = encode(&ChangerReport::Stopped(deck(
            MAGAZINE_PRESENT,
            0,
            0,
            AudioState::Stopped,
        )));
        assert_eq!(
            frame.payload,
            vec![0x39, 0x08, 0x02, 0x10, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn disc_check_encodes_mask_flag_and_slot() {
        let going = encode(&ChangerReport::CheckingForDisc(DiscCheck {
            audio_state: AudioState::Stopped,
            mask: 0b000001,
            disc: 2,
            last_failed: false,
        }));
        assert_eq!(
            going.payload,
            vec![0x39, 0x09, 0x02, 0x00, 0b000001, 0x00, 0x02, 0x00]
        );

        let failed = encode(&ChangerReport::CheckingForDisc(DiscCheck {
            audio_state: AudioState::Stopped,
            mask: 0b000001,
            disc: 2,
            last_failed: true,
        }));
        assert_eq!(
            failed.payload,
            vec![0x39, 0x09, 0x02, 0x08, 0b000001, 0x00, 0x02, 0x00]
        );
    }

    #[test]
    fn magazine_bit_never_leaks_into_the_mask_byte() {
        let frame = encode(&ChangerReport::Playing(deck(
            MAGAZINE_PRESENT | DISC_ANY,
            1,
            1,
            AudioState::Playing,
        )));
        assert_eq!(frame.payload[4], DISC_ANY);
    }

    #[test]
    fn track_numbers_reach_the_wire_in_bcd() {
        let d = |track| deck(MAGAZINE_PRESENT | 0b1, 1, track, AudioState::Playing);
        assert_eq!(encode(&ChangerReport::Playing(d(0))).payload[7], 0x01);
        assert_eq!(encode(&ChangerReport::Playing(d(100))).payload[7], 0x01);
        assert_eq!(encode(&ChangerReport::Playing(d(199))).payload[7], 0x01);
        assert_eq!(encode(&ChangerReport::Playing(d(17))).payload[7], 0x17);
    }

    #[test]
    fn encoded_frames_parse_back_and_xor_to_zero() {
        let reports = [
            ChangerReport::Announce,
            ChangerReport::PollResponse,
            ChangerReport::Playing(deck(MAGAZINE_PRESENT | 0b111111, 6, 99, AudioState::Playing)),
        ];
        for report in reports {
            let wire = encode(&report).to_wire();
            assert_eq!(cdc_physical::xor_checksum(&wire), 0);
            let parsed = Frame::parse(&wire).expect("parse back");
            // Our own reports look like echoes to the decoder.
            assert_eq!(decode(&parsed), None);
        }
    }
}
