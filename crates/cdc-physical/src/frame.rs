//! ---
//! cdc_section: "03-physical-transport"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "Wire frame type and XOR checksum codec."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
//! Bus frame layout and checksum.
//!
//! On the wire every frame is `[source, length, destination, payload...,
//! checksum]` where `length` counts the destination byte, the payload and the
//! checksum, and the checksum is the XOR of every preceding byte. A valid
//! frame therefore XORs to zero end to end.

use thiserror::Error;

/// Largest payload the changer ever exchanges with the radio.
pub const MAX_PAYLOAD: usize = 20;

/// Wire size of the largest frame: header (3) + payload + checksum.
pub const MAX_FRAME: usize = MAX_PAYLOAD + 4;

/// Smallest parseable frame: source, length, destination, checksum.
pub const MIN_FRAME: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("payload must not be empty")]
    EmptyPayload,
    #[error("payload of {0} bytes exceeds the {MAX_PAYLOAD} byte maximum")]
    PayloadLength(usize),
    #[error("frame truncated: {0} bytes on the wire, minimum is {MIN_FRAME}")]
    Truncated(usize),
    #[error("declared length {declared} does not match {actual} bytes on the wire")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("checksum mismatch")]
    Checksum,
}

/// A decoded bus frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub source: u8,
    pub destination: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Build a frame, rejecting payloads the bus cannot carry.
    pub fn new(source: u8, destination: u8, payload: Vec<u8>) -> Result<Self, FrameError> {
        if payload.is_empty() {
            return Err(FrameError::EmptyPayload);
        }
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadLength(payload.len()));
        }
        Ok(Self {
            source,
            destination,
            payload,
        })
    }

    /// Parse raw wire bytes into a frame.
    pub fn parse(raw: &[u8]) -> Result<Self, FrameError> {
        if raw.len() < MIN_FRAME {
            return Err(FrameError::Truncated(raw.len()));
        }
        let declared = raw[1] as usize;
        // length counts destination + payload + checksum
        if declared + 2 != raw.len() {
            return Err(FrameError::LengthMismatch {
                declared,
                actual: raw.len(),
            });
        }
        if xor_checksum(raw) != 0 {
            return Err(FrameError::Checksum);
        }
        let payload = raw[3..raw.len() - 1].to_vec();
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadLength(payload.len()));
        }
        Ok(Self {
            source: raw[0],
            destination: raw[2],
            payload,
        })
    }

    /// Serialise the frame into wire bytes, checksum included.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut wire = Vec::with_capacity(self.payload.len() + 4);
        wire.push(self.source);
        wire.push((self.payload.len() + 2) as u8);
        wire.push(self.destination);
        wire.extend_from_slice(&self.payload);
        wire.push(xor_checksum(&wire));
        wire
    }
}

/// XOR of all bytes. Over a complete valid frame the result is zero.
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}
