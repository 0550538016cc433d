//! ---
//! cdc_section: "03-physical-transport"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "Receive-side byte assembly and frame validation."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
//! Receive path.
//!
//! The assembler runs in the byte-arrival context and must never wait: it
//! claims raw buffers with `try_alloc` and sheds the frame in progress when
//! the pool or the channel is full. Parsing and validation happen later in
//! the validate task, which is free to take its time.

use cdc_pool::{FramePool, PooledSlot};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::frame::Frame;
use crate::port::LineEvent;

/// Capacity of one raw receive buffer, comfortably above the largest frame.
pub const RAW_CAPACITY: usize = 64;

/// Health of one assembled byte run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IoStatus {
    #[default]
    Ok,
    /// At least one byte arrived with a parity error.
    ParityError,
    /// The run outgrew the buffer; bytes were lost.
    BufferOverrun,
}

/// One byte run between two line-idle boundaries.
#[derive(Debug, Clone, Copy)]
pub struct RawInbound {
    pub status: IoStatus,
    pub len: usize,
    pub buffer: [u8; RAW_CAPACITY],
}

impl Default for RawInbound {
    fn default() -> Self {
        Self {
            status: IoStatus::Ok,
            len: 0,
            buffer: [0; RAW_CAPACITY],
        }
    }
}

impl RawInbound {
    pub fn bytes(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    fn reset(&mut self) {
        self.status = IoStatus::Ok;
        self.len = 0;
    }
}

/// Accumulates line events into raw buffers and hands complete runs onward.
pub struct RxAssembler {
    pool: FramePool<RawInbound>,
    out: mpsc::Sender<PooledSlot<RawInbound>>,
    current: Option<PooledSlot<RawInbound>>,
}

impl RxAssembler {
    pub fn new(pool: FramePool<RawInbound>, out: mpsc::Sender<PooledSlot<RawInbound>>) -> Self {
        Self {
            pool,
            out,
            current: None,
        }
    }

    /// Feed one line event. Never blocks; a full pool or channel drops the
    /// run in progress.
    pub fn push(&mut self, event: LineEvent) {
        match event {
            LineEvent::Byte(byte) => {
                let Some(slot) = self.slot() else {
                    return;
                };
                if slot.len < RAW_CAPACITY {
                    let at = slot.len;
                    slot.buffer[at] = byte;
                    slot.len = at + 1;
                } else {
                    slot.status = IoStatus::BufferOverrun;
                }
            }
            LineEvent::ParityError => {
                if let Some(slot) = self.slot() {
                    slot.status = IoStatus::ParityError;
                }
            }
            LineEvent::Idle => self.finalize(),
        }
    }

    fn slot(&mut self) -> Option<&mut PooledSlot<RawInbound>> {
        if self.current.is_none() {
            match self.pool.try_alloc() {
                Some(mut slot) => {
                    slot.reset();
                    self.current = Some(slot);
                }
                None => {
                    warn!("rx pool exhausted; shedding incoming bytes");
                    return None;
                }
            }
        }
        self.current.as_mut()
    }

    /// Close the run in progress and ship it, empty runs included: the
    /// validate task is the single place that judges a run.
    fn finalize(&mut self) {
        let Some(slot) = self.current.take() else {
            return;
        };
        if let Err(err) = self.out.try_send(slot) {
            warn!("rx channel full; dropping assembled run ({err})");
        }
    }
}

/// Parse one raw run into a frame, or explain why it was discarded.
pub fn validate(raw: &RawInbound) -> Option<Frame> {
    match raw.status {
        IoStatus::Ok => {}
        IoStatus::ParityError => {
            debug!(len = raw.len, "discarding run with parity error");
            return None;
        }
        IoStatus::BufferOverrun => {
            debug!(len = raw.len, "discarding overrun run");
            return None;
        }
    }
    if raw.len == 0 {
        return None;
    }
    match Frame::parse(raw.bytes()) {
        Ok(frame) => {
            trace!(source = frame.source, destination = frame.destination, "frame received");
            Some(frame)
        }
        Err(err) => {
            debug!(len = raw.len, %err, "discarding unparseable run");
            None
        }
    }
}
