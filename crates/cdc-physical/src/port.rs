//! ---
//! cdc_section: "03-physical-transport"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "Bus port abstraction and in-memory loopback implementation."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
//! Hardware seam for the transport.
//!
//! [`BusPort`] is the boundary between the protocol stack and whatever
//! carries the bytes. The [`LoopbackPort`] implementation backs tests and the
//! simulator; a UART-backed port slots in behind the same trait.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::frame::Frame;

/// One event observed on the receive line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent {
    /// A byte arrived intact.
    Byte(u8),
    /// The UART flagged a parity error for the incoming byte.
    ParityError,
    /// The line went quiet long enough to mark a frame boundary.
    Idle,
}

/// Result of one outbound transfer attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Every byte left the wire.
    Complete,
    /// Another node claimed the bus mid-transfer; the frame must be resent.
    CtsLost,
}

/// The physical bus as the transport sees it.
#[async_trait]
pub trait BusPort: Send + Sync + 'static {
    /// Wait for the next receive-line event.
    async fn next_event(&self) -> LineEvent;

    /// Current clear-to-send state of the bus.
    fn cts(&self) -> bool;

    /// Wait until the bus is clear to send.
    async fn wait_for_cts(&self);

    /// Push one frame's bytes onto the wire and wait for the outcome.
    async fn transfer(&self, wire: &[u8]) -> TransferOutcome;
}

#[derive(Default)]
struct LoopbackState {
    events: VecDeque<LineEvent>,
    transmissions: VecDeque<Vec<u8>>,
    fail_next: u32,
}

/// In-memory port: injected line events on the RX side, recorded wire bytes
/// on the TX side, with scriptable CTS and transfer failures.
pub struct LoopbackPort {
    state: Mutex<LoopbackState>,
    rx_notify: Notify,
    tx_notify: Notify,
    cts: AtomicBool,
    cts_notify: Notify,
}

impl Default for LoopbackPort {
    fn default() -> Self {
        Self {
            state: Mutex::new(LoopbackState::default()),
            rx_notify: Notify::new(),
            tx_notify: Notify::new(),
            cts: AtomicBool::new(true),
            cts_notify: Notify::new(),
        }
    }
}

impl LoopbackPort {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue raw line events for the receiving side.
    pub fn inject_events(&self, events: impl IntoIterator<Item = LineEvent>) {
        let mut state = self.state.lock();
        state.events.extend(events);
        drop(state);
        self.rx_notify.notify_one();
    }

    /// Queue a byte run followed by a line-idle boundary.
    pub fn inject_bytes(&self, bytes: &[u8]) {
        let mut events: Vec<LineEvent> = bytes.iter().copied().map(LineEvent::Byte).collect();
        events.push(LineEvent::Idle);
        self.inject_events(events);
    }

    /// Queue a complete frame as received wire traffic.
    pub fn inject_frame(&self, frame: &Frame) {
        self.inject_bytes(&frame.to_wire());
    }

    /// Raise or drop the clear-to-send line.
    pub fn set_cts(&self, clear: bool) {
        self.cts.store(clear, Ordering::SeqCst);
        if clear {
            self.cts_notify.notify_waiters();
        }
    }

    /// Make the next `count` transfers report a mid-frame CTS loss.
    pub fn fail_next_transfers(&self, count: u32) {
        self.state.lock().fail_next = count;
    }

    /// Pop the oldest recorded transmission, waiting for one if necessary.
    pub async fn next_transmission(&self) -> Vec<u8> {
        loop {
            let notified = self.tx_notify.notified();
            if let Some(wire) = self.state.lock().transmissions.pop_front() {
                return wire;
            }
            notified.await;
        }
    }

    /// Pop a recorded transmission without waiting.
    pub fn try_next_transmission(&self) -> Option<Vec<u8>> {
        self.state.lock().transmissions.pop_front()
    }

    /// Number of recorded transmissions not yet consumed.
    pub fn pending_transmissions(&self) -> usize {
        self.state.lock().transmissions.len()
    }
}

#[async_trait]
impl BusPort for LoopbackPort {
    async fn next_event(&self) -> LineEvent {
        loop {
            let notified = self.rx_notify.notified();
            if let Some(event) = self.state.lock().events.pop_front() {
                // Wake the next waiter in case more events are queued.
                self.rx_notify.notify_one();
                return event;
            }
            notified.await;
        }
    }

    fn cts(&self) -> bool {
        self.cts.load(Ordering::SeqCst)
    }

    async fn wait_for_cts(&self) {
        loop {
            let notified = self.cts_notify.notified();
            if self.cts() {
                return;
            }
            notified.await;
        }
    }

    async fn transfer(&self, wire: &[u8]) -> TransferOutcome {
        let mut state = self.state.lock();
        if state.fail_next > 0 {
            state.fail_next -= 1;
            drop(state);
            // A collision also drops the CTS line until the other node is done.
            self.set_cts(false);
            return TransferOutcome::CtsLost;
        }
        state.transmissions.push_back(wire.to_vec());
        drop(state);
        self.tx_notify.notify_waiters();
        TransferOutcome::Complete
    }
}
