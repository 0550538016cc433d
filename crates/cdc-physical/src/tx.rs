//! ---
//! cdc_section: "03-physical-transport"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "CTS-gated transmit queue with collision retry."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
//! Transmit path.
//!
//! Frames queue up in pool-backed buffers and drain one at a time. The bus is
//! half duplex, so each transfer waits for clear-to-send first; a collision
//! mid-transfer puts the frame back at the front of the queue so bus order is
//! preserved across retries.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use cdc_pool::{FramePool, PooledSlot};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, trace, warn};

use crate::frame::{Frame, FrameError, MAX_FRAME};
use crate::port::{BusPort, TransferOutcome};

/// One serialised frame waiting to go out.
#[derive(Debug, Clone, Copy)]
pub struct OutboundFrame {
    pub len: usize,
    pub buffer: [u8; MAX_FRAME],
}

impl Default for OutboundFrame {
    fn default() -> Self {
        Self {
            len: 0,
            buffer: [0; MAX_FRAME],
        }
    }
}

impl OutboundFrame {
    fn fill(&mut self, frame: &Frame) {
        let wire = frame.to_wire();
        self.buffer[..wire.len()].copy_from_slice(&wire);
        self.len = wire.len();
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer[..self.len]
    }
}

pub(crate) struct TxShared {
    pending: Mutex<VecDeque<PooledSlot<OutboundFrame>>>,
    notify: Notify,
}

impl TxShared {
    pub(crate) fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }
}

/// Handle used by the application to queue outbound frames.
#[derive(Clone)]
pub struct FrameSender {
    pool: FramePool<OutboundFrame>,
    shared: Arc<TxShared>,
}

impl FrameSender {
    pub(crate) fn new(pool: FramePool<OutboundFrame>, shared: Arc<TxShared>) -> Self {
        Self { pool, shared }
    }

    /// Queue a frame, waiting for a pool slot when the bus is backlogged.
    pub async fn send(&self, frame: &Frame) -> Result<(), FrameError> {
        if frame.payload.len() > crate::frame::MAX_PAYLOAD {
            return Err(FrameError::PayloadLength(frame.payload.len()));
        }
        let mut slot = self.pool.alloc().await;
        slot.fill(frame);
        self.shared.pending.lock().push_back(slot);
        self.shared.notify.notify_one();
        Ok(())
    }

    /// Number of frames waiting to leave.
    pub fn backlog(&self) -> usize {
        self.shared.pending.lock().len()
    }
}

/// Drain the transmit queue forever. Spawned by the transport.
pub(crate) async fn run_tx<P: BusPort>(port: Arc<P>, shared: Arc<TxShared>, gap: Duration) {
    loop {
        let slot = loop {
            let notified = shared.notify.notified();
            if let Some(slot) = shared.pending.lock().pop_front() {
                break slot;
            }
            notified.await;
        };

        if !port.cts() {
            trace!("bus busy before transfer; waiting for cts");
            // Keep holding the frame; nothing else can jump the queue while
            // it is out of the deque.
            port.wait_for_cts().await;
        }

        match port.transfer(slot.bytes()).await {
            TransferOutcome::Complete => {
                debug!(len = slot.len, "frame transmitted");
                drop(slot);
                // Quiet gap so the radio's receiver can keep up with
                // back-to-back frames.
                tokio::time::sleep(gap).await;
            }
            TransferOutcome::CtsLost => {
                warn!(len = slot.len, "collision mid-transfer; requeueing frame");
                shared.pending.lock().push_front(slot);
                port.wait_for_cts().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::LoopbackPort;

    fn sender(pool_capacity: usize) -> (FrameSender, Arc<TxShared>) {
        let shared = Arc::new(TxShared::new());
        (
            FrameSender::new(FramePool::new(pool_capacity), Arc::clone(&shared)),
            shared,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn transmits_queued_frames_in_order() {
        let port = LoopbackPort::new();
        let (tx, shared) = sender(4);
        tokio::spawn(run_tx(
            Arc::clone(&port),
            shared,
            Duration::from_millis(10),
        ));

        let a = Frame::new(0x18, 0xFF, vec![0x02, 0x01]).expect("frame");
        let b = Frame::new(0x18, 0xFF, vec![0x02, 0x00]).expect("frame");
        tx.send(&a).await.expect("queue a");
        tx.send(&b).await.expect("queue b");

        assert_eq!(port.next_transmission().await, a.to_wire());
        assert_eq!(port.next_transmission().await, b.to_wire());
    }

    #[tokio::test(start_paused = true)]
    async fn collision_requeues_at_the_front() {
        let port = LoopbackPort::new();
        let (tx, shared) = sender(4);
        tokio::spawn(run_tx(
            Arc::clone(&port),
            shared,
            Duration::from_millis(10),
        ));

        let a = Frame::new(0x18, 0x68, vec![0x39, 0x00]).expect("frame");
        let b = Frame::new(0x18, 0x68, vec![0x39, 0x01]).expect("frame");

        // First transfer collides and drops the CTS line.
        port.fail_next_transfers(1);
        tx.send(&a).await.expect("queue a");
        tx.send(&b).await.expect("queue b");

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(port.pending_transmissions(), 0);
        // The collided frame went back to the front, so both still count as
        // waiting.
        assert_eq!(tx.backlog(), 2);

        // Bus clears: A must still leave before B.
        port.set_cts(true);
        assert_eq!(port.next_transmission().await, a.to_wire());
        assert_eq!(port.next_transmission().await, b.to_wire());
        assert_eq!(tx.backlog(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn holds_off_while_cts_is_low() {
        let port = LoopbackPort::new();
        port.set_cts(false);
        let (tx, shared) = sender(2);
        tokio::spawn(run_tx(
            Arc::clone(&port),
            shared,
            Duration::from_millis(10),
        ));

        let frame = Frame::new(0x18, 0x68, vec![0x39, 0x02]).expect("frame");
        tx.send(&frame).await.expect("queue");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(port.pending_transmissions(), 0);

        port.set_cts(true);
        assert_eq!(port.next_transmission().await, frame.to_wire());
    }
}
