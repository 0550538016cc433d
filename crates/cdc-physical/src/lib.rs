//! ---
//! cdc_section: "03-physical-transport"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "Half-duplex bus framing, RX assembly and CTS-gated transmission."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
//! Physical bus transport.
//!
//! The transport owns three tasks: the line listener feeding the byte
//! assembler, the validator turning raw byte runs into [`Frame`]s, and the
//! transmit drain. Applications talk to it through a [`FrameSender`] and a
//! channel of validated inbound frames.

pub mod frame;
pub mod port;
pub mod rx;
pub mod tx;

use std::sync::Arc;

use cdc_common::BusConfig;
use cdc_pool::FramePool;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

pub use frame::{xor_checksum, Frame, FrameError, MAX_FRAME, MAX_PAYLOAD, MIN_FRAME};
pub use port::{BusPort, LineEvent, LoopbackPort, TransferOutcome};
pub use rx::{validate, IoStatus, RawInbound, RxAssembler, RAW_CAPACITY};
pub use tx::{FrameSender, OutboundFrame};

/// Running transport tasks. Aborted on drop.
pub struct PhysicalLayer {
    tasks: Vec<JoinHandle<()>>,
}

impl PhysicalLayer {
    /// Wire up the transport over `port` and spawn its tasks.
    ///
    /// Returns the task handle bundle, the stream of validated inbound
    /// frames and the outbound sender.
    pub fn spawn<P: BusPort>(
        port: Arc<P>,
        config: &BusConfig,
    ) -> (Self, mpsc::Receiver<Frame>, FrameSender) {
        let rx_pool: FramePool<RawInbound> = FramePool::new(config.rx_pool_capacity);
        let tx_pool: FramePool<OutboundFrame> = FramePool::new(config.tx_pool_capacity);

        let (raw_tx, mut raw_rx) = mpsc::channel(config.rx_pool_capacity);
        let (frame_tx, frame_rx) = mpsc::channel(config.rx_pool_capacity);

        let shared = Arc::new(tx::TxShared::new());
        let sender = FrameSender::new(tx_pool, Arc::clone(&shared));

        let mut tasks = Vec::new();

        let listener_port = Arc::clone(&port);
        let mut assembler = RxAssembler::new(rx_pool, raw_tx);
        tasks.push(tokio::spawn(async move {
            loop {
                let event = listener_port.next_event().await;
                assembler.push(event);
            }
        }));

        tasks.push(tokio::spawn(async move {
            while let Some(raw) = raw_rx.recv().await {
                if let Some(frame) = validate(&raw) {
                    drop(raw);
                    if frame_tx.send(frame).await.is_err() {
                        break;
                    }
                }
            }
        }));

        tasks.push(tokio::spawn(tx::run_tx(port, shared, config.tx_gap)));

        info!(
            rx_pool = config.rx_pool_capacity,
            tx_pool = config.tx_pool_capacity,
            "physical transport started"
        );
        (Self { tasks }, frame_rx, sender)
    }
}

impl Drop for PhysicalLayer {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn injected_frames_arrive_validated() {
        let port = LoopbackPort::new();
        let (_layer, mut frames, _sender) = PhysicalLayer::spawn(Arc::clone(&port), &BusConfig::default());

        let poll = Frame::new(0x68, 0x18, vec![0x01]).expect("frame");
        port.inject_frame(&poll);
        // Noise between frames is discarded by the validator.
        port.inject_bytes(&[0x68, 0x05]);
        let play = Frame::new(0x68, 0x18, vec![0x38, 0x03, 0x00]).expect("frame");
        port.inject_frame(&play);

        assert_eq!(frames.recv().await, Some(poll));
        assert_eq!(frames.recv().await, Some(play));
    }

    #[tokio::test(start_paused = true)]
    async fn sender_reaches_the_wire() {
        let port = LoopbackPort::new();
        let (_layer, _frames, sender) = PhysicalLayer::spawn(Arc::clone(&port), &BusConfig::default());

        let announce = Frame::new(0x18, 0xFF, vec![0x02, 0x01]).expect("frame");
        sender.send(&announce).await.expect("queue");
        assert_eq!(
            port.next_transmission().await,
            vec![0x18, 0x04, 0xFF, 0x02, 0x01, 0xE0]
        );
    }
}
