//! ---
//! cdc_section: "05-changer-application"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "Glue between the transport channels and the changer task."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
//! Transport glue.
//!
//! Two small forwarding tasks keep the changer task free of wire concerns:
//! inbound frames are decoded into bus events, outbound reports are encoded
//! and queued on the frame sender.

use cdc_physical::{Frame, FrameSender};
use cdc_radio::{decode, encode, ChangerReport};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::ChangerEvent;

/// Decode inbound frames into changer events until either channel closes.
pub fn spawn_decode(
    mut frames: mpsc::Receiver<Frame>,
    events: mpsc::Sender<ChangerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            let Some(command) = decode(&frame) else {
                continue;
            };
            if events.send(ChangerEvent::Bus(command)).await.is_err() {
                break;
            }
        }
    })
}

/// Encode changer reports onto the wire until either channel closes.
pub fn spawn_encode(
    mut reports: mpsc::Receiver<ChangerReport>,
    sender: FrameSender,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(report) = reports.recv().await {
            let frame = encode(&report);
            if let Err(err) = sender.send(&frame).await {
                warn!(%err, "failed to queue report frame");
            }
        }
    })
}
