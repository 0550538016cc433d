//! ---
//! cdc_section: "08-testing"
//! cdc_subsection: "integration-tests"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "Full-stack bus tests: simulator to changer and back."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::Duration;

use cdc_changer::{spawn_decode, spawn_encode, Changer, ChangerEvent, NullPlayback};
use cdc_common::{AppConfig, BusConfig};
use cdc_physical::{Frame, LoopbackPort, PhysicalLayer};
use cdc_radio::{address, RadioCommand};
use cdc_sim::RadioSimulator;
use tokio::sync::mpsc;

struct Stack {
    events: mpsc::Sender<ChangerEvent>,
    sim: RadioSimulator,
    _physical: PhysicalLayer,
}

fn spawn_stack() -> Stack {
    let config = AppConfig::default();
    let port = LoopbackPort::new();
    let (physical, frames, sender) = PhysicalLayer::spawn(Arc::clone(&port), &config.bus);

    let (event_tx, event_rx) = mpsc::channel(64);
    let (report_tx, report_rx) = mpsc::channel(64);
    spawn_decode(frames, event_tx.clone());
    spawn_encode(report_rx, sender);

    let changer = Changer::new(report_tx, Arc::new(NullPlayback), config.changer);
    tokio::spawn(changer.run(event_rx));

    let sim = RadioSimulator::new(port);
    Stack {
        events: event_tx,
        sim,
        _physical: physical,
    }
}

const ANNOUNCE_WIRE: [u8; 6] = [0x18, 0x04, 0xFF, 0x02, 0x01, 0xE0];

async fn next_non_announce(sim: &RadioSimulator) -> Frame {
    loop {
        let frame = sim.next_reply().await;
        if frame.to_wire() != ANNOUNCE_WIRE {
            return frame;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn changer_announces_itself_on_the_wire() {
    let stack = spawn_stack();
    let announce = stack.sim.next_reply().await;
    assert_eq!(announce.to_wire(), ANNOUNCE_WIRE);
}

#[tokio::test(start_paused = true)]
async fn poll_is_answered_with_the_poll_response_broadcast() {
    let stack = spawn_stack();
    assert_eq!(stack.sim.next_reply().await.to_wire(), ANNOUNCE_WIRE);

    stack.sim.send(RadioCommand::Poll);
    let reply = next_non_announce(&stack.sim).await;
    assert_eq!(reply.to_wire(), vec![0x18, 0x04, 0xFF, 0x02, 0x00, 0xE1]);
}

#[tokio::test(start_paused = true)]
async fn status_with_no_magazine_reports_the_degenerate_template() {
    let stack = spawn_stack();
    assert_eq!(stack.sim.next_reply().await.to_wire(), ANNOUNCE_WIRE);

    stack.sim.send(RadioCommand::Status);
    let reply = next_non_announce(&stack.sim).await;
    assert_eq!(reply.destination, address::RADIO);
    assert_eq!(
        reply.payload,
        vec![0x39, 0x0A, 0x02, 0x18, 0x00, 0x00, 0x00, 0x00]
    );
}

#[tokio::test(start_paused = true)]
async fn play_after_loading_discs_reports_playing() {
    let stack = spawn_stack();
    assert_eq!(stack.sim.next_reply().await.to_wire(), ANNOUNCE_WIRE);

    // Connect, then load a magazine with disc 1 and let enumeration finish.
    stack.sim.send(RadioCommand::Status);
    next_non_announce(&stack.sim).await;
    stack
        .events
        .send(ChangerEvent::DiscStatus(0x80 | 0b000001))
        .await
        .expect("send disc status");
    for _ in 0..12 {
        let check = next_non_announce(&stack.sim).await;
        assert_eq!(check.payload[1], 0x09, "expected a disc-check frame");
    }
    let stopped = next_non_announce(&stack.sim).await;
    assert_eq!(stopped.payload[1], 0x00);

    stack.sim.send(RadioCommand::Play);
    let playing = next_non_announce(&stack.sim).await;
    // Playing, audio playing, disc bitmap 0b000001, the fixed resume slot.
    assert_eq!(
        playing.payload,
        vec![0x39, 0x02, 0x09, 0x00, 0b000001, 0x00, 0x02, 0x01]
    );
}

#[tokio::test(start_paused = true)]
async fn collision_mid_transfer_preserves_frame_order() {
    let port = LoopbackPort::new();
    let (_physical, _frames, sender) = PhysicalLayer::spawn(Arc::clone(&port), &BusConfig::default());

    let a = Frame::new(address::CD_CHANGER, address::RADIO, vec![0x39, 0x00, 0x02]).expect("frame");
    let b = Frame::new(address::CD_CHANGER, address::RADIO, vec![0x39, 0x02, 0x09]).expect("frame");

    port.fail_next_transfers(1);
    sender.send(&a).await.expect("queue a");
    sender.send(&b).await.expect("queue b");

    // Give the transmit task time to collide and park on the dropped line.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(port.pending_transmissions(), 0);

    port.set_cts(true);
    assert_eq!(port.next_transmission().await, a.to_wire());
    assert_eq!(port.next_transmission().await, b.to_wire());
}
