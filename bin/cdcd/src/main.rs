//! ---
//! cdc_section: "07-daemon"
//! cdc_subsection: "binary"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "Binary entrypoint for the changer daemon."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use cdc_changer::{spawn_decode, spawn_encode, Changer, ChangerEvent, EchoPlayback};
use cdc_common::config::AppConfig;
use cdc_common::logging::init_tracing;
use cdc_physical::{LoopbackPort, PhysicalLayer};
use cdc_sim::RadioSimulator;
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "CD-changer emulator daemon",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Disc-presence bitmask fed to the changer at startup")]
    discs: Option<u8>,

    #[arg(long, help = "Drive the bus with the canned radio session")]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/cdcd.toml"));
    candidates.push(PathBuf::from("configs/cdcd.dev.toml"));

    let config = AppConfig::load(&candidates)?;
    init_tracing("cdcd", &config.logging)?;

    let port = LoopbackPort::new();
    let (_physical, frames, sender) = PhysicalLayer::spawn(Arc::clone(&port), &config.bus);

    let (event_tx, event_rx) = mpsc::channel(64);
    let (report_tx, report_rx) = mpsc::channel(64);

    let _decode_task = spawn_decode(frames, event_tx.clone());
    let _encode_task = spawn_encode(report_rx, sender);

    let engine = Arc::new(EchoPlayback::new(event_tx.clone()));
    let changer = Changer::new(report_tx, engine, config.changer.clone());
    let changer_task = tokio::spawn(changer.run(event_rx));

    if let Some(bitmap) = cli.discs {
        event_tx.send(ChangerEvent::DiscStatus(bitmap)).await.ok();
    }

    let simulator = RadioSimulator::new(Arc::clone(&port));
    if cli.demo {
        info!("running the canned radio session");
        let script = RadioSimulator::demo_script();
        tokio::spawn(async move {
            simulator.run_script(&script).await;
        });
    }

    info!("daemon running; waiting for termination signal");
    signal::ctrl_c().await?;
    info!("ctrl-c received; shutting down");
    changer_task.abort();

    Ok(())
}
