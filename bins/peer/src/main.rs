use clap::Parser;
use lattice_config::PeerConfig;
use lattice_events::PeerUpdate;
use lattice_mailbox::{Inbox, Outbox, PeerId, PEER_COUNT};
use rand::Rng;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// One lattice peer: publishes a counter to its own region and prints what
/// every other peer is publishing. Runs until killed.
#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// This process's index, 0 ..= PEER_COUNT - 1. Must be unique in the
    /// group: it selects the region this process owns and the reader bit it
    /// sets in every peer's slots.
    index: usize,

    /// Optional TOML config; defaults apply when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.index >= PEER_COUNT {
        eprintln!(
            "index {} is out of range; this group has {PEER_COUNT} peers (0..={})",
            args.index,
            PEER_COUNT - 1
        );
        std::process::exit(1);
    }
    let me = PeerId::new(args.index)?;

    let config = match &args.config {
        Some(path) => PeerConfig::load(path.display().to_string())?,
        None => PeerConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    // Own region first: every peer creates before attaching, so the
    // rendezvous below can never deadlock.
    let mut outbox = Outbox::<PeerUpdate>::create(config.region_path(args.index))?;

    info!("peer {me}: waiting for the other {} peers", PEER_COUNT - 1);
    let mut inboxes = Vec::with_capacity(PEER_COUNT - 1);
    for index in 0..PEER_COUNT {
        if index == args.index {
            continue;
        }
        let source = PeerId::new(index)?;
        inboxes.push(Inbox::<PeerUpdate>::attach(
            config.region_path(index),
            me,
            source,
        ));
    }
    info!("peer {me}: ready");

    let mut rng = rand::thread_rng();
    let mut value: u64 = 0;

    loop {
        for inbox in &mut inboxes {
            if inbox.has_message() {
                let update = *inbox.lock()?;
                info!("peer {me}: read from {}: {}", inbox.source(), update.val);
                inbox.unlock()?;
            } else {
                info!("peer {me}: read from {}: empty", inbox.source());
            }
        }

        value += 1;
        outbox.publish(PeerUpdate::new(value))?;
        info!("peer {me}: write {value}");

        let pause = rng.gen_range(config.min_publish_delay_us..=config.max_publish_delay_us);
        std::thread::sleep(Duration::from_micros(pause));
    }
}
