//! Process bootstrap (C9): CLI parsing, logging, wiring config/link/bridge
//! together, and running the two tasks described for this system.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use vlan_stp_bridge::bridge::Bridge;
use vlan_stp_bridge::cam::Cam;
use vlan_stp_bridge::config;
use vlan_stp_bridge::dataplane;
use vlan_stp_bridge::emitter;
use vlan_stp_bridge::link::{self, LinkSend};

/// VLAN-aware learning bridge with a simplified spanning-tree core.
#[derive(Parser, Debug)]
#[command(name = "vlan-stp-bridge")]
struct Cli {
    /// Numeric switch identity; selects `configs/switch<ID>.cfg`.
    switch_id: String,

    /// Names of the local interfaces to bind, one per config port line, in
    /// the same order as that config file.
    #[arg(required = true, num_args = 1..)]
    link_args: Vec<String>,

    /// Directory containing `switch<ID>.cfg` files.
    #[arg(long, default_value = "configs")]
    config_dir: PathBuf,

    /// BPDU resend cadence in milliseconds for the root bridge.
    #[arg(long, default_value_t = 1000)]
    bpdu_interval_ms: u64,

    /// Per-interface poll timeout for the data-plane receive loop.
    #[arg(long, default_value_t = 1000)]
    poll_timeout_us: u64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "exiting");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let switch_config = config::load(&cli.config_dir, &cli.switch_id)
        .with_context(|| format!("loading config for switch {}", cli.switch_id))?;
    info!(
        switch_id = %cli.switch_id,
        bridge_priority = switch_config.bridge_priority,
        ports = switch_config.ports.len(),
        "loaded switch configuration"
    );

    if switch_config.ports.len() != cli.link_args.len() {
        anyhow::bail!(
            "config for switch {} declares {} ports but {} link arguments were given",
            cli.switch_id,
            switch_config.ports.len(),
            cli.link_args.len()
        );
    }

    let (link_adapter, mut receivers) = link::build(
        &cli.link_args,
        Some(Duration::from_micros(cli.poll_timeout_us)),
    )
    .context("building link adapter")?;
    info!(
        switch_mac = ?link_adapter.get_switch_mac(),
        ports = link_adapter.port_count(),
        "bound link interfaces"
    );

    let bridge = Arc::new(Bridge::new(switch_config));
    let link_adapter: Arc<dyn LinkSend> = Arc::new(link_adapter);

    {
        let bridge = Arc::clone(&bridge);
        let link_adapter = Arc::clone(&link_adapter);
        let interval = Duration::from_millis(cli.bpdu_interval_ms);
        std::thread::Builder::new()
            .name("bpdu-emitter".into())
            .spawn(move || emitter::run(bridge, link_adapter, interval))
            .context("spawning bpdu emitter thread")?;
    }

    let mut cam = Cam::new();
    dataplane::run(&bridge, &mut cam, link_adapter.as_ref(), &mut receivers)
}
