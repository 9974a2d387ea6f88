//! Bridge a GPS receiver's NMEA 0183 output to a DAC GDC31 autopilot head.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use clap::Parser;
use tracing::{error, info, Level};

use nmea_bridge::{
    bridge::Bridge,
    config::{BridgeConfig, DEFAULT_BAUD_RATE, DEFAULT_DEVICE},
    transport::{Replay, SerialTransport},
};

#[derive(Parser, Debug)]
#[command(name = "nmea-bridge", version, about, long_about = None)]
struct Cli {
    /// Serial device wired to the receiver and the autopilot
    #[arg(short, long, env = "NMEA_BRIDGE_DEVICE", default_value = DEFAULT_DEVICE)]
    device: String,

    /// Baud rate
    #[arg(short, long, env = "NMEA_BRIDGE_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Line read timeout in milliseconds
    #[arg(long, env = "NMEA_BRIDGE_READ_TIMEOUT_MS", default_value_t = 200)]
    read_timeout_ms: u64,

    /// Seconds between attempts to open the serial port
    #[arg(long, env = "NMEA_BRIDGE_RETRY_SECS", default_value_t = 5)]
    retry_secs: u64,

    /// Log every extracted field and frame
    #[arg(long, env = "NMEA_BRIDGE_DEBUG")]
    debug: bool,

    /// Replay canned sentences instead of using the serial port
    #[arg(long, env = "NMEA_BRIDGE_SIMULATION")]
    simulation: bool,
}

impl From<Cli> for BridgeConfig {
    fn from(cli: Cli) -> Self {
        BridgeConfig::default()
            .with_device(&cli.device)
            .with_baud_rate(cli.baud)
            .with_read_timeout(Duration::from_millis(cli.read_timeout_ms))
            .with_retry_interval(Duration::from_secs(cli.retry_secs))
            .with_debug(cli.debug)
            .with_simulation(cli.simulation)
    }
}

fn main() {
    let config = BridgeConfig::from(Cli::parse());

    let level = if config.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("### Aviation converter ###");

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        error!("cannot install interrupt handler: {}", e);
    }

    let mut bridge = Bridge::new(&config);
    if config.simulation {
        let mut replay = Replay::new(config.simulation_hold);
        bridge.run(&mut replay, &shutdown);
    } else {
        let opened = bridge.connect(
            || SerialTransport::open(&config),
            config.retry_interval,
            &shutdown,
        );
        if let Some(mut port) = opened {
            bridge.run(&mut port, &shutdown);
        }
    }
}
