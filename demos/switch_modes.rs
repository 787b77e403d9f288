//! Walk the device through every built-in mode
//!
//! Usage:
//!   cargo run --example switch_modes -- --port /dev/ttyUSB0 --dwell 4

use clap::Parser;
use std::time::Duration;
use stimlink::{Device, DriverConfig, Mode};

#[derive(Parser)]
#[command(about = "Cycle a stimulation controller through all of its modes")]
struct Args {
    /// Serial port the controller is attached to
    #[arg(short, long)]
    port: Option<String>,

    /// Seconds to stay in each mode
    #[arg(short, long, default_value_t = 4)]
    dwell: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let Some(port) = args.port else {
        println!("No port given. Available ports:");
        for port in serialport::available_ports()? {
            println!("  {}", port.port_name);
        }
        return Ok(());
    };

    let mut config = DriverConfig::default();
    config.serial.port = port;

    let mut device = Device::open(&config)?;
    for &mode in Mode::all() {
        if device.switch_mode(mode)? {
            println!("Mode: {}", mode.name());
        } else {
            println!("Mode {} was not accepted", mode.name());
        }
        std::thread::sleep(Duration::from_secs(args.dwell));
    }

    device.close();
    Ok(())
}
