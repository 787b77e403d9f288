//! Start the favorite mode stored in the device's EEPROM
//!
//! Usage:
//!   cargo run --example load_favorite -- --port /dev/ttyUSB0

use clap::Parser;
use stimlink::{Device, DriverConfig};

#[derive(Parser)]
#[command(about = "Load a stimulation controller's favorite mode")]
struct Args {
    /// Serial port the controller is attached to
    #[arg(short, long)]
    port: Option<String>,
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
    match device.favorite_mode()? {
        Some(mode) => println!("Favorite mode in EEPROM: {}", mode.name()),
        None => println!("Favorite mode slot holds an unknown value"),
    }

    if device.load_favorite_mode()? {
        match device.current_mode()? {
            Some(mode) => println!("Now running: {}", mode.name()),
            None => println!("Device reports an unknown mode"),
        }
    } else {
        println!("Favorite-mode command was not accepted");
    }

    device.close();
    Ok(())
}
