//! Step the output power level through Low, Normal and High
//!
//! Usage:
//!   cargo run --example set_power_level -- --port /dev/ttyUSB0

use clap::Parser;
use std::time::Duration;
use stimlink::{Device, DriverConfig, PowerLevel};

#[derive(Parser)]
#[command(about = "Cycle a stimulation controller's power level")]
struct Args {
    /// Serial port the controller is attached to
    #[arg(short, long)]
    port: Option<String>,

    /// Also persist the final level in EEPROM
    #[arg(long)]
    save: bool,
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
    for level in [PowerLevel::Low, PowerLevel::Normal, PowerLevel::High] {
        if device.set_power_level(level)? {
            println!("Power level: {}", level.name());
        } else {
            println!("Power level {} was not accepted", level.name());
        }
        std::thread::sleep(Duration::from_secs(2));
    }

    if args.save {
        if device.save_power_level(PowerLevel::High)? {
            println!("Persisted High in EEPROM");
        } else {
            println!("EEPROM write was not accepted");
        }
    }

    device.close();
    Ok(())
}
