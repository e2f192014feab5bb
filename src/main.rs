// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{crate_version, Parser, Subcommand};
use fnordlight::animation::Worker;
use fnordlight::bus::{self, SerialConfig};
use fnordlight::config::{Config, ConfigError};
use fnordlight::{Addressable, Bus, BusConfig, Fade, Rgb};
use tracing::info;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Drives FnordLight fixtures over a serial bus."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

/// Options shared by the one-shot bus commands.
#[derive(clap::Args)]
struct BusArgs {
    /// The serial port the bus is attached to.
    port: String,
    /// The number of fixtures on the bus.
    #[arg(short = 'n', long, default_value_t = bus::DEFAULT_FIXTURE_COUNT)]
    fixture_count: usize,
    /// The baud rate of the port.
    #[arg(short, long, default_value_t = bus::DEFAULT_BAUD_RATE)]
    baud_rate: u32,
}

impl BusArgs {
    /// Opens and initializes the bus.
    fn open(&self) -> Result<Arc<Bus>, fnordlight::Error> {
        let serial = SerialConfig {
            baud_rate: self.baud_rate,
            ..SerialConfig::new(&self.port)
        };
        Bus::open(&serial, BusConfig::new(self.fixture_count))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available serial ports.
    Ports {},
    /// Runs the animations in the given config until interrupted.
    Start {
        /// The path to the bus config.
        config_path: String,
    },
    /// Fades one fixture, or all of them, to a color.
    Fade {
        #[clap(flatten)]
        bus: BusArgs,
        red: u8,
        green: u8,
        blue: u8,
        /// The fixture to fade. All fixtures when omitted.
        #[arg(short, long)]
        fixture: Option<usize>,
        /// The fade step.
        #[arg(short, long, default_value_t = bus::DEFAULT_STEP)]
        step: u8,
        /// The hold before fading.
        #[arg(short, long, default_value_t = bus::DEFAULT_DELAY)]
        delay: u8,
    },
    /// Fades one fixture, or all of them, to black.
    Black {
        #[clap(flatten)]
        bus: BusArgs,
        /// The fixture to black out. All fixtures when omitted.
        #[arg(short, long)]
        fixture: Option<usize>,
    },
    /// Stops running fades.
    Stop {
        #[clap(flatten)]
        bus: BusArgs,
        /// The fixture to stop. All fixtures when omitted.
        #[arg(short, long)]
        fixture: Option<usize>,
        /// Only freeze the current color instead of halting the fade engine.
        #[arg(long)]
        freeze: bool,
    },
    /// Sends the resync preamble.
    Sync {
        #[clap(flatten)]
        bus: BusArgs,
        /// The address to follow the preamble with. Broadcast when omitted.
        #[arg(short, long)]
        address: Option<u8>,
    },
}

/// Resolves an optional fixture number to a wire address.
fn address(bus: &Bus, fixture: Option<usize>) -> Result<u8, fnordlight::Error> {
    match fixture {
        Some(number) => Ok(bus.light(number)?.address()),
        None => Ok(bus.broadcast_address()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ports {} => {
            let ports = bus::list_ports()?;
            if ports.is_empty() {
                println!("No serial ports found.");
                return Ok(());
            }

            println!("Serial ports (count: {}):", ports.len());
            for port in ports {
                println!("- {}", port);
            }
        }
        Commands::Start { config_path } => {
            let config = Config::deserialize(&PathBuf::from(&config_path))?;
            let bus = Bus::open(&config.serial()?, config.bus()?)?;

            let mut workers = config
                .animations()
                .iter()
                .map(|animation| Ok(Worker::start(animation.build(&bus)?, bus.clone())))
                .collect::<Result<Vec<Worker>, ConfigError>>()?;

            if workers.is_empty() {
                println!("No animations configured for {}.", bus);
                return Ok(());
            }
            info!(workers = workers.len(), bus = bus.name(), "Animations running.");

            tokio::signal::ctrl_c().await?;
            info!("Interrupted, stopping animations.");

            for worker in workers.iter() {
                worker.stop();
            }
            tokio::task::spawn_blocking(move || {
                for worker in workers.iter_mut() {
                    worker.join();
                }
            })
            .await?;

            bus.black_all()?;
        }
        Commands::Fade {
            bus,
            red,
            green,
            blue,
            fixture,
            step,
            delay,
        } => {
            let bus = bus.open()?;
            let color = Rgb::new(red, green, blue);
            let fade = Fade::new(step, delay);
            match fixture {
                Some(number) => bus.light(number)?.fade_to(color, fade)?,
                None => bus.broadcast().fade_to(color, fade)?,
            }
        }
        Commands::Black { bus, fixture } => {
            let bus = bus.open()?;
            bus.black(address(&bus, fixture)?)?;
        }
        Commands::Stop {
            bus,
            fixture,
            freeze,
        } => {
            let bus = bus.open()?;
            bus.stop(address(&bus, fixture)?, !freeze)?;
        }
        Commands::Sync { bus, address } => {
            let bus = bus.open()?;
            bus.sync(address.unwrap_or(bus.broadcast_address()))?;
        }
    };

    Ok(())
}
