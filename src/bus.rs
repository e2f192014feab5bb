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
use std::{fmt, sync::Arc};

use parking_lot::Mutex;
use tracing::{debug, info, span, Level};

use crate::{color::checked_byte, light::Light, Error, Rgb};

mod frame;
#[cfg(test)]
pub mod mock;
mod transport;

pub use frame::{Frame, COMMAND_FRAME_LEN, SYNC_MARKER, SYNC_PREAMBLE_LEN};
pub use transport::{
    list_ports, SerialConfig, SerialTransport, Transport, DEFAULT_BAUD_RATE,
    DEFAULT_WRITE_TIMEOUT,
};

/// The address every fixture listens to.
pub const BROADCAST_ADDRESS: u8 = 255;

/// The number of fixtures on a bus unless configured otherwise.
pub const DEFAULT_FIXTURE_COUNT: usize = 20;

/// The default fade granularity.
pub const DEFAULT_STEP: u8 = 5;

/// The default hold before a fade starts.
pub const DEFAULT_DELAY: u8 = 0;

/// The speed parameters of a fade. Both are in firmware-defined units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fade {
    /// Fade speed and granularity.
    pub step: u8,
    /// Hold before the fade starts.
    pub delay: u8,
}

impl Fade {
    pub const fn new(step: u8, delay: u8) -> Fade {
        Fade { step, delay }
    }

    /// Builds fade parameters from untyped values, rejecting anything outside 0-255.
    pub fn checked(step: i64, delay: i64) -> Result<Fade, Error> {
        Ok(Fade {
            step: checked_byte("step", step)?,
            delay: checked_byte("delay", delay)?,
        })
    }
}

impl Default for Fade {
    fn default() -> Self {
        Fade::new(DEFAULT_STEP, DEFAULT_DELAY)
    }
}

/// Bus construction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BusConfig {
    /// Number of fixtures on the bus. Addresses run from 0 to fixture_count - 1.
    pub fixture_count: usize,
    /// Address reserved for "all fixtures".
    pub broadcast_address: u8,
}

impl BusConfig {
    pub fn new(fixture_count: usize) -> BusConfig {
        BusConfig {
            fixture_count,
            broadcast_address: BROADCAST_ADDRESS,
        }
    }

    /// Fixture addresses must be representable in one byte and must never collide with the
    /// broadcast address.
    pub fn validate(&self) -> Result<(), Error> {
        if self.fixture_count > usize::from(self.broadcast_address) {
            return Err(Error::InvalidArgument(format!(
                "fixture count {} overlaps the broadcast address {}",
                self.fixture_count, self.broadcast_address
            )));
        }
        Ok(())
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig::new(DEFAULT_FIXTURE_COUNT)
    }
}

/// A serial bus with fixtures attached.
///
/// The bus is the only thing that writes to its transport. Every frame is written and flushed
/// while holding the transport lock, so frames from concurrent callers never interleave.
pub struct Bus {
    name: String,
    config: BusConfig,
    /// Guards the wire. Held from the first byte of a frame through its flush.
    transport: Mutex<Box<dyn Transport>>,
    lights: Vec<Arc<Light>>,
    broadcast: Arc<Light>,
    /// The bus color. Only sent by `update`.
    color: Mutex<Rgb>,
}

impl Bus {
    /// Creates a bus over the given transport and initializes it. The fixtures are told to
    /// resync and then to stop any fade in progress.
    pub fn new(
        name: &str,
        transport: Box<dyn Transport>,
        config: BusConfig,
    ) -> Result<Arc<Bus>, Error> {
        config.validate()?;

        let bus = Arc::new_cyclic(|bus| {
            let lights = (0..config.fixture_count)
                .map(|address| Arc::new(Light::new(bus.clone(), address as u8)))
                .collect();
            Bus {
                name: name.to_string(),
                broadcast: Arc::new(Light::new(bus.clone(), config.broadcast_address)),
                config,
                transport: Mutex::new(transport),
                lights,
                color: Mutex::new(Rgb::BLACK),
            }
        });

        let span = span!(Level::INFO, "bus init", bus = bus.name.as_str());
        let _enter = span.enter();

        bus.sync_all()?;
        bus.stop_all()?;

        info!(
            fixtures = bus.config.fixture_count,
            broadcast = bus.config.broadcast_address,
            "Bus initialized."
        );
        Ok(bus)
    }

    /// Opens a serial port and creates a bus on it.
    pub fn open(serial: &SerialConfig, config: BusConfig) -> Result<Arc<Bus>, Error> {
        let transport = SerialTransport::open(serial)?;
        Bus::new(&serial.path, Box::new(transport), config)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fixture_count(&self) -> usize {
        self.config.fixture_count
    }

    pub fn broadcast_address(&self) -> u8 {
        self.config.broadcast_address
    }

    /// Gets the light at the given address.
    pub fn light(&self, number: usize) -> Result<Arc<Light>, Error> {
        self.lights
            .get(number)
            .cloned()
            .ok_or_else(|| self.out_of_range(number))
    }

    /// All fixture lights in address order.
    pub fn lights(&self) -> &[Arc<Light>] {
        &self.lights
    }

    /// A light that addresses every fixture on the bus at once.
    pub fn broadcast(&self) -> Arc<Light> {
        self.broadcast.clone()
    }

    /// Sends the resync preamble followed by the given address.
    pub fn sync(&self, address: u8) -> Result<(), Error> {
        self.send(Frame::Sync { address })
    }

    /// Sends the resync preamble to the broadcast address.
    pub fn sync_all(&self) -> Result<(), Error> {
        self.sync(self.config.broadcast_address)
    }

    /// Fades the fixture(s) at the address to the given color.
    pub fn fade_to(&self, address: u8, color: Rgb, fade: Fade) -> Result<(), Error> {
        self.send(Frame::Fade {
            address,
            color,
            fade,
        })
    }

    /// Stops fades at the address. With `fading` set the fade engine halts as well, instead of
    /// only freezing the current color.
    pub fn stop(&self, address: u8, fading: bool) -> Result<(), Error> {
        self.send(Frame::Stop { address, fading })
    }

    /// Stops all fades on the bus and halts the fade engines.
    pub fn stop_all(&self) -> Result<(), Error> {
        self.stop(self.config.broadcast_address, true)
    }

    /// Fades the fixture(s) at the address to black with the default fade.
    pub fn black(&self, address: u8) -> Result<(), Error> {
        self.fade_to(address, Rgb::BLACK, Fade::default())
    }

    /// Fades every fixture on the bus to black.
    pub fn black_all(&self) -> Result<(), Error> {
        self.black(self.config.broadcast_address)
    }

    /// Stages the bus color without sending it.
    pub fn set_rgb(&self, color: Rgb) {
        debug!(bus = self.name.as_str(), color = %color, "Bus color set.");
        *self.color.lock() = color;
    }

    /// The staged bus color.
    pub fn rgb(&self) -> Rgb {
        *self.color.lock()
    }

    /// Fades every fixture to the staged bus color.
    pub fn update(&self) -> Result<(), Error> {
        let color = self.rgb();
        self.fade_to(self.config.broadcast_address, color, Fade::default())
    }

    /// Writes one frame and flushes it. Arguments are checked before the wire is touched.
    fn send(&self, frame: Frame) -> Result<(), Error> {
        self.check_address(frame.address())?;
        let bytes = frame.encode();

        debug!(bus = self.name.as_str(), frame = %frame, "Sending frame.");

        let mut transport = self.transport.lock();
        transport.write(&bytes)?;
        transport.flush()?;
        Ok(())
    }

    fn check_address(&self, address: u8) -> Result<(), Error> {
        if address == self.config.broadcast_address
            || usize::from(address) < self.config.fixture_count
        {
            return Ok(());
        }
        Err(self.out_of_range(usize::from(address)))
    }

    fn out_of_range(&self, address: usize) -> Error {
        Error::OutOfRange {
            address,
            fixture_count: self.config.fixture_count,
            broadcast: self.config.broadcast_address,
        }
    }
}

impl fmt::Display for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} fixtures)", self.name, self.config.fixture_count)
    }
}
