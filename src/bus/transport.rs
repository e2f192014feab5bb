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
use std::{
    fmt,
    io::{self, Write},
    time::Duration,
};

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::debug;

use crate::Error;

/// The baud rate spoken by the fixture firmware.
pub const DEFAULT_BAUD_RATE: u32 = 19200;

/// How long the serial driver may block on a single write before giving up.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// A byte sink that the bus writes frames to.
pub trait Transport: Send {
    /// Queues bytes for transmission.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Blocks until everything written so far has physically left the port.
    fn flush(&mut self) -> io::Result<()>;
}

/// Settings for opening a serial port.
#[derive(Debug, Clone, PartialEq)]
pub struct SerialConfig {
    pub path: String,
    pub baud_rate: u32,
    pub write_timeout: Duration,
}

impl SerialConfig {
    pub fn new(path: &str) -> SerialConfig {
        SerialConfig {
            path: path.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// A transport backed by a serial port running 8N1.
pub struct SerialTransport {
    name: String,
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Opens the configured serial port.
    pub fn open(config: &SerialConfig) -> Result<SerialTransport, Error> {
        let port = serialport::new(&config.path, config.baud_rate)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .timeout(config.write_timeout)
            .open()?;

        debug!(
            port = config.path.as_str(),
            baud_rate = config.baud_rate,
            "Opened serial port."
        );

        Ok(SerialTransport {
            name: config.path.clone(),
            port,
        })
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()?;
        // The bus is half-duplex, so anything sitting in the input buffer is our own echo.
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }
}

impl fmt::Display for SerialTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Lists the serial ports known to the operating system.
pub fn list_ports() -> Result<Vec<String>, Error> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|port| port.port_name)
        .collect())
}
