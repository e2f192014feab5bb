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
use std::{path::Path, time::Duration};

use ::config::{File, FileFormat};
use duration_string::DurationString;
use serde::Deserialize;

use crate::{
    bus::{
        BusConfig, SerialConfig, BROADCAST_ADDRESS, DEFAULT_BAUD_RATE, DEFAULT_FIXTURE_COUNT,
        DEFAULT_WRITE_TIMEOUT,
    },
    color::checked_byte,
};

mod animation;
mod error;

pub use animation::Animation;
pub use error::ConfigError;

/// The configuration for a bus and the animations running on it.
#[derive(Deserialize)]
pub struct Config {
    /// The serial port the bus is attached to.
    port: String,

    /// The baud rate of the port. Defaults to 19200.
    baud_rate: Option<u32>,

    /// How long a single write may block before it fails.
    write_timeout: Option<String>,

    /// The number of fixtures on the bus.
    fixture_count: Option<usize>,

    /// The address every fixture listens to.
    broadcast_address: Option<i64>,

    /// The animations to start.
    #[serde(default)]
    animations: Vec<Animation>,
}

impl Config {
    /// Parses a configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Config, ConfigError> {
        Ok(::config::Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Config>()?)
    }

    /// Parses a configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Config, ConfigError> {
        Ok(::config::Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize::<Config>()?)
    }

    /// Gets the serial port settings.
    pub fn serial(&self) -> Result<SerialConfig, ConfigError> {
        Ok(SerialConfig {
            path: self.port.clone(),
            baud_rate: self.baud_rate.unwrap_or(DEFAULT_BAUD_RATE),
            write_timeout: parse_duration(self.write_timeout.as_deref(), DEFAULT_WRITE_TIMEOUT)?,
        })
    }

    /// Gets the bus settings. Fails if the fixtures would overlap the broadcast address.
    pub fn bus(&self) -> Result<BusConfig, ConfigError> {
        let config = BusConfig {
            fixture_count: self.fixture_count.unwrap_or(DEFAULT_FIXTURE_COUNT),
            broadcast_address: self
                .broadcast_address
                .map_or(Ok(BROADCAST_ADDRESS), |address| {
                    checked_byte("broadcast address", address)
                })?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Gets the configured animations.
    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }
}

/// Parses an optional duration string such as "125ms", falling back to the default.
pub(crate) fn parse_duration(
    duration: Option<&str>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    duration.map_or(Ok(default), |duration| {
        Ok(DurationString::from_string(duration.to_string())?.into())
    })
}
