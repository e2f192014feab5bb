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

/// Errors raised by the bus, its lights and clusters.
///
/// None of these are retried internally.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Unable to open serial port: {0}")]
    Serial(#[from] serialport::Error),

    #[error("Bus has been closed")]
    BusClosed,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Address {address} is out of range (fixtures: {fixture_count}, broadcast: {broadcast})")]
    OutOfRange {
        address: usize,
        fixture_count: usize,
        broadcast: u8,
    },

    #[error("Light is not a member of this cluster")]
    NotFound,

    #[error("Registering this light would make the cluster contain itself")]
    Cycle,
}

impl Error {
    /// Returns true if this error came from the underlying transport. Transport failures are
    /// fatal to the bus that raised them.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Serial(_) | Error::BusClosed
        )
    }
}
