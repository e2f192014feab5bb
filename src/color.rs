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
use std::fmt;

use rand::Rng;

use crate::Error;

/// An RGB color as sent to a fixture. No alpha, no gamma correction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Builds a color from untyped components, rejecting anything outside 0-255.
    pub fn checked(r: i64, g: i64, b: i64) -> Result<Self, Error> {
        Ok(Self {
            r: checked_byte("red", r)?,
            g: checked_byte("green", g)?,
            b: checked_byte("blue", b)?,
        })
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Rgb::new(r, g, b)
    }
}

impl TryFrom<[i64; 3]> for Rgb {
    type Error = Error;

    fn try_from([r, g, b]: [i64; 3]) -> Result<Self, Self::Error> {
        Rgb::checked(r, g, b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Converts an untyped value into a wire byte.
pub(crate) fn checked_byte(name: &str, value: i64) -> Result<u8, Error> {
    u8::try_from(value).map_err(|_| {
        Error::InvalidArgument(format!("{} must be within 0-255, got {}", name, value))
    })
}

/// Picks a random color. Each channel is `floor(random * 255)`, so full intensity is never
/// chosen.
pub fn random_color() -> Rgb {
    random_color_with(&mut rand::thread_rng())
}

/// Picks a random color from the given source.
pub fn random_color_with<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
    let mut channel = || (rng.gen::<f64>() * 255.0) as u8;
    Rgb {
        r: channel(),
        g: channel(),
        b: channel(),
    }
}
