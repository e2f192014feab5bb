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

//! Drives chains of FnordLight RGB fixtures over a shared serial bus.
//!
//! A [`Bus`] owns the serial transport and turns commands into frames. [`Light`] and
//! [`Cluster`] both implement [`Addressable`], so code that fades one fixture fades a group of
//! fixtures, possibly spread over several buses, without changes.

pub mod animation;
pub mod blend;
pub mod bus;
pub mod color;
pub mod config;
mod error;
pub mod light;
mod playsync;

pub use blend::ColorBlend;
pub use bus::{Bus, BusConfig, Fade};
pub use color::Rgb;
pub use error::Error;
pub use light::{Addressable, Cluster, Light, Target};
