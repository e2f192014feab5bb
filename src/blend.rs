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
use rand::Rng;

use crate::{Error, Rgb};

/// Interpolates across an ordered palette of colors on the interval [0, 1].
///
/// A value maps to position `value * (len - 1)`, bracketed by the entries at
/// `min(floor(position), len - 2)` and the one after it. The weighting within that bracket is
/// inverted relative to a textbook lerp: a fraction of 0 yields the upper entry and a fraction
/// of 1 yields the lower one. So a two color palette runs from its second color at 0.0 to its
/// first at 1.0.
///
/// With three or more colors an exact palette position does not return the entry there: an
/// interior integer position returns the next entry, and 1.0 returns the second-to-last entry.
/// The first entry is never produced exactly.
#[derive(Debug, Clone, Default)]
pub struct ColorBlend {
    colors: Vec<Rgb>,
}

impl ColorBlend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a color to the end of the palette.
    pub fn add_color(&mut self, color: Rgb) {
        self.colors.push(color);
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Evaluates the palette at `value`. A missing value, or one outside [0, 1], is replaced
    /// with a uniformly random one.
    pub fn evaluate(&self, value: Option<f64>) -> Result<Rgb, Error> {
        self.evaluate_with(value, &mut rand::thread_rng())
    }

    /// Like [`ColorBlend::evaluate`], drawing any substitute value from `rng`.
    pub fn evaluate_with<R: Rng + ?Sized>(
        &self,
        value: Option<f64>,
        rng: &mut R,
    ) -> Result<Rgb, Error> {
        match self.colors.as_slice() {
            [] => Err(Error::InvalidArgument(
                "cannot evaluate an empty palette".to_string(),
            )),
            [only] => Ok(*only),
            colors => {
                let value = match value {
                    Some(value) if (0.0..=1.0).contains(&value) => value,
                    _ => rng.gen::<f64>(),
                };

                let position = value * (colors.len() - 1) as f64;
                // The bracket always spans two distinct entries, so the last segment also
                // covers position == len - 1.
                let lower_index = (position.floor() as usize).min(colors.len() - 2);
                let upper_index = lower_index + 1;
                let fraction = position - lower_index as f64;

                let lower = colors[lower_index];
                let upper = colors[upper_index];
                let mix = |l: u8, u: u8| -> u8 {
                    (f64::from(l) * fraction + f64::from(u) * (1.0 - fraction)) as u8
                };

                Ok(Rgb {
                    r: mix(lower.r, upper.r),
                    g: mix(lower.g, upper.g),
                    b: mix(lower.b, upper.b),
                })
            }
        }
    }
}

impl FromIterator<Rgb> for ColorBlend {
    fn from_iter<T: IntoIterator<Item = Rgb>>(iter: T) -> Self {
        ColorBlend {
            colors: iter.into_iter().collect(),
        }
    }
}
