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
use std::{sync::Arc, time::Duration};

use serde::Deserialize;

use crate::{
    animation::{self, PaletteCycle, RaindropMode, Raindrops},
    blend::ColorBlend,
    bus::{Bus, Fade, DEFAULT_DELAY, DEFAULT_STEP},
    light::{Cluster, Target},
    Error, Rgb,
};

use super::{parse_duration, ConfigError};

/// The default time between palette fades.
const DEFAULT_PALETTE_INTERVAL: Duration = Duration::from_secs(1);

/// A YAML representation of an animation.
#[derive(Deserialize, Clone, Debug)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Animation {
    /// Random drops of color.
    Raindrops {
        /// single or ripple. Defaults to single.
        mode: Option<RaindropMode>,
        /// How long each drop stays lit.
        hold: Option<String>,
        /// The pause between drops.
        pause: Option<String>,
    },

    /// Random points of a palette.
    Palette {
        /// The fixtures to fade. All of them when omitted.
        lights: Option<Vec<usize>>,
        /// The palette colors as [r, g, b].
        palette: Vec<Vec<i64>>,
        /// The fade step.
        step: Option<i64>,
        /// The fade delay.
        delay: Option<i64>,
        /// The time between fades.
        interval: Option<String>,
    },
}

impl Animation {
    /// Builds the animation against the given bus.
    pub fn build(&self, bus: &Arc<Bus>) -> Result<Box<dyn animation::Animation>, ConfigError> {
        match self {
            Animation::Raindrops { mode, hold, pause } => {
                let mut raindrops = Raindrops::new(mode.unwrap_or(RaindropMode::Single));
                if let Some(hold) = hold {
                    raindrops =
                        raindrops.with_hold(parse_duration(Some(hold.as_str()), Duration::ZERO)?);
                }
                if let Some(pause) = pause {
                    raindrops =
                        raindrops.with_pause(parse_duration(Some(pause.as_str()), Duration::ZERO)?);
                }
                Ok(Box::new(raindrops))
            }
            Animation::Palette {
                lights,
                palette,
                step,
                delay,
                interval,
            } => {
                let blend = palette
                    .iter()
                    .map(|color| parse_color(color))
                    .collect::<Result<ColorBlend, Error>>()?;
                if blend.is_empty() {
                    return Err(Error::InvalidArgument("palette has no colors".to_string()).into());
                }

                let fade = Fade::checked(
                    step.unwrap_or(i64::from(DEFAULT_STEP)),
                    delay.unwrap_or(i64::from(DEFAULT_DELAY)),
                )?;
                let interval = parse_duration(interval.as_deref(), DEFAULT_PALETTE_INTERVAL)?;

                Ok(Box::new(PaletteCycle::new(
                    target(bus, lights.as_deref())?,
                    blend,
                    fade,
                    interval,
                )))
            }
        }
    }
}

fn parse_color(color: &[i64]) -> Result<Rgb, Error> {
    match color {
        [r, g, b] => Rgb::checked(*r, *g, *b),
        _ => Err(Error::InvalidArgument(format!(
            "colors need exactly three components, got {:?}",
            color
        ))),
    }
}

/// Resolves the configured light numbers into one target.
fn target(bus: &Arc<Bus>, lights: Option<&[usize]>) -> Result<Target, Error> {
    match lights {
        None | Some([]) => Ok(Target::Light(bus.broadcast())),
        Some([number]) => Ok(Target::Light(bus.light(*number)?)),
        Some(numbers) => {
            let cluster = Cluster::new();
            for number in numbers {
                cluster.register_light(bus.light(*number)?)?;
            }
            Ok(Target::Cluster(Arc::new(cluster)))
        }
    }
}
