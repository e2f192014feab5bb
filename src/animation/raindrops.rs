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

use rand::Rng;
use serde::Deserialize;

use crate::{
    bus::Fade,
    color::random_color,
    light::{Addressable, Cluster, Target},
    Error, Rgb,
};

use super::{Animation, WorkerContext};

/// Fade used to light a drop up.
const DROP_FADE: Fade = Fade::new(50, 0);

/// Light at the centre of a ripple.
const RIPPLE_CENTRE: usize = 4;

/// Pairs lit together as a ripple moves outwards from the centre.
const RIPPLE_RINGS: [(usize, usize); 4] = [(3, 5), (2, 6), (1, 7), (0, 8)];

/// How raindrops fall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Single drops on randomly chosen lights.
    Single,
    /// Drops ripple outward from the centre light, one ring at a time.
    Ripple,
}

/// Random colored drops that flash up and fade out.
pub struct Raindrops {
    mode: Mode,
    /// How long a drop stays lit before it fades out.
    hold: Duration,
    /// The pause after a drop fades out.
    pause: Duration,
    /// The ripple rings, built on first use.
    rings: Option<Vec<Target>>,
}

impl Raindrops {
    pub fn new(mode: Mode) -> Raindrops {
        let pause = match mode {
            Mode::Single => Duration::from_millis(125),
            Mode::Ripple => Duration::from_millis(750),
        };
        Raindrops {
            mode,
            hold: Duration::from_millis(50),
            pause,
            rings: None,
        }
    }

    pub fn with_hold(mut self, hold: Duration) -> Raindrops {
        self.hold = hold;
        self
    }

    pub fn with_pause(mut self, pause: Duration) -> Raindrops {
        self.pause = pause;
        self
    }

    /// Lights a target in a random color, holds, then fades it out.
    fn drop_on(&self, target: &Target, ctx: &WorkerContext, fade_out: Fade) -> Result<(), Error> {
        target.fade_to(random_color(), DROP_FADE)?;
        ctx.wait(self.hold, false);
        target.fade_to(Rgb::BLACK, fade_out)
    }

    fn single(&mut self, ctx: &WorkerContext) -> Result<(), Error> {
        let count = ctx.light_count();
        if count == 0 {
            return Err(Error::InvalidArgument(
                "raindrops need at least one light".to_string(),
            ));
        }

        let origin = rand::thread_rng().gen_range(0..count);
        let light = ctx.light(origin)?;
        self.drop_on(&light, ctx, Fade::new(2, 0))?;
        ctx.wait(self.pause, true);
        Ok(())
    }

    fn ripple(&mut self, ctx: &WorkerContext) -> Result<(), Error> {
        let rings = match self.rings.take() {
            Some(rings) => rings,
            None => build_rings(ctx)?,
        };

        let result = self.ripple_rings(&rings, ctx);
        self.rings = Some(rings);
        result
    }

    fn ripple_rings(&self, rings: &[Target], ctx: &WorkerContext) -> Result<(), Error> {
        for ring in rings {
            if !ctx.running() {
                break;
            }
            self.drop_on(ring, ctx, Fade::new(2, 1))?;
            ctx.wait(self.pause, false);
        }
        Ok(())
    }
}

/// Builds the centre light followed by each ring as a cluster.
fn build_rings(ctx: &WorkerContext) -> Result<Vec<Target>, Error> {
    let needed = RIPPLE_RINGS[RIPPLE_RINGS.len() - 1].1 + 1;
    if ctx.light_count() < needed {
        return Err(Error::InvalidArgument(format!(
            "ripple needs at least {} lights, the bus has {}",
            needed,
            ctx.light_count()
        )));
    }

    let mut rings = vec![ctx.light(RIPPLE_CENTRE)?];
    for (left, right) in RIPPLE_RINGS {
        let cluster = Cluster::new();
        cluster.register_light(ctx.light(left)?)?;
        cluster.register_light(ctx.light(right)?)?;
        rings.push(Target::Cluster(Arc::new(cluster)));
    }
    Ok(rings)
}

impl Animation for Raindrops {
    fn name(&self) -> &str {
        match self.mode {
            Mode::Single => "raindrops",
            Mode::Ripple => "raindrops (ripple)",
        }
    }

    fn step(&mut self, ctx: &WorkerContext) -> Result<(), Error> {
        match self.mode {
            Mode::Single => self.single(ctx),
            Mode::Ripple => self.ripple(ctx),
        }
    }
}
