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
use std::time::Duration;

use crate::{
    blend::ColorBlend,
    bus::Fade,
    light::{Addressable, Target},
    Error,
};

use super::{Animation, WorkerContext};

/// Fades a target to random points of a palette, one per interval.
pub struct PaletteCycle {
    target: Target,
    blend: ColorBlend,
    fade: Fade,
    interval: Duration,
}

impl PaletteCycle {
    pub fn new(target: Target, blend: ColorBlend, fade: Fade, interval: Duration) -> PaletteCycle {
        PaletteCycle {
            target,
            blend,
            fade,
            interval,
        }
    }
}

impl Animation for PaletteCycle {
    fn name(&self) -> &str {
        "palette"
    }

    fn step(&mut self, ctx: &WorkerContext) -> Result<(), Error> {
        let color = self.blend.evaluate(None)?;
        self.target.fade_to(color, self.fade)?;
        ctx.wait(self.interval, true);
        Ok(())
    }
}
