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
    sync::{Arc, Weak},
};

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    bus::{Bus, Fade},
    Error, Rgb,
};

mod cluster;

pub use cluster::Cluster;

/// Anything that can be faded like a single light.
///
/// Animations should be written against this trait so that they drive a single fixture and a
/// cluster of fixtures the same way.
pub trait Addressable: Send + Sync {
    /// Fades to the given color.
    fn fade_to(&self, color: Rgb, fade: Fade) -> Result<(), Error>;

    /// Fades to black with the default fade.
    fn black(&self) -> Result<(), Error>;

    /// Stages a color without sending it.
    fn set_rgb(&self, color: Rgb);

    /// The staged color.
    fn rgb(&self) -> Rgb;

    /// Fades to the staged color with the default fade.
    fn update(&self) -> Result<(), Error> {
        self.fade_to(self.rgb(), Fade::default())
    }
}

/// A single fixture address on a bus.
///
/// The bus reference is weak and is only upgraded for the duration of a call. A light never
/// keeps its bus alive.
#[derive(Debug)]
pub struct Light {
    bus: Weak<Bus>,
    address: u8,
    color: Mutex<Rgb>,
}

impl Light {
    pub(crate) fn new(bus: Weak<Bus>, address: u8) -> Light {
        Light {
            bus,
            address,
            color: Mutex::new(Rgb::BLACK),
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Returns true if both lights address the same fixture on the same bus.
    pub fn same_fixture(&self, other: &Light) -> bool {
        self.address == other.address && Weak::ptr_eq(&self.bus, &other.bus)
    }

    fn bus(&self) -> Result<Arc<Bus>, Error> {
        self.bus.upgrade().ok_or(Error::BusClosed)
    }
}

impl Addressable for Light {
    fn fade_to(&self, color: Rgb, fade: Fade) -> Result<(), Error> {
        debug!(
            address = self.address,
            color = %color,
            step = fade.step,
            delay = fade.delay,
            "Light fade."
        );
        self.bus()?.fade_to(self.address, color, fade)
    }

    fn black(&self) -> Result<(), Error> {
        self.bus()?.black(self.address)
    }

    fn set_rgb(&self, color: Rgb) {
        *self.color.lock() = color;
    }

    fn rgb(&self) -> Rgb {
        *self.color.lock()
    }
}

impl fmt::Display for Light {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "light @{}", self.address)
    }
}

/// One member of a cluster: either a single light or another cluster.
#[derive(Debug, Clone)]
pub enum Target {
    Light(Arc<Light>),
    Cluster(Arc<Cluster>),
}

impl Target {
    /// Returns true if `cluster` is this target or is nested anywhere inside it.
    pub(crate) fn reaches(&self, cluster: &Cluster) -> bool {
        match self {
            Target::Light(_) => false,
            Target::Cluster(member) => {
                std::ptr::eq(Arc::as_ptr(member), cluster) || member.contains(cluster)
            }
        }
    }

    fn as_addressable(&self) -> &dyn Addressable {
        match self {
            Target::Light(light) => light.as_ref(),
            Target::Cluster(cluster) => cluster.as_ref(),
        }
    }
}

/// Lights compare by fixture, clusters by identity.
impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Target::Light(a), Target::Light(b)) => a.same_fixture(b),
            (Target::Cluster(a), Target::Cluster(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Arc<Light>> for Target {
    fn from(light: Arc<Light>) -> Self {
        Target::Light(light)
    }
}

impl From<Arc<Cluster>> for Target {
    fn from(cluster: Arc<Cluster>) -> Self {
        Target::Cluster(cluster)
    }
}

impl Addressable for Target {
    fn fade_to(&self, color: Rgb, fade: Fade) -> Result<(), Error> {
        self.as_addressable().fade_to(color, fade)
    }

    fn black(&self) -> Result<(), Error> {
        self.as_addressable().black()
    }

    fn set_rgb(&self, color: Rgb) {
        self.as_addressable().set_rgb(color)
    }

    fn rgb(&self) -> Rgb {
        self.as_addressable().rgb()
    }

    fn update(&self) -> Result<(), Error> {
        self.as_addressable().update()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Light(light) => fmt::Display::fmt(light, f),
            Target::Cluster(cluster) => fmt::Display::fmt(cluster, f),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::bus::{test::mock_bus, Frame};

    use super::*;

    #[test]
    fn test_light_forwards_address() {
        let (bus, transport) = mock_bus(20);
        let light = bus.light(6).unwrap();

        light.fade_to(Rgb::new(9, 8, 7), Fade::new(50, 0)).unwrap();
        light.black().unwrap();

        assert_eq!(
            transport.flushed(),
            vec![
                Frame::Fade {
                    address: 6,
                    color: Rgb::new(9, 8, 7),
                    fade: Fade::new(50, 0),
                }
                .encode(),
                Frame::Fade {
                    address: 6,
                    color: Rgb::BLACK,
                    fade: Fade::default(),
                }
                .encode(),
            ]
        );
    }

    #[test]
    fn test_light_color_cache_round_trips() {
        let (bus, transport) = mock_bus(20);
        let light = bus.light(1).unwrap();

        light.set_rgb(Rgb::new(11, 22, 33));
        assert_eq!(light.rgb(), Rgb::new(11, 22, 33));
        assert!(transport.bytes().is_empty());

        light.update().unwrap();
        light.fade_to(Rgb::WHITE, Fade::default()).unwrap();
        assert_eq!(light.rgb(), Rgb::new(11, 22, 33));

        assert_eq!(
            transport.flushed()[0],
            Frame::Fade {
                address: 1,
                color: Rgb::new(11, 22, 33),
                fade: Fade::default(),
            }
            .encode()
        );
    }

    #[test]
    fn test_light_handle_is_shared() {
        let (bus, _) = mock_bus(20);
        bus.light(3).unwrap().set_rgb(Rgb::new(1, 1, 1));
        assert_eq!(bus.light(3).unwrap().rgb(), Rgb::new(1, 1, 1));
    }

    #[test]
    fn test_broadcast_light() {
        let (bus, transport) = mock_bus(20);
        bus.broadcast().black().unwrap();
        assert_eq!(transport.flushed()[0][0], 255);
    }

    #[test]
    fn test_light_after_bus_dropped() {
        let (bus, _) = mock_bus(20);
        let light = bus.light(0).unwrap();
        drop(bus);

        assert!(matches!(light.black(), Err(Error::BusClosed)));
    }

    #[test]
    fn test_target_equality() {
        let (bus_a, _) = mock_bus(4);
        let (bus_b, _) = mock_bus(4);

        let a0 = Target::from(bus_a.light(0).unwrap());
        let a0_again = Target::from(bus_a.light(0).unwrap());
        let a1 = Target::from(bus_a.light(1).unwrap());
        let b0 = Target::from(bus_b.light(0).unwrap());

        assert_eq!(a0, a0_again);
        assert_ne!(a0, a1);
        assert_ne!(a0, b0);

        let cluster = Arc::new(Cluster::new());
        let c = Target::from(cluster.clone());
        assert_eq!(c, Target::from(cluster));
        assert_ne!(c, Target::from(Arc::new(Cluster::new())));
        assert_ne!(c, a0);
    }
}
