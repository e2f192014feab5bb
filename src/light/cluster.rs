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

use parking_lot::Mutex;
use tracing::debug;

use crate::{bus::Fade, Error, Rgb};

use super::{Addressable, Target};

/// Serializes registrations, so a cycle check and the push that follows it can't be split by a
/// concurrent registration going the other way.
static REGISTRATION: Mutex<()> = Mutex::new(());

/// A group of lights and clusters driven as one light.
///
/// Members may sit on different buses. Calls fan out to the members in insertion order and
/// stop at the first failure; members before the failing one have already been sent their
/// frame.
#[derive(Debug, Default)]
pub struct Cluster {
    members: Mutex<Vec<Target>>,
    color: Mutex<Rgb>,
}

impl Cluster {
    pub fn new() -> Cluster {
        Cluster::default()
    }

    /// Creates a cluster from the given members.
    pub fn with_members<T, I>(members: I) -> Cluster
    where
        T: Into<Target>,
        I: IntoIterator<Item = T>,
    {
        Cluster {
            members: Mutex::new(members.into_iter().map(Into::into).collect()),
            color: Mutex::new(Rgb::BLACK),
        }
    }

    /// Appends a member. The same light may be registered more than once.
    ///
    /// Fails with [`Error::Cycle`] if the member is this cluster or contains it.
    pub fn register_light(&self, target: impl Into<Target>) -> Result<(), Error> {
        let target = target.into();
        let _registration = REGISTRATION.lock();
        if target.reaches(self) {
            return Err(Error::Cycle);
        }

        debug!(member = %target, "Cluster: register light.");
        self.members.lock().push(target);
        Ok(())
    }

    /// Removes the first member equal to `target`.
    pub fn remove_light(&self, target: &Target) -> Result<(), Error> {
        let mut members = self.members.lock();
        let index = members
            .iter()
            .position(|member| member == target)
            .ok_or(Error::NotFound)?;
        members.remove(index);
        Ok(())
    }

    /// A snapshot of the current members.
    pub fn members(&self) -> Vec<Target> {
        self.members.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.members.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.lock().is_empty()
    }

    /// Returns true if `cluster` is nested anywhere below this one.
    pub(crate) fn contains(&self, cluster: &Cluster) -> bool {
        // Only one member list is locked at a time.
        self.members()
            .iter()
            .any(|member| member.reaches(cluster))
    }
}

impl Addressable for Cluster {
    fn fade_to(&self, color: Rgb, fade: Fade) -> Result<(), Error> {
        let members = self.members();
        debug!(
            members = members.len(),
            color = %color,
            "Cluster fade."
        );

        // The snapshot is iterated unlocked so bus I/O never happens under the member lock.
        for member in members.iter() {
            member.fade_to(color, fade)?;
        }
        Ok(())
    }

    fn black(&self) -> Result<(), Error> {
        for member in self.members().iter() {
            member.black()?;
        }
        Ok(())
    }

    fn set_rgb(&self, color: Rgb) {
        *self.color.lock() = color;
    }

    fn rgb(&self) -> Rgb {
        *self.color.lock()
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cluster of {}", self.len())
    }
}

#[cfg(test)]
mod test {
    use std::{
        sync::{Arc, Barrier},
        thread,
    };

    use crate::bus::{test::mock_bus, Frame};

    use super::*;

    fn fade_frame(address: u8, color: Rgb, fade: Fade) -> Vec<u8> {
        Frame::Fade {
            address,
            color,
            fade,
        }
        .encode()
    }

    #[test]
    fn test_cluster_fans_out_across_buses() {
        let (bus_a, transport_a) = mock_bus(20);
        let (bus_b, transport_b) = mock_bus(20);

        let cluster = Cluster::new();
        cluster.register_light(bus_a.light(3).unwrap()).unwrap();
        cluster.register_light(bus_b.light(5).unwrap()).unwrap();

        cluster
            .fade_to(Rgb::new(100, 0, 50), Fade::new(50, 0))
            .unwrap();

        assert_eq!(
            transport_a.flushed(),
            vec![fade_frame(3, Rgb::new(100, 0, 50), Fade::new(50, 0))]
        );
        assert_eq!(
            transport_b.flushed(),
            vec![fade_frame(5, Rgb::new(100, 0, 50), Fade::new(50, 0))]
        );
    }

    #[test]
    fn test_cluster_preserves_insertion_order() {
        let (bus, transport) = mock_bus(20);
        let cluster = Cluster::with_members([
            bus.light(8).unwrap(),
            bus.light(0).unwrap(),
            bus.light(4).unwrap(),
        ]);

        cluster.black().unwrap();

        let addresses: Vec<u8> = transport.flushed().iter().map(|f| f[0]).collect();
        assert_eq!(addresses, vec![8, 0, 4]);
    }

    #[test]
    fn test_nested_clusters() {
        let (bus, transport) = mock_bus(20);
        let inner = Arc::new(Cluster::with_members([
            bus.light(1).unwrap(),
            bus.light(2).unwrap(),
        ]));
        let outer = Cluster::new();
        outer.register_light(bus.light(0).unwrap()).unwrap();
        outer.register_light(inner.clone()).unwrap();

        outer.fade_to(Rgb::WHITE, Fade::default()).unwrap();

        let addresses: Vec<u8> = transport.flushed().iter().map(|f| f[0]).collect();
        assert_eq!(addresses, vec![0, 1, 2]);
    }

    #[test]
    fn test_update_sends_cached_color() {
        let (bus, transport) = mock_bus(20);
        let cluster = Cluster::with_members([bus.light(1).unwrap(), bus.light(2).unwrap()]);

        cluster.set_rgb(Rgb::new(5, 6, 7));
        assert!(transport.bytes().is_empty());
        assert_eq!(cluster.rgb(), Rgb::new(5, 6, 7));

        cluster.update().unwrap();
        assert_eq!(
            transport.flushed(),
            vec![
                fade_frame(1, Rgb::new(5, 6, 7), Fade::default()),
                fade_frame(2, Rgb::new(5, 6, 7), Fade::default()),
            ]
        );
        // Member caches are untouched.
        assert_eq!(bus.light(1).unwrap().rgb(), Rgb::BLACK);
    }

    #[test]
    fn test_remove_light() {
        let (bus, _) = mock_bus(20);
        let cluster = Cluster::with_members([
            bus.light(1).unwrap(),
            bus.light(2).unwrap(),
            bus.light(1).unwrap(),
        ]);

        cluster
            .remove_light(&Target::from(bus.light(1).unwrap()))
            .unwrap();

        let remaining: Vec<Target> = cluster.members();
        assert_eq!(
            remaining,
            vec![
                Target::from(bus.light(2).unwrap()),
                Target::from(bus.light(1).unwrap()),
            ]
        );
    }

    #[test]
    fn test_remove_missing_light_is_not_found() {
        let (bus, _) = mock_bus(20);
        let cluster = Cluster::with_members([bus.light(1).unwrap(), bus.light(2).unwrap()]);
        let before = cluster.members();

        let result = cluster.remove_light(&Target::from(bus.light(3).unwrap()));
        assert!(matches!(result, Err(Error::NotFound)));
        assert_eq!(cluster.members(), before);

        // A second attempt fails the same way.
        let result = cluster.remove_light(&Target::from(bus.light(3).unwrap()));
        assert!(matches!(result, Err(Error::NotFound)));
        assert_eq!(cluster.len(), 2);
    }

    #[test]
    fn test_register_self_is_a_cycle() {
        let cluster = Arc::new(Cluster::new());
        assert!(matches!(
            cluster.register_light(cluster.clone()),
            Err(Error::Cycle)
        ));
        assert!(cluster.is_empty());
    }

    #[test]
    fn test_register_ancestor_is_a_cycle() {
        let (bus, _) = mock_bus(20);
        let top = Arc::new(Cluster::new());
        let middle = Arc::new(Cluster::new());
        let bottom = Arc::new(Cluster::with_members([bus.light(0).unwrap()]));

        top.register_light(middle.clone()).unwrap();
        middle.register_light(bottom.clone()).unwrap();

        assert!(matches!(
            bottom.register_light(top.clone()),
            Err(Error::Cycle)
        ));
        assert!(matches!(
            bottom.register_light(middle.clone()),
            Err(Error::Cycle)
        ));
        assert_eq!(bottom.len(), 1);

        // Sharing a cluster between siblings is not a cycle.
        let sibling = Arc::new(Cluster::new());
        sibling.register_light(bottom.clone()).unwrap();
        top.register_light(sibling).unwrap();
        top.black().unwrap();
    }

    #[test]
    fn test_fail_fast_on_first_error() {
        let (bus_a, transport_a) = mock_bus(20);
        let (bus_b, transport_b) = mock_bus(20);
        let (bus_c, transport_c) = mock_bus(20);

        let cluster = Cluster::with_members([
            bus_a.light(0).unwrap(),
            bus_b.light(0).unwrap(),
            bus_c.light(0).unwrap(),
        ]);
        transport_b.fail(true);

        let err = cluster.fade_to(Rgb::WHITE, Fade::default()).unwrap_err();
        assert!(err.is_transport());
        assert_eq!(transport_a.flushed().len(), 1);
        assert!(transport_b.bytes().is_empty());
        assert!(transport_c.bytes().is_empty());
    }

    #[test]
    fn test_empty_cluster_is_a_no_op() {
        let cluster = Cluster::new();
        assert!(cluster.fade_to(Rgb::WHITE, Fade::default()).is_ok());
        assert!(cluster.black().is_ok());
        assert!(cluster.update().is_ok());
    }

    #[test]
    fn test_concurrent_mutual_registration_is_rejected() {
        for _ in 0..2000 {
            let a = Arc::new(Cluster::new());
            let b = Arc::new(Cluster::new());
            let barrier = Arc::new(Barrier::new(2));

            let register = |outer: &Arc<Cluster>, inner: &Arc<Cluster>| {
                let outer = outer.clone();
                let inner = inner.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    outer.register_light(inner).is_ok()
                })
            };
            let a_in_b = register(&b, &a);
            let b_in_a = register(&a, &b);

            let registered = [a_in_b.join().unwrap(), b_in_a.join().unwrap()];
            assert_eq!(registered.iter().filter(|ok| **ok).count(), 1);
            assert_eq!(a.len() + b.len(), 1);
        }
    }
}
