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
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use tracing::{error, info, span, Level};

use crate::{bus::Bus, light::Target, playsync::CancelHandle, Error};

mod palette;
mod raindrops;

pub use palette::PaletteCycle;
pub use raindrops::{Mode as RaindropMode, Raindrops};

/// A timed lighting loop.
///
/// The worker calls `step` repeatedly for as long as it is running. A step should send a small
/// number of commands and then wait through the context, so that stopping takes effect between
/// commands rather than inside one.
pub trait Animation: Send {
    /// A name used for logging.
    fn name(&self) -> &str;

    /// Runs one iteration of the animation.
    fn step(&mut self, ctx: &WorkerContext) -> Result<(), Error>;
}

/// What an animation gets to work with: the lights on its bus, the running flag and a
/// cancellable wait.
#[derive(Clone)]
pub struct WorkerContext {
    bus: Arc<Bus>,
    cancel_handle: CancelHandle,
}

impl WorkerContext {
    pub fn new(bus: Arc<Bus>) -> WorkerContext {
        WorkerContext {
            bus,
            cancel_handle: CancelHandle::new(),
        }
    }

    /// The number of fixtures on the bus.
    pub fn light_count(&self) -> usize {
        self.bus.fixture_count()
    }

    /// Gets the light at the given address.
    pub fn light(&self, number: usize) -> Result<Target, Error> {
        Ok(Target::Light(self.bus.light(number)?))
    }

    /// A target covering every fixture on the bus.
    pub fn broadcast(&self) -> Target {
        Target::Light(self.bus.broadcast())
    }

    /// Returns true until the worker is asked to stop.
    pub fn running(&self) -> bool {
        !self.cancel_handle.is_cancelled()
    }

    /// Asks the worker to stop.
    pub fn stop(&self) {
        self.cancel_handle.cancel();
    }

    /// Waits for the given duration. With `respond_to_cancel` a stop request ends the wait
    /// early; without it the full duration always elapses. Returns whether the worker is still
    /// running.
    pub fn wait(&self, duration: Duration, respond_to_cancel: bool) -> bool {
        if respond_to_cancel {
            !self.cancel_handle.wait_timeout(duration)
        } else {
            thread::sleep(duration);
            self.running()
        }
    }
}

/// Runs an animation on its own thread.
pub struct Worker {
    name: String,
    context: WorkerContext,
    finished: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Starts the animation against the given bus.
    pub fn start(animation: Box<dyn Animation>, bus: Arc<Bus>) -> Worker {
        Worker::start_with_context(animation, WorkerContext::new(bus))
    }

    /// Starts the animation with an existing context.
    pub fn start_with_context(
        mut animation: Box<dyn Animation>,
        context: WorkerContext,
    ) -> Worker {
        let name = animation.name().to_string();
        let finished = Arc::new(AtomicBool::new(false));

        let handle = {
            let context = context.clone();
            let finished = finished.clone();
            let name = name.clone();
            thread::spawn(move || {
                let span = span!(Level::INFO, "worker", name = name.as_str());
                let _enter = span.enter();

                info!("Worker started.");
                while context.running() {
                    if let Err(e) = animation.step(&context) {
                        // A failed step ends this worker only.
                        error!(err = e.to_string(), "Animation step failed, stopping worker.");
                        break;
                    }
                }
                finished.store(true, Ordering::Relaxed);
                info!("Worker stopped.");
            })
        };

        Worker {
            name,
            context,
            finished,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true while the animation thread is still looping.
    pub fn is_running(&self) -> bool {
        !self.finished.load(Ordering::Relaxed)
    }

    /// Asks the animation to stop. It finishes its current command first.
    pub fn stop(&self) {
        self.context.stop();
    }

    /// Waits for the animation thread to exit.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!(worker = self.name.as_str(), "Worker thread panicked.");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
        self.join();
    }
}
