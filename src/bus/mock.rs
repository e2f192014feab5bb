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
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use parking_lot::Mutex;

/// Everything the mock has seen.
#[derive(Default)]
struct Recording {
    /// Every byte written, in order.
    bytes: Vec<u8>,
    /// Bytes grouped by the flush that followed them.
    flushed: Vec<Vec<u8>>,
    /// Bytes written since the last flush.
    pending: Vec<u8>,
}

/// A mock transport. Records writes instead of sending them anywhere.
///
/// Clones share the same recording, so a test can keep one handle while the bus owns another.
#[derive(Clone, Default)]
pub struct Transport {
    recording: Arc<Mutex<Recording>>,
    should_fail: Arc<AtomicBool>,
}

impl Transport {
    pub fn new() -> Transport {
        Transport::default()
    }

    /// Makes all subsequent writes and flushes fail.
    pub fn fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::Relaxed);
    }

    /// Every byte written so far.
    pub fn bytes(&self) -> Vec<u8> {
        self.recording.lock().bytes.clone()
    }

    /// The bytes written before each flush.
    pub fn flushed(&self) -> Vec<Vec<u8>> {
        self.recording.lock().flushed.clone()
    }

    /// Bytes written but not yet flushed.
    pub fn pending(&self) -> Vec<u8> {
        self.recording.lock().pending.clone()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        let mut recording = self.recording.lock();
        *recording = Recording::default();
    }

    fn check(&self) -> io::Result<()> {
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock transport failure",
            ));
        }
        Ok(())
    }
}

impl super::Transport for Transport {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.check()?;

        // One byte at a time with a yield in between, so an unguarded caller would interleave.
        for byte in bytes {
            {
                let mut recording = self.recording.lock();
                recording.bytes.push(*byte);
                recording.pending.push(*byte);
            }
            thread::yield_now();
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.check()?;

        let mut recording = self.recording.lock();
        let pending = std::mem::take(&mut recording.pending);
        recording.flushed.push(pending);
        Ok(())
    }
}

mod test {
    use crate::bus::Transport as _;

    use super::*;

    #[test]
    fn test_mock_transport_records_flushes() {
        let mock = Transport::new();
        let mut handle = mock.clone();

        handle.write(&[1, 2]).unwrap();
        handle.write(&[3]).unwrap();
        assert_eq!(mock.pending(), vec![1, 2, 3]);
        handle.flush().unwrap();
        handle.write(&[4]).unwrap();

        assert_eq!(mock.bytes(), vec![1, 2, 3, 4]);
        assert_eq!(mock.flushed(), vec![vec![1, 2, 3]]);
        assert_eq!(mock.pending(), vec![4]);

        mock.clear();
        assert!(mock.bytes().is_empty());
    }

    #[test]
    fn test_mock_transport_failure() {
        let mock = Transport::new();
        let mut handle = mock.clone();

        mock.fail(true);
        assert!(handle.write(&[1]).is_err());
        assert!(handle.flush().is_err());
        assert!(mock.bytes().is_empty());

        mock.fail(false);
        assert!(handle.write(&[1]).is_ok());
    }
}
