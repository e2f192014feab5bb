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

//! Byte layout of the commands understood by the fixture firmware.
//!
//! Command frames are padded to a common length of 15 bytes so the firmware's fixed-size read
//! always completes. The sync preamble is sent on its own and is not padded.

use std::fmt;

use crate::Rgb;

use super::Fade;

/// The escape byte repeated in the sync preamble.
pub const SYNC_MARKER: u8 = 27;

/// How many escape bytes precede the sync address.
pub const SYNC_PREAMBLE_LEN: usize = 15;

/// Command code for a fade.
pub const FADE_COMMAND: u8 = 0x01;

/// Command code for stop.
pub const STOP_COMMAND: u8 = 0x08;

/// Length of every padded command frame.
pub const COMMAND_FRAME_LEN: usize = 15;

const FADE_PADDING: usize = 8;
const STOP_PADDING: usize = 12;

/// One complete command as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// Lets fixtures find frame boundaries again after noise or a partial frame.
    Sync { address: u8 },
    /// Fades the addressed fixture(s) to a color.
    Fade { address: u8, color: Rgb, fade: Fade },
    /// Stops running fades. With `fading` set the fade engine is halted too.
    Stop { address: u8, fading: bool },
}

impl Frame {
    pub fn address(&self) -> u8 {
        match self {
            Frame::Sync { address } | Frame::Fade { address, .. } | Frame::Stop { address, .. } => {
                *address
            }
        }
    }

    /// Encodes the frame into its wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            Frame::Sync { address } => {
                let mut bytes = vec![SYNC_MARKER; SYNC_PREAMBLE_LEN];
                bytes.push(address);
                bytes
            }
            Frame::Fade {
                address,
                color,
                fade,
            } => {
                let mut bytes = vec![
                    address,
                    FADE_COMMAND,
                    fade.step,
                    fade.delay,
                    color.r,
                    color.g,
                    color.b,
                ];
                bytes.resize(bytes.len() + FADE_PADDING, 0);
                bytes
            }
            Frame::Stop { address, fading } => {
                let mut bytes = vec![address, STOP_COMMAND, u8::from(fading)];
                bytes.resize(bytes.len() + STOP_PADDING, 0);
                bytes
            }
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Sync { address } => write!(f, "sync @{}", address),
            Frame::Fade {
                address,
                color,
                fade,
            } => write!(
                f,
                "fade @{} to {} (step {}, delay {})",
                address, color, fade.step, fade.delay
            ),
            Frame::Stop { address, fading } => write!(f, "stop @{} (fading: {})", address, fading),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sync_layout() {
        let bytes = Frame::Sync { address: 255 }.encode();
        assert_eq!(bytes.len(), 16);
        assert!(bytes[..15].iter().all(|b| *b == 0x1B));
        assert_eq!(bytes[15], 255);
    }

    #[test]
    fn test_fade_layout() {
        let bytes = Frame::Fade {
            address: 3,
            color: Rgb::new(10, 20, 30),
            fade: Fade::new(7, 2),
        }
        .encode();
        assert_eq!(
            bytes,
            vec![3, 0x01, 7, 2, 10, 20, 30, 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_stop_layout() {
        let bytes = Frame::Stop {
            address: 255,
            fading: true,
        }
        .encode();
        assert_eq!(bytes, vec![255, 0x08, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

        let bytes = Frame::Stop {
            address: 0,
            fading: false,
        }
        .encode();
        assert_eq!(bytes[..3], [0, 0x08, 0]);
    }

    #[test]
    fn test_command_frames_share_length() {
        let fade = Frame::Fade {
            address: 0,
            color: Rgb::WHITE,
            fade: Fade::default(),
        };
        let stop = Frame::Stop {
            address: 0,
            fading: true,
        };
        assert_eq!(fade.encode().len(), COMMAND_FRAME_LEN);
        assert_eq!(stop.encode().len(), COMMAND_FRAME_LEN);
    }
}
