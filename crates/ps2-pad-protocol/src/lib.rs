//! Command/response protocol for PS/2-class touchpads.
//!
//! Talks to a pointing device over a raw byte channel (typically a
//! `serio_raw` device node), covering the base PS/2 command set plus the BYD
//! vendor extensions found on BTP-family touchpads. The crate is I/O-free: a
//! driver owns the transport and the timing and moves bytes through an
//! [`ExchangeSession`].
//!
//! ## Exchange model
//!
//! Commands are named entries in a [`CommandCatalog`]; an entry's send
//! sequence may reference other entries by name, so invoking `init_im`
//! expands into a tree of nested commands. [`resolve`] builds that tree and
//! [`ExchangeSession`] drains it byte by byte under a turn-taking gate: at
//! most one unacknowledged byte is outstanding, and the next goes out only
//! after the pad has replied. Responses match against per-command
//! expectation patterns (`0xFA` acknowledges; wildcards cover ids and status
//! bytes); a mismatch tears the whole tree down.
//!
//! ## Telemetry
//!
//! Outside of an exchange the pad streams 4-byte frames:
//!
//! | Byte | Content |
//! |------|---------|
//! | 0 | buttons (bits 0..2), alignment marker (bit 3), X/Y sign (bits 4/5), X/Y overflow (bits 6/7) |
//! | 1 | X delta magnitude, or absolute X for gesture frames |
//! | 2 | Y delta magnitude, or absolute Y for gesture frames |
//! | 3 | zero for motion frames, otherwise a gesture code |
//!
//! [`PadPacket::decode`] turns one frame into a value record; the session
//! handles alignment recovery (a head byte without the marker flushes the
//! buffer).
//!
//! ## Sources
//!
//! - PS/2 mouse command set: <https://wiki.osdev.org/PS/2_Mouse>
//! - BYD vendor commands: `drivers/input/mouse/byd.c` in the Linux kernel

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(static_mut_refs)]

pub mod builtin;
pub mod catalog;
pub mod error;
pub mod gesture;
pub mod packet;
pub mod resolve;
pub mod session;

pub use builtin::*;
pub use catalog::*;
pub use error::*;
pub use gesture::*;
pub use packet::*;
pub use resolve::*;
pub use session::*;

/// Acknowledge byte returned for every accepted command byte.
pub const ACK_BYTE: u8 = 0xFA;
/// Self-test-passed byte reported after a reset, ahead of the device id.
pub const SELF_TEST_PASSED: u8 = 0xAA;
/// Device id of a plain PS/2 mouse.
pub const MOUSE_DEVICE_ID: u8 = 0x00;
/// Device id once the IntelliMouse sample-rate knock has been accepted.
pub const INTELLIMOUSE_DEVICE_ID: u8 = 0x03;
/// Device id once the 5-button IntelliMouse knock has been accepted.
pub const INTELLIMOUSE5_DEVICE_ID: u8 = 0x04;
