//! Telemetry frame decoding.
//!
//! BYD pads stream 4-byte frames shaped like IntelliMouse reports. The first
//! byte carries button bits and the alignment marker; the fourth byte selects
//! between relative motion and a discrete gesture report.

use crate::gesture;

/// Alignment marker: bit 3 must be set in the first byte of every frame.
pub const FRAME_MARKER: u8 = 0x08;
/// Frames are always four bytes.
pub const FRAME_LEN: usize = 4;

/// Button bits from the first byte of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonState {
    pub left: bool,
    pub right: bool,
    pub middle: bool,
}

/// Frame payload: relative motion or a recognized gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketBody {
    /// Relative movement report. Deltas are 9-bit signed values split across
    /// the magnitude byte and a sign bit in the first byte.
    Motion {
        x_movement: i16,
        y_movement: i16,
        x_overflow: bool,
        y_overflow: bool,
        wheel: i8,
        fourth: bool,
        fifth: bool,
    },
    /// Gesture report. Positions are absolute, not deltas.
    Gesture {
        code: u8,
        name: String,
        x_position: u8,
        y_position: u8,
    },
}

/// One decoded telemetry frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadPacket {
    pub buttons: ButtonState,
    pub body: PacketBody,
}

impl PadPacket {
    /// Decodes an aligned 4-byte frame. Framing (the marker bit on the first
    /// byte) is the caller's responsibility.
    pub fn decode(frame: [u8; FRAME_LEN]) -> Self {
        let [b0, b1, b2, b3] = frame;
        let buttons = ButtonState {
            left: b0 & 0x01 != 0,
            right: b0 & 0x02 != 0,
            middle: b0 & 0x04 != 0,
        };
        let body = if b3 != 0 {
            PacketBody::Gesture {
                code: b3,
                name: gesture::gesture_label(b3),
                x_position: b1,
                y_position: b2,
            }
        } else {
            // b3 carries the IntelliMouse extension fields (wheel delta in
            // the low nibble, buttons 4/5 in bits 4/5). A non-zero b3 is
            // routed to the gesture branch above, so on this pad these
            // fields only ever decode from a zero byte.
            PacketBody::Motion {
                x_movement: sign_extend_9(b1, b0 & 0x10 != 0),
                y_movement: sign_extend_9(b2, b0 & 0x20 != 0),
                x_overflow: b0 & 0x40 != 0,
                y_overflow: b0 & 0x80 != 0,
                wheel: wheel_delta(b3),
                fourth: b3 & 0x10 != 0,
                fifth: b3 & 0x20 != 0,
            }
        };
        Self { buttons, body }
    }
}

/// Widens a magnitude byte to the 9-bit signed delta: `magnitude - 256` when
/// the sign bit is set.
fn sign_extend_9(magnitude: u8, negative: bool) -> i16 {
    if negative {
        i16::from(magnitude) - 256
    } else {
        i16::from(magnitude)
    }
}

/// 4-bit two's-complement wheel delta from the low nibble.
fn wheel_delta(b3: u8) -> i8 {
    let nibble = b3 & 0x0F;
    if nibble & 0x08 != 0 {
        (nibble as i8) - 16
    } else {
        nibble as i8
    }
}
