//! Gesture report codes.
//!
//! BYD pads report recognized gestures in the fourth byte of a data frame.
//! The codes below were observed on the BTP-10463 fitted to Librem 13v1
//! laptops; anything else renders as `unknown_xx`.

/// Well-known gesture name for `code`, if we have one.
pub fn gesture_name(code: u8) -> Option<&'static str> {
    match code {
        0x28 => Some("pinch out"),
        0x29 => Some("rotate clockwise"),
        0x2A => Some("scroll right (two finger)"),
        0x2B => Some("scroll down (two finger)"),
        0x2C => Some("three-finger swipe-right"),
        0x2D => Some("three-finger swipe-down"),
        0x2E => Some("left-click"),
        0x33 => Some("four finger swipe-down"),
        0x35 => Some("scroll right (region)"),
        0x36 => Some("scroll down (region)"),
        0xCA => Some("scroll up (region)"),
        0xCB => Some("scroll left (region)"),
        0xCD => Some("four finger swipe-up"),
        0xD2 => Some("right-click"),
        0xD3 => Some("three-finger swipe-up"),
        0xD4 => Some("three-finger swipe-left"),
        0xD5 => Some("scroll up (two finger)"),
        0xD6 => Some("scroll left (two finger)"),
        0xD7 => Some("rotate counter-clockwise"),
        0xD8 => Some("pinch in"),
        _ => None,
    }
}

/// Display label for `code`: the well-known name, or `unknown_xx` with the
/// code in two hex digits.
pub fn gesture_label(code: u8) -> String {
    match gesture_name(code) {
        Some(name) => name.to_owned(),
        None => format!("unknown_{code:02x}"),
    }
}
