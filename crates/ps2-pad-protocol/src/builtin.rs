//! Built-in command table.
//!
//! Base PS/2 pointing-device commands plus the BYD vendor extensions used by
//! BTP-family touchpads (as fitted to Purism Librem laptops). The `byd_*`
//! setters all take one argument byte and acknowledge twice; the composite
//! `init_*` entries sequence the magic sample-rate/resolution knocks that
//! switch the pad into IntelliMouse and vendor modes.

use crate::catalog::{CommandDefinition, ExpectElement, SendElement};
use crate::{ACK_BYTE, INTELLIMOUSE5_DEVICE_ID, MOUSE_DEVICE_ID, SELF_TEST_PASSED};

/// Acknowledge position in a response pattern.
const ACK: ExpectElement = ExpectElement::Byte(ACK_BYTE);
/// Wildcard response position.
const ANY: ExpectElement = ExpectElement::Any;

/// Single acknowledge.
const EXPECT_ACK: &[ExpectElement] = &[ACK];
/// Acknowledge for the command byte, then for its argument byte.
const EXPECT_ACK_ACK: &[ExpectElement] = &[ACK, ACK];

const fn byte(value: u8) -> SendElement {
    SendElement::Byte(value)
}

const fn call(name: &'static str) -> SendElement {
    SendElement::Call { name, args: &[] }
}

const fn call_with(name: &'static str, args: &'static [u8]) -> SendElement {
    SendElement::Call { name, args }
}

pub static BUILTIN_COMMANDS: &[CommandDefinition] = &[
    CommandDefinition {
        name: "init_ps2",
        description: "Resets touchpad to defaults",
        send: &[call("reset"), call("set_defaults")],
        expect: &[],
        arg_labels: &[],
    },
    CommandDefinition {
        name: "init_im",
        description: "Resets touchpad and initializes to Intellimouse mode",
        send: &[
            call("init_ps2"),
            call_with("set_sample_rate", &[0xC8]),
            call_with("set_sample_rate", &[0x64]),
            call_with("set_sample_rate", &[0x50]),
            call("get_device_id"),
        ],
        expect: &[],
        arg_labels: &[],
    },
    CommandDefinition {
        name: "init_im5",
        description: "Resets touchpad and initializes to Intellimouse 5-button mode",
        send: &[
            call("init_im"),
            call_with("set_sample_rate", &[0xC8]),
            call_with("set_sample_rate", &[0xC8]),
            call_with("set_sample_rate", &[0x50]),
            call("get_device_id"),
        ],
        expect: &[ACK, ExpectElement::Byte(INTELLIMOUSE5_DEVICE_ID)],
        arg_labels: &[],
    },
    CommandDefinition {
        name: "byd_detect",
        description: "Initializes BYD touchpad and sends detect sequence. Only works once.",
        send: &[
            call("init_im"),
            call_with("set_resolution", &[0x03]),
            call_with("set_resolution", &[0x03]),
            call_with("set_resolution", &[0x03]),
            call_with("set_resolution", &[0x03]),
            call("get_status"),
        ],
        expect: &[],
        arg_labels: &[],
    },
    CommandDefinition {
        name: "byd_default_config",
        description: "Sets BYD touchpad to default configuration",
        send: &[
            call_with("byd_tapping", &[0x02]),
            call_with("byd_edge_scrolling", &[0x04]),
            call_with("byd_button_disable", &[0x00]),
            call_with("byd_button_control", &[0x04]),
            call_with("byd_handedness", &[0x01]),
            call_with("byd_edge_motion", &[0x01]),
            call_with("byd_touch_sensitivity", &[0x04]),
            call_with("byd_two_finger_scroll", &[0x03]),
            call_with("byd_two_finger_options", &[0x01]),
            call_with("byd_gestures_enabled", &[0x01]),
        ],
        expect: &[],
        arg_labels: &[],
    },
    // Base PS/2 commands.
    CommandDefinition {
        name: "reset",
        description: "Resets touchpad",
        send: &[byte(0xFF)],
        expect: &[
            ACK,
            ExpectElement::Byte(SELF_TEST_PASSED),
            ExpectElement::Byte(MOUSE_DEVICE_ID),
        ],
        arg_labels: &[],
    },
    CommandDefinition {
        name: "resend",
        description: "Asks touchpad to resend last data",
        send: &[byte(0xFE)],
        expect: EXPECT_ACK,
        arg_labels: &[],
    },
    CommandDefinition {
        name: "error",
        description: "Tells touchpad there was an error (The touchpad's response is undefined)",
        send: &[byte(0xFC)],
        expect: &[ExpectElement::Byte(0xFE)],
        arg_labels: &[],
    },
    CommandDefinition {
        name: "set_defaults",
        description: "Sets touchpad to default settings (touchpad dependent)",
        send: &[byte(0xF6)],
        expect: EXPECT_ACK,
        arg_labels: &[],
    },
    CommandDefinition {
        name: "stop_reporting",
        description: "Stop reporting movement data",
        send: &[byte(0xF5)],
        expect: EXPECT_ACK,
        arg_labels: &[],
    },
    CommandDefinition {
        name: "start_reporting",
        description: "Start reporting movement data (only valid in streaming mode)",
        send: &[byte(0xF4)],
        expect: EXPECT_ACK,
        arg_labels: &[],
    },
    CommandDefinition {
        name: "set_sample_rate",
        description: "Set touchpad sampling rate",
        send: &[byte(0xF3)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[],
    },
    CommandDefinition {
        name: "get_device_id",
        description: "Get touchpad's device id",
        send: &[byte(0xF2)],
        expect: &[ACK, ANY],
        arg_labels: &[],
    },
    CommandDefinition {
        name: "set_remote_mode",
        description: "Set touchpad to polling mode (read data using read_data command)",
        send: &[byte(0xF0)],
        expect: EXPECT_ACK,
        arg_labels: &[],
    },
    CommandDefinition {
        name: "set_wrap_mode",
        description: "Set touchpad to echo back all commands sent to it. (reset clears)",
        send: &[byte(0xEE)],
        expect: EXPECT_ACK,
        arg_labels: &[],
    },
    CommandDefinition {
        name: "reset_wrap_mode",
        description: "Resets counters and return to previous mode",
        send: &[byte(0xEC)],
        expect: EXPECT_ACK,
        arg_labels: &[],
    },
    CommandDefinition {
        name: "read_data",
        description: "Reads touchpad cursor position (only valid in remote mode)",
        send: &[byte(0xEB)],
        expect: &[ACK, ANY, ANY, ANY, ANY],
        arg_labels: &[],
    },
    CommandDefinition {
        name: "set_stream_mode",
        description: "Places touchpad in stream mode (use start_reporting to begin)",
        send: &[byte(0xEA)],
        expect: EXPECT_ACK,
        arg_labels: &[],
    },
    CommandDefinition {
        name: "get_status",
        description: "Get current touchpad base settings (mode, resolution, sample_rate)",
        send: &[byte(0xE9)],
        expect: &[ACK, ANY, ANY, ANY],
        arg_labels: &[],
    },
    CommandDefinition {
        name: "set_resolution",
        description: "Set touchpad resolution",
        send: &[byte(0xE8)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[
            (0x00, "1 count/mm"),
            (0x01, "2 counts/mm"),
            (0x02, "4 counts/mm"),
            (0x03, "8 counts/mm"),
        ],
    },
    CommandDefinition {
        name: "set_scaling_double",
        description: "Enable double scaling mode",
        send: &[byte(0xE8)],
        expect: EXPECT_ACK,
        arg_labels: &[],
    },
    CommandDefinition {
        name: "set_scaling_normal",
        description: "Set scaling mode to normal",
        send: &[byte(0xE7)],
        expect: EXPECT_ACK,
        arg_labels: &[],
    },
    // BYD vendor commands. One argument byte each, double acknowledge.
    CommandDefinition {
        name: "byd_button_disable",
        description: "Enable or disable click-button",
        send: &[byte(0xD0)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[(0x00, "normal"), (0x08, "disabled")],
    },
    CommandDefinition {
        name: "byd_tapping",
        description: "Enable or disable tapping",
        send: &[byte(0xD4)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[(0x01, "on"), (0x02, "off")],
    },
    CommandDefinition {
        name: "byd_handedness",
        description: "Set right or left handedness",
        send: &[byte(0xD3)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[(0x01, "Right Handed"), (0x02, "left handed")],
    },
    CommandDefinition {
        name: "byd_tapdrag",
        description: "Configure tap & drag",
        send: &[byte(0xD5)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[(0x01, "Drag"), (0x02, "Drag Lock"), (0x03, "Disabled")],
    },
    CommandDefinition {
        name: "byd_edge_scrolling",
        description: "Configure edge-scrolling",
        send: &[byte(0xD7)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[
            (0x01, "Vertical"),
            (0x02, "Horizontal"),
            (0x03, "Both"),
            (0x04, "None"),
        ],
    },
    CommandDefinition {
        name: "byd_edge_scroll_config",
        description: "Edge-motion during edge-scroll",
        send: &[byte(0xD8)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[
            (0x01, "Free Scrolling"),
            (0x02, "Edge Motion"),
            (0x03, "Both"),
            (0x04, "None"),
        ],
    },
    CommandDefinition {
        name: "byd_slide_speed",
        description: "Set slide speed",
        send: &[byte(0xDA)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[(0x01, "Slowest"), (0x05, "Fastest")],
    },
    CommandDefinition {
        name: "byd_edge_motion",
        description: "Configure edge-motion",
        send: &[byte(0xDB)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[
            (0x01, "Off"),
            (0x02, "When Dragging"),
            (0x03, "Dragging and Pointing"),
        ],
    },
    CommandDefinition {
        name: "byd_edge_motion_speed",
        description: "Configure Edge-motion speed",
        send: &[byte(0xE4)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[
            (0x00, "Pressure Controlled"),
            (0x01, "Slowest"),
            (0x09, "Fastest"),
        ],
    },
    CommandDefinition {
        name: "byd_touch_sensitivity",
        description: "Set touchpad sensitivity",
        send: &[byte(0xD6)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[(0x01, "Lowest"), (0x07, "Highest")],
    },
    CommandDefinition {
        name: "byd_palm_check",
        description: "Set palm-detection sensitivity",
        send: &[byte(0xDE)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[(0x01, "Lowest"), (0x06, "Highest")],
    },
    CommandDefinition {
        name: "byd_gestures_enabled",
        description: "Enable gesture detection",
        send: &[byte(0xE3)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[(0x01, "On"), (0x02, "Off")],
    },
    CommandDefinition {
        name: "byd_tapdrag_delay",
        description: "Set tap & drag delay",
        send: &[byte(0xCF)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[(0x00, "Off"), (0x01, "Shortest"), (0x08, "Longest")],
    },
    CommandDefinition {
        name: "byd_two_finger_scroll",
        description: "Enable two-finger scrolling gesture",
        send: &[byte(0xD2)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[
            (0x01, "Vertical"),
            (0x02, "Horizontal"),
            (0x03, "Both"),
            (0x04, "Off"),
        ],
    },
    CommandDefinition {
        name: "byd_two_finger_options",
        description: "Configure two-finger scrolling options",
        send: &[byte(0xE5)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[
            (0x01, "Free"),
            (0x02, "Edge Motion On"),
            (0x03, "Both"),
            (0x04, "Off"),
        ],
    },
    CommandDefinition {
        name: "byd_left_edge_width",
        description: "Set Left-edge width",
        send: &[byte(0xDC)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[(0x00, "None"), (0x01, "Thinnest"), (0x07, "Widest")],
    },
    CommandDefinition {
        name: "byd_top_edge_height",
        description: "Set Top-edge height",
        send: &[byte(0xDD)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[(0x00, "None"), (0x01, "Shortest"), (0x07, "Tallest")],
    },
    CommandDefinition {
        name: "byd_right_edge_width",
        description: "Set Right-edge width",
        send: &[byte(0xDF)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[(0x00, "None"), (0x01, "Thinnest"), (0x07, "Widest")],
    },
    CommandDefinition {
        name: "byd_bottom_edge_height",
        description: "Set bottom-edge height",
        send: &[byte(0xE1)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[(0x00, "None"), (0x01, "Shortest"), (0x07, "Tallest")],
    },
    CommandDefinition {
        name: "byd_report_abs_pos",
        description: "Enable absolute position reporting",
        send: &[byte(0xD1)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[(0x00, "Off"), (0x02, "On")],
    },
    CommandDefinition {
        name: "byd_button_control",
        description: "Control how touchpad button is interpreted",
        send: &[byte(0xD0)],
        expect: EXPECT_ACK_ACK,
        arg_labels: &[
            (0x04, "Normal"),
            (0x05, "Left as gesture"),
            (0x06, "Right as gesture"),
            (0x07, "Both as Gesture"),
        ],
    },
    CommandDefinition {
        name: "raw",
        description: "Send a hex byte directly to pad",
        send: &[],
        expect: &[ANY],
        arg_labels: &[],
    },
];
