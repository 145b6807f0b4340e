//! Console rendering of engine events.

use std::fmt::Write as _;

use colored::Colorize;
use tokio::sync::mpsc;

use padprobe_engine::EngineEvent;
use ps2_pad_protocol::{AbortReason, ButtonState, PacketBody, PadPacket, SessionEvent};

/// Prints every engine event until the channel closes. Returns whether the
/// transport died along the way, so the process can exit nonzero.
pub async fn print_events(mut events: mpsc::Receiver<EngineEvent>) -> bool {
    let mut transport_closed = false;
    while let Some(event) = events.recv().await {
        if matches!(event, EngineEvent::TransportClosed) {
            transport_closed = true;
        }
        print_event(&event);
    }
    transport_closed
}

/// Prints a startup error and its cause chain.
pub fn print_error(error: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);
    let mut source = error.source();
    while let Some(cause) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), cause);
        source = cause.source();
    }
}

fn print_event(event: &EngineEvent) {
    match event {
        EngineEvent::Session(session) => print_session_event(session),
        EngineEvent::ResolveFailed { error, .. } => {
            println!("{} {}", "error:".red().bold(), error);
        }
        EngineEvent::Busy { active } => {
            println!(
                "{} `{}` is still in progress; `abort` to cancel it",
                "busy:".yellow(),
                active
            );
        }
        EngineEvent::NothingToAbort => println!("nothing to abort"),
        EngineEvent::Buffer { bytes } => {
            if bytes.is_empty() {
                println!("buffer empty");
            } else {
                println!("buffer ({} bytes): {}", bytes.len(), hex_string(bytes));
            }
        }
        EngineEvent::TransportClosed => {
            println!("{}", "pad device closed; `quit` to exit".red().bold());
        }
    }
}

fn print_session_event(event: &SessionEvent) {
    match event {
        SessionEvent::Sending { command, bytes } => {
            println!("{} {command}: {}", "send".bold(), hex_string(bytes));
        }
        SessionEvent::Finished { command, received } => {
            if received.is_empty() {
                println!("{} {command}", "done".green());
            } else {
                println!("{} {command}: {}", "done".green(), hex_string(received));
            }
        }
        SessionEvent::Aborted { command, reason } => match reason {
            AbortReason::Mismatch { expected, actual } => {
                println!(
                    "{} {command}: {}",
                    "fail".red().bold(),
                    mismatch_line(*expected, *actual)
                );
                println!(
                    "{}",
                    "pad state is unknown; `reset` is the usual recovery".yellow()
                );
            }
            AbortReason::Operator => {
                println!("{} {command} aborted", "fail".red().bold());
            }
        },
        SessionEvent::Packet(packet) => println!("{}", packet_line(packet)),
        SessionEvent::Desync { discarded } => {
            println!(
                "{} unframed telemetry, flushed {} bytes: {}",
                "desync".yellow().bold(),
                discarded.len(),
                hex_string(discarded)
            );
        }
        SessionEvent::Flushed { discarded } => println!("flushed {discarded} buffered bytes"),
    }
}

fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Both radices: mismatches are usually off by a bit or two, and the
/// binary form makes that visible at a glance.
fn mismatch_line(expected: u8, actual: u8) -> String {
    format!("expected {expected:#04x} ({expected:#010b}), got {actual:#04x} ({actual:#010b})")
}

fn packet_line(packet: &PadPacket) -> String {
    let buttons = buttons_label(&packet.buttons);
    match &packet.body {
        PacketBody::Motion {
            x_movement,
            y_movement,
            x_overflow,
            y_overflow,
            wheel,
            fourth,
            fifth,
        } => {
            let mut line = format!("motion dx={x_movement:+} dy={y_movement:+} buttons=[{buttons}]");
            if *x_overflow {
                line.push_str(" x-overflow");
            }
            if *y_overflow {
                line.push_str(" y-overflow");
            }
            if *wheel != 0 {
                let _ = write!(line, " wheel={wheel:+}");
            }
            if *fourth {
                line.push_str(" btn4");
            }
            if *fifth {
                line.push_str(" btn5");
            }
            line
        }
        PacketBody::Gesture {
            code,
            name,
            x_position,
            y_position,
        } => {
            format!(
                "gesture {name} ({code:#04x}) at x={x_position:#04x} y={y_position:#04x} buttons=[{buttons}]"
            )
        }
    }
}

fn buttons_label(buttons: &ButtonState) -> String {
    let mut label = String::new();
    label.push(if buttons.left { 'L' } else { '-' });
    label.push(if buttons.middle { 'M' } else { '-' });
    label.push(if buttons.right { 'R' } else { '-' });
    label
}
