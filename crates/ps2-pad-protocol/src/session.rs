//! The exchange session: turn-taking state machine and inbound buffer owner.
//!
//! A session is purely synchronous. The driver performs all I/O and timing,
//! feeding received chunks in through [`ExchangeSession::push_bytes`] and
//! pulling transmissions out through [`ExchangeSession::poll_send`]; progress
//! surfaces as a queue of [`SessionEvent`]s. Bytes that arrive while no
//! command tree is active route to the telemetry decoder instead of the
//! response matcher.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::catalog::ExpectElement;
use crate::packet::{FRAME_LEN, FRAME_MARKER, PadPacket};
use crate::resolve::{ResolvedCommand, SendItem};

/// Why an exchange was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The device's byte disagreed with the expected pattern.
    Mismatch { expected: u8, actual: u8 },
    /// The operator asked for the abort.
    Operator,
}

/// Progress reports, drained by the driver after every session interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A command transmitted its first byte; `bytes` is its whole remaining
    /// literal sequence at that point.
    Sending {
        command: &'static str,
        bytes: Vec<u8>,
    },
    /// A command's expected response pattern completed.
    Finished {
        command: &'static str,
        received: Vec<u8>,
    },
    /// The whole command tree was torn down.
    Aborted {
        command: &'static str,
        reason: AbortReason,
    },
    /// A telemetry frame decoded outside of any exchange.
    Packet(PadPacket),
    /// The buffer head lacked the frame marker; everything buffered was
    /// discarded to resynchronize.
    Desync { discarded: Vec<u8> },
    /// The inbound buffer was cleared.
    Flushed { discarded: usize },
}

/// Outcome of a send poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPoll {
    /// Write this byte to the device now, then poll again.
    Transmit(u8),
    /// Waiting on the device: the turn gate is closed or the response
    /// pattern is still incomplete. Poll again after the poll interval.
    AwaitReply,
    /// No command tree is active.
    Idle,
}

/// One host/device exchange context.
///
/// Owns the execution stack, the inbound byte buffer, and the turn gate.
/// The gate starts open, closes whenever a byte is transmitted, and re-opens
/// on any received byte, bounding unacknowledged writes to one.
#[derive(Debug)]
pub struct ExchangeSession {
    stack: Vec<ResolvedCommand>,
    active: Option<ResolvedCommand>,
    inbound: VecDeque<u8>,
    clear_to_send: bool,
    events: VecDeque<SessionEvent>,
}

impl ExchangeSession {
    /// Creates an idle session with the turn gate open.
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            active: None,
            inbound: VecDeque::new(),
            clear_to_send: true,
            events: VecDeque::new(),
        }
    }

    /// Arms the session with a resolved command tree.
    ///
    /// Returns `false` without touching the session when an exchange is
    /// already in progress.
    #[must_use]
    pub fn invoke(&mut self, root: ResolvedCommand) -> bool {
        if self.active.is_some() {
            return false;
        }
        debug!(command = root.name, "exchange armed");
        self.active = Some(root);
        true
    }

    /// True while a command tree is being exchanged.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Name of the command the operator invoked: the root of the current
    /// tree, not the innermost nested call.
    pub fn active_name(&self) -> Option<&'static str> {
        self.stack
            .first()
            .or(self.active.as_ref())
            .map(|cmd| cmd.name)
    }

    /// Oldest undrained progress report.
    pub fn take_event(&mut self) -> Option<SessionEvent> {
        self.events.pop_front()
    }

    /// Copy of the unconsumed inbound bytes, oldest first.
    pub fn buffer(&self) -> Vec<u8> {
        self.inbound.iter().copied().collect()
    }

    /// Clears the inbound buffer at the operator's request.
    pub fn flush(&mut self) {
        let discarded = self.inbound.len();
        self.inbound.clear();
        debug!(discarded, "inbound buffer flushed");
        self.events.push_back(SessionEvent::Flushed { discarded });
    }

    /// Tears down the current exchange at the operator's request, clearing
    /// the stack and the inbound buffer.
    ///
    /// Returns `false` when no exchange was in progress.
    pub fn abort(&mut self) -> bool {
        let Some(command) = self.active_name() else {
            return false;
        };
        warn!(command, "exchange aborted; the pad may need a reset to reach a known state");
        self.events.push_back(SessionEvent::Aborted {
            command,
            reason: AbortReason::Operator,
        });
        self.teardown();
        true
    }

    /// Advances the sending half of the exchange by at most one byte.
    ///
    /// On [`SendPoll::Transmit`] the driver writes the byte and polls again
    /// immediately. Descent into a nested command is free: it does not
    /// consume a turn.
    pub fn poll_send(&mut self) -> SendPoll {
        loop {
            let Some(mut node) = self.active.take() else {
                return SendPoll::Idle;
            };
            if node.to_send.is_empty() && node.expect.is_empty() {
                self.finish(node);
                continue;
            }
            if !self.clear_to_send {
                self.active = Some(node);
                return SendPoll::AwaitReply;
            }
            match node.to_send.pop_front() {
                Some(SendItem::Byte(byte)) => {
                    if node.received.is_empty() {
                        let mut bytes = vec![byte];
                        bytes.extend(node.literal_bytes());
                        self.events.push_back(SessionEvent::Sending {
                            command: node.name,
                            bytes,
                        });
                    }
                    debug!(command = node.name, "tx {byte:#04x}");
                    self.clear_to_send = false;
                    self.active = Some(node);
                    return SendPoll::Transmit(byte);
                }
                Some(SendItem::Nested(child)) => {
                    self.stack.push(node);
                    self.active = Some(*child);
                }
                None => {
                    // Literals all sent; the response pattern is still
                    // outstanding.
                    self.active = Some(node);
                    return SendPoll::AwaitReply;
                }
            }
        }
    }

    /// Ingests a chunk received from the transport.
    ///
    /// Any received byte re-opens the turn gate, whether or not it matches.
    pub fn push_bytes(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        debug!("rx {chunk:02x?}");
        self.inbound.extend(chunk);
        self.clear_to_send = true;
        self.drain_inbound();
    }

    /// Routes buffered bytes: the response matcher while a tree is active,
    /// the telemetry decoder otherwise. Leftover bytes at a finish boundary
    /// re-match against the parent, then fall through to the decoder; they
    /// are never silently dropped.
    fn drain_inbound(&mut self) {
        while !self.inbound.is_empty() {
            let Some(mut node) = self.active.take() else {
                self.decode_frames();
                return;
            };
            while let (Some(&want), Some(&byte)) = (node.expect.front(), self.inbound.front()) {
                if let ExpectElement::Byte(expected) = want {
                    if expected != byte {
                        self.abort_mismatch(node.name, expected, byte);
                        return;
                    }
                }
                self.inbound.pop_front();
                node.expect.pop_front();
                node.received.push(byte);
            }
            if node.expect.is_empty() {
                // Pattern satisfied: the node is finished even if some of
                // its literals were never sent.
                self.finish(node);
            } else {
                self.active = Some(node);
                return;
            }
        }
    }

    fn finish(&mut self, node: ResolvedCommand) {
        debug!(command = node.name, "exchange node finished");
        self.events.push_back(SessionEvent::Finished {
            command: node.name,
            received: node.received,
        });
        self.active = self.stack.pop();
        if self.active.is_none() {
            // Tree complete; anything still buffered belongs to telemetry.
            self.decode_frames();
        }
    }

    fn abort_mismatch(&mut self, command: &'static str, expected: u8, actual: u8) {
        warn!(
            command,
            "response mismatch: expected {expected:#04x}, got {actual:#04x}; the pad may need a reset to reach a known state"
        );
        self.events.push_back(SessionEvent::Aborted {
            command,
            reason: AbortReason::Mismatch { expected, actual },
        });
        self.teardown();
    }

    fn teardown(&mut self) {
        self.stack.clear();
        self.active = None;
        let discarded = self.inbound.len();
        self.inbound.clear();
        if discarded > 0 {
            self.events.push_back(SessionEvent::Flushed { discarded });
        }
    }

    /// Decodes as many aligned 4-byte frames as are buffered. A head byte
    /// without the marker bit desynchronizes the whole buffer; fewer than
    /// four buffered bytes wait for the rest of the frame.
    fn decode_frames(&mut self) {
        loop {
            let Some(&head) = self.inbound.front() else {
                return;
            };
            if head & FRAME_MARKER == 0 {
                let discarded: Vec<u8> = self.inbound.drain(..).collect();
                warn!("telemetry desynchronized, flushing {discarded:02x?}");
                self.events.push_back(SessionEvent::Desync { discarded });
                return;
            }
            let [b0, b1, b2, b3, ..] = *self.inbound.make_contiguous() else {
                return;
            };
            self.inbound.drain(..FRAME_LEN);
            self.events
                .push_back(SessionEvent::Packet(PadPacket::decode([b0, b1, b2, b3])));
        }
    }
}

impl Default for ExchangeSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CommandCatalog;
    use crate::packet::PacketBody;
    use crate::resolve::resolve;

    fn command(name: &'static str, send: &[u8], expect: &[ExpectElement]) -> ResolvedCommand {
        ResolvedCommand {
            name,
            to_send: send.iter().copied().map(SendItem::Byte).collect(),
            expect: expect.iter().copied().collect(),
            received: Vec::new(),
        }
    }

    fn events(session: &mut ExchangeSession) -> Vec<SessionEvent> {
        std::iter::from_fn(|| session.take_event()).collect()
    }

    const ACK: ExpectElement = ExpectElement::Byte(0xFA);

    #[test]
    fn test_exact_match_round_trip() {
        let mut session = ExchangeSession::new();
        assert!(session.invoke(command("probe", &[0xE6], &[ACK, ACK])));
        assert_eq!(session.poll_send(), SendPoll::Transmit(0xE6));
        session.push_bytes(&[0xFA, 0xFA]);
        assert_eq!(session.poll_send(), SendPoll::Idle);
        assert!(!session.is_active());
        assert_eq!(
            events(&mut session),
            vec![
                SessionEvent::Sending {
                    command: "probe",
                    bytes: vec![0xE6],
                },
                SessionEvent::Finished {
                    command: "probe",
                    received: vec![0xFA, 0xFA],
                },
            ]
        );
    }

    #[test]
    fn test_wildcard_matches_any_byte() {
        let mut session = ExchangeSession::new();
        assert!(session.invoke(command("ident", &[0xF2], &[ACK, ExpectElement::Any])));
        assert_eq!(session.poll_send(), SendPoll::Transmit(0xF2));
        session.push_bytes(&[0xFA, 0x37]);
        assert!(!session.is_active());
        assert!(events(&mut session).contains(&SessionEvent::Finished {
            command: "ident",
            received: vec![0xFA, 0x37],
        }));
    }

    #[test]
    fn test_mismatch_aborts_and_flushes() {
        let mut session = ExchangeSession::new();
        assert!(session.invoke(command("probe", &[0xE6], &[ACK])));
        assert_eq!(session.poll_send(), SendPoll::Transmit(0xE6));
        session.push_bytes(&[0x00]);
        assert!(!session.is_active());
        assert!(session.buffer().is_empty());
        assert_eq!(session.poll_send(), SendPoll::Idle);
        assert_eq!(
            events(&mut session),
            vec![
                SessionEvent::Sending {
                    command: "probe",
                    bytes: vec![0xE6],
                },
                SessionEvent::Aborted {
                    command: "probe",
                    reason: AbortReason::Mismatch {
                        expected: 0xFA,
                        actual: 0x00,
                    },
                },
                SessionEvent::Flushed { discarded: 1 },
            ]
        );
    }

    #[test]
    fn test_turn_gate_allows_one_outstanding_byte() {
        let mut session = ExchangeSession::new();
        assert!(session.invoke(command("rate", &[0xF3, 0xC8], &[ACK, ACK])));
        assert_eq!(session.poll_send(), SendPoll::Transmit(0xF3));
        assert_eq!(session.poll_send(), SendPoll::AwaitReply);
        assert_eq!(session.poll_send(), SendPoll::AwaitReply);
        session.push_bytes(&[0xFA]);
        assert_eq!(session.poll_send(), SendPoll::Transmit(0xC8));
        assert_eq!(session.poll_send(), SendPoll::AwaitReply);
        session.push_bytes(&[0xFA]);
        assert_eq!(session.poll_send(), SendPoll::Idle);
        assert!(events(&mut session).contains(&SessionEvent::Finished {
            command: "rate",
            received: vec![0xFA, 0xFA],
        }));
    }

    #[test]
    fn test_nested_tree_drains_in_declaration_order() {
        let catalog = CommandCatalog::builtin().expect("builtin catalog");
        let mut session = ExchangeSession::new();
        assert!(session.invoke(resolve(&catalog, "init_ps2", &[]).expect("resolves")));

        assert_eq!(session.poll_send(), SendPoll::Transmit(0xFF));
        session.push_bytes(&[0xFA, 0xAA, 0x00]);
        assert_eq!(session.poll_send(), SendPoll::Transmit(0xF6));
        session.push_bytes(&[0xFA]);
        assert_eq!(session.poll_send(), SendPoll::Idle);

        assert_eq!(
            events(&mut session),
            vec![
                SessionEvent::Sending {
                    command: "reset",
                    bytes: vec![0xFF],
                },
                SessionEvent::Finished {
                    command: "reset",
                    received: vec![0xFA, 0xAA, 0x00],
                },
                SessionEvent::Sending {
                    command: "set_defaults",
                    bytes: vec![0xF6],
                },
                SessionEvent::Finished {
                    command: "set_defaults",
                    received: vec![0xFA],
                },
                SessionEvent::Finished {
                    command: "init_ps2",
                    received: vec![],
                },
            ]
        );
    }

    #[test]
    fn test_leftover_bytes_reach_the_parent() {
        let mut session = ExchangeSession::new();
        let mut parent = command("parent", &[], &[ExpectElement::Byte(0xAA)]);
        parent
            .to_send
            .push_front(SendItem::Nested(Box::new(command("child", &[0x01], &[ACK]))));
        assert!(session.invoke(parent));

        assert_eq!(session.poll_send(), SendPoll::Transmit(0x01));
        session.push_bytes(&[0xFA, 0xAA]);

        let got = events(&mut session);
        assert!(got.contains(&SessionEvent::Finished {
            command: "child",
            received: vec![0xFA],
        }));
        assert!(got.contains(&SessionEvent::Finished {
            command: "parent",
            received: vec![0xAA],
        }));
    }

    #[test]
    fn test_leftover_bytes_reach_the_decoder() {
        let mut session = ExchangeSession::new();
        assert!(session.invoke(command("probe", &[0xE6], &[ACK])));
        assert_eq!(session.poll_send(), SendPoll::Transmit(0xE6));
        session.push_bytes(&[0xFA, 0x08, 0x05, 0x05, 0x00]);

        let got = events(&mut session);
        assert!(got.contains(&SessionEvent::Finished {
            command: "probe",
            received: vec![0xFA],
        }));
        assert!(got.iter().any(|event| matches!(
            event,
            SessionEvent::Packet(packet)
                if matches!(packet.body, PacketBody::Motion { x_movement: 5, y_movement: 5, .. })
        )));
    }

    #[test]
    fn test_pattern_completion_outranks_unsent_literals() {
        let mut session = ExchangeSession::new();
        assert!(session.invoke(command("odd", &[0x01, 0x02], &[ACK])));
        assert_eq!(session.poll_send(), SendPoll::Transmit(0x01));
        session.push_bytes(&[0xFA]);
        // The pattern is complete, so the command finishes with 0x02 unsent.
        assert_eq!(session.poll_send(), SendPoll::Idle);
        assert!(events(&mut session).contains(&SessionEvent::Finished {
            command: "odd",
            received: vec![0xFA],
        }));
    }

    #[test]
    fn test_stray_bytes_complete_empty_parent_patterns() {
        let catalog = CommandCatalog::builtin().expect("builtin catalog");
        let mut session = ExchangeSession::new();
        assert!(session.invoke(resolve(&catalog, "init_ps2", &[]).expect("resolves")));

        assert_eq!(session.poll_send(), SendPoll::Transmit(0xFF));
        // One stray byte beyond reset's reply: it re-matches against
        // init_ps2's empty pattern, finishing the whole tree early.
        session.push_bytes(&[0xFA, 0xAA, 0x00, 0xFA]);
        assert!(!session.is_active());
        assert!(events(&mut session).contains(&SessionEvent::Finished {
            command: "init_ps2",
            received: vec![],
        }));
        // The stray byte itself is now a partial telemetry frame.
        assert_eq!(session.buffer(), vec![0xFA]);
    }

    #[test]
    fn test_operator_abort() {
        let mut session = ExchangeSession::new();
        assert!(session.invoke(command("probe", &[0xE6], &[ACK, ACK])));
        assert_eq!(session.poll_send(), SendPoll::Transmit(0xE6));
        session.push_bytes(&[0xFA]);

        assert!(session.abort());
        assert!(!session.is_active());
        assert!(!session.abort());
        assert!(events(&mut session).contains(&SessionEvent::Aborted {
            command: "probe",
            reason: AbortReason::Operator,
        }));
    }

    #[test]
    fn test_abort_names_the_root_command() {
        let catalog = CommandCatalog::builtin().expect("builtin catalog");
        let mut session = ExchangeSession::new();
        assert!(session.invoke(resolve(&catalog, "init_ps2", &[]).expect("resolves")));
        assert_eq!(session.poll_send(), SendPoll::Transmit(0xFF));

        assert!(session.abort());
        assert!(events(&mut session).contains(&SessionEvent::Aborted {
            command: "init_ps2",
            reason: AbortReason::Operator,
        }));
    }

    #[test]
    fn test_invoke_refused_while_busy() {
        let mut session = ExchangeSession::new();
        assert!(session.invoke(command("first", &[0x01], &[ACK])));
        assert!(!session.invoke(command("second", &[0x02], &[ACK])));
        assert_eq!(session.active_name(), Some("first"));
    }

    #[test]
    fn test_telemetry_decodes_without_a_command() {
        let mut session = ExchangeSession::new();
        session.push_bytes(&[0x08, 0x05, 0x05, 0x00, 0x09, 0x01, 0x02, 0x00]);
        let got = events(&mut session);
        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|event| matches!(event, SessionEvent::Packet(_))));
    }

    #[test]
    fn test_partial_frame_waits_for_more_bytes() {
        let mut session = ExchangeSession::new();
        session.push_bytes(&[0x08, 0x05]);
        assert_eq!(session.take_event(), None);
        assert_eq!(session.buffer(), vec![0x08, 0x05]);
        session.push_bytes(&[0x05, 0x00]);
        assert!(matches!(
            session.take_event(),
            Some(SessionEvent::Packet(_))
        ));
        assert!(session.buffer().is_empty());
    }

    #[test]
    fn test_desync_discards_whole_buffer() {
        let mut session = ExchangeSession::new();
        session.push_bytes(&[0x03, 0x08, 0x05, 0x05, 0x00]);
        assert_eq!(
            events(&mut session),
            vec![SessionEvent::Desync {
                discarded: vec![0x03, 0x08, 0x05, 0x05, 0x00],
            }]
        );
        assert!(session.buffer().is_empty());
    }

    #[test]
    fn test_empty_chunks_are_no_ops() {
        let mut session = ExchangeSession::new();
        session.push_bytes(&[]);
        session.push_bytes(&[]);
        assert_eq!(session.take_event(), None);
        assert_eq!(session.poll_send(), SendPoll::Idle);
    }

    #[test]
    fn test_explicit_flush_reports_count() {
        let mut session = ExchangeSession::new();
        session.push_bytes(&[0x08, 0x05]);
        session.flush();
        let got = events(&mut session);
        assert!(got.contains(&SessionEvent::Flushed { discarded: 2 }));
        assert!(session.buffer().is_empty());
    }
}
