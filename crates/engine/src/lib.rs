//! Async driver loop for PS/2 pad exchanges.
//!
//! [`spawn`] starts a tokio task that owns the
//! [`ExchangeSession`](ps2_pad_protocol::ExchangeSession) and the device
//! transport. Control arrives as [`EngineCommand`]s, device bytes arrive as
//! opaque chunks on an inbound channel fed by the caller's reader thread,
//! and everything worth showing flows back out as [`EngineEvent`]s.
//!
//! While an exchange awaits a reply the task re-polls the send side every
//! [`DEFAULT_POLL_INTERVAL`]; the rest of the time it sleeps on its
//! channels. There is no per-command timeout: a device that never answers
//! stalls the exchange until the operator aborts it.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(static_mut_refs)]

pub mod driver;
pub mod transport;

pub use driver::*;
pub use transport::*;
