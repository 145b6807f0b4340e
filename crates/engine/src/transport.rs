//! The byte-level port to the pad device.

use thiserror::Error;

/// Transport failures. All of them are fatal to the engine: there is no
/// recovery strategy for a failed device handle.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("device write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes raw bytes to the pad.
///
/// Reads are not part of the port: inbound bytes arrive as opaque chunks on
/// the channel handed to [`spawn`](crate::spawn), typically fed by a reader
/// thread owned by the caller.
pub trait PadTransport: Send {
    /// Writes `bytes` to the device, synchronously.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}
