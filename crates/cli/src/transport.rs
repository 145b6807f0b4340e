//! Pad device plumbing.
//!
//! The pad shows up as a plain read/write character device. Writes go
//! through the handle the engine owns; reads happen on a dedicated thread
//! holding a cloned handle, chunked into the engine's inbound channel. The
//! thread exits when the device goes away or the engine stops listening,
//! and dropping its sender is what tells the engine the transport is gone.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use std::thread;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use padprobe_engine::{PadTransport, TransportError};

/// Scratch size for the reader thread. Command replies are a handful of
/// bytes and telemetry frames are four, so chunks stay small anyway.
const READ_CHUNK: usize = 64;

/// Capacity of the inbound chunk channel.
const INBOUND_DEPTH: usize = 64;

struct DeviceWriter {
    file: File,
}

impl PadTransport for DeviceWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.file.write_all(bytes)?;
        self.file.flush()?;
        Ok(())
    }
}

/// Opens the pad device and starts its reader thread.
pub fn open_device(path: &Path) -> Result<(Box<dyn PadTransport>, mpsc::Receiver<Vec<u8>>)> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .with_context(|| format!("opening pad device {}", path.display()))?;
    let reader = file
        .try_clone()
        .with_context(|| format!("cloning handle for {}", path.display()))?;
    info!(device = %path.display(), "pad device opened");

    let (chunk_tx, chunk_rx) = mpsc::channel(INBOUND_DEPTH);
    thread::Builder::new()
        .name("pad-reader".to_owned())
        .spawn(move || read_loop(reader, chunk_tx))
        .context("starting pad reader thread")?;

    Ok((Box::new(DeviceWriter { file }), chunk_rx))
}

fn read_loop(mut device: File, chunks: mpsc::Sender<Vec<u8>>) {
    let mut scratch = [0u8; READ_CHUNK];
    loop {
        match device.read(&mut scratch) {
            Ok(0) => {
                debug!("pad device reached end of stream");
                break;
            }
            Ok(n) => {
                if chunks.blocking_send(scratch[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(error) if error.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(error) => {
                warn!(%error, "pad device read failed");
                break;
            }
        }
    }
}
