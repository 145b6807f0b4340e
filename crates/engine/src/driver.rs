//! The engine task: single owner of the exchange session and the transport.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use ps2_pad_protocol::{
    CommandCatalog, ExchangeSession, ResolveError, SendPoll, SessionEvent, resolve,
};

use crate::transport::PadTransport;

/// Default turn-gate re-check interval while an exchange awaits a reply.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How often the send side is re-polled while an exchange awaits a
    /// reply. There is deliberately no per-command timeout: a silent device
    /// stalls the exchange and keeps being polled.
    pub poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Control messages accepted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// Resolve `name` against the catalog and start the exchange.
    Invoke { name: String, args: Vec<u8> },
    /// Tear down the exchange in progress.
    Abort,
    /// Discard all buffered inbound bytes.
    Flush,
    /// Report a copy of the buffered inbound bytes.
    ShowBuffer,
    /// Stop the engine task.
    Shutdown,
}

/// Reports emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Progress from the exchange session.
    Session(SessionEvent),
    /// `Invoke` named a command the catalog does not know; no I/O happened.
    ResolveFailed { name: String, error: ResolveError },
    /// `Invoke` refused: an exchange is already in progress.
    Busy { active: &'static str },
    /// `Abort` had nothing to tear down.
    NothingToAbort,
    /// Reply to `ShowBuffer`.
    Buffer { bytes: Vec<u8> },
    /// The transport died: the reader channel closed or a write failed.
    TransportClosed,
}

/// Clonable sender half of the engine's control channel.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    /// Queues a control message. Returns `false` once the engine has
    /// stopped.
    pub async fn send(&self, command: EngineCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// Queues a control message from a blocking thread (the REPL). Returns
    /// `false` once the engine has stopped.
    pub fn blocking_send(&self, command: EngineCommand) -> bool {
        self.commands.blocking_send(command).is_ok()
    }
}

/// Starts the engine task.
///
/// `inbound` carries chunks read from the device; the caller keeps the
/// sender half alive for as long as the device handle is open. The returned
/// receiver carries every [`EngineEvent`] for rendering.
pub fn spawn(
    catalog: CommandCatalog,
    transport: Box<dyn PadTransport>,
    inbound: mpsc::Receiver<Vec<u8>>,
    config: EngineConfig,
) -> (EngineHandle, mpsc::Receiver<EngineEvent>, JoinHandle<()>) {
    let (command_tx, command_rx) = mpsc::channel(16);
    let (event_tx, event_rx) = mpsc::channel(64);
    let engine = Engine {
        catalog,
        session: ExchangeSession::new(),
        transport,
        commands: command_rx,
        inbound,
        events: event_tx,
        poll_interval: config.poll_interval,
    };
    let task = tokio::spawn(engine.run());
    (EngineHandle { commands: command_tx }, event_rx, task)
}

struct Engine {
    catalog: CommandCatalog,
    session: ExchangeSession,
    transport: Box<dyn PadTransport>,
    commands: mpsc::Receiver<EngineCommand>,
    inbound: mpsc::Receiver<Vec<u8>>,
    events: mpsc::Sender<EngineEvent>,
    poll_interval: Duration,
}

impl Engine {
    async fn run(mut self) {
        info!("pad engine started");
        loop {
            let awaiting_reply = self.session.is_active();
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(EngineCommand::Shutdown) | None => break,
                        Some(command) => {
                            if !self.handle_command(command).await {
                                break;
                            }
                        }
                    }
                }
                chunk = self.inbound.recv() => {
                    match chunk {
                        Some(chunk) => {
                            self.session.push_bytes(&chunk);
                            if !self.drive().await {
                                break;
                            }
                        }
                        None => {
                            info!("reader channel closed");
                            let _ = self.events.send(EngineEvent::TransportClosed).await;
                            break;
                        }
                    }
                }
                () = sleep(self.poll_interval), if awaiting_reply => {
                    if !self.drive().await {
                        break;
                    }
                }
            }
        }
        info!("pad engine stopped");
    }

    /// Applies one control message. Returns `false` when the engine should
    /// stop.
    async fn handle_command(&mut self, command: EngineCommand) -> bool {
        debug!(?command, "control message");
        match command {
            EngineCommand::Invoke { name, args } => match resolve(&self.catalog, &name, &args) {
                Ok(root) => {
                    if self.session.invoke(root) {
                        self.drive().await
                    } else {
                        let active = self.session.active_name().unwrap_or("command");
                        warn!(%name, active, "invoke refused while an exchange is in progress");
                        self.events.send(EngineEvent::Busy { active }).await.is_ok()
                    }
                }
                Err(error) => self
                    .events
                    .send(EngineEvent::ResolveFailed { name, error })
                    .await
                    .is_ok(),
            },
            EngineCommand::Abort => {
                if self.session.abort() {
                    self.forward_events().await
                } else {
                    self.events.send(EngineEvent::NothingToAbort).await.is_ok()
                }
            }
            EngineCommand::Flush => {
                self.session.flush();
                self.forward_events().await
            }
            EngineCommand::ShowBuffer => {
                let bytes = self.session.buffer();
                self.events.send(EngineEvent::Buffer { bytes }).await.is_ok()
            }
            EngineCommand::Shutdown => false,
        }
    }

    /// Drives the send side to quiescence, then forwards session events.
    /// Returns `false` on a fatal transport failure.
    async fn drive(&mut self) -> bool {
        loop {
            match self.session.poll_send() {
                SendPoll::Transmit(byte) => {
                    if let Err(error) = self.transport.write(&[byte]) {
                        error!(%error, "transport write failed");
                        self.forward_events().await;
                        let _ = self.events.send(EngineEvent::TransportClosed).await;
                        return false;
                    }
                }
                SendPoll::AwaitReply | SendPoll::Idle => break,
            }
        }
        self.forward_events().await
    }

    /// Returns `false` when the event receiver is gone.
    async fn forward_events(&mut self) -> bool {
        while let Some(event) = self.session.take_event() {
            if self
                .events
                .send(EngineEvent::Session(event))
                .await
                .is_err()
            {
                return false;
            }
        }
        true
    }
}
