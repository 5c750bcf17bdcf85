use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::MonotonicTime;
use crate::engine::{CapabilityUpdate, DeviceEngine, UnmappedDatapoint};
use crate::error::TransportError;
use crate::gesture::{ChannelId, Gesture, TimerDirective};
use crate::profile::CapabilityValue;

const COMMAND_QUEUE_DEPTH: usize = 32;

/// Typed interface the platform glue implements to carry outgoing frames.
///
/// The engine never probes for alternate send methods; this is the single
/// seam between the protocol core and the platform's Zigbee stack.
#[async_trait]
pub trait FrameTransport: Send + Sync {
    /// Sends one already-encoded cluster payload to the device.
    async fn send_frame(&self, payload: &[u8]) -> Result<(), TransportError>;
}

/// Events the runtime forwards to the platform layer.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A decoded capability state change.
    Capability(CapabilityUpdate),
    /// A gesture finalized by a click timer.
    Gesture {
        channel: ChannelId,
        gesture: Gesture,
    },
    /// A datapoint no mapping covered.
    Unmapped(UnmappedDatapoint),
}

#[derive(Debug)]
enum RuntimeCommand {
    Deliver(Vec<u8>),
    Write {
        capability: String,
        sub_channel: Option<String>,
        value: CapabilityValue,
    },
}

/// Handle to a spawned per-device runtime task.
///
/// The task is the single writer of the engine's channel state: cluster
/// payloads, write requests, and timer firings are serialised through one
/// event loop, so no further synchronisation is needed.
#[derive(Debug)]
pub struct DeviceHandle {
    commands: mpsc::Sender<RuntimeCommand>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl DeviceHandle {
    /// Spawns the runtime task for one device engine.
    #[must_use]
    pub fn spawn(
        engine: DeviceEngine,
        transport: Arc<dyn FrameTransport>,
        events: mpsc::Sender<EngineEvent>,
    ) -> Self {
        let (commands, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let cancel = CancellationToken::new();
        let runtime = RuntimeTask {
            engine,
            transport,
            events,
            timers: HashMap::new(),
            started: Instant::now(),
        };
        let task = tokio::spawn(runtime.run(command_rx, cancel.clone()));

        Self {
            commands,
            cancel,
            task,
        }
    }

    /// Delivers one incoming cluster payload to the engine.
    ///
    /// # Errors
    ///
    /// Returns an error when the runtime task has shut down.
    pub async fn deliver(&self, payload: Vec<u8>) -> Result<(), TransportError> {
        self.commands
            .send(RuntimeCommand::Deliver(payload))
            .await
            .map_err(|_closed| TransportError::LinkClosed)
    }

    /// Requests one capability write through the engine and transport.
    ///
    /// # Errors
    ///
    /// Returns an error when the runtime task has shut down.
    pub async fn write(
        &self,
        capability: impl Into<String>,
        sub_channel: Option<String>,
        value: CapabilityValue,
    ) -> Result<(), TransportError> {
        self.commands
            .send(RuntimeCommand::Write {
                capability: capability.into(),
                sub_channel,
                value,
            })
            .await
            .map_err(|_closed| TransportError::LinkClosed)
    }

    /// Tears the device down, cancelling every pending channel timer.
    ///
    /// No timer fires after this returns.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if self.task.await.is_err() {
            warn!("device runtime task aborted during shutdown");
        }
    }
}

struct RuntimeTask {
    engine: DeviceEngine,
    transport: Arc<dyn FrameTransport>,
    events: mpsc::Sender<EngineEvent>,
    timers: HashMap<ChannelId, (u64, Instant)>,
    started: Instant,
}

impl RuntimeTask {
    async fn run(mut self, mut commands: mpsc::Receiver<RuntimeCommand>, cancel: CancellationToken) {
        info!(identity = ?self.engine.identity().manufacturer(), "device runtime started");
        loop {
            match self.next_timer() {
                Some((channel, generation, deadline)) => {
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        command = commands.recv() => match command {
                            Some(command) => self.handle_command(command).await,
                            None => break,
                        },
                        () = sleep_until(deadline) => self.fire_timer(channel, generation).await,
                    }
                }
                None => {
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        command = commands.recv() => match command {
                            Some(command) => self.handle_command(command).await,
                            None => break,
                        },
                    }
                }
            }
        }

        // Teardown: drop timer bookkeeping and invalidate channel state so
        // nothing can fire against a released device.
        self.timers.clear();
        self.engine.reset_channels();
        info!("device runtime stopped");
    }

    fn now(&self) -> MonotonicTime {
        MonotonicTime::from_elapsed(Instant::now().duration_since(self.started))
    }

    fn next_timer(&self) -> Option<(ChannelId, u64, Instant)> {
        self.timers
            .iter()
            .min_by_key(|(_, (_, deadline))| *deadline)
            .map(|(channel, (generation, deadline))| (channel.clone(), *generation, *deadline))
    }

    async fn handle_command(&mut self, command: RuntimeCommand) {
        match command {
            RuntimeCommand::Deliver(payload) => self.handle_deliver(&payload).await,
            RuntimeCommand::Write {
                capability,
                sub_channel,
                value,
            } => self.handle_write(&capability, sub_channel.as_deref(), &value).await,
        }
    }

    async fn handle_deliver(&mut self, payload: &[u8]) {
        let now = self.now();
        let report = match self.engine.parse_incoming(payload, now) {
            Ok(report) => report,
            Err(error) => {
                warn!(%error, "dropping malformed cluster payload");
                return;
            }
        };

        for directive in report.timers() {
            self.apply_timer_directive(directive);
        }
        for update in report.updates() {
            self.emit(EngineEvent::Capability(update.clone())).await;
        }
        for unmapped in report.unmapped() {
            self.emit(EngineEvent::Unmapped(unmapped.clone())).await;
        }
    }

    async fn handle_write(
        &mut self,
        capability: &str,
        sub_channel: Option<&str>,
        value: &CapabilityValue,
    ) {
        let now = self.now();
        let Some(frame) = self
            .engine
            .build_outgoing(capability, sub_channel, value, now)
        else {
            warn!(capability, "ignoring write to unmapped or read-only capability");
            return;
        };

        if let Err(error) = self.transport.send_frame(&frame).await {
            warn!(%error, capability, "transport rejected outgoing frame");
        }
    }

    fn apply_timer_directive(&mut self, directive: &TimerDirective) {
        match directive {
            TimerDirective::Arm {
                channel,
                deadline,
                generation,
            } => {
                let fire_at = self.started + deadline.as_duration();
                self.timers.insert(channel.clone(), (*generation, fire_at));
            }
            TimerDirective::Cancel { channel } => {
                self.timers.remove(channel);
            }
        }
    }

    async fn fire_timer(&mut self, channel: ChannelId, generation: u64) {
        self.timers.remove(&channel);
        if let Some(gesture) = self.engine.finalize_channel(&channel, generation) {
            self.emit(EngineEvent::Gesture { channel, gesture }).await;
        }
    }

    async fn emit(&self, event: EngineEvent) {
        if self.events.send(event).await.is_err() {
            debug!("event receiver dropped; discarding engine event");
        }
    }
}
