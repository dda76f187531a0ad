// SPDX-License-Identifier: GPL-3.0-only

//! Typed host bridge
//!
//! The hosting application and the scan session talk exclusively through
//! enumerated messages over a channel pair. Port names and payload types are
//! fixed by the host contract and encoded in the serde attributes below; the
//! wire form is `{"port": <name>, "payload": <value>}` with the payload key
//! omitted for ports that carry none.
//!
//! Ordering guarantee: none beyond single-task delivery order. At most one
//! stream is active at a time.

pub mod stdio;

use crate::errors::BridgeError;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Inbound commands, host to session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "port", content = "payload", rename_all = "camelCase")]
pub enum Command {
    /// Begin the acquisition sequence
    InitializeCamera,
    /// Suppress scan payloads now, tear down after this many milliseconds
    DisableCamera(u64),
    /// Pause or resume detection
    SetFrameFrozen(bool),
    /// Open a URL with the system handler
    RerouteTo(String),
}

/// Outbound events, session to host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "port", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// Stream up/down
    ReceiveCameraActive(bool),
    /// Permission denied or device absent
    NoCameraFoundError(bool),
    /// Decoded payload from one detection
    ScannedDeviceCode(String),
}

/// Host-side handle: send commands, receive events
pub struct BridgeHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedReceiver<Event>,
}

impl BridgeHandle {
    /// Send a command to the session
    pub fn send(&self, command: Command) -> Result<(), BridgeError> {
        trace!(?command, "Sending command");
        self.commands
            .send(command)
            .map_err(|_| BridgeError::ChannelClosed)
    }

    /// Receive the next event; `None` when the session is gone
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }
}

/// Session-side ports: receive commands, emit events
pub struct SessionPorts {
    pub(crate) commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<Event>,
}

impl SessionPorts {
    /// Emit an event to the host
    ///
    /// A vanished host is logged and otherwise ignored; no session failure
    /// ever propagates across the bridge.
    pub(crate) fn emit(&self, event: Event) {
        debug!(?event, "Emitting event");
        if self.events.send(event).is_err() {
            debug!("Host side of the bridge is gone, dropping event");
        }
    }
}

/// Create a connected bridge pair
pub fn channel() -> (BridgeHandle, SessionPorts) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    (
        BridgeHandle {
            commands: command_tx,
            events: event_rx,
        },
        SessionPorts {
            commands: command_rx,
            events: event_tx,
        },
    )
}

/// Parse one wire line as a command
pub fn parse_command(line: &str) -> Result<Command, BridgeError> {
    serde_json::from_str(line).map_err(|e| BridgeError::InvalidMessage(e.to_string()))
}

/// Encode an event for the wire
pub fn encode_event(event: &Event) -> Result<String, BridgeError> {
    serde_json::to_string(event).map_err(|e| BridgeError::InvalidMessage(e.to_string()))
}
