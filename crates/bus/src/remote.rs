// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A bus backed by an out-of-process transport. The concrete wire protocol
//! (websocket, unix socket, whatever the deployment uses) is not this
//! crate's concern: [`WireTransport`] is the seam, and [`RemoteBus`]
//! implements everything on top of it — framing, the connect/join
//! handshake, and routing inbound frames back to local subscribers.

use crate::error::BusError;
use crate::MessageBus;
use actl_core::{BusMessage, Target};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A bidirectional framed connection to a remote bus. One frame per
/// [`BusMessage`], serialized as JSON by [`RemoteBus`] before reaching
/// this trait.
#[async_trait]
pub trait WireTransport: Send + Sync {
    async fn send_frame(&self, frame: String) -> Result<(), BusError>;

    /// Blocks until a frame arrives, or returns `None` on clean close.
    async fn recv_frame(&self) -> Result<Option<String>, BusError>;
}

#[derive(Serialize, Deserialize)]
struct WireFrame {
    kind: WireFrameKind,
    agent_id: String,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    message: Option<BusMessage>,
}

#[derive(Serialize, Deserialize, PartialEq)]
enum WireFrameKind {
    Connect,
    Join,
    Publish,
}

/// Routes local subscriber traffic through a [`WireTransport`], and
/// delivers inbound frames from that transport to local subscribers —
/// the same fan-out [`InProcessBus`](crate::InProcessBus) does in memory,
/// except messages cross process boundaries first.
#[derive(Clone)]
pub struct RemoteBus<T> {
    transport: Arc<T>,
    local: Arc<Mutex<HashMap<String, mpsc::Sender<BusMessage>>>>,
}

impl<T: WireTransport + 'static> RemoteBus<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            local: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Drive inbound frames until the transport closes. Spawn this as a
    /// background task alongside the bus.
    pub async fn run(&self) -> Result<(), BusError> {
        while let Some(frame) = self.transport.recv_frame().await? {
            let Ok(frame) = serde_json::from_str::<WireFrame>(&frame) else {
                tracing::warn!(%frame, "discarding malformed remote bus frame");
                continue;
            };
            if frame.kind != WireFrameKind::Publish {
                continue;
            }
            let Some(msg) = frame.message else { continue };
            let recipients: Vec<mpsc::Sender<BusMessage>> = {
                let local = self.local.lock();
                match &msg.to {
                    Target::Agent(agent_id) => {
                        local.get(agent_id).cloned().into_iter().collect()
                    }
                    Target::Channel(_) => local.values().cloned().collect(),
                }
            };
            for recipient in recipients {
                let _ = recipient.try_send(msg.clone());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<T: WireTransport + 'static> MessageBus for RemoteBus<T> {
    async fn connect(
        &self,
        agent_id: &str,
        inbound: mpsc::Sender<BusMessage>,
    ) -> Result<(), BusError> {
        self.local.lock().insert(agent_id.to_string(), inbound);
        let frame = WireFrame {
            kind: WireFrameKind::Connect,
            agent_id: agent_id.to_string(),
            channel: None,
            message: None,
        };
        self.transport
            .send_frame(serde_json::to_string(&frame).unwrap_or_default())
            .await
    }

    async fn join(&self, agent_id: &str, channel: &str) -> Result<(), BusError> {
        let frame = WireFrame {
            kind: WireFrameKind::Join,
            agent_id: agent_id.to_string(),
            channel: Some(channel.to_string()),
            message: None,
        };
        self.transport
            .send_frame(serde_json::to_string(&frame).unwrap_or_default())
            .await
    }

    async fn send(&self, msg: BusMessage) -> Result<(), BusError> {
        let frame = WireFrame {
            kind: WireFrameKind::Publish,
            agent_id: msg.from.clone(),
            channel: None,
            message: Some(msg),
        };
        self.transport
            .send_frame(serde_json::to_string(&frame).unwrap_or_default())
            .await
    }

    async fn disconnect(&self, agent_id: &str) -> Result<(), BusError> {
        self.local.lock().remove(agent_id);
        Ok(())
    }
}

/// In-memory [`WireTransport`] pairing two ends of an mpsc channel, for
/// exercising [`RemoteBus`] without a real socket.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeWireTransport {
    outbox: mpsc::Sender<String>,
    inbox: tokio::sync::Mutex<mpsc::Receiver<String>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeWireTransport {
    /// Returns a connected pair: frames sent on one arrive on the other.
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_a) = mpsc::channel(64);
        let (tx_b, rx_b) = mpsc::channel(64);
        (
            Self {
                outbox: tx_a,
                inbox: tokio::sync::Mutex::new(rx_b),
            },
            Self {
                outbox: tx_b,
                inbox: tokio::sync::Mutex::new(rx_a),
            },
        )
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl WireTransport for FakeWireTransport {
    async fn send_frame(&self, frame: String) -> Result<(), BusError> {
        self.outbox
            .send(frame)
            .await
            .map_err(|_| BusError::Disconnected)
    }

    async fn recv_frame(&self) -> Result<Option<String>, BusError> {
        Ok(self.inbox.lock().await.recv().await)
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
