// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-process message bus: a shared hub every daemon in the fleet
//! connects to, routing channel broadcasts and direct agent-to-agent
//! messages without ever leaving the supervisor process.

use crate::error::BusError;
use crate::MessageBus;
use actl_core::{BusMessage, Target};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;

struct Subscriber {
    inbound: mpsc::Sender<BusMessage>,
    channels: HashSet<String>,
}

#[derive(Default)]
struct HubState {
    subscribers: HashMap<String, Subscriber>,
}

/// Shared routing table for an in-process fleet. Cheaply cloneable; every
/// clone shares the same underlying subscriber table.
#[derive(Clone, Default)]
pub struct InProcessBus {
    state: Arc<Mutex<HubState>>,
}

impl InProcessBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently connected agents. Exposed for status reporting.
    pub fn connected_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }
}

#[async_trait]
impl MessageBus for InProcessBus {
    async fn connect(
        &self,
        agent_id: &str,
        inbound: mpsc::Sender<BusMessage>,
    ) -> Result<(), BusError> {
        let mut state = self.state.lock();
        state.subscribers.insert(
            agent_id.to_string(),
            Subscriber {
                inbound,
                channels: HashSet::new(),
            },
        );
        Ok(())
    }

    async fn join(&self, agent_id: &str, channel: &str) -> Result<(), BusError> {
        let mut state = self.state.lock();
        let sub = state
            .subscribers
            .get_mut(agent_id)
            .ok_or_else(|| BusError::NotConnected(agent_id.to_string()))?;
        sub.channels.insert(channel.to_string());
        Ok(())
    }

    async fn send(&self, msg: BusMessage) -> Result<(), BusError> {
        // Collect recipients under the lock, send to them after releasing it:
        // a slow or full subscriber channel must never block the hub.
        let recipients: Vec<mpsc::Sender<BusMessage>> = {
            let state = self.state.lock();
            match &msg.to {
                Target::Agent(agent_id) => state
                    .subscribers
                    .get(agent_id)
                    .filter(|_| agent_id.as_str() != msg.from)
                    .map(|sub| vec![sub.inbound.clone()])
                    .unwrap_or_default(),
                Target::Channel(channel) => state
                    .subscribers
                    .iter()
                    .filter(|(id, sub)| id.as_str() != msg.from && sub.channels.contains(channel))
                    .map(|(_, sub)| sub.inbound.clone())
                    .collect(),
            }
        };

        for recipient in recipients {
            // A full or closed receiver means that agent stopped listening;
            // that is its problem, not the sender's.
            let _ = recipient.try_send(msg.clone());
        }
        Ok(())
    }

    async fn disconnect(&self, agent_id: &str) -> Result<(), BusError> {
        self.state.lock().subscribers.remove(agent_id);
        Ok(())
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
