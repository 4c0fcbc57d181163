// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire types for the message bus: addressing and the structured message
//! envelope carried in a bus message's `content` field.

use crate::task::Task;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Destination of a bus message: either a channel (`#channel`) or a direct
/// agent address (`@agentId`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Channel(String),
    Agent(String),
}

impl Target {
    pub fn channel(name: impl Into<String>) -> Self {
        Target::Channel(name.into())
    }

    pub fn agent(agent_id: impl Into<String>) -> Self {
        Target::Agent(agent_id.into())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Channel(name) => write!(f, "#{name}"),
            Target::Agent(id) => write!(f, "@{id}"),
        }
    }
}

/// A message as carried by the bus, opaque to the transport: `to` is parsed
/// from `#channel` / `@agentId` strings by the bus implementation, `content`
/// is a UTF-8 JSON-encoded [`Envelope`].
#[derive(Debug, Clone, PartialEq)]
pub struct BusMessage {
    pub from: String,
    pub to: Target,
    pub content: String,
    pub ts: u64,
}

/// The structured message envelope the core emits or consumes on the bus.
///
/// Unknown `type` tags and parse failures are ignored by routers, never
/// propagated as errors — see spec section 6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Envelope {
    #[serde(rename = "TASK_AVAILABLE")]
    TaskAvailable { task: Task },

    #[serde(rename = "ASSIGN")]
    Assign { agent_id: String, task: Task },

    #[serde(rename = "CLAIM")]
    Claim {
        agent_id: String,
        component: Option<String>,
        role: String,
    },

    #[serde(rename = "TASK_DONE")]
    TaskDone {
        agent_id: String,
        task: Task,
        success: bool,
    },

    #[serde(rename = "TASK_FAIL")]
    TaskFail {
        agent_id: String,
        task: Task,
        error: String,
    },
}

impl Envelope {
    /// Parse the bus content field. Parse failures are silent (`None`),
    /// matching the router's "parse failures are silent" contract.
    pub fn parse(content: &str) -> Option<Self> {
        serde_json::from_str(content).ok()
    }

    pub fn to_json(&self) -> String {
        // An `Envelope` only ever contains owned, serializable fields, so
        // serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
