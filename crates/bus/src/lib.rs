// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! actl-bus: the message bus abstraction daemons use to publish claims,
//! task results, and to receive assigned work. Two implementations share
//! one contract: [`InProcessBus`] for a fleet running in a single
//! supervisor process, and [`RemoteBus`] for a fleet bridged over a wire
//! transport. Building a second concrete transport is out of scope here —
//! [`WireTransport`] exists so that contract can be exercised without one.

pub mod error;
pub mod hub;
pub mod remote;

pub use error::BusError;
pub use hub::InProcessBus;
pub use remote::{RemoteBus, WireTransport};

use actl_core::BusMessage;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Shared contract for publishing and receiving bus traffic.
///
/// Implementations never interpret `content` — parsing it as an
/// [`actl_core::Envelope`] is the caller's job.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Register `agent_id` with the bus. Messages addressed to it, or to a
    /// channel it later joins, arrive on `inbound`.
    async fn connect(&self, agent_id: &str, inbound: mpsc::Sender<BusMessage>)
        -> Result<(), BusError>;

    /// Subscribe a connected agent to a channel's broadcasts.
    async fn join(&self, agent_id: &str, channel: &str) -> Result<(), BusError>;

    /// Publish a message. Channel broadcasts never echo back to their
    /// sender; direct messages are delivered once to their addressee.
    async fn send(&self, msg: BusMessage) -> Result<(), BusError>;

    /// Remove an agent from the bus. Idempotent.
    async fn disconnect(&self, agent_id: &str) -> Result<(), BusError>;
}

#[cfg(any(test, feature = "test-support"))]
pub use remote::FakeWireTransport;
