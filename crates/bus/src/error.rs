// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("agent {0} is not connected to the bus")]
    NotConnected(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("bus is disconnected")]
    Disconnected,
}
