// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identity: a stable `agentId` derived from a freshly minted keypair.
//! Owned by the workspace collaborator, never by the daemon or supervisor.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;

/// A minted identity: the public key and the short id derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentIdentity {
    pub agent_id: String,
    pub public_key: [u8; 32],
}

/// Mints agent identities. Implementations are synchronous — identity
/// derivation is pure local cryptography, never I/O.
pub trait IdentityProvider: Send + Sync + 'static {
    fn mint(&self) -> AgentIdentity;
}

fn short_id(public_key: &[u8; 32]) -> String {
    public_key[..4]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Ed25519-backed identity provider: the production implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519IdentityProvider;

impl IdentityProvider for Ed25519IdentityProvider {
    fn mint(&self) -> AgentIdentity {
        let signing_key = SigningKey::generate(&mut OsRng);
        let public_key = signing_key.verifying_key().to_bytes();
        AgentIdentity {
            agent_id: short_id(&public_key),
            public_key,
        }
    }
}

/// Deterministic, counter-based identity provider for tests — avoids
/// pulling real entropy into state-machine tests that only need distinct,
/// stable ids.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeIdentityProvider {
    next: parking_lot::Mutex<u32>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeIdentityProvider {
    pub fn new() -> Self {
        Self {
            next: parking_lot::Mutex::new(0),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl IdentityProvider for FakeIdentityProvider {
    fn mint(&self) -> AgentIdentity {
        let mut next = self.next.lock();
        let mut public_key = [0u8; 32];
        public_key[..4].copy_from_slice(&next.to_be_bytes());
        *next += 1;
        AgentIdentity {
            agent_id: short_id(&public_key),
            public_key,
        }
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
