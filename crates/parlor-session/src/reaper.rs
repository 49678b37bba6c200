//! The stale session reaper.
//!
//! A logged-out identity keeps its secret for `forget_after` so a client
//! that lost its connection (tab reload, flaky wifi) can come back as the
//! same participant. Past that, the sweep forgets both the logout record
//! and the secret; the next time the client shows up with that identity
//! it is unknown and gets re-provisioned.

use std::time::{Duration, Instant};

use parlor_protocol::ClientIdentity;

use crate::{ConnectionRegistry, SecretStore, SessionConfig};

/// Sweeps expired logout records.
#[derive(Debug, Clone)]
pub struct Reaper {
    forget_after: Duration,
}

impl Reaper {
    /// Creates a reaper with the configured threshold.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            forget_after: config.forget_after,
        }
    }

    /// Evicts every logout record older than the threshold at `now`,
    /// together with the identity's secret.
    ///
    /// Identities with a live connection carry no logout record and are
    /// never touched. Returns the evicted identities.
    pub fn sweep(
        &self,
        registry: &mut ConnectionRegistry,
        secrets: &mut SecretStore,
        now: Instant,
    ) -> Vec<ClientIdentity> {
        let expired: Vec<ClientIdentity> = registry
            .logouts()
            .filter(|(_, since)| now.saturating_duration_since(*since) > self.forget_after)
            .map(|(identity, _)| identity.clone())
            .collect();

        for identity in &expired {
            registry.clear_logout(identity);
            secrets.forget(identity);
            tracing::info!(%identity, "session expired, credentials forgotten");
        }

        expired
    }
}
