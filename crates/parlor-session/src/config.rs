//! Session configuration.

use std::time::Duration;

/// Configuration for session bookkeeping.
///
/// Controls how long a disconnected client can come back and resume its
/// identity, and how often stale identities are swept.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long after its last connection closed an identity is kept.
    /// Past this, its secret is forgotten and the client must
    /// re-provision.
    ///
    /// Default: 30 minutes.
    pub forget_after: Duration,

    /// How often the reaper sweeps for expired identities.
    ///
    /// Default: 60 seconds.
    pub reap_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            forget_after: Duration::from_secs(30 * 60),
            reap_interval: Duration::from_secs(60),
        }
    }
}
