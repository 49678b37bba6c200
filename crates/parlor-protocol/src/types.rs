//! Identifier types that travel on the wire.
//!
//! All of these are newtypes over `String`. Identities and game codes are
//! normalized (trimmed, lowercased) whenever they come from a client, so
//! `" ABCD "` and `"abcd"` name the same game. Secrets are opaque and are
//! never normalized beyond treating blank input as absent.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Trims and lowercases a client-supplied identifier.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Renders random bytes as lowercase hex.
fn random_hex<const N: usize>() -> String {
    let bytes: [u8; N] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// ClientIdentity
// ---------------------------------------------------------------------------

/// Opaque per-browser-session token identifying a participant across
/// reconnects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Mints a fresh random identity (a v4 UUID).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Parses a client-supplied identity. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalize(raw);
        (!normalized.is_empty()).then_some(Self(normalized))
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ClientSecret
// ---------------------------------------------------------------------------

/// Opaque random token proving continued ownership of a [`ClientIdentity`].
///
/// Issued once, never echoed back afterwards. `Debug` is redacted so the
/// value cannot end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSecret(String);

impl ClientSecret {
    /// Mints a fresh secret: 128 random bits as 32 hex characters.
    pub fn generate() -> Self {
        Self(random_hex::<16>())
    }

    /// Wraps a secret presented by a client. Blank input yields `None`.
    pub fn presented(raw: &str) -> Option<Self> {
        (!raw.trim().is_empty()).then(|| Self(raw.to_owned()))
    }

    /// Compares two secrets in time independent of where they differ.
    pub fn matches(&self, other: &ClientSecret) -> bool {
        let (a, b) = (self.0.as_bytes(), other.0.as_bytes());
        if a.len() != b.len() {
            return false;
        }
        a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }

    /// Exposes the raw value. Only used when issuing the secret.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientSecret(..)")
    }
}

// ---------------------------------------------------------------------------
// GameCode
// ---------------------------------------------------------------------------

/// Short human-shareable code identifying one running game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameCode(String);

impl GameCode {
    /// Length of minted codes.
    pub const LEN: usize = 5;

    /// Letters and digits that survive being read aloud or typed on a
    /// phone: no `0/o`, `1/l/i`.
    const ALPHABET: &'static [u8] = b"abcdefghjkmnpqrstuvwxyz23456789";

    /// Mints a random code. Uniqueness is the registry's job.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code = (0..Self::LEN)
            .map(|_| {
                let idx = rng.random_range(0..Self::ALPHABET.len());
                char::from(Self::ALPHABET[idx])
            })
            .collect();
        Self(code)
    }

    /// Parses a client-supplied code. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalize(raw);
        (!normalized.is_empty()).then_some(Self(normalized))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// RuntimeIdentifier
// ---------------------------------------------------------------------------

/// Random token fixed for one broker's lifetime.
///
/// Clients remember the last value they saw; a different value means the
/// server restarted (or wants them to behave as if it had) and they must
/// drop all local state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeIdentifier(String);

impl RuntimeIdentifier {
    /// Mints a fresh random identifier.
    pub fn generate() -> Self {
        Self(random_hex::<16>())
    }

    /// Mints a random identifier guaranteed to differ from `real`.
    pub fn decoy(real: &RuntimeIdentifier) -> Self {
        loop {
            let candidate = Self::generate();
            if candidate != *real {
                return candidate;
            }
        }
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuntimeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
