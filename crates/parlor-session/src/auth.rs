//! Credential store: the secret issued to each identity.
//!
//! Parlor has no accounts. The first message a browser sends without an
//! identity gets a fresh identity and a random secret; every later message
//! must present that pair. The secret is the only proof of ownership, so
//! it lives here and nowhere else, and is forgotten only by the reaper.

use std::collections::HashMap;

use parlor_protocol::{ClientIdentity, ClientSecret};

use crate::SessionError;

/// Maps each provisioned identity to its secret.
#[derive(Debug, Default)]
pub struct SecretStore {
    secrets: HashMap<ClientIdentity, ClientSecret>,
}

impl SecretStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a fresh identity and secret and records the pair.
    pub fn provision(&mut self) -> (ClientIdentity, ClientSecret) {
        loop {
            let identity = ClientIdentity::generate();
            if self.secrets.contains_key(&identity) {
                continue;
            }
            let secret = ClientSecret::generate();
            self.secrets.insert(identity.clone(), secret.clone());
            return (identity, secret);
        }
    }

    /// Checks a presented secret against the one on record.
    ///
    /// # Errors
    /// - [`SessionError::UnknownIdentity`]: nothing on record for the
    ///   identity.
    /// - [`SessionError::SecretMismatch`]: a secret is on record and the
    ///   presented one differs or is missing.
    pub fn verify(
        &self,
        identity: &ClientIdentity,
        presented: Option<&ClientSecret>,
    ) -> Result<(), SessionError> {
        let recorded = self
            .secrets
            .get(identity)
            .ok_or_else(|| SessionError::UnknownIdentity(identity.clone()))?;

        match presented {
            Some(presented) if recorded.matches(presented) => Ok(()),
            _ => Err(SessionError::SecretMismatch(identity.clone())),
        }
    }

    /// Forgets the identity's secret. Returns `true` if one was on record.
    pub fn forget(&mut self, identity: &ClientIdentity) -> bool {
        self.secrets.remove(identity).is_some()
    }

    /// Returns `true` if a secret is on record for the identity.
    pub fn contains(&self, identity: &ClientIdentity) -> bool {
        self.secrets.contains_key(identity)
    }

    /// Number of provisioned identities.
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Returns `true` if nothing is provisioned.
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}
