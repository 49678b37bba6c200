//! Error types for the session layer.

use parlor_protocol::ClientIdentity;

/// Why a presented identity was not accepted.
///
/// Neither variant is ever reported to the client. The broker reacts to
/// `UnknownIdentity` by forcing the client to re-provision, and drops the
/// message on `SecretMismatch`.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No secret is on record for the identity: it was never issued here,
    /// or it expired and was reaped.
    #[error("no credentials on record for {0}")]
    UnknownIdentity(ClientIdentity),

    /// A secret is on record and the presented one differs (or is absent).
    #[error("secret mismatch for {0}")]
    SecretMismatch(ClientIdentity),
}
