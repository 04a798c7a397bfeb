//! # Error Types
//!
//! Errors surfaced by the cached identity provider and the alias registry.

use thiserror::Error;

/// Errors from a membership service provider.
///
/// The cached provider never creates delegation errors itself; it forwards
/// whatever the underlying provider returned. `Clone` because principal
/// checks cache the failure alongside the key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MspError {
    /// The serialized identity could not be decoded.
    #[error("Failed to deserialize identity: {0}")]
    Deserialization(String),

    /// The identity failed validation against the current MSP configuration.
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// The identity does not satisfy the requested principal.
    #[error("Principal not satisfied: {0}")]
    PrincipalNotSatisfied(String),

    /// The provider rejected its configuration.
    #[error("MSP setup failed: {0}")]
    Setup(String),

    /// Unusable arguments supplied when constructing the cached provider.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Any other provider failure.
    #[error("Provider error: {0}")]
    Provider(String),
}

/// Errors from the alias registry's ingestion side.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The consumer task has stopped; no further records can be committed.
    #[error("Alias consumer has stopped")]
    ConsumerStopped,

    /// The ingestion channel stayed full for the whole deadline.
    #[error("Timed out after {waited_ms}ms waiting for alias channel capacity")]
    DeadlineExceeded { waited_ms: u64 },

    /// The ingestion channel is full and the caller asked not to wait.
    #[error("Alias channel is full ({capacity} records pending)")]
    ChannelFull { capacity: usize },

    /// A serialized identity is longer than the fixed encoding allows.
    #[error("Serialized identity is {len} bytes, fixed encoding holds {max}")]
    OversizedIdentity { len: usize, max: usize },
}

/// Errors from the endorsement flow.
#[derive(Debug, Error)]
pub enum EndorsementError {
    #[error("Failed fetching signing identity: {0}")]
    SigningIdentity(#[source] MspError),

    #[error("Could not serialize the signing identity: {0}")]
    Serialize(#[source] MspError),

    #[error("Could not sign the proposal response payload: {0}")]
    Sign(#[source] MspError),
}
