//! # Outbound Ports (Driven Ports / SPI)
//!
//! Dependencies of the endorsement adapter.

use crate::domain::errors::MspError;
use std::sync::Arc;

/// A signed proposal as received from a client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignedProposal {
    pub proposal_bytes: Vec<u8>,
    pub signature: Vec<u8>,
}

/// An identity holding a private key.
pub trait SigningIdentity: Send + Sync {
    /// Serialized public identity, as embedded in the endorsement.
    fn serialize(&self) -> Result<Vec<u8>, MspError>;

    /// Sign `message`.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, MspError>;
}

/// Picks the signing identity to endorse a given proposal with.
pub trait SigningIdentityFetcher: Send + Sync {
    fn signing_identity_for_request(
        &self,
        proposal: &SignedProposal,
    ) -> Result<Arc<dyn SigningIdentity>, MspError>;
}
