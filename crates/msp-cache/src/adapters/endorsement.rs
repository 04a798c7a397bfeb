//! # Default Endorsement
//!
//! Signs a proposal response payload with the peer's signing identity and
//! reports whether that identity is already aliased.
//!
//! The signature covers `payload ‖ serialized endorser identity`, binding the
//! endorser to what it signed.

use crate::domain::errors::EndorsementError;
use crate::domain::identity::PositionAlias;
use crate::ports::outbound::{SignedProposal, SigningIdentityFetcher};
use crate::service::alias_registry::AliasRegistry;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A signature over a proposal response payload and the identity that made it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorsement {
    pub signature: Vec<u8>,
    /// Serialized endorser identity
    pub endorser: Vec<u8>,
    /// Position alias of `endorser`, when the registry already knows it
    pub endorser_alias: Option<PositionAlias>,
}

/// Endorsement plugin that signs with the identity the fetcher picks.
pub struct DefaultEndorsement<F> {
    fetcher: F,
    aliases: Option<AliasRegistry>,
}

impl<F: SigningIdentityFetcher> DefaultEndorsement<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            aliases: None,
        }
    }

    /// Look endorser identities up in `registry`.
    pub fn with_alias_registry(mut self, registry: AliasRegistry) -> Self {
        self.aliases = Some(registry);
        self
    }

    /// Endorse `payload` for `proposal`.
    ///
    /// Returns the endorsement together with the payload, which is passed
    /// through unchanged.
    pub fn endorse(
        &self,
        payload: Vec<u8>,
        proposal: &SignedProposal,
    ) -> Result<(Endorsement, Vec<u8>), EndorsementError> {
        let signer = self
            .fetcher
            .signing_identity_for_request(proposal)
            .map_err(EndorsementError::SigningIdentity)?;
        let endorser = signer.serialize().map_err(EndorsementError::Serialize)?;
        debug!(endorser_len = endorser.len(), "Endorsing proposal response payload");

        let mut message = Vec::with_capacity(payload.len() + endorser.len());
        message.extend_from_slice(&payload);
        message.extend_from_slice(&endorser);
        let signature = signer.sign(&message).map_err(EndorsementError::Sign)?;

        let endorser_alias = self
            .aliases
            .as_ref()
            .and_then(|registry| registry.alias_for_bytes(&endorser));
        match endorser_alias {
            Some(alias) => info!(%alias, "Endorser identity already aliased"),
            None => info!("Endorser identity not aliased yet"),
        }

        Ok((
            Endorsement {
                signature,
                endorser,
                endorser_alias,
            },
            payload,
        ))
    }
}
