//! # Domain Entities
//!
//! Identity identifiers, principals and the position records that feed the
//! alias registry.

use crate::domain::identity::{FixedIdentity, PositionAlias, CREATOR_LENGTH};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies an identity within its membership service provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityIdentifier {
    /// Identifier of the MSP that issued the identity
    pub mspid: String,
    /// Identifier unique within that MSP (typically a certificate hash)
    pub id: String,
}

impl IdentityIdentifier {
    pub fn new(mspid: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            mspid: mspid.into(),
            id: id.into(),
        }
    }

    /// `"<mspid>:<id>"`, the key for validation and principal caches.
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.mspid, self.id)
    }
}

impl fmt::Display for IdentityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.mspid, self.id)
    }
}

/// How the bytes of an [`MspPrincipal`] are to be interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrincipalClassification {
    /// A role within an MSP (member, admin, client, peer)
    Role,
    /// An organizational unit
    OrganizationUnit,
    /// One specific serialized identity
    Identity,
    /// Anonymous vs. nominal
    Anonymity,
    /// A combination of other principals
    Combined,
}

impl PrincipalClassification {
    /// Wire discriminant, used in principal cache keys.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Role => 0,
            Self::OrganizationUnit => 1,
            Self::Identity => 2,
            Self::Anonymity => 3,
            Self::Combined => 4,
        }
    }
}

/// A policy predicate over identities, checked by `satisfies_principal`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MspPrincipal {
    pub classification: PrincipalClassification,
    /// Opaque encoded principal, interpreted by the provider
    pub principal: Vec<u8>,
}

impl MspPrincipal {
    pub fn new(classification: PrincipalClassification, principal: impl Into<Vec<u8>>) -> Self {
        Self {
            classification,
            principal: principal.into(),
        }
    }

    /// Classification discriminant followed by the principal bytes.
    pub fn fingerprint(&self) -> Vec<u8> {
        let mut fingerprint = Vec::with_capacity(1 + self.principal.len());
        fingerprint.push(self.classification.as_u8());
        fingerprint.extend_from_slice(&self.principal);
        fingerprint
    }
}

/// Opaque provider configuration handed to `setup`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MspConfig {
    /// Provider type tag (e.g. 0 for X.509)
    pub msp_type: i32,
    /// Encoded provider-specific configuration
    pub config: Vec<u8>,
}

/// Where an identity was recorded on the ledger. Consumed exactly once by the
/// alias registry's consumer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionRecord {
    pub creator: FixedIdentity,
    pub block_number: u64,
    pub tx_index: u16,
    pub endorser_index: u16,
    /// The serialized identity was longer than [`CREATOR_LENGTH`] and only its
    /// trailing bytes were kept.
    pub truncated: bool,
}

impl PositionRecord {
    /// Build a record from raw serialized identity bytes.
    pub fn new(creator: &[u8], block_number: u64, tx_index: u16, endorser_index: u16) -> Self {
        Self {
            creator: FixedIdentity::from_bytes(creator),
            block_number,
            tx_index,
            endorser_index,
            truncated: creator.len() > CREATOR_LENGTH,
        }
    }

    /// The alias these coordinates encode to.
    pub fn alias(&self) -> PositionAlias {
        PositionAlias::encode(self.block_number, self.tx_index, self.endorser_index)
    }
}
