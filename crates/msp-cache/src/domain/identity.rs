//! # Fixed-Length Identity and Positional Alias Encodings
//!
//! A serialized identity (typically a PEM certificate wrapped with its MSP id)
//! runs to several hundred bytes and repeats across most transactions on a
//! channel. The alias registry keys identities by a fixed-length encoding and
//! replaces them with a 12-byte positional alias naming the ledger coordinates
//! where the full bytes were recorded.
//!
//! ## Encodings
//!
//! - `FixedIdentity`: identity bytes left-padded with zeros to
//!   [`CREATOR_LENGTH`]. Longer input keeps only its trailing
//!   `CREATOR_LENGTH` bytes.
//! - `PositionAlias`: `block_number (u64 BE) ‖ tx_index (u16 BE) ‖
//!   endorser_index (u16 BE)`.
//!
//! ## Known limitations
//!
//! `recover_variable_length` strips every leading zero byte, so an identity
//! that itself starts with `0x00` does not round-trip. Truncated identities
//! cannot be recovered either, and two long identities sharing their trailing
//! `CREATOR_LENGTH` bytes collide. Use [`FixedIdentity::try_from_bytes`] to
//! reject oversized input instead.

use crate::domain::errors::RegistryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Maximum serialized identity length the fixed encoding holds.
pub const CREATOR_LENGTH: usize = 850;

/// Length of an encoded [`PositionAlias`].
pub const ALIAS_LENGTH: usize = 12;

/// Bytes shown by `Debug` before eliding the rest.
const DEBUG_PREFIX_LEN: usize = 16;

/// Serialized identity padded to [`CREATOR_LENGTH`] bytes.
///
/// Boxed so records move through the ingestion channel without copying the
/// whole array.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FixedIdentity(Box<[u8; CREATOR_LENGTH]>);

impl FixedIdentity {
    /// Encode `creator`, left-padding with zeros.
    ///
    /// Input longer than [`CREATOR_LENGTH`] is cropped from the left. Lookups
    /// go through here too, so cropping is only logged at debug level; the
    /// registry warns when it commits a cropped identity.
    pub fn from_bytes(creator: &[u8]) -> Self {
        let tail = if creator.len() > CREATOR_LENGTH {
            debug!(
                len = creator.len(),
                max = CREATOR_LENGTH,
                "Serialized identity exceeds fixed length, keeping trailing bytes"
            );
            &creator[creator.len() - CREATOR_LENGTH..]
        } else {
            creator
        };

        let mut fixed = Box::new([0u8; CREATOR_LENGTH]);
        fixed[CREATOR_LENGTH - tail.len()..].copy_from_slice(tail);
        Self(fixed)
    }

    /// Encode `creator`, rejecting input that would be truncated.
    pub fn try_from_bytes(creator: &[u8]) -> Result<Self, RegistryError> {
        if creator.len() > CREATOR_LENGTH {
            return Err(RegistryError::OversizedIdentity {
                len: creator.len(),
                max: CREATOR_LENGTH,
            });
        }
        Ok(Self::from_bytes(creator))
    }

    /// Strip the zero padding.
    pub fn recover_variable_length(&self) -> &[u8] {
        let padding = self.0.iter().take_while(|&&b| b == 0).count();
        &self.0[padding..]
    }

    /// The full padded encoding.
    pub fn as_bytes(&self) -> &[u8; CREATOR_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for FixedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.recover_variable_length();
        let shown = &bytes[..bytes.len().min(DEBUG_PREFIX_LEN)];
        write!(f, "FixedIdentity(len={}, 0x{}", bytes.len(), hex::encode(shown))?;
        if bytes.len() > DEBUG_PREFIX_LEN {
            write!(f, "..")?;
        }
        write!(f, ")")
    }
}

/// Ledger coordinates where an identity's full bytes were recorded.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionAlias([u8; ALIAS_LENGTH]);

impl PositionAlias {
    /// Encode (block, transaction, endorser) coordinates.
    pub fn encode(block_number: u64, tx_index: u16, endorser_index: u16) -> Self {
        let mut bytes = [0u8; ALIAS_LENGTH];
        bytes[..8].copy_from_slice(&block_number.to_be_bytes());
        bytes[8..10].copy_from_slice(&tx_index.to_be_bytes());
        bytes[10..].copy_from_slice(&endorser_index.to_be_bytes());
        Self(bytes)
    }

    /// Interpret arbitrary bytes as an alias, left-padding or left-cropping
    /// to [`ALIAS_LENGTH`].
    pub fn from_bytes(alias: &[u8]) -> Self {
        let tail = &alias[alias.len().saturating_sub(ALIAS_LENGTH)..];
        let mut bytes = [0u8; ALIAS_LENGTH];
        bytes[ALIAS_LENGTH - tail.len()..].copy_from_slice(tail);
        Self(bytes)
    }

    pub fn block_number(&self) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.0[..8]);
        u64::from_be_bytes(buf)
    }

    pub fn tx_index(&self) -> u16 {
        u16::from_be_bytes([self.0[8], self.0[9]])
    }

    pub fn endorser_index(&self) -> u16 {
        u16::from_be_bytes([self.0[10], self.0[11]])
    }

    pub fn as_bytes(&self) -> &[u8; ALIAS_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for PositionAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PositionAlias(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for PositionAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.block_number(),
            self.tx_index(),
            self.endorser_index()
        )
    }
}
