//! # Inbound Ports (Driving Ports / API)
//!
//! The membership service provider interface. The underlying provider
//! (certificate parsing, chain and signature checks) implements it, and so
//! does [`CachedMsp`](crate::service::CachedMsp), which makes the cache a
//! drop-in replacement anywhere a provider is expected.

use crate::domain::entities::{IdentityIdentifier, MspConfig, MspPrincipal};
use crate::domain::errors::MspError;
use std::fmt::Debug;
use std::sync::Arc;

/// A deserialized identity.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait Identity: Debug + Send + Sync {
    /// MSP id and unique id of this identity.
    fn identifier(&self) -> &IdentityIdentifier;

    /// Validate this identity against its MSP.
    fn validate(&self) -> Result<(), MspError>;

    /// Check this identity against a principal.
    fn satisfies_principal(&self, principal: &MspPrincipal) -> Result<(), MspError>;

    /// Serialized form, as carried in proposals and transactions.
    fn serialize(&self) -> Result<Vec<u8>, MspError>;

    /// The identity this one decorates, if it is a wrapper.
    ///
    /// Providers receive the innermost identity so that wrappers never leak
    /// into the implementation they wrap.
    fn decorated(&self) -> Option<&dyn Identity> {
        None
    }
}

/// Membership service provider.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait MembershipServiceProvider: Send + Sync {
    /// (Re)configure the provider. Results computed under a previous
    /// configuration must not be served afterwards.
    fn setup(&self, config: &MspConfig) -> Result<(), MspError>;

    /// Identifier of this MSP.
    fn identifier(&self) -> Result<String, MspError>;

    /// Provider implementation version.
    fn version(&self) -> u32;

    /// Decode a serialized identity.
    fn deserialize_identity(&self, serialized: &[u8]) -> Result<Arc<dyn Identity>, MspError>;

    /// Check that `serialized` is in canonical form without fully validating it.
    fn is_well_formed(&self, serialized: &[u8]) -> Result<(), MspError>;

    /// Validate an identity (certificate chain, revocation, expiry).
    fn validate(&self, identity: &dyn Identity) -> Result<(), MspError>;

    /// Check an identity against a principal.
    fn satisfies_principal(
        &self,
        identity: &dyn Identity,
        principal: &MspPrincipal,
    ) -> Result<(), MspError>;
}

impl<T: MembershipServiceProvider + ?Sized> MembershipServiceProvider for Arc<T> {
    fn setup(&self, config: &MspConfig) -> Result<(), MspError> {
        (**self).setup(config)
    }

    fn identifier(&self) -> Result<String, MspError> {
        (**self).identifier()
    }

    fn version(&self) -> u32 {
        (**self).version()
    }

    fn deserialize_identity(&self, serialized: &[u8]) -> Result<Arc<dyn Identity>, MspError> {
        (**self).deserialize_identity(serialized)
    }

    fn is_well_formed(&self, serialized: &[u8]) -> Result<(), MspError> {
        (**self).is_well_formed(serialized)
    }

    fn validate(&self, identity: &dyn Identity) -> Result<(), MspError> {
        (**self).validate(identity)
    }

    fn satisfies_principal(
        &self,
        identity: &dyn Identity,
        principal: &MspPrincipal,
    ) -> Result<(), MspError> {
        (**self).satisfies_principal(identity, principal)
    }
}
