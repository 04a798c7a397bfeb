//! # Cached Membership Service Provider
//!
//! Decorator that puts three second-chance caches in front of an underlying
//! provider.
//!
//! | Operation             | Key                                   | Cached outcomes |
//! |-----------------------|---------------------------------------|-----------------|
//! | `deserialize_identity`| raw serialized bytes                  | success only    |
//! | `validate`            | `"<mspid>:<id>"`                      | success only    |
//! | `satisfies_principal` | identity key ‖ classification ‖ bytes | both            |
//!
//! `setup` swaps in three fresh caches, so nothing computed under an earlier
//! configuration is served afterwards.
//!
//! Identities handed out are [`CachedIdentity`] wrappers. Their `validate` and
//! `satisfies_principal` go through the same caches, and the underlying
//! provider only ever sees the unwrapped identity.

use crate::domain::config::IdentityCacheConfig;
use crate::domain::entities::{IdentityIdentifier, MspConfig, MspPrincipal};
use crate::domain::errors::MspError;
use crate::domain::second_chance::SecondChanceCache;
use crate::metrics::{CacheKind, MetricsRecorder, NoOpMetrics};
use crate::ports::inbound::{Identity, MembershipServiceProvider};
use crate::service::alias_registry::AliasRegistry;
use parking_lot::RwLock;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, info};

/// The three caches of one configuration epoch.
struct IdentityCaches {
    deserialize: SecondChanceCache<Vec<u8>, Arc<dyn Identity>>,
    validate: SecondChanceCache<String, ()>,
    satisfies_principal: SecondChanceCache<Vec<u8>, Result<(), MspError>>,
}

impl IdentityCaches {
    fn new(capacities: (NonZeroUsize, NonZeroUsize, NonZeroUsize)) -> Self {
        let (deserialize, validate, satisfies_principal) = capacities;
        Self {
            deserialize: SecondChanceCache::new(deserialize),
            validate: SecondChanceCache::new(validate),
            satisfies_principal: SecondChanceCache::new(satisfies_principal),
        }
    }
}

/// State shared between the provider and every identity it hands out.
struct CacheCore<M> {
    msp: M,
    capacities: (NonZeroUsize, NonZeroUsize, NonZeroUsize),
    caches: RwLock<Arc<IdentityCaches>>,
    aliases: Option<AliasRegistry>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl<M: MembershipServiceProvider + 'static> CacheCore<M> {
    /// Current cache epoch. The lock is held only for the `Arc` clone.
    fn caches(&self) -> Arc<IdentityCaches> {
        self.caches.read().clone()
    }

    fn reset_caches(&self) {
        *self.caches.write() = Arc::new(IdentityCaches::new(self.capacities));
    }

    fn record_eviction(&self, kind: CacheKind, evicted: bool) {
        if evicted {
            self.metrics.record_eviction(kind);
        }
    }

    fn deserialize_identity(&self, serialized: &[u8]) -> Result<Arc<dyn Identity>, MspError> {
        let caches = self.caches();
        if let Some(identity) = caches.deserialize.get(serialized) {
            self.metrics.record_lookup(CacheKind::DeserializeIdentity, true);
            return Ok(identity);
        }
        self.metrics.record_lookup(CacheKind::DeserializeIdentity, false);

        let identity = self.msp.deserialize_identity(serialized)?;
        let evicted = caches
            .deserialize
            .add(serialized.to_vec(), Arc::clone(&identity));
        self.record_eviction(CacheKind::DeserializeIdentity, evicted.is_some());

        if let Some(registry) = &self.aliases {
            match registry.alias_for_bytes(serialized) {
                Some(alias) => {
                    debug!(identity = %identity.identifier(), %alias, "Deserialized aliased identity")
                }
                None => {
                    debug!(identity = %identity.identifier(), "Deserialized identity has no alias yet")
                }
            }
        }
        Ok(identity)
    }

    fn validate(&self, identity: &dyn Identity) -> Result<(), MspError> {
        let identity = innermost(identity);
        let key = identity.identifier().cache_key();
        let caches = self.caches();

        if caches.validate.get(&key).is_some() {
            self.metrics.record_lookup(CacheKind::ValidateIdentity, true);
            return Ok(());
        }
        self.metrics.record_lookup(CacheKind::ValidateIdentity, false);

        self.msp.validate(identity)?;
        let evicted = caches.validate.add(key, ());
        self.record_eviction(CacheKind::ValidateIdentity, evicted.is_some());
        Ok(())
    }

    fn satisfies_principal(
        &self,
        identity: &dyn Identity,
        principal: &MspPrincipal,
    ) -> Result<(), MspError> {
        let identity = innermost(identity);
        let mut key = identity.identifier().cache_key().into_bytes();
        key.extend_from_slice(&principal.fingerprint());
        let caches = self.caches();

        if let Some(outcome) = caches.satisfies_principal.get(&key) {
            self.metrics.record_lookup(CacheKind::SatisfiesPrincipal, true);
            return outcome;
        }
        self.metrics.record_lookup(CacheKind::SatisfiesPrincipal, false);

        let outcome = self.msp.satisfies_principal(identity, principal);
        let evicted = caches.satisfies_principal.add(key, outcome.clone());
        self.record_eviction(CacheKind::SatisfiesPrincipal, evicted.is_some());
        outcome
    }
}

/// Strip every decorator layer.
fn innermost(identity: &dyn Identity) -> &dyn Identity {
    let mut current = identity;
    while let Some(inner) = current.decorated() {
        current = inner;
    }
    current
}

/// Caching decorator over a [`MembershipServiceProvider`].
///
/// Implements the same trait, so it can be used wherever the wrapped provider
/// was. Cloning is cheap and clones share their caches.
pub struct CachedMsp<M> {
    core: Arc<CacheCore<M>>,
}

impl<M: MembershipServiceProvider + 'static> CachedMsp<M> {
    /// Wrap `msp` with caches sized by `config`.
    ///
    /// # Errors
    /// `MspError::InvalidConfiguration` if any capacity is zero.
    pub fn new(msp: M, config: &IdentityCacheConfig) -> Result<Self, MspError> {
        Self::builder(msp).config(config.clone()).build()
    }

    pub fn builder(msp: M) -> CachedMspBuilder<M> {
        CachedMspBuilder {
            msp,
            config: IdentityCacheConfig::default(),
            aliases: None,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &M {
        &self.core.msp
    }

    /// Alias registry consulted on deserialization, if attached.
    pub fn alias_registry(&self) -> Option<&AliasRegistry> {
        self.core.aliases.as_ref()
    }

    /// Entries currently held by one of the caches.
    pub fn cached_entries(&self, kind: CacheKind) -> usize {
        let caches = self.core.caches();
        match kind {
            CacheKind::DeserializeIdentity => caches.deserialize.len(),
            CacheKind::ValidateIdentity => caches.validate.len(),
            CacheKind::SatisfiesPrincipal => caches.satisfies_principal.len(),
        }
    }

    fn wrap(&self, identity: Arc<dyn Identity>) -> Arc<dyn Identity> {
        Arc::new(CachedIdentity {
            inner: identity,
            core: Arc::clone(&self.core),
        })
    }
}

impl<M> Clone for CachedMsp<M> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<M> fmt::Debug for CachedMsp<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let caches = self.core.caches.read();
        f.debug_struct("CachedMsp")
            .field("deserialize", &caches.deserialize)
            .field("validate", &caches.validate)
            .field("satisfies_principal", &caches.satisfies_principal)
            .field("aliases", &self.core.aliases)
            .finish()
    }
}

impl<M: MembershipServiceProvider + 'static> MembershipServiceProvider for CachedMsp<M> {
    /// Discard every cached result, then reconfigure the wrapped provider.
    ///
    /// The caches are swapped again once the provider has accepted the new
    /// configuration, dropping anything computed while it was switching.
    fn setup(&self, config: &MspConfig) -> Result<(), MspError> {
        self.core.reset_caches();
        self.core.msp.setup(config)?;
        self.core.reset_caches();
        self.core.metrics.record_cache_reset();
        info!(msp_type = config.msp_type, "[CachedMsp] Provider reconfigured, identity caches reset");
        Ok(())
    }

    fn identifier(&self) -> Result<String, MspError> {
        self.core.msp.identifier()
    }

    fn version(&self) -> u32 {
        self.core.msp.version()
    }

    fn deserialize_identity(&self, serialized: &[u8]) -> Result<Arc<dyn Identity>, MspError> {
        self.core
            .deserialize_identity(serialized)
            .map(|identity| self.wrap(identity))
    }

    fn is_well_formed(&self, serialized: &[u8]) -> Result<(), MspError> {
        self.core.msp.is_well_formed(serialized)
    }

    fn validate(&self, identity: &dyn Identity) -> Result<(), MspError> {
        self.core.validate(identity)
    }

    fn satisfies_principal(
        &self,
        identity: &dyn Identity,
        principal: &MspPrincipal,
    ) -> Result<(), MspError> {
        self.core.satisfies_principal(identity, principal)
    }
}

/// Builder for [`CachedMsp`].
pub struct CachedMspBuilder<M> {
    msp: M,
    config: IdentityCacheConfig,
    aliases: Option<AliasRegistry>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl<M: MembershipServiceProvider + 'static> CachedMspBuilder<M> {
    pub fn config(mut self, config: IdentityCacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Consult `registry` when deserializing identities.
    pub fn alias_registry(mut self, registry: AliasRegistry) -> Self {
        self.aliases = Some(registry);
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn build(self) -> Result<CachedMsp<M>, MspError> {
        let capacities = self.config.capacities()?;
        debug!(
            deserialize = capacities.0.get(),
            validate = capacities.1.get(),
            satisfies_principal = capacities.2.get(),
            "[CachedMsp] Creating identity caches"
        );
        Ok(CachedMsp {
            core: Arc::new(CacheCore {
                msp: self.msp,
                capacities,
                caches: RwLock::new(Arc::new(IdentityCaches::new(capacities))),
                aliases: self.aliases,
                metrics: self.metrics,
            }),
        })
    }
}

/// Identity returned by [`CachedMsp`], bound to the provider's caches.
pub struct CachedIdentity<M> {
    inner: Arc<dyn Identity>,
    core: Arc<CacheCore<M>>,
}

impl<M> fmt::Debug for CachedIdentity<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CachedIdentity").field(&self.inner).finish()
    }
}

impl<M: MembershipServiceProvider + 'static> Identity for CachedIdentity<M> {
    fn identifier(&self) -> &IdentityIdentifier {
        self.inner.identifier()
    }

    fn validate(&self) -> Result<(), MspError> {
        self.core.validate(self.inner.as_ref())
    }

    fn satisfies_principal(&self, principal: &MspPrincipal) -> Result<(), MspError> {
        self.core.satisfies_principal(self.inner.as_ref(), principal)
    }

    fn serialize(&self) -> Result<Vec<u8>, MspError> {
        self.inner.serialize()
    }

    fn decorated(&self) -> Option<&dyn Identity> {
        Some(self.inner.as_ref())
    }
}
