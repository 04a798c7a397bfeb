//! # MSP Identity Cache
//!
//! Identity caching and identity compression for a permissioned-ledger peer's
//! membership service provider (MSP).
//!
//! Every proposal, endorsement and committed transaction carries a serialized
//! identity that has to be deserialized, validated and checked against
//! principals. This crate amortizes that work and lets repeated identities be
//! referenced by where they first appeared on the ledger.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `SecondChanceCache`: bounded cache with CLOCK replacement
//!   - `FixedIdentity` / `PositionAlias`: fixed-length identity and 12-byte alias encodings
//!   - `IdentityCacheConfig`, `AliasRegistryConfig`: configuration with validation
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `MembershipServiceProvider`, `Identity`: driving port (inbound API)
//!   - `SigningIdentityFetcher`, `SigningIdentity`: driven port (endorsement signing)
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `CachedMsp`: implements `MembershipServiceProvider` over three caches
//!   - `AliasRegistry` / `AliasConsumer`: backpressured alias ingestion
//!
//! - **Adapters Layer** (`adapters/`): Edges
//!   - `DefaultEndorsement`: proposal response signing
//!   - `BlockCache`, `PositionFeed`: committed blocks as alias registry input
//!
//! ## Invariants
//!
//! - A cache never holds more entries than its capacity.
//! - Nothing computed before `setup` is served after it.
//! - Deserialization and validation failures are never cached.
//! - Position records are never dropped while the consumer runs; producers
//!   wait for capacity instead.
//!
//! ## Usage Example
//!
//! ```ignore
//! use msp_cache::{AliasRegistry, AliasRegistryConfig, CachedMsp, IdentityCacheConfig, Metrics};
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(Metrics::new());
//! let (aliases, consumer) = AliasRegistry::spawn(&AliasRegistryConfig::from_env(), metrics.clone())?;
//!
//! let msp = CachedMsp::builder(x509_msp)
//!     .config(IdentityCacheConfig::from_env())
//!     .alias_registry(aliases.clone())
//!     .metrics(metrics)
//!     .build()?;
//!
//! let identity = msp.deserialize_identity(&creator_bytes)?;
//! identity.validate()?;
//! ```

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use domain::{
    AliasPolicy, AliasRegistryConfig, EndorsementError, FixedIdentity, IdentityCacheConfig,
    IdentityCacheConfigBuilder, IdentityIdentifier, MspConfig, MspError, MspPrincipal,
    PositionAlias, PositionRecord, PrincipalClassification, RegistryError, SecondChanceCache,
    ALIAS_LENGTH, CREATOR_LENGTH,
};
pub use metrics::{CacheKind, CommitOutcome, Metrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::{
    Identity, MembershipServiceProvider, SignedProposal, SigningIdentity, SigningIdentityFetcher,
};
pub use service::{
    AliasConsumer, AliasRegistry, CachedIdentity, CachedMsp, CachedMspBuilder, ConsumerStats,
};

pub use adapters::{
    BlockCache, DefaultEndorsement, Endorsement, PositionFeed, TransactionCache, TxValidationCode,
};
