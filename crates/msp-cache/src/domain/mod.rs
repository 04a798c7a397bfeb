//! # Domain Layer
//!
//! Cache algorithm, identity encodings and value types. No I/O, no tasks.

pub mod config;
pub mod entities;
pub mod errors;
pub mod identity;
pub mod second_chance;

pub use config::{
    AliasPolicy, AliasRegistryConfig, IdentityCacheConfig, IdentityCacheConfigBuilder,
    DEFAULT_ALIAS_CHANNEL_CAPACITY, DEFAULT_CACHE_SIZE,
};
pub use entities::{
    IdentityIdentifier, MspConfig, MspPrincipal, PositionRecord, PrincipalClassification,
};
pub use errors::{EndorsementError, MspError, RegistryError};
pub use identity::{FixedIdentity, PositionAlias, ALIAS_LENGTH, CREATOR_LENGTH};
pub use second_chance::SecondChanceCache;
