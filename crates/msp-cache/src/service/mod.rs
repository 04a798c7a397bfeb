//! # Service Layer
//!
//! - `alias_registry`: identity ↔ position alias maps fed by a bounded channel
//! - `cached_msp`: caching decorator over a membership service provider

pub mod alias_registry;
pub mod cached_msp;

pub use alias_registry::{AliasConsumer, AliasRegistry, ConsumerStats};
pub use cached_msp::{CachedIdentity, CachedMsp, CachedMspBuilder};
