//! Cache and alias registry configuration
//!
//! # Example
//!
//! ```ignore
//! use msp_cache::domain::IdentityCacheConfigBuilder;
//!
//! let config = IdentityCacheConfigBuilder::new()
//!     .deserialize_identity_cache_size(256)
//!     .satisfies_principal_cache_size(512)
//!     .build()
//!     .expect("Valid config");
//! ```

use crate::domain::errors::MspError;
use serde::{Deserialize, Serialize};
use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Default capacity of each of the three identity caches.
pub const DEFAULT_CACHE_SIZE: usize = 100;

/// Default capacity of the alias ingestion channel.
pub const DEFAULT_ALIAS_CHANNEL_CAPACITY: usize = 500;

/// Capacities of the three caches owned by a cached provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityCacheConfig {
    /// Entries in the deserialization cache (keyed by serialized identity)
    pub deserialize_identity_cache_size: usize,
    /// Entries in the validation cache (keyed by `mspid:id`)
    pub validate_identity_cache_size: usize,
    /// Entries in the principal cache (keyed by identity and principal)
    pub satisfies_principal_cache_size: usize,
}

impl Default for IdentityCacheConfig {
    fn default() -> Self {
        Self {
            deserialize_identity_cache_size: DEFAULT_CACHE_SIZE,
            validate_identity_cache_size: DEFAULT_CACHE_SIZE,
            satisfies_principal_cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

impl IdentityCacheConfig {
    /// Read capacities from the environment, falling back to defaults.
    ///
    /// - `MSP_DESERIALIZE_CACHE_SIZE`
    /// - `MSP_VALIDATE_CACHE_SIZE`
    /// - `MSP_PRINCIPAL_CACHE_SIZE`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            deserialize_identity_cache_size: env_or(
                "MSP_DESERIALIZE_CACHE_SIZE",
                defaults.deserialize_identity_cache_size,
            ),
            validate_identity_cache_size: env_or(
                "MSP_VALIDATE_CACHE_SIZE",
                defaults.validate_identity_cache_size,
            ),
            satisfies_principal_cache_size: env_or(
                "MSP_PRINCIPAL_CACHE_SIZE",
                defaults.satisfies_principal_cache_size,
            ),
        }
    }

    /// Every capacity must be positive.
    pub fn validate(&self) -> Result<(), MspError> {
        self.capacities().map(|_| ())
    }

    /// Validated capacities as (deserialize, validate, satisfies principal).
    pub(crate) fn capacities(
        &self,
    ) -> Result<(NonZeroUsize, NonZeroUsize, NonZeroUsize), MspError> {
        Ok((
            non_zero(
                "deserialize_identity_cache_size",
                self.deserialize_identity_cache_size,
            )?,
            non_zero(
                "validate_identity_cache_size",
                self.validate_identity_cache_size,
            )?,
            non_zero(
                "satisfies_principal_cache_size",
                self.satisfies_principal_cache_size,
            )?,
        ))
    }
}

/// Builder for [`IdentityCacheConfig`] with validation.
#[derive(Default)]
pub struct IdentityCacheConfigBuilder {
    deserialize_identity_cache_size: Option<usize>,
    validate_identity_cache_size: Option<usize>,
    satisfies_principal_cache_size: Option<usize>,
}

impl IdentityCacheConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deserialize_identity_cache_size(mut self, size: usize) -> Self {
        self.deserialize_identity_cache_size = Some(size);
        self
    }

    pub fn validate_identity_cache_size(mut self, size: usize) -> Self {
        self.validate_identity_cache_size = Some(size);
        self
    }

    pub fn satisfies_principal_cache_size(mut self, size: usize) -> Self {
        self.satisfies_principal_cache_size = Some(size);
        self
    }

    /// Set all three capacities at once.
    pub fn all_caches(self, size: usize) -> Self {
        self.deserialize_identity_cache_size(size)
            .validate_identity_cache_size(size)
            .satisfies_principal_cache_size(size)
    }

    /// Build the config, rejecting zero capacities.
    pub fn build(self) -> Result<IdentityCacheConfig, MspError> {
        let defaults = IdentityCacheConfig::default();
        let config = IdentityCacheConfig {
            deserialize_identity_cache_size: self
                .deserialize_identity_cache_size
                .unwrap_or(defaults.deserialize_identity_cache_size),
            validate_identity_cache_size: self
                .validate_identity_cache_size
                .unwrap_or(defaults.validate_identity_cache_size),
            satisfies_principal_cache_size: self
                .satisfies_principal_cache_size
                .unwrap_or(defaults.satisfies_principal_cache_size),
        };
        config.validate()?;
        Ok(config)
    }
}

/// What the consumer does with a position record for an identity that
/// already has an alias.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasPolicy {
    /// Keep the first recorded position; later records are skipped.
    #[default]
    InsertIfAbsent,
    /// The most recently processed position replaces the previous alias.
    Overwrite,
}

impl FromStr for AliasPolicy {
    type Err = MspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "insert_if_absent" | "first" => Ok(Self::InsertIfAbsent),
            "overwrite" | "last" => Ok(Self::Overwrite),
            other => Err(MspError::InvalidConfiguration(format!(
                "unknown alias policy '{}'",
                other
            ))),
        }
    }
}

/// Alias registry ingestion settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRegistryConfig {
    /// Records that may queue before `submit_position` waits
    pub channel_capacity: usize,
    /// Duplicate-identity handling
    pub policy: AliasPolicy,
}

impl Default for AliasRegistryConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_ALIAS_CHANNEL_CAPACITY,
            policy: AliasPolicy::default(),
        }
    }
}

impl AliasRegistryConfig {
    /// Read settings from the environment, falling back to defaults.
    ///
    /// - `MSP_ALIAS_CHANNEL_CAPACITY`
    /// - `MSP_ALIAS_POLICY` (`insert_if_absent` or `overwrite`)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            channel_capacity: env_or("MSP_ALIAS_CHANNEL_CAPACITY", defaults.channel_capacity),
            policy: env_or("MSP_ALIAS_POLICY", defaults.policy),
        }
    }

    pub fn validate(&self) -> Result<(), MspError> {
        non_zero("channel_capacity", self.channel_capacity).map(|_| ())
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_policy(mut self, policy: AliasPolicy) -> Self {
        self.policy = policy;
        self
    }
}

fn non_zero(field: &str, value: usize) -> Result<NonZeroUsize, MspError> {
    NonZeroUsize::new(value)
        .ok_or_else(|| MspError::InvalidConfiguration(format!("{} must be positive", field)))
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
