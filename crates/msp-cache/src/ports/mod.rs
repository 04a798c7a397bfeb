//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: the membership service provider API
//! - **Outbound (Driven)**: signing identities used by the endorsement adapter

pub mod inbound;
pub mod outbound;

pub use inbound::{Identity, MembershipServiceProvider};
pub use outbound::{SignedProposal, SigningIdentity, SigningIdentityFetcher};
