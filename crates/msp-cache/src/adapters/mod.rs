//! # Adapters Layer
//!
//! Components at the edge of the identity layer:
//! - `endorsement`: signs proposal responses and reports endorser aliases
//! - `block_cache`: decoded block contents
//! - `position_feed`: turns committed blocks into alias registry input

pub mod block_cache;
pub mod endorsement;
pub mod position_feed;

pub use block_cache::{BlockCache, TransactionCache, TxValidationCode};
pub use endorsement::{DefaultEndorsement, Endorsement};
pub use position_feed::PositionFeed;
