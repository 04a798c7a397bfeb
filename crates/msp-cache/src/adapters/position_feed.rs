//! # Position Feed
//!
//! Producer side of the alias registry: turns committed blocks into
//! [`PositionRecord`]s.
//!
//! Only endorsers of valid transactions are recorded, each identity at most
//! once per block, and identities that already have an alias are left alone.

use crate::adapters::block_cache::BlockCache;
use crate::domain::entities::PositionRecord;
use crate::domain::errors::RegistryError;
use crate::service::alias_registry::AliasRegistry;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Feeds committed blocks into an [`AliasRegistry`].
#[derive(Clone, Debug)]
pub struct PositionFeed {
    registry: AliasRegistry,
}

impl PositionFeed {
    pub fn new(registry: AliasRegistry) -> Self {
        Self { registry }
    }

    /// Submit a record for every new endorser identity in `block`.
    ///
    /// Waits for channel capacity like
    /// [`AliasRegistry::submit_position`]. Returns the number of records
    /// submitted.
    pub async fn ingest_block(&self, block: &BlockCache) -> Result<usize, RegistryError> {
        let mut seen = HashSet::new();
        let mut submitted = 0;

        for tx in block.valid_transactions() {
            for (endorser_index, endorser) in tx.endorsers.iter().enumerate() {
                // Every later index is out of range too.
                let Ok(endorser_index) = u16::try_from(endorser_index) else {
                    warn!(
                        block = block.number,
                        tx_id = %tx.tx_id,
                        dropped = tx.endorsers.len() - endorser_index,
                        "Endorser index exceeds alias range, positions not recorded"
                    );
                    break;
                };

                let record =
                    PositionRecord::new(endorser, block.number, tx.index_in_block, endorser_index);
                if !seen.insert(record.creator.clone())
                    || self.registry.lookup_alias(&record.creator).is_some()
                {
                    continue;
                }

                self.registry.submit_position(record).await?;
                submitted += 1;
            }
        }

        debug!(block = block.number, submitted, "Position records submitted for block");
        Ok(submitted)
    }
}
