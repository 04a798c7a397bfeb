//! # Identity Alias Registry
//!
//! Maps fixed-length identities to positional aliases and back.
//!
//! ## Architecture
//!
//! ```text
//!  producers ──PositionRecord──→ [bounded mpsc, cap 500] ──→ AliasConsumer ──write──→ AliasTables
//!                                   (backpressure)             (sole writer)              ↑
//!  readers ───────────────────────────── lookup_alias / lookup_identity ──────── read ────┘
//! ```
//!
//! - `AliasRegistry` is a cheap, cloneable handle exposing only enqueue and
//!   read operations.
//! - `AliasConsumer` is the single task that mutates the maps. Clearing goes
//!   through the channel too, so there is never a second writer.
//! - Readers may not yet see a position submitted moments earlier. The
//!   registry is a compression aid, not an authoritative index.
//!
//! ## Backpressure
//!
//! `submit_position` waits while the channel is full instead of dropping the
//! record. Request paths that cannot afford to wait use
//! `submit_position_with_deadline` or `try_submit_position`.

use crate::domain::config::{AliasPolicy, AliasRegistryConfig};
use crate::domain::entities::PositionRecord;
use crate::domain::errors::{MspError, RegistryError};
use crate::domain::identity::{FixedIdentity, PositionAlias};
use crate::metrics::{CommitOutcome, MetricsRecorder};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Work items carried by the ingestion channel.
enum RegistryCommand {
    Record(PositionRecord),
    Clear,
    Flush(oneshot::Sender<()>),
}

/// Forward and reverse maps. Written only by [`AliasConsumer`].
#[derive(Default)]
struct AliasTables {
    alias_for_creator: HashMap<FixedIdentity, PositionAlias>,
    creator_for_alias: HashMap<PositionAlias, Vec<u8>>,
}

/// Handle to the alias registry.
///
/// Clone it freely; every clone feeds the same consumer and reads the same
/// maps. The consumer stops once every handle is dropped.
#[derive(Clone)]
pub struct AliasRegistry {
    tables: Arc<RwLock<AliasTables>>,
    sender: mpsc::Sender<RegistryCommand>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl AliasRegistry {
    /// Create a registry handle and its (not yet running) consumer.
    ///
    /// The caller decides where the consumer runs, typically
    /// `tokio::spawn(consumer.run())`.
    pub fn new(
        config: &AliasRegistryConfig,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Result<(Self, AliasConsumer), MspError> {
        config.validate()?;

        let tables = Arc::new(RwLock::new(AliasTables::default()));
        let (sender, receiver) = mpsc::channel(config.channel_capacity);

        let registry = Self {
            tables: Arc::clone(&tables),
            sender,
            metrics: Arc::clone(&metrics),
        };
        let consumer = AliasConsumer {
            tables,
            receiver,
            policy: config.policy,
            metrics,
        };
        Ok((registry, consumer))
    }

    /// Create a registry and spawn its consumer on the current Tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(
        config: &AliasRegistryConfig,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Result<(Self, JoinHandle<ConsumerStats>), MspError> {
        let (registry, consumer) = Self::new(config, metrics)?;
        Ok((registry, tokio::spawn(consumer.run())))
    }

    /// Queue a position record, waiting while the channel is full.
    pub async fn submit_position(&self, record: PositionRecord) -> Result<(), RegistryError> {
        let started = Instant::now();
        self.sender
            .send(RegistryCommand::Record(record))
            .await
            .map_err(|_| RegistryError::ConsumerStopped)?;
        self.metrics.record_position_submitted(started.elapsed());
        Ok(())
    }

    /// Queue a position record from synchronous code, blocking the thread
    /// while the channel is full.
    ///
    /// # Panics
    /// Panics if called from within an asynchronous execution context.
    pub fn blocking_submit_position(&self, record: PositionRecord) -> Result<(), RegistryError> {
        let started = Instant::now();
        self.sender
            .blocking_send(RegistryCommand::Record(record))
            .map_err(|_| RegistryError::ConsumerStopped)?;
        self.metrics.record_position_submitted(started.elapsed());
        Ok(())
    }

    /// Queue a position record, giving up if no capacity frees up within
    /// `deadline`. The record is discarded on timeout.
    pub async fn submit_position_with_deadline(
        &self,
        record: PositionRecord,
        deadline: Duration,
    ) -> Result<(), RegistryError> {
        let started = Instant::now();
        let permit = match tokio::time::timeout(deadline, self.sender.reserve()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(RegistryError::ConsumerStopped),
            Err(_) => {
                warn!(
                    block_number = record.block_number,
                    tx_index = record.tx_index,
                    deadline_ms = deadline.as_millis() as u64,
                    "Alias channel still full at deadline, discarding position record"
                );
                return Err(RegistryError::DeadlineExceeded {
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
        };
        permit.send(RegistryCommand::Record(record));
        self.metrics.record_position_submitted(started.elapsed());
        Ok(())
    }

    /// Queue a position record only if there is room right now.
    pub fn try_submit_position(&self, record: PositionRecord) -> Result<(), RegistryError> {
        match self.sender.try_send(RegistryCommand::Record(record)) {
            Ok(()) => {
                self.metrics.record_position_submitted(Duration::ZERO);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => Err(RegistryError::ChannelFull {
                capacity: self.sender.max_capacity(),
            }),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(RegistryError::ConsumerStopped),
        }
    }

    /// Ask the consumer to empty both maps (policy reload). Records queued
    /// before the clear are discarded with it.
    pub async fn clear(&self) -> Result<(), RegistryError> {
        self.sender
            .send(RegistryCommand::Clear)
            .await
            .map_err(|_| RegistryError::ConsumerStopped)
    }

    /// Wait until everything queued before this call has been committed.
    pub async fn flush(&self) -> Result<(), RegistryError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.sender
            .send(RegistryCommand::Flush(done_tx))
            .await
            .map_err(|_| RegistryError::ConsumerStopped)?;
        done_rx.await.map_err(|_| RegistryError::ConsumerStopped)
    }

    /// Alias recorded for `creator`, if any.
    pub fn lookup_alias(&self, creator: &FixedIdentity) -> Option<PositionAlias> {
        self.tables.read().alias_for_creator.get(creator).copied()
    }

    /// Alias recorded for raw serialized identity bytes, if any.
    pub fn alias_for_bytes(&self, creator: &[u8]) -> Option<PositionAlias> {
        self.lookup_alias(&FixedIdentity::from_bytes(creator))
    }

    /// Serialized identity recorded at `alias`, if any.
    pub fn lookup_identity(&self, alias: &PositionAlias) -> Option<Vec<u8>> {
        self.tables.read().creator_for_alias.get(alias).cloned()
    }

    /// Number of aliased identities.
    pub fn len(&self) -> usize {
        self.tables.read().alias_for_creator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Commands queued but not yet taken by the consumer.
    pub fn pending(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }
}

impl fmt::Debug for AliasRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AliasRegistry")
            .field("aliases", &self.len())
            .field("pending", &self.pending())
            .finish()
    }
}

/// Totals reported by [`AliasConsumer::run`] when it stops.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub received: u64,
    pub inserted: u64,
    pub replaced: u64,
    pub skipped: u64,
    pub clears: u64,
}

impl ConsumerStats {
    fn count(&mut self, outcome: CommitOutcome) {
        match outcome {
            CommitOutcome::Inserted => self.inserted += 1,
            CommitOutcome::Replaced => self.replaced += 1,
            CommitOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// The single writer of the registry maps.
pub struct AliasConsumer {
    tables: Arc<RwLock<AliasTables>>,
    receiver: mpsc::Receiver<RegistryCommand>,
    policy: AliasPolicy,
    metrics: Arc<dyn MetricsRecorder>,
}

impl AliasConsumer {
    /// Drain the channel until every registry handle is dropped.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) -> ConsumerStats {
        info!(policy = ?self.policy, "[AliasConsumer] Started draining position records");

        let mut stats = ConsumerStats::default();
        while let Some(command) = self.receiver.recv().await {
            match command {
                RegistryCommand::Record(record) => {
                    stats.received += 1;
                    let outcome = self.commit(record);
                    stats.count(outcome);
                    self.metrics.record_position_committed(outcome);
                }
                RegistryCommand::Clear => {
                    let mut tables = self.tables.write();
                    info!(
                        aliases = tables.alias_for_creator.len(),
                        "[AliasConsumer] Clearing alias registry"
                    );
                    tables.alias_for_creator.clear();
                    tables.creator_for_alias.clear();
                    stats.clears += 1;
                    self.metrics.record_registry_cleared();
                }
                RegistryCommand::Flush(done) => {
                    // The requester may have given up waiting.
                    let _ = done.send(());
                }
            }
        }

        info!(?stats, "[AliasConsumer] All registry handles dropped, shutting down");
        stats
    }

    /// Install forward and reverse mappings for one record.
    fn commit(&self, record: PositionRecord) -> CommitOutcome {
        let alias = record.alias();
        let identity = record.creator.recover_variable_length().to_vec();
        let mut tables = self.tables.write();

        let previous_alias = tables.alias_for_creator.get(&record.creator).copied();
        let occupant_differs = tables
            .creator_for_alias
            .get(&alias)
            .is_some_and(|occupant| *occupant != identity);

        let outcome = match (previous_alias, self.policy) {
            (Some(existing), AliasPolicy::InsertIfAbsent) => {
                debug!(%existing, skipped = %alias, "Identity already aliased, keeping first position");
                return CommitOutcome::Skipped;
            }
            (None, AliasPolicy::InsertIfAbsent) if occupant_differs => {
                warn!(%alias, "Position already aliased to a different identity, skipping record");
                return CommitOutcome::Skipped;
            }
            (Some(existing), AliasPolicy::Overwrite) => {
                debug!(%existing, replacement = %alias, "Replacing identity alias");
                CommitOutcome::Replaced
            }
            (None, _) => CommitOutcome::Inserted,
        };

        if occupant_differs {
            // Overwrite policy: the displaced identity must not keep pointing
            // at a position that now resolves to someone else.
            if let Some(displaced) = tables.creator_for_alias.get(&alias).cloned() {
                warn!(%alias, "Position reassigned to a different identity");
                let displaced = FixedIdentity::from_bytes(&displaced);
                if tables.alias_for_creator.get(&displaced) == Some(&alias) {
                    tables.alias_for_creator.remove(&displaced);
                }
            }
        }

        if record.truncated {
            warn!(%alias, "Committing identity cropped to its trailing bytes, it may collide");
        }
        tables.creator_for_alias.insert(alias, identity);
        tables.alias_for_creator.insert(record.creator, alias);
        outcome
    }
}
