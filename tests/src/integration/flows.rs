//! # Integration Test Flows
//!
//! Exercises the cached provider, the alias registry, the position feed, the
//! endorsement adapter and the Prometheus recorder together.
//!
//! ## Flows Tested:
//!
//! 1. **Request path**: deserialize → validate → satisfies principal, served
//!    from cache on repeat
//! 2. **Reconfiguration**: a revocation installed by `setup` takes effect at
//!    once, even for identities handed out earlier
//! 3. **Commit path**: committed blocks → position feed → alias registry,
//!    visible to deserialization and endorsement
//! 4. **Backpressure**: thousands of records through the default channel,
//!    none lost

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    use msp_cache::adapters::{DefaultEndorsement, PositionFeed};
    use msp_cache::{
        AliasPolicy, AliasRegistry, AliasRegistryConfig, CacheKind, CachedMsp,
        IdentityCacheConfig, MembershipServiceProvider, Metrics, MspError, MspPrincipal,
        NoOpMetrics, PositionAlias, PrincipalClassification, SignedProposal, SigningIdentity,
        SigningIdentityFetcher,
    };
    use msp_telemetry::{encode_metrics, register_metrics, PrometheusRecorder};

    use crate::fixtures::{block_with_endorsers, serialized_identity, FakeX509Msp};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn member_of(mspid: &str) -> MspPrincipal {
        MspPrincipal::new(PrincipalClassification::Role, format!("{}.member", mspid))
    }

    fn admin_of(mspid: &str) -> MspPrincipal {
        MspPrincipal::new(PrincipalClassification::Role, format!("{}.admin", mspid))
    }

    /// Signs with a fixed peer identity; the signature is the message length.
    struct PeerSigner(Vec<u8>);

    impl SigningIdentity for PeerSigner {
        fn serialize(&self) -> Result<Vec<u8>, MspError> {
            Ok(self.0.clone())
        }

        fn sign(&self, message: &[u8]) -> Result<Vec<u8>, MspError> {
            Ok((message.len() as u64).to_be_bytes().to_vec())
        }
    }

    struct PeerSignerFetcher(Arc<PeerSigner>);

    impl SigningIdentityFetcher for PeerSignerFetcher {
        fn signing_identity_for_request(
            &self,
            _: &SignedProposal,
        ) -> Result<Arc<dyn SigningIdentity>, MspError> {
            Ok(self.0.clone())
        }
    }

    // =============================================================================
    // REQUEST PATH
    // =============================================================================

    #[test]
    fn test_repeated_requests_served_from_cache() {
        let msp = FakeX509Msp::new("Org1MSP");
        let metrics = Arc::new(Metrics::new());
        let cached = CachedMsp::builder(Arc::clone(&msp))
            .metrics(metrics.clone())
            .build()
            .unwrap();
        let creator = serialized_identity("Org1MSP", "client7");

        for _ in 0..10 {
            let identity = cached.deserialize_identity(&creator).unwrap();
            identity.validate().unwrap();
            identity.satisfies_principal(&member_of("Org1MSP")).unwrap();
            assert!(identity.satisfies_principal(&admin_of("Org1MSP")).is_err());
        }

        let calls = msp.calls();
        assert_eq!(calls.deserialize, 1);
        assert_eq!(calls.validate, 1);
        assert_eq!(calls.satisfies_principal, 2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.hits(CacheKind::DeserializeIdentity), 9);
        assert_eq!(snapshot.hits(CacheKind::SatisfiesPrincipal), 18);
    }

    #[test]
    fn test_identity_principal_matches_serialized_bytes() {
        let msp = FakeX509Msp::new("Org1MSP");
        let cached = CachedMsp::new(Arc::clone(&msp), &IdentityCacheConfig::default()).unwrap();
        let creator = serialized_identity("Org1MSP", "admin1");
        let identity = cached.deserialize_identity(&creator).unwrap();

        let exact = MspPrincipal::new(PrincipalClassification::Identity, creator.clone());
        let other = MspPrincipal::new(
            PrincipalClassification::Identity,
            serialized_identity("Org1MSP", "admin2"),
        );

        assert!(cached.satisfies_principal(identity.as_ref(), &exact).is_ok());
        assert!(cached.satisfies_principal(identity.as_ref(), &other).is_err());
        assert!(cached.satisfies_principal(identity.as_ref(), &admin_of("Org1MSP")).is_ok());
    }

    #[test]
    fn test_foreign_identity_rejected_every_time() {
        let msp = FakeX509Msp::new("Org1MSP");
        let cached = CachedMsp::new(Arc::clone(&msp), &IdentityCacheConfig::default()).unwrap();
        let foreign = serialized_identity("Org2MSP", "peer0");

        for _ in 0..3 {
            assert!(matches!(
                cached.deserialize_identity(&foreign),
                Err(MspError::Deserialization(_))
            ));
        }
        assert_eq!(msp.calls().deserialize, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_request_tasks() {
        let msp = FakeX509Msp::new("Org1MSP");
        let config = IdentityCacheConfig {
            deserialize_identity_cache_size: 8,
            validate_identity_cache_size: 8,
            satisfies_principal_cache_size: 8,
        };
        let cached = CachedMsp::new(Arc::clone(&msp), &config).unwrap();

        let tasks: Vec<_> = (0..16)
            .map(|task| {
                let cached = cached.clone();
                tokio::spawn(async move {
                    for round in 0..200 {
                        let id = format!("client{}", (task + round) % 24);
                        let creator = serialized_identity("Org1MSP", &id);
                        let identity = cached.deserialize_identity(&creator).unwrap();
                        identity.validate().unwrap();
                        identity.satisfies_principal(&member_of("Org1MSP")).unwrap();
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        for kind in CacheKind::ALL {
            assert!(cached.cached_entries(kind) <= 8);
        }
    }

    // =============================================================================
    // RECONFIGURATION
    // =============================================================================

    #[test]
    fn test_revocation_takes_effect_after_setup() {
        let msp = FakeX509Msp::new("Org1MSP");
        let cached = CachedMsp::new(Arc::clone(&msp), &IdentityCacheConfig::default()).unwrap();
        let identity = cached
            .deserialize_identity(&serialized_identity("Org1MSP", "peer3"))
            .unwrap();
        identity.validate().unwrap();
        identity.validate().unwrap();
        assert_eq!(msp.calls().validate, 1);

        cached
            .setup(&FakeX509Msp::revocation_config(&["peer3"]))
            .unwrap();

        let err = identity.validate().unwrap_err();
        assert!(matches!(err, MspError::InvalidIdentity(_)));
        // Failures are not cached: lifting the revocation heals immediately.
        cached.setup(&FakeX509Msp::revocation_config(&[])).unwrap();
        identity.validate().unwrap();
        assert_eq!(msp.calls().setup, 2);
    }

    // =============================================================================
    // COMMIT PATH
    // =============================================================================

    #[tokio::test]
    async fn test_committed_endorsers_become_aliased() {
        let (registry, _consumer) =
            AliasRegistry::spawn(&AliasRegistryConfig::default(), Arc::new(NoOpMetrics)).unwrap();
        let feed = PositionFeed::new(registry.clone());
        let peer0 = serialized_identity("Org1MSP", "peer0");
        let peer1 = serialized_identity("Org1MSP", "peer1");

        let block = block_with_endorsers(
            10,
            &[&[peer0.clone()], &[peer0.clone(), peer1.clone()]],
        );
        assert_eq!(feed.ingest_block(&block).await.unwrap(), 2);
        registry.flush().await.unwrap();

        assert_eq!(registry.alias_for_bytes(&peer0), Some(PositionAlias::encode(10, 0, 0)));
        assert_eq!(registry.alias_for_bytes(&peer1), Some(PositionAlias::encode(10, 1, 1)));
        assert_eq!(
            registry.lookup_identity(&PositionAlias::encode(10, 1, 1)),
            Some(peer1.clone())
        );

        // Deserialization consults the registry but its result is unaffected.
        let msp = FakeX509Msp::new("Org1MSP");
        let cached = CachedMsp::builder(msp)
            .alias_registry(registry.clone())
            .build()
            .unwrap();
        let identity = cached.deserialize_identity(&peer1).unwrap();
        assert_eq!(identity.identifier().id, "peer1");

        // Endorsements by an aliased peer carry the alias.
        let endorsement = DefaultEndorsement::new(PeerSignerFetcher(Arc::new(PeerSigner(
            peer0.clone(),
        ))))
        .with_alias_registry(registry);
        let (endorsement, payload) = endorsement
            .endorse(b"response".to_vec(), &SignedProposal::default())
            .unwrap();
        assert_eq!(payload, b"response".to_vec());
        assert_eq!(endorsement.endorser_alias, Some(PositionAlias::encode(10, 0, 0)));
        assert_eq!(
            endorsement.signature,
            ((b"response".len() + peer0.len()) as u64).to_be_bytes().to_vec()
        );
    }

    #[tokio::test]
    async fn test_policy_reload_clears_and_reingests() {
        let (registry, _consumer) = AliasRegistry::spawn(
            &AliasRegistryConfig::default().with_policy(AliasPolicy::Overwrite),
            Arc::new(NoOpMetrics),
        )
        .unwrap();
        let feed = PositionFeed::new(registry.clone());
        let peer0 = serialized_identity("Org1MSP", "peer0");

        feed.ingest_block(&block_with_endorsers(1, &[&[peer0.clone()]]))
            .await
            .unwrap();
        registry.clear().await.unwrap();
        registry.flush().await.unwrap();
        feed.ingest_block(&block_with_endorsers(2, &[&[peer0.clone()]]))
            .await
            .unwrap();
        registry.flush().await.unwrap();

        assert_eq!(registry.alias_for_bytes(&peer0), Some(PositionAlias::encode(2, 0, 0)));
        assert!(registry.lookup_identity(&PositionAlias::encode(1, 0, 0)).is_none());
    }

    // =============================================================================
    // BACKPRESSURE
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_no_records_lost_under_load() {
        let metrics = Arc::new(Metrics::new());
        let (registry, consumer) =
            AliasRegistry::spawn(&AliasRegistryConfig::default(), metrics.clone()).unwrap();

        let producers: Vec<_> = (0..8u64)
            .map(|producer| {
                let feed = PositionFeed::new(registry.clone());
                tokio::spawn(async move {
                    let mut submitted = 0;
                    for block in 0..25u64 {
                        let endorsers: Vec<Vec<u8>> = (0..20)
                            .map(|n| {
                                serialized_identity("Org1MSP", &format!("p{}-b{}-e{}", producer, block, n))
                            })
                            .collect();
                        let txs: Vec<&[Vec<u8>]> = endorsers.chunks(2).collect();
                        submitted += feed
                            .ingest_block(&block_with_endorsers(producer * 1000 + block, &txs))
                            .await
                            .unwrap();
                    }
                    submitted
                })
            })
            .collect();

        let mut total = 0;
        for producer in producers {
            total += producer.await.unwrap();
        }
        assert_eq!(total, 8 * 25 * 20);

        registry.flush().await.unwrap();
        assert_eq!(registry.len(), total);

        drop(registry);
        let stats = timeout(Duration::from_secs(5), consumer)
            .await
            .expect("consumer stops once handles are dropped")
            .unwrap();
        assert_eq!(stats.received as usize, total);
        assert_eq!(metrics.snapshot().aliases_inserted as usize, total);
    }

    // =============================================================================
    // TELEMETRY
    // =============================================================================

    #[tokio::test]
    async fn test_prometheus_recorder_wired_end_to_end() {
        register_metrics().unwrap();
        let recorder = Arc::new(PrometheusRecorder);
        let (registry, _consumer) =
            AliasRegistry::spawn(&AliasRegistryConfig::default(), recorder.clone()).unwrap();
        let cached = CachedMsp::builder(FakeX509Msp::new("Org1MSP"))
            .metrics(recorder)
            .alias_registry(registry.clone())
            .build()
            .unwrap();

        let creator = serialized_identity("Org1MSP", "peer9");
        cached.deserialize_identity(&creator).unwrap();
        cached.deserialize_identity(&creator).unwrap();
        PositionFeed::new(registry.clone())
            .ingest_block(&block_with_endorsers(5, &[&[creator]]))
            .await
            .unwrap();
        registry.flush().await.unwrap();

        let text = encode_metrics().unwrap();
        assert!(text.contains("msp_cache_lookups_total"));
        assert!(text.contains(r#"cache="deserialize_identity""#));
        assert!(text.contains("msp_alias_commits_total"));
    }
}
