//! # Envelope Storage Integration
//!
//! Headers written by older binaries in older shapes sit next to current
//! ones in the chain store. The decision engine must read all of them, and
//! must refuse shapes it does not know instead of guessing.

#[cfg(test)]
mod tests {
    use qc_18_protocol_upgrade::{
        EnvelopeChainStore, FinalizedChain, InMemoryDecisionStore, InMemoryEpochManager,
        InMemoryEventBus, ProtocolUpgradeApi, ProtocolUpgradeConfig, ProtocolUpgradeDependencies,
        ProtocolUpgradeService, UpgradeError,
    };
    use rayon::prelude::*;
    use shared_types::{
        BlockHeader, BlockHeaderEnvelope, BlockHeaderV1, BlockHeaderV2, EpochId, StakeTable,
        ValidatorId, VersionedBlockHeader, LEDGERLESS_DECLARED_VERSION,
    };
    use shared_versioned::EnvelopeError;
    use std::sync::Arc;

    fn validator(n: u8) -> ValidatorId {
        [n; 32]
    }

    /// Epoch 0 with three validators, heights 1..=3 produced by 1, 2, 3.
    fn genesis_epoch() -> (Arc<InMemoryEpochManager>, Arc<EnvelopeChainStore>) {
        let epochs = Arc::new(InMemoryEpochManager::new());
        epochs
            .add_epoch(
                EpochId(0),
                None,
                StakeTable::from_stakes(
                    EpochId(0),
                    [(validator(1), 10), (validator(2), 45), (validator(3), 45)],
                ),
            )
            .unwrap();
        for height in 1..=3u64 {
            epochs
                .assign_producer(EpochId(0), height, validator(height as u8))
                .unwrap();
        }
        epochs.record_block([0xAA; 32], EpochId(0));
        (epochs, Arc::new(EnvelopeChainStore::new()))
    }

    fn service(
        epochs: &Arc<InMemoryEpochManager>,
        chain: &Arc<EnvelopeChainStore>,
    ) -> ProtocolUpgradeService<
        InMemoryEpochManager,
        EnvelopeChainStore,
        InMemoryDecisionStore,
        InMemoryEventBus,
    > {
        ProtocolUpgradeService::new(ProtocolUpgradeDependencies {
            epoch_manager: Arc::clone(epochs),
            chain: Arc::clone(chain),
            decision_store: Arc::new(InMemoryDecisionStore::new()),
            event_sink: Arc::new(InMemoryEventBus::new()),
            config: ProtocolUpgradeConfig::default(),
        })
        .unwrap()
    }

    fn current(height: u64, version: u32) -> BlockHeader {
        BlockHeader {
            height,
            prev_hash: [height as u8; 32],
            author: validator(height as u8),
            declared_version: version,
            timestamp_ms: height * 1_000,
            extra_data: vec![0xEE],
        }
    }

    #[test]
    fn test_mixed_shapes_are_tallied() {
        let (epochs, chain) = genesis_epoch();

        // Height 1: written before the ledger field existed.
        let v1 = VersionedBlockHeader::V1(BlockHeaderV1 {
            height: 1,
            prev_hash: [0u8; 32],
            author: validator(1),
            timestamp_secs: 1,
        });
        chain.append_raw(EpochId(0), 1, BlockHeaderEnvelope::encode_shape(&v1).unwrap());

        // Height 2: second shape, declares v2.
        let v2 = VersionedBlockHeader::V2(BlockHeaderV2 {
            height: 2,
            prev_hash: [1u8; 32],
            author: validator(2),
            timestamp_secs: 2,
            declared_version: 2,
        });
        chain.append_raw(EpochId(0), 2, BlockHeaderEnvelope::encode_shape(&v2).unwrap());

        // Height 3: current shape.
        chain.append(EpochId(0), &current(3, 2)).unwrap();

        let headers = chain.headers_in_epoch(EpochId(0)).unwrap();
        assert_eq!(headers[0].declared_version, LEDGERLESS_DECLARED_VERSION);
        assert_eq!(headers[1].timestamp_ms, 2_000);

        let decision = service(&epochs, &chain).decision_for(EpochId(0)).unwrap();
        assert_eq!(decision.tally.get(&LEDGERLESS_DECLARED_VERSION), Some(&10));
        assert_eq!(decision.tally.get(&2), Some(&90));
        assert_eq!(decision.version, 2);
    }

    #[test]
    fn test_newer_header_shape_stops_decision() {
        let (epochs, chain) = genesis_epoch();
        chain.append(EpochId(0), &current(1, 2)).unwrap();

        // A header from a binary that knows a shape this one does not.
        let mut future = current(2, 3).to_envelope_bytes().unwrap();
        future[0] = BlockHeaderEnvelope::latest_tag() + 1;
        chain.append_raw(EpochId(0), 2, future);

        let result = service(&epochs, &chain).decide(&[0xAA; 32]);
        assert!(matches!(
            result,
            Err(UpgradeError::Envelope(EnvelopeError::UnknownVersionTag { .. }))
        ));
    }

    #[test]
    fn test_corrupt_header_stops_decision() {
        let (epochs, chain) = genesis_epoch();
        let mut bytes = current(1, 2).to_envelope_bytes().unwrap();
        bytes.truncate(bytes.len() - 3);
        chain.append_raw(EpochId(0), 1, bytes);

        let result = service(&epochs, &chain).decide(&[0xAA; 32]);
        assert!(matches!(
            result,
            Err(UpgradeError::Envelope(EnvelopeError::MalformedPayload { .. }))
        ));
    }

    #[test]
    fn test_parallel_decoding_matches_sequential() {
        let shapes: Vec<Vec<u8>> = (0..3_000u64)
            .map(|h| {
                let shape = match h % 3 {
                    0 => VersionedBlockHeader::V1(BlockHeaderV1 {
                        height: h,
                        prev_hash: [0u8; 32],
                        author: validator(1),
                        timestamp_secs: h,
                    }),
                    1 => VersionedBlockHeader::V2(BlockHeaderV2 {
                        height: h,
                        prev_hash: [0u8; 32],
                        author: validator(2),
                        timestamp_secs: h,
                        declared_version: 2,
                    }),
                    _ => VersionedBlockHeader::V3(current(h, 3)),
                };
                BlockHeaderEnvelope::encode_shape(&shape).unwrap()
            })
            .collect();

        let sequential: Vec<BlockHeader> = shapes
            .iter()
            .map(|b| BlockHeader::from_envelope_bytes(b).unwrap())
            .collect();
        let parallel: Vec<BlockHeader> = shapes
            .par_iter()
            .map(|b| BlockHeader::from_envelope_bytes(b).unwrap())
            .collect();

        assert_eq!(sequential, parallel);
        let hashes: Vec<_> = parallel.par_iter().map(BlockHeader::hash).collect();
        assert_eq!(hashes.len(), 3_000);
    }
}
