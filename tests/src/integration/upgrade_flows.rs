//! # Protocol Upgrade Flows
//!
//! Drives a simulated chain epoch by epoch, feeding each decision back as
//! the next epoch's active version, the way block production would.
//!
//! ## Flows Tested:
//!
//! 1. **Gradual rollout**: validators upgrade one by one; the new version
//!    activates exactly `W` epochs after 80% of stake first declares it.
//! 2. **Independent nodes**: separate nodes on separate tasks build the same
//!    history and reach byte-identical decisions.
//! 3. **Lost supermajority**: an adopted version stays active after its
//!    support drops below the threshold.
//! 4. **Vote schedule**: a release rolled out early does not vote until the
//!    scheduled height.

#[cfg(test)]
mod tests {
    use crate::fixtures::{SimulatedChain, SimulatedService};
    use crate::integration::init_tracing;
    use qc_18_protocol_upgrade::domain::{declared_version_for, DecisionEnvelope};
    use qc_18_protocol_upgrade::{
        EpochVersionDecision, ProtocolUpgradeApi, ProtocolUpgradeConfig,
        UpgradeVoteSchedule, GENESIS_PROTOCOL_VERSION,
    };
    use shared_types::{BlockHeight, EpochId, ProtocolVersion};

    const BLOCKS_PER_EPOCH: u64 = 10;

    /// Run `epochs` epochs and return the version decided at each boundary.
    fn run<F>(
        chain: &SimulatedChain,
        service: &SimulatedService,
        epochs: u64,
        declare: F,
    ) -> Vec<ProtocolVersion>
    where
        F: Fn(usize, EpochId, BlockHeight) -> ProtocolVersion,
    {
        let mut active = GENESIS_PROTOCOL_VERSION;
        let mut decided = Vec::new();
        for e in 0..epochs {
            let last = chain
                .finalize_epoch(active, |i, height| declare(i, EpochId(e), height))
                .unwrap();
            active = service.decide(&last).unwrap();
            decided.push(active);
        }
        decided
    }

    /// Validator `i` runs the v2 binary from epoch `i` on.
    fn gradual_rollout(i: usize, epoch: EpochId, _height: BlockHeight) -> ProtocolVersion {
        if epoch.0 >= i as u64 {
            2
        } else {
            1
        }
    }

    #[test]
    fn test_gradual_rollout_activates_after_window() {
        init_tracing();
        let chain = SimulatedChain::new(&[20; 5], BLOCKS_PER_EPOCH);
        let service = chain.service(ProtocolUpgradeConfig::default()).unwrap();

        let decided = run(&chain, &service, 8, gradual_rollout);

        // 80% first declares v2 in epoch 3, decided at the boundary of epoch 5.
        assert_eq!(decided, vec![1, 1, 1, 1, 1, 2, 2, 2]);
        let decision = service.cached_decision(EpochId(5)).unwrap();
        assert_eq!(decision.decision_epoch, EpochId(3));
        assert_eq!(decision.tally.get(&2), Some(&80));
        assert!(decision.is_upgrade());
    }

    #[test]
    fn test_version_never_reverts_after_rollback() {
        let chain = SimulatedChain::new(&[20; 5], BLOCKS_PER_EPOCH);
        let service = chain.service(ProtocolUpgradeConfig::default()).unwrap();

        // Everyone on v3 for three epochs, then everyone rolls back to v2.
        let decided = run(&chain, &service, 7, |_, epoch, _| if epoch.0 < 3 { 3 } else { 2 });

        assert_eq!(decided, vec![3, 3, 3, 3, 3, 3, 3]);
    }

    #[test]
    fn test_adopted_version_survives_lost_supermajority() {
        let chain = SimulatedChain::new(&[20; 5], BLOCKS_PER_EPOCH);
        let service = chain.service(ProtocolUpgradeConfig::default()).unwrap();

        // Everyone declares v2 in epoch 1; from epoch 2 on only 40% still do.
        let decided = run(&chain, &service, 6, |i, epoch, _| match epoch.0 {
            0 => 1,
            1 => 2,
            _ if i < 2 => 2,
            _ => 1,
        });

        assert_eq!(decided, vec![1, 1, 1, 2, 2, 2]);
        assert!(decided.windows(2).all(|w| w[0] <= w[1]));

        let decision = service.cached_decision(EpochId(4)).unwrap();
        assert_eq!(decision.decision_epoch, EpochId(2));
        assert!(!decision.threshold_met);
        assert_eq!(decision.previous_version, 2);
        assert!(!decision.is_upgrade());
    }

    #[test]
    fn test_minority_upgrade_never_activates() {
        let chain = SimulatedChain::new(&[50, 30, 20], BLOCKS_PER_EPOCH);
        let service = chain.service(ProtocolUpgradeConfig::default()).unwrap();

        let decided = run(&chain, &service, 6, |i, _, _| if i == 0 { 2 } else { 1 });
        assert!(decided.iter().all(|v| *v == 1));
    }

    #[test]
    fn test_vote_schedule_delays_adoption() {
        let config = ProtocolUpgradeConfig::default()
            .with_protocol_version(2)
            .with_vote_schedule(UpgradeVoteSchedule {
                vote_from_height: 3 * BLOCKS_PER_EPOCH + 1,
                previous_version: 1,
            });
        let chain = SimulatedChain::new(&[25; 4], BLOCKS_PER_EPOCH);
        let service = chain.service(config.clone()).unwrap();

        // Every node runs the same release and follows its schedule.
        let decided = run(&chain, &service, 7, |_, _, height| declared_version_for(&config, height));

        // First vote in epoch 3, decided at the boundary of epoch 5.
        assert_eq!(decided, vec![1, 1, 1, 1, 1, 2, 2]);
    }

    fn node_history(seed_nodes: usize) -> Vec<Vec<u8>> {
        let chain = SimulatedChain::new(&[40, 25, 15, 10, 10], BLOCKS_PER_EPOCH);
        let service = chain.service(ProtocolUpgradeConfig::default()).unwrap();
        run(&chain, &service, 6, |i, epoch, height| {
            // Mixed declarations that change within an epoch.
            let base = if i < seed_nodes { 2 } else { 1 };
            base + ((height + epoch.0) % 2) as u32
        });
        (0..6)
            .map(|e| {
                let decision: EpochVersionDecision = service.decision_for(EpochId(e)).unwrap();
                DecisionEnvelope::encode(&decision).unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_independent_nodes_reach_identical_decisions() {
        let mut handles = Vec::new();
        for _ in 0..4 {
            handles.push(tokio::task::spawn_blocking(|| node_history(3)));
        }

        let histories: Vec<Vec<Vec<u8>>> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        for history in &histories[1..] {
            assert_eq!(history, &histories[0]);
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_decision() {
        let chain = SimulatedChain::new(&[20; 5], BLOCKS_PER_EPOCH);
        let service = std::sync::Arc::new(chain.service(ProtocolUpgradeConfig::default()).unwrap());
        let last = (0..4)
            .map(|_| chain.finalize_epoch(1, |_, _| 2).unwrap())
            .last()
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = std::sync::Arc::clone(&service);
            handles.push(tokio::spawn(async move { service.decide(&last).unwrap() }));
        }
        for result in futures::future::join_all(handles).await {
            assert_eq!(result.unwrap(), 2);
        }
        assert!(service.cached_decision(EpochId(3)).is_some());
    }
}
