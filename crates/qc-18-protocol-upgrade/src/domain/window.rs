//! Decision epoch look-back.
//!
//! The decision for the boundary at the end of epoch `E` counts the
//! declarations made in the `W`-th epoch before `E`, or in genesis if the
//! chain has fewer than `W` earlier epochs.

use super::error::UpgradeResult;
use shared_types::EpochId;

/// Walk back `num_epochs` steps from `start`, stopping early at genesis.
///
/// `prev_epoch` returns `Ok(None)` only for the genesis epoch.
pub fn decision_epoch<F>(start: EpochId, num_epochs: u64, mut prev_epoch: F) -> UpgradeResult<EpochId>
where
    F: FnMut(EpochId) -> UpgradeResult<Option<EpochId>>,
{
    let mut epoch = start;
    for _ in 0..num_epochs {
        match prev_epoch(epoch)? {
            Some(prev) => epoch = prev,
            None => break,
        }
    }
    Ok(epoch)
}
