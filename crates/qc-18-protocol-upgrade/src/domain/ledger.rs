//! Protocol version ledger: what a producer writes into its headers.
//!
//! Each header records the highest protocol version the producer's binary
//! supports. Producers that lag behind the active version still produce and
//! still have their declaration counted; that is how adoption is measured.

use super::config::ProtocolUpgradeConfig;
use shared_types::{BlockHeader, BlockHeight, Hash, ProtocolVersion, ValidatorId};

/// Version a producer declares in a header at `height`.
pub fn declared_version_for(config: &ProtocolUpgradeConfig, height: BlockHeight) -> ProtocolVersion {
    match config.vote_schedule {
        Some(schedule) if height < schedule.vote_from_height => schedule.previous_version,
        _ => config.protocol_version,
    }
}

/// Fields a producer fills in; the declared version is added by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderTemplate {
    pub height: BlockHeight,
    pub prev_hash: Hash,
    pub author: ValidatorId,
    pub timestamp_ms: u64,
    pub extra_data: Vec<u8>,
}

/// Build a header carrying this binary's declaration.
pub fn produce_header(config: &ProtocolUpgradeConfig, template: HeaderTemplate) -> BlockHeader {
    BlockHeader {
        height: template.height,
        prev_hash: template.prev_hash,
        author: template.author,
        declared_version: declared_version_for(config, template.height),
        timestamp_ms: template.timestamp_ms,
        extra_data: template.extra_data,
    }
}

/// True if a header's author runs a binary older than the active protocol.
pub fn lags_active_version(header: &BlockHeader, active: ProtocolVersion) -> bool {
    header.declared_version < active
}
