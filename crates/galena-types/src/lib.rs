//! # galena-types: Core types for Galena
//!
//! This crate contains shared types used across the Galena system:
//! - Node identity ([`NodeId`])
//! - Entity IDs ([`TopicId`], [`AclId`])
//! - Log positions ([`OffsetAndEpoch`])
//! - Metadata format versioning ([`MetadataVersion`])

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Node Identity
// ============================================================================

/// Unique identifier for a cluster node (controller or broker).
///
/// Node ids are assigned by the operator and are stable across restarts.
/// Negative values are reserved for "no node" sentinels in wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(i32);

impl NodeId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Raw id value.
    pub fn as_i32(self) -> i32 {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for NodeId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl From<NodeId> for i32 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

// ============================================================================
// Entity IDs
// ============================================================================

/// Unique identifier for a topic.
///
/// Topic ids survive renames; the human-readable topic name is carried
/// separately in the metadata image.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct TopicId(Uuid);

impl TopicId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generates a fresh random topic id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TopicId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// Unique identifier for a standard ACL binding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct AclId(Uuid);

impl AclId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generates a fresh random ACL id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl Display for AclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AclId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

// ============================================================================
// Log Positions
// ============================================================================

/// A position in the replicated metadata log: offset plus the leader epoch
/// that wrote it.
///
/// Ordering is offset-major, then epoch. Two positions from the same
/// history compare the way the log does, which is what the migration
/// watermark checks rely on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct OffsetAndEpoch {
    pub offset: i64,
    pub epoch: i32,
}

impl OffsetAndEpoch {
    pub fn new(offset: i64, epoch: i32) -> Self {
        Self { offset, epoch }
    }

    /// The position before any record was written.
    pub const ZERO: Self = Self {
        offset: 0,
        epoch: 0,
    };
}

impl Display for OffsetAndEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.offset, self.epoch)
    }
}

// ============================================================================
// Metadata Versioning
// ============================================================================

/// Version of the metadata record format advertised by the cluster.
///
/// Bumped through feature records; brokers refuse records newer than the
/// version they understand.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct MetadataVersion(u16);

impl MetadataVersion {
    pub fn new(version: u16) -> Self {
        Self(version)
    }

    pub fn as_u16(self) -> u16 {
        self.0
    }
}

impl Display for MetadataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u16> for MetadataVersion {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_and_epoch_is_offset_major() {
        let low = OffsetAndEpoch::new(10, 9);
        let high = OffsetAndEpoch::new(11, 2);
        assert!(low < high);

        let same_offset_low = OffsetAndEpoch::new(10, 1);
        assert!(same_offset_low < low);
    }

    #[test]
    fn node_id_round_trips() {
        let id = NodeId::new(3000);
        assert_eq!(i32::from(id), 3000);
        assert_eq!(format!("{id}"), "3000");
    }

    #[test]
    fn topic_ids_are_distinct() {
        assert_ne!(TopicId::random(), TopicId::random());
    }

    #[test]
    fn metadata_version_display() {
        assert_eq!(format!("{}", MetadataVersion::new(14)), "v14");
    }
}
