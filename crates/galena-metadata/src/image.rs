//! Immutable metadata image.
//!
//! A [`MetadataImage`] is the fully materialized cluster metadata at one
//! log position. Images are cheap to clone (the driver keeps the previous
//! image around while mirroring a delta) and are never mutated in place;
//! the log publishes a fresh image with every change set.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use galena_types::{AclId, MetadataVersion, NodeId, OffsetAndEpoch, TopicId};

use crate::acl::StandardAcl;

// ============================================================================
// Features
// ============================================================================

/// Stage of the Keeper-to-quorum migration as recorded in the log itself.
///
/// The tag is written by the quorum controller and gates what the
/// migration driver is allowed to do when it wakes up.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum MigrationPhase {
    /// Cluster was never configured for migration.
    #[default]
    None,
    /// Migration is enabled but bulk replay has not finished.
    PreMigration,
    /// Bulk replay finished; dual-write is (or was) in effect.
    Migration,
    /// Migration finalized; the Keeper is no longer written.
    PostMigration,
}

impl Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MigrationPhase::None => "none",
            MigrationPhase::PreMigration => "pre-migration",
            MigrationPhase::Migration => "migration",
            MigrationPhase::PostMigration => "post-migration",
        };
        f.write_str(s)
    }
}

/// Cluster-wide feature levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FeaturesImage {
    pub metadata_version: MetadataVersion,
    pub migration_phase: MigrationPhase,
}

// ============================================================================
// Cluster
// ============================================================================

/// One broker's registration in the cluster image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerRegistration {
    pub id: NodeId,
    /// True when the broker registered itself as still speaking the legacy
    /// protocol and being fed from the Keeper.
    pub migrating_legacy_broker: bool,
    pub fenced: bool,
}

/// Cluster membership as known to the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ClusterImage {
    pub brokers: BTreeMap<NodeId, BrokerRegistration>,
}

impl ClusterImage {
    pub fn is_empty(&self) -> bool {
        self.brokers.is_empty()
    }

    /// True when `id` is registered and carries the migrating-legacy marker.
    pub fn has_migrating_legacy_broker(&self, id: NodeId) -> bool {
        self.brokers
            .get(&id)
            .is_some_and(|b| b.migrating_legacy_broker)
    }
}

// ============================================================================
// Topics
// ============================================================================

/// Replica assignment and leadership for one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PartitionRegistration {
    pub replicas: Vec<NodeId>,
    pub isr: Vec<NodeId>,
    pub leader: Option<NodeId>,
    pub leader_epoch: i32,
    pub partition_epoch: i32,
}

/// One topic with its partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicImage {
    pub id: TopicId,
    pub name: String,
    pub partitions: BTreeMap<u32, PartitionRegistration>,
}

/// All topics keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TopicsImage {
    pub by_id: BTreeMap<TopicId, TopicImage>,
}

// ============================================================================
// Configs
// ============================================================================

/// What kind of entity a config resource names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ConfigResourceKind {
    Broker,
    Topic,
}

/// A configurable entity: a broker or a topic, by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConfigResource {
    pub kind: ConfigResourceKind,
    pub name: String,
}

impl ConfigResource {
    pub fn broker(name: impl Into<String>) -> Self {
        Self {
            kind: ConfigResourceKind::Broker,
            name: name.into(),
        }
    }

    pub fn topic(name: impl Into<String>) -> Self {
        Self {
            kind: ConfigResourceKind::Topic,
            name: name.into(),
        }
    }
}

impl Display for ConfigResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ConfigResourceKind::Broker => "broker",
            ConfigResourceKind::Topic => "topic",
        };
        write!(f, "{kind}:{}", self.name)
    }
}

/// Dynamic configs, the full key/value map per resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConfigsImage {
    pub resources: BTreeMap<ConfigResource, BTreeMap<String, String>>,
}

impl ConfigsImage {
    /// The complete config map for `resource`; empty when the resource has
    /// no remaining entries (including after a delete).
    pub fn config_map(&self, resource: &ConfigResource) -> BTreeMap<String, String> {
        self.resources.get(resource).cloned().unwrap_or_default()
    }
}

// ============================================================================
// Client Quotas
// ============================================================================

/// The entity a quota applies to; any combination of user, client id, and
/// source ip.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ClientQuotaEntity {
    pub user: Option<String>,
    pub client_id: Option<String>,
    pub ip: Option<String>,
}

impl ClientQuotaEntity {
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            user: Some(name.into()),
            ..Self::default()
        }
    }
}

impl Display for ClientQuotaEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(user) = &self.user {
            parts.push(format!("user={user}"));
        }
        if let Some(client_id) = &self.client_id {
            parts.push(format!("client-id={client_id}"));
        }
        if let Some(ip) = &self.ip {
            parts.push(format!("ip={ip}"));
        }
        f.write_str(&parts.join(","))
    }
}

/// Client quotas, the full key/value map per entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ClientQuotasImage {
    pub entities: BTreeMap<ClientQuotaEntity, BTreeMap<String, f64>>,
}

impl ClientQuotasImage {
    /// The complete quota map for `entity`; empty when all quotas for the
    /// entity were removed.
    pub fn quota_map(&self, entity: &ClientQuotaEntity) -> BTreeMap<String, f64> {
        self.entities.get(entity).cloned().unwrap_or_default()
    }
}

// ============================================================================
// Producer Ids
// ============================================================================

/// Producer-id block allocation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerIdsImage {
    /// First id of the next block to hand out, or -1 if no block was ever
    /// allocated.
    pub next_producer_id: i64,
}

impl Default for ProducerIdsImage {
    fn default() -> Self {
        Self {
            next_producer_id: -1,
        }
    }
}

// ============================================================================
// ACLs
// ============================================================================

/// All standard ACL bindings keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AclsImage {
    pub acls: BTreeMap<AclId, StandardAcl>,
}

// ============================================================================
// The Image
// ============================================================================

/// Fully materialized cluster metadata at one log position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetadataImage {
    /// Position of the last record folded into this image.
    pub highest: OffsetAndEpoch,
    pub features: FeaturesImage,
    pub cluster: ClusterImage,
    pub topics: TopicsImage,
    pub configs: ConfigsImage,
    pub client_quotas: ClientQuotasImage,
    pub producer_ids: ProducerIdsImage,
    pub acls: AclsImage,
}

impl MetadataImage {
    /// Position of the last record folded into this image.
    pub fn highest_offset_and_epoch(&self) -> OffsetAndEpoch {
        self.highest
    }

    pub fn is_empty(&self) -> bool {
        self.highest == OffsetAndEpoch::default()
            && self.cluster.is_empty()
            && self.topics.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_image_defaults() {
        let image = MetadataImage::default();
        assert!(image.is_empty());
        assert_eq!(image.features.migration_phase, MigrationPhase::None);
        assert_eq!(image.producer_ids.next_producer_id, -1);
    }

    #[test]
    fn migrating_legacy_broker_marker() {
        let mut cluster = ClusterImage::default();
        cluster.brokers.insert(
            NodeId::new(1),
            BrokerRegistration {
                id: NodeId::new(1),
                migrating_legacy_broker: true,
                fenced: false,
            },
        );
        cluster.brokers.insert(
            NodeId::new(2),
            BrokerRegistration {
                id: NodeId::new(2),
                migrating_legacy_broker: false,
                fenced: false,
            },
        );

        assert!(cluster.has_migrating_legacy_broker(NodeId::new(1)));
        assert!(!cluster.has_migrating_legacy_broker(NodeId::new(2)));
        assert!(!cluster.has_migrating_legacy_broker(NodeId::new(3)));
    }

    #[test]
    fn config_map_for_missing_resource_is_empty() {
        let configs = ConfigsImage::default();
        assert!(configs.config_map(&ConfigResource::topic("orders")).is_empty());
    }
}
