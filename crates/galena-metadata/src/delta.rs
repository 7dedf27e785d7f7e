//! Incremental metadata change sets.
//!
//! A [`MetadataDelta`] names the keys that changed between two images, in
//! the order the log changed them. Consumers that need the resulting value
//! look it up in the image that accompanied the delta; deltas carry only
//! enough to know *what* changed.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use galena_types::{AclId, MetadataVersion, NodeId, TopicId};

use crate::acl::StandardAcl;
use crate::image::{
    ClientQuotaEntity, ConfigResource, MigrationPhase, PartitionRegistration,
};

/// Feature-level changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FeaturesDelta {
    pub metadata_version: Option<MetadataVersion>,
    pub migration_phase: Option<MigrationPhase>,
}

/// Broker registrations that changed (registered, fenced, unregistered).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ClusterDelta {
    pub changed: Vec<NodeId>,
}

/// Changes to one topic: the partitions that were created or reassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDelta {
    pub id: TopicId,
    pub name: String,
    pub partition_changes: BTreeMap<u32, PartitionRegistration>,
}

/// Topic changes in log order, plus the set of ids created in this delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TopicsDelta {
    pub changed: Vec<TopicDelta>,
    pub created: BTreeSet<TopicId>,
}

impl TopicsDelta {
    /// True when `id` first appeared in this delta.
    pub fn is_created(&self, id: TopicId) -> bool {
        self.created.contains(&id)
    }
}

/// Config resources whose maps changed, in log order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConfigsDelta {
    pub changed: Vec<ConfigResource>,
}

/// Quota entities whose maps changed, in log order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ClientQuotasDelta {
    pub changed: Vec<ClientQuotaEntity>,
}

/// Producer-id block advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerIdsDelta {
    pub next_producer_id: i64,
}

/// ACL bindings added (`Some`) or deleted (`None`), in log order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AclsDelta {
    pub changed: Vec<(AclId, Option<StandardAcl>)>,
}

/// Everything that changed between two images.
///
/// `None` means the domain did not change at all; an empty inner change
/// list never appears in a published delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetadataDelta {
    pub features: Option<FeaturesDelta>,
    pub cluster: Option<ClusterDelta>,
    pub topics: Option<TopicsDelta>,
    pub configs: Option<ConfigsDelta>,
    pub client_quotas: Option<ClientQuotasDelta>,
    pub producer_ids: Option<ProducerIdsDelta>,
    pub acls: Option<AclsDelta>,
}

impl MetadataDelta {
    pub fn is_empty(&self) -> bool {
        self.features.is_none()
            && self.cluster.is_none()
            && self.topics.is_none()
            && self.configs.is_none()
            && self.client_quotas.is_none()
            && self.producer_ids.is_none()
            && self.acls.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_delta_is_empty() {
        assert!(MetadataDelta::default().is_empty());
    }

    #[test]
    fn created_topics_are_tracked() {
        let id = TopicId::random();
        let mut delta = TopicsDelta::default();
        delta.created.insert(id);
        assert!(delta.is_created(id));
        assert!(!delta.is_created(TopicId::random()));
    }
}
