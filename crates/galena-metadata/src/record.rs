//! Serialized metadata records.
//!
//! Records are the unit the migration replay feeds into the log: each
//! batch read out of the Keeper is translated into these records before
//! the quorum commits them.

use serde::{Deserialize, Serialize};

use galena_types::{AclId, MetadataVersion, NodeId, TopicId};

use crate::acl::StandardAcl;
use crate::image::{ClientQuotaEntity, ConfigResource, PartitionRegistration};

/// One metadata record as committed to the quorum log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetadataRecord {
    Topic {
        id: TopicId,
        name: String,
    },
    Partition {
        topic_id: TopicId,
        partition: u32,
        registration: PartitionRegistration,
    },
    Config {
        resource: ConfigResource,
        key: String,
        /// `None` is a tombstone clearing the key.
        value: Option<String>,
    },
    ClientQuota {
        entity: ClientQuotaEntity,
        key: String,
        /// `None` is a tombstone clearing the quota.
        value: Option<f64>,
    },
    ProducerIds {
        next_producer_id: i64,
    },
    AccessControl {
        id: AclId,
        acl: StandardAcl,
    },
    Feature {
        metadata_version: MetadataVersion,
    },
    BrokerRegistration {
        id: NodeId,
        migrating_legacy_broker: bool,
    },
}
