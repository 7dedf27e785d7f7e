//! # galena-metadata: Metadata image and delta model
//!
//! The quorum log materializes cluster metadata as a sequence of immutable
//! [`MetadataImage`] snapshots. Each publication carries the new image, the
//! incremental [`MetadataDelta`] that produced it, and an [`ImageManifest`]
//! saying whether the publication was a full snapshot or a delta replay.
//!
//! Images cover seven domains: features, cluster membership, topics,
//! configs, client quotas, producer ids, and ACLs. Every domain has an
//! image half (the full materialized state) and a delta half (the keys
//! that changed, in the order the log changed them).

pub mod acl;
pub mod delta;
pub mod image;
pub mod leader;
pub mod manifest;
pub mod record;

pub use acl::{
    AccessControlEntry, AclOperation, AclPermissionType, PatternType, ResourcePattern,
    ResourceType, StandardAcl,
};
pub use delta::{
    AclsDelta, ClientQuotasDelta, ClusterDelta, ConfigsDelta, FeaturesDelta, MetadataDelta,
    ProducerIdsDelta, TopicDelta, TopicsDelta,
};
pub use image::{
    AclsImage, BrokerRegistration, ClientQuotaEntity, ClientQuotasImage, ClusterImage,
    ConfigResource, ConfigResourceKind, ConfigsImage, FeaturesImage, MetadataImage,
    MigrationPhase, PartitionRegistration, ProducerIdsImage, TopicImage, TopicsImage,
};
pub use leader::LeaderAndEpoch;
pub use manifest::{ImageManifest, ManifestKind};
pub use record::MetadataRecord;
