//! Keeper store client contract.
//!
//! The migration client owns every Keeper round-trip: reading and writing
//! the persisted recovery node, the conditional controller claim, the
//! bulk metadata read, and the per-domain dual-write operations. The
//! driver never talks to the Keeper except through this trait.
//!
//! All write operations are conditional on the epoch node version cached
//! in the passed [`LeadershipState`] and return a refreshed state on
//! success. A conditional failure surfaces as
//! [`KeeperClientError::Transient`]; the driver treats it as authoritative
//! evidence of lost leadership and resynchronizes through the next
//! leader-change event.

use std::collections::{BTreeMap, BTreeSet};

use galena_metadata::{
    AccessControlEntry, ClientQuotaEntity, ConfigResource, MetadataRecord,
    PartitionRegistration, ResourcePattern,
};
use galena_types::{NodeId, TopicId};

use crate::error::{DriverError, KeeperClientError};
use crate::leadership::LeadershipState;

/// A batch of records read out of the Keeper during bulk replay.
///
/// The client groups records so that an entity and its tombstones land in
/// the same batch or in order across batches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBatch {
    pub records: Vec<MetadataRecord>,
}

impl RecordBatch {
    pub fn new(records: Vec<MetadataRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Sink receiving each replay batch. Returning an error stops the
/// enumeration; the client surfaces it unchanged.
pub type BatchSink<'a> = &'a mut dyn FnMut(RecordBatch) -> Result<(), DriverError>;

/// Sink receiving each broker id found in the Keeper during replay.
pub type BrokerSink<'a> = &'a mut dyn FnMut(NodeId);

/// The Keeper migration client.
pub trait KeeperMigrationClient: Send + Sync {
    /// Reads the persisted migration-recovery node, creating it from
    /// `initial` if absent.
    fn get_or_create_migration_recovery_state(
        &self,
        initial: &LeadershipState,
    ) -> Result<LeadershipState, KeeperClientError>;

    /// Persists `state` into the recovery node.
    fn set_migration_recovery_state(
        &self,
        state: &LeadershipState,
    ) -> Result<LeadershipState, KeeperClientError>;

    /// Attempts to claim exclusive Keeper controller leadership. When
    /// another controller holds the epoch node the returned state carries
    /// an unclaimed node version rather than an error.
    fn claim_controller_leadership(
        &self,
        state: &LeadershipState,
    ) -> Result<LeadershipState, KeeperClientError>;

    /// Broker ids currently registered in the Keeper.
    fn read_broker_ids(&self) -> Result<BTreeSet<NodeId>, KeeperClientError>;

    /// Broker ids appearing in Keeper topic assignments. A broker can be
    /// assigned replicas while its registration is gone.
    fn read_broker_ids_from_topic_assignments(&self)
        -> Result<BTreeSet<NodeId>, KeeperClientError>;

    /// Enumerates all Keeper metadata as record batches, plus every broker
    /// id encountered.
    fn read_all_metadata(
        &self,
        batch_sink: BatchSink<'_>,
        broker_sink: BrokerSink<'_>,
    ) -> Result<(), DriverError>;

    // ------------------------------------------------------------------
    // Dual-write operations
    // ------------------------------------------------------------------

    fn create_topic(
        &self,
        name: &str,
        id: TopicId,
        partitions: &BTreeMap<u32, PartitionRegistration>,
        state: &LeadershipState,
    ) -> Result<LeadershipState, KeeperClientError>;

    fn update_topic_partitions(
        &self,
        changes: &BTreeMap<String, BTreeMap<u32, PartitionRegistration>>,
        state: &LeadershipState,
    ) -> Result<LeadershipState, KeeperClientError>;

    /// Writes the full config map for one resource. The Keeper keeps all
    /// entries for a resource in a single node, so partial maps are
    /// never written.
    fn write_configs(
        &self,
        resource: &ConfigResource,
        configs: &BTreeMap<String, String>,
        state: &LeadershipState,
    ) -> Result<LeadershipState, KeeperClientError>;

    /// Writes the full quota map for one entity, same single-node rule as
    /// configs.
    fn write_client_quotas(
        &self,
        entity: &ClientQuotaEntity,
        quotas: &BTreeMap<String, f64>,
        state: &LeadershipState,
    ) -> Result<LeadershipState, KeeperClientError>;

    fn write_producer_id(
        &self,
        next_producer_id: i64,
        state: &LeadershipState,
    ) -> Result<LeadershipState, KeeperClientError>;

    fn remove_deleted_acls(
        &self,
        pattern: &ResourcePattern,
        entries: &[AccessControlEntry],
        state: &LeadershipState,
    ) -> Result<LeadershipState, KeeperClientError>;

    fn write_added_acls(
        &self,
        pattern: &ResourcePattern,
        entries: &[AccessControlEntry],
        state: &LeadershipState,
    ) -> Result<LeadershipState, KeeperClientError>;
}
