//! Dual-write mirroring of metadata deltas into the Keeper.
//!
//! While the driver holds Keeper controller authority, every published
//! delta is mirrored back so legacy observers keep a consistent view.
//! The five domains are written in a fixed order — topics, configs,
//! client quotas, producer ids, ACLs — and each write runs through
//! `DriverCore::apply` so the epoch node version is refreshed between
//! writes.
//!
//! A write that fails mid-delta leaves the Keeper partially updated.
//! That is accepted: the log is the source of truth, a version conflict
//! means authority was lost anyway, and the next published image resends
//! whatever did not land.

use std::collections::BTreeMap;
use std::sync::Arc;

use galena_metadata::{
    AccessControlEntry, MetadataDelta, MetadataImage, ResourcePattern,
};

use crate::driver::DriverCore;
use crate::error::{DriverError, Result};
use crate::event::MetadataChange;
use crate::state::DriverState;

impl DriverCore {
    /// Absorbs a publication and, in dual-write, mirrors it.
    ///
    /// The image and `first_publish` are updated regardless of state; the
    /// Keeper is only touched in [`DriverState::DualWrite`]. The event's
    /// completion callback fires exactly once either way.
    pub(crate) fn on_metadata_change(&mut self, change: MetadataChange) -> Result<()> {
        let MetadataChange {
            delta,
            image,
            manifest,
            done,
        } = change;

        self.first_publish = true;
        let prev_image = std::mem::replace(&mut self.image, image);
        tracing::trace!(
            kind = ?manifest.kind,
            position = %self.image.highest,
            "absorbed metadata publication"
        );

        match self.mirror_delta(&prev_image, &delta) {
            Ok(()) => {
                done(Ok(()));
                Ok(())
            }
            Err(error) => {
                done(Err(error.clone()));
                Err(error)
            }
        }
    }

    fn mirror_delta(&mut self, prev_image: &MetadataImage, delta: &MetadataDelta) -> Result<()> {
        if self.state != DriverState::DualWrite {
            return Ok(());
        }

        if delta.features.is_some() {
            self.propagator
                .set_metadata_version(self.image.features.metadata_version);
        }

        if self.image.highest_offset_and_epoch() <= self.leadership.replayed() {
            // everything up to the watermark went in during bulk replay
            tracing::info!(
                position = %self.image.highest,
                replayed = %self.leadership.replayed(),
                "delta already mirrored by the bulk replay, skipping keeper writes"
            );
        } else {
            self.mirror_topics(delta)?;
            self.mirror_configs(delta)?;
            self.mirror_client_quotas(delta)?;
            self.mirror_producer_ids(delta)?;
            self.mirror_acls(prev_image, delta)?;
        }

        if delta.topics.is_some() || delta.cluster.is_some() {
            self.propagator.send_rpcs_from_delta(
                delta,
                &self.image,
                self.leadership.keeper_controller_epoch,
            );
        }
        Ok(())
    }

    fn mirror_topics(&mut self, delta: &MetadataDelta) -> Result<()> {
        let Some(topics) = &delta.topics else {
            return Ok(());
        };
        for topic in &topics.changed {
            let client = Arc::clone(&self.client);
            if topics.is_created(topic.id) {
                self.apply("create-topic", |state| {
                    client.create_topic(&topic.name, topic.id, &topic.partition_changes, state)
                })?;
            } else {
                let changes = BTreeMap::from([(topic.name.clone(), topic.partition_changes.clone())]);
                self.apply("update-topic-partitions", |state| {
                    client.update_topic_partitions(&changes, state)
                })?;
            }
        }
        Ok(())
    }

    fn mirror_configs(&mut self, delta: &MetadataDelta) -> Result<()> {
        let Some(configs) = &delta.configs else {
            return Ok(());
        };
        for resource in &configs.changed {
            // the Keeper stores all entries for a resource in one node, so
            // the full map comes from the new image
            let full_map = self.image.configs.config_map(resource);
            let client = Arc::clone(&self.client);
            self.apply("write-configs", |state| {
                client.write_configs(resource, &full_map, state)
            })?;
        }
        Ok(())
    }

    fn mirror_client_quotas(&mut self, delta: &MetadataDelta) -> Result<()> {
        let Some(quotas) = &delta.client_quotas else {
            return Ok(());
        };
        for entity in &quotas.changed {
            let full_map = self.image.client_quotas.quota_map(entity);
            let client = Arc::clone(&self.client);
            self.apply("write-client-quotas", |state| {
                client.write_client_quotas(entity, &full_map, state)
            })?;
        }
        Ok(())
    }

    fn mirror_producer_ids(&mut self, delta: &MetadataDelta) -> Result<()> {
        if delta.producer_ids.is_none() {
            return Ok(());
        }
        let next = self.image.producer_ids.next_producer_id;
        let client = Arc::clone(&self.client);
        self.apply("write-producer-id", |state| {
            client.write_producer_id(next, state)
        })
    }

    /// Mirrors ACL changes: all deletions first, then all additions.
    ///
    /// A deletion names only the ACL id; the pattern and entry come from
    /// the previous image. Deleting an id the previous image never held
    /// is fatal.
    fn mirror_acls(&mut self, prev_image: &MetadataImage, delta: &MetadataDelta) -> Result<()> {
        let Some(acls) = &delta.acls else {
            return Ok(());
        };

        let mut deleted: BTreeMap<ResourcePattern, Vec<AccessControlEntry>> = BTreeMap::new();
        let mut added: BTreeMap<ResourcePattern, Vec<AccessControlEntry>> = BTreeMap::new();
        for (id, change) in &acls.changed {
            match change {
                Some(acl) => added
                    .entry(acl.pattern.clone())
                    .or_default()
                    .push(acl.entry.clone()),
                None => {
                    let prev = prev_image
                        .acls
                        .acls
                        .get(id)
                        .ok_or(DriverError::UnknownAclDeletion { id: *id })?;
                    deleted
                        .entry(prev.pattern.clone())
                        .or_default()
                        .push(prev.entry.clone());
                }
            }
        }

        for (pattern, entries) in &deleted {
            let client = Arc::clone(&self.client);
            self.apply("remove-deleted-acls", |state| {
                client.remove_deleted_acls(pattern, entries, state)
            })?;
        }
        for (pattern, entries) in &added {
            let client = Arc::clone(&self.client);
            self.apply("write-added-acls", |state| {
                client.write_added_acls(pattern, entries, state)
            })?;
        }
        Ok(())
    }
}
