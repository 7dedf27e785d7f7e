//! Bulk replay of Keeper metadata into the quorum log.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::client::RecordBatch;
use crate::completion::{Completion, WaitError};
use crate::driver::DriverCore;
use crate::error::{DriverError, Result};
use crate::state::DriverState;

/// Blocks on a log commit future with the configured deadline.
fn wait_for_commit<T>(result: Completion<T>, timeout: Duration, op: &str) -> Result<T> {
    result.wait_for(timeout).map_err(|cause| match cause {
        WaitError::TimedOut => DriverError::CommitTimeout { op: op.into() },
        WaitError::Abandoned => DriverError::CommitAbandoned { op: op.into() },
    })
}

impl DriverCore {
    /// One-shot bulk replay. Reads everything the Keeper holds, feeds it
    /// into the log batch by batch, then persists the replay watermark.
    /// Any failure aborts the in-flight replay; a transient one is retried
    /// from scratch on the next poll.
    pub(crate) fn on_migrate_metadata(&mut self) -> Result<()> {
        if self.state != DriverState::KeeperMigration {
            return Ok(());
        }

        if let Err(error) = self.replay_keeper_metadata() {
            self.consumer.abort_migration();
            return Err(error);
        }
        self.transition(DriverState::BrokerRpc)
    }

    fn replay_keeper_metadata(&mut self) -> Result<()> {
        let consumer = Arc::clone(&self.consumer);
        let timeout = self.config.commit_timeout();
        let started = Instant::now();
        let mut records = 0usize;
        let mut brokers = 0usize;

        consumer.begin_migration();
        self.client.read_all_metadata(
            &mut |batch: RecordBatch| {
                let size = batch.len();
                wait_for_commit(consumer.accept_batch(batch), timeout, "batch commit")?;
                records += size;
                Ok(())
            },
            &mut |_broker| brokers += 1,
        )?;

        let position = wait_for_commit(
            consumer.complete_migration(),
            timeout,
            "migration completion",
        )?;

        let client = Arc::clone(&self.client);
        self.apply("finish-migration", |state| {
            client.set_migration_recovery_state(
                &state
                    .with_replayed_offset_and_epoch(position.offset, position.epoch)
                    .with_migration_complete(),
            )
        })?;

        tracing::info!(
            records,
            brokers,
            position = %position,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "finished migrating keeper metadata into the log"
        );
        Ok(())
    }
}
