//! Log ingestion contract for migration batches.

use galena_types::OffsetAndEpoch;

use crate::client::RecordBatch;
use crate::completion::Completion;

/// Ingests replayed Keeper metadata into the quorum log.
///
/// A replay is bracketed by `begin_migration` and either
/// `complete_migration` or `abort_migration`. Batches commit
/// asynchronously; the returned completions resolve once the quorum has
/// committed the batch.
pub trait RecordConsumer: Send + Sync {
    /// Marks the start of a bulk replay.
    fn begin_migration(&self);

    /// Submits one batch; resolves when the log commits it.
    fn accept_batch(&self, batch: RecordBatch) -> Completion<()>;

    /// Seals the replay; resolves to the position of the final record.
    fn complete_migration(&self) -> Completion<OffsetAndEpoch>;

    /// Discards an in-flight replay after a failure.
    fn abort_migration(&self);
}
