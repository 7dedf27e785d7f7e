//! The publisher surface the metadata loader drives.

use galena_metadata::{ImageManifest, LeaderAndEpoch, MetadataDelta, MetadataImage};

/// A consumer of metadata publications.
///
/// The migration driver implements this through its handle; the loader
/// calls these from its own threads and every call is turned into a
/// queued event. The driver registers itself only after recovery has
/// finished, so no publication can arrive before the persisted migration
/// progress is known.
pub trait MetadataPublisher: Send {
    /// Stable name for registration and logs.
    fn name(&self) -> String;

    /// Quorum leadership changed.
    fn on_leader_change(&self, leader: LeaderAndEpoch);

    /// A new image was published. The manifest says whether it came from
    /// a snapshot or a delta replay.
    fn on_metadata_update(
        &self,
        delta: MetadataDelta,
        image: MetadataImage,
        manifest: ImageManifest,
    );

    /// The loader is shutting the publisher down.
    fn close(&self);
}
