//! RPC propagation to legacy brokers.

use galena_metadata::{MetadataDelta, MetadataImage};
use galena_types::MetadataVersion;

/// Sends legacy-protocol RPCs derived from quorum metadata.
///
/// Legacy brokers do not consume the log; during migration the active
/// driver pushes cluster state to them the way the old controller did.
pub trait RpcPropagator: Send + Sync {
    /// Pushes the metadata format version legacy brokers must assume.
    fn set_metadata_version(&self, version: MetadataVersion);

    /// Full-state RPCs derived from `image`, stamped with the Keeper
    /// controller epoch so brokers accept them.
    fn send_rpcs_from_image(&self, image: &MetadataImage, keeper_controller_epoch: i32);

    /// Incremental RPCs derived from `delta` against `image`.
    fn send_rpcs_from_delta(
        &self,
        delta: &MetadataDelta,
        image: &MetadataImage,
        keeper_controller_epoch: i32,
    );
}
