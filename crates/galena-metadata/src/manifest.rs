//! Publication manifests.

use serde::{Deserialize, Serialize};

use galena_types::OffsetAndEpoch;

/// Whether a publication replays a full snapshot or an incremental delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManifestKind {
    Snapshot,
    Delta,
}

/// Accompanies every image publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageManifest {
    /// Position of the last record contained in the publication.
    pub provenance: OffsetAndEpoch,
    pub kind: ManifestKind,
}

impl ImageManifest {
    pub fn snapshot(provenance: OffsetAndEpoch) -> Self {
        Self {
            provenance,
            kind: ManifestKind::Snapshot,
        }
    }

    pub fn delta(provenance: OffsetAndEpoch) -> Self {
        Self {
            provenance,
            kind: ManifestKind::Delta,
        }
    }

    pub fn is_snapshot(&self) -> bool {
        self.kind == ManifestKind::Snapshot
    }
}
