//! Persisted migration leadership record.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use galena_types::OffsetAndEpoch;

/// Epoch node version meaning "no claim is held".
pub const UNCLAIMED_EPOCH_NODE_VERSION: i32 = -1;

/// The driver's last-known authority over the Keeper, plus how much of
/// the log has already been mirrored back into it.
///
/// Values of this type are immutable; handlers replace the driver's copy
/// through `DriverCore::apply`, which is also the only point where the
/// Keeper recovery node is written. Every Keeper write is conditional on
/// `keeper_epoch_node_version`, so a stale record is self-evident: the
/// next conditional write fails and the driver drops its authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadershipState {
    /// Controller epoch this driver claimed in the Keeper.
    pub keeper_controller_epoch: i32,

    /// Version of the Keeper epoch node that witnessed the claim;
    /// [`UNCLAIMED_EPOCH_NODE_VERSION`] until a claim succeeds.
    pub keeper_epoch_node_version: i32,

    /// Quorum controller this record was last updated for.
    pub quorum_controller_id: i32,
    pub quorum_controller_epoch: i32,

    /// Log position already mirrored into the Keeper by bulk replay.
    pub replayed_offset: i64,
    pub replayed_epoch: i32,

    /// True once bulk replay finished and the log acknowledged it.
    pub migration_complete: bool,
}

impl LeadershipState {
    /// The sentinel before anything was recovered from the Keeper.
    pub fn empty() -> Self {
        Self {
            keeper_controller_epoch: -1,
            keeper_epoch_node_version: UNCLAIMED_EPOCH_NODE_VERSION,
            quorum_controller_id: -1,
            quorum_controller_epoch: -1,
            replayed_offset: -1,
            replayed_epoch: -1,
            migration_complete: false,
        }
    }

    /// True while a Keeper controller claim is held.
    pub fn is_claimed(&self) -> bool {
        self.keeper_epoch_node_version >= 0
    }

    /// The replay watermark as a log position.
    pub fn replayed(&self) -> OffsetAndEpoch {
        OffsetAndEpoch::new(self.replayed_offset, self.replayed_epoch)
    }

    pub fn with_new_quorum_controller(&self, id: i32, epoch: i32) -> Self {
        Self {
            quorum_controller_id: id,
            quorum_controller_epoch: epoch,
            ..self.clone()
        }
    }

    pub fn with_keeper_controller(&self, epoch: i32, node_version: i32) -> Self {
        Self {
            keeper_controller_epoch: epoch,
            keeper_epoch_node_version: node_version,
            ..self.clone()
        }
    }

    pub fn with_epoch_node_version(&self, node_version: i32) -> Self {
        Self {
            keeper_epoch_node_version: node_version,
            ..self.clone()
        }
    }

    pub fn with_replayed_offset_and_epoch(&self, offset: i64, epoch: i32) -> Self {
        Self {
            replayed_offset: offset,
            replayed_epoch: epoch,
            ..self.clone()
        }
    }

    pub fn with_migration_complete(&self) -> Self {
        Self {
            migration_complete: true,
            ..self.clone()
        }
    }
}

impl Default for LeadershipState {
    fn default() -> Self {
        Self::empty()
    }
}

impl Display for LeadershipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "keeper epoch={} (node v{}), quorum controller={}@{}, replayed={}, complete={}",
            self.keeper_controller_epoch,
            self.keeper_epoch_node_version,
            self.quorum_controller_id,
            self.quorum_controller_epoch,
            self.replayed(),
            self.migration_complete,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_unclaimed() {
        let state = LeadershipState::empty();
        assert!(!state.is_claimed());
        assert!(!state.migration_complete);
        assert_eq!(state.replayed(), OffsetAndEpoch::new(-1, -1));
    }

    #[test]
    fn builders_replace_only_their_fields() {
        let state = LeadershipState::empty()
            .with_new_quorum_controller(3000, 7)
            .with_keeper_controller(4, 12)
            .with_replayed_offset_and_epoch(100, 5)
            .with_migration_complete();

        assert_eq!(state.quorum_controller_id, 3000);
        assert_eq!(state.quorum_controller_epoch, 7);
        assert_eq!(state.keeper_controller_epoch, 4);
        assert!(state.is_claimed());
        assert_eq!(state.replayed(), OffsetAndEpoch::new(100, 5));
        assert!(state.migration_complete);
    }

    #[test]
    fn claim_failure_sentinel_round_trips() {
        let state = LeadershipState::empty()
            .with_keeper_controller(4, 12)
            .with_epoch_node_version(UNCLAIMED_EPOCH_NODE_VERSION);
        assert!(!state.is_claimed());
        assert_eq!(state.keeper_controller_epoch, 4);
    }
}
