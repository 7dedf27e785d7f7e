//! Quorum leadership as observed by log consumers.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use galena_types::NodeId;

/// The quorum leader (if any) and its epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderAndEpoch {
    pub leader_id: Option<NodeId>,
    pub epoch: i32,
}

impl LeaderAndEpoch {
    /// The sentinel before any leader was observed.
    pub fn unknown() -> Self {
        Self {
            leader_id: None,
            epoch: -1,
        }
    }

    pub fn new(leader_id: NodeId, epoch: i32) -> Self {
        Self {
            leader_id: Some(leader_id),
            epoch,
        }
    }

    /// True when `node` is the current leader.
    pub fn is_leader(&self, node: NodeId) -> bool {
        self.leader_id == Some(node)
    }
}

impl Default for LeaderAndEpoch {
    fn default() -> Self {
        Self::unknown()
    }
}

impl Display for LeaderAndEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.leader_id {
            Some(id) => write!(f, "leader={id} epoch={}", self.epoch),
            None => write!(f, "leader=none epoch={}", self.epoch),
        }
    }
}
