//! Driver lifecycle states and the legal-transition relation.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Lifecycle state of the migration driver.
///
/// The driver advances through these states one serialized event at a
/// time. `Inactive` is the universal fallback: every active state may
/// drop back to it on loss of quorum leadership or loss of Keeper
/// authority. Nothing ever transitions back to `Uninitialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DriverState {
    /// Startup; persisted migration progress has not been recovered yet.
    Uninitialized = 0,
    /// Not the quorum leader, or authority was relinquished.
    Inactive = 1,
    /// Quorum leader, waiting for every controller peer to advertise
    /// migration support and for the first metadata publication.
    WaitForControllerQuorum = 2,
    /// Waiting for all Keeper-registered brokers to appear in the
    /// cluster image with the migrating-legacy marker.
    WaitForBrokers = 3,
    /// Attempting to claim exclusive Keeper controller leadership.
    BecomeController = 4,
    /// One-shot bulk replay of Keeper metadata into the log.
    KeeperMigration = 5,
    /// Pushing the current image to legacy brokers over RPC.
    BrokerRpc = 6,
    /// Steady state: every log delta is mirrored into the Keeper.
    DualWrite = 7,
}

impl DriverState {
    /// True when moving from `self` to `to` is legal.
    ///
    /// Identity self-transitions are always allowed; they occur when an
    /// event re-runs while the state has not advanced.
    pub fn can_transition_to(self, to: DriverState) -> bool {
        use DriverState::{
            BecomeController, BrokerRpc, DualWrite, Inactive, KeeperMigration, Uninitialized,
            WaitForBrokers, WaitForControllerQuorum,
        };

        if self == to {
            return true;
        }
        matches!(
            (self, to),
            (Uninitialized, Inactive)
                | (Inactive, WaitForControllerQuorum)
                | (
                    WaitForControllerQuorum,
                    Inactive | BecomeController | WaitForBrokers
                )
                | (WaitForBrokers, Inactive | BecomeController)
                | (BecomeController, Inactive | KeeperMigration | BrokerRpc)
                | (KeeperMigration, Inactive | BrokerRpc)
                | (BrokerRpc, Inactive | DualWrite)
                | (DualWrite, Inactive)
        )
    }

    /// Discriminant for the cross-thread state snapshot.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Inverse of [`DriverState::as_u8`].
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Uninitialized),
            1 => Some(Self::Inactive),
            2 => Some(Self::WaitForControllerQuorum),
            3 => Some(Self::WaitForBrokers),
            4 => Some(Self::BecomeController),
            5 => Some(Self::KeeperMigration),
            6 => Some(Self::BrokerRpc),
            7 => Some(Self::DualWrite),
            _ => None,
        }
    }

    /// All states, for enumeration in tests.
    pub const ALL: [DriverState; 8] = [
        DriverState::Uninitialized,
        DriverState::Inactive,
        DriverState::WaitForControllerQuorum,
        DriverState::WaitForBrokers,
        DriverState::BecomeController,
        DriverState::KeeperMigration,
        DriverState::BrokerRpc,
        DriverState::DualWrite,
    ];
}

impl Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DriverState::Uninitialized => "uninitialized",
            DriverState::Inactive => "inactive",
            DriverState::WaitForControllerQuorum => "wait-for-controller-quorum",
            DriverState::WaitForBrokers => "wait-for-brokers",
            DriverState::BecomeController => "become-controller",
            DriverState::KeeperMigration => "keeper-migration",
            DriverState::BrokerRpc => "broker-rpc",
            DriverState::DualWrite => "dual-write",
        };
        f.write_str(s)
    }
}
