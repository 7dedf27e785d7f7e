//! Driver events.
//!
//! Everything that reaches the driver's fields travels through one of
//! these, dequeued one at a time by the worker. External callers only
//! enqueue; they never touch driver state directly.

use std::fmt;

use galena_metadata::{ImageManifest, LeaderAndEpoch, MetadataDelta, MetadataImage};

use crate::completion::Completer;
use crate::error::DriverError;
use crate::state::DriverState;

/// Callback invoked exactly once when a metadata-change event has been
/// absorbed: `Ok(())` on normal exit, the cause on failure.
pub type ChangeCallback = Box<dyn FnOnce(Result<(), DriverError>) + Send>;

/// A metadata publication routed to the driver.
pub struct MetadataChange {
    pub delta: MetadataDelta,
    pub image: MetadataImage,
    pub manifest: ImageManifest,
    pub done: ChangeCallback,
}

impl fmt::Debug for MetadataChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataChange")
            .field("manifest", &self.manifest)
            .field("highest", &self.image.highest)
            .finish_non_exhaustive()
    }
}

/// The event kinds the worker serializes.
pub enum DriverEvent {
    /// Periodic wakeup; advances the state machine when no external event
    /// has.
    Poll,
    /// Quorum leadership changed.
    LeaderChange(LeaderAndEpoch),
    /// A new image (and the delta that produced it) was published.
    MetadataChange(MetadataChange),
    /// Check whether all controller peers advertise migration support.
    WaitForControllerQuorum,
    /// Check whether all legacy brokers are visible in the image.
    WaitForBrokers,
    /// Attempt to claim Keeper controller leadership.
    BecomeController,
    /// Run the one-shot bulk replay.
    MigrateMetadata,
    /// Push the current image to legacy brokers.
    SendRpcs,
    /// Control-surface probe; answered after all previously enqueued
    /// events have run.
    InspectState(Completer<DriverState>),
}

impl DriverEvent {
    /// Stable name for logs and fault reports.
    pub fn name(&self) -> &'static str {
        match self {
            DriverEvent::Poll => "poll",
            DriverEvent::LeaderChange(_) => "leader-change",
            DriverEvent::MetadataChange(_) => "metadata-change",
            DriverEvent::WaitForControllerQuorum => "wait-for-controller-quorum",
            DriverEvent::WaitForBrokers => "wait-for-brokers",
            DriverEvent::BecomeController => "become-controller",
            DriverEvent::MigrateMetadata => "migrate-metadata",
            DriverEvent::SendRpcs => "send-rpcs",
            DriverEvent::InspectState(_) => "inspect-state",
        }
    }
}

impl fmt::Debug for DriverEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
