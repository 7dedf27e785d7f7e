//! The migration driver.
//!
//! One driver instance runs next to every quorum controller replica;
//! only the instance co-located with the current quorum leader does
//! migration work. The driver is a serial event-driven state machine:
//! leadership changes, metadata publications, and a periodic poll all
//! become queued events, and a single worker thread runs them one at a
//! time against the fields in [`DriverCore`].
//!
//! # Lifecycle
//!
//! ```text
//! uninitialized ──► inactive ──► wait-for-controller-quorum ──► wait-for-brokers
//!                      ▲                    │                        │
//!                      │                    ▼                        ▼
//!                      └──────── become-controller ◄─────────────────┘
//!                                     │
//!                                     ▼
//!                      keeper-migration ──► broker-rpc ──► dual-write
//! ```
//!
//! Every active state can drop back to `inactive` on loss of quorum
//! leadership or loss of Keeper authority.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, JoinHandle};

use galena_metadata::{ImageManifest, LeaderAndEpoch, MetadataDelta, MetadataImage, MigrationPhase};
use galena_types::NodeId;

use crate::client::KeeperMigrationClient;
use crate::completion::{Completion, completion};
use crate::config::DriverConfig;
use crate::consumer::RecordConsumer;
use crate::error::{DriverError, KeeperClientError, Result};
use crate::event::{ChangeCallback, DriverEvent, MetadataChange};
use crate::fault::FaultHandler;
use crate::leadership::LeadershipState;
use crate::propagator::RpcPropagator;
use crate::publisher::MetadataPublisher;
use crate::queue::{EventQueue, SubmitResult};
use crate::quorum::QuorumReadiness;
use crate::state::DriverState;

/// Invoked once, at the end of recovery, to register the driver as a
/// metadata publisher. Publications must not arrive earlier.
pub type InitialLoadFn = Box<dyn FnOnce() + Send>;

/// External collaborators the driver drives.
pub struct Collaborators {
    pub client: Arc<dyn KeeperMigrationClient>,
    pub consumer: Arc<dyn RecordConsumer>,
    pub propagator: Arc<dyn RpcPropagator>,
    pub readiness: Arc<dyn QuorumReadiness>,
    pub faults: Arc<dyn FaultHandler>,
}

// ============================================================================
// Driver Core
// ============================================================================

/// Fields owned by the worker thread.
///
/// All mutation happens in event handlers dispatched from the queue, one
/// event at a time. Handlers call collaborators synchronously and may
/// block; further events simply queue behind the running one.
pub(crate) struct DriverCore {
    pub(crate) node_id: NodeId,
    pub(crate) config: DriverConfig,

    pub(crate) state: DriverState,
    pub(crate) leadership: LeadershipState,
    pub(crate) image: MetadataImage,
    pub(crate) leader: LeaderAndEpoch,
    pub(crate) first_publish: bool,

    pub(crate) client: Arc<dyn KeeperMigrationClient>,
    pub(crate) consumer: Arc<dyn RecordConsumer>,
    pub(crate) propagator: Arc<dyn RpcPropagator>,
    pub(crate) readiness: Arc<dyn QuorumReadiness>,
    pub(crate) faults: Arc<dyn FaultHandler>,

    pub(crate) queue: Arc<EventQueue<DriverEvent>>,
    pub(crate) observed_state: Arc<AtomicU8>,
    pub(crate) initial_load: Option<InitialLoadFn>,
}

impl DriverCore {
    pub(crate) fn new(
        node_id: NodeId,
        config: DriverConfig,
        collaborators: Collaborators,
        queue: Arc<EventQueue<DriverEvent>>,
        observed_state: Arc<AtomicU8>,
        initial_load: InitialLoadFn,
    ) -> Self {
        Self {
            node_id,
            config,
            state: DriverState::Uninitialized,
            leadership: LeadershipState::empty(),
            image: MetadataImage::default(),
            leader: LeaderAndEpoch::unknown(),
            first_publish: false,
            client: collaborators.client,
            consumer: collaborators.consumer,
            propagator: collaborators.propagator,
            readiness: collaborators.readiness,
            faults: collaborators.faults,
            queue,
            observed_state,
            initial_load: Some(initial_load),
        }
    }

    /// Worker loop: runs until the queue is closed and drained.
    pub(crate) fn run(mut self) {
        tracing::debug!(node = %self.node_id, "migration driver worker started");
        while let Some(event) = self.queue.next() {
            self.dispatch(event);
        }
        tracing::debug!(node = %self.node_id, "migration driver worker stopped");
    }

    /// Runs one event and routes any failure through the classifier.
    ///
    /// The poll event re-schedules itself unconditionally, errors
    /// included; it is the retry engine for everything transient.
    pub(crate) fn dispatch(&mut self, event: DriverEvent) {
        let name = event.name();
        let is_poll = matches!(event, DriverEvent::Poll);

        let result = match event {
            DriverEvent::Poll => self.on_poll(),
            DriverEvent::LeaderChange(leader) => self.on_leader_change(leader),
            DriverEvent::MetadataChange(change) => self.on_metadata_change(change),
            DriverEvent::WaitForControllerQuorum => self.on_wait_for_controller_quorum(),
            DriverEvent::WaitForBrokers => self.on_wait_for_brokers(),
            DriverEvent::BecomeController => self.on_become_controller(),
            DriverEvent::MigrateMetadata => self.on_migrate_metadata(),
            DriverEvent::SendRpcs => self.on_send_rpcs(),
            DriverEvent::InspectState(completer) => {
                completer.complete(self.state);
                Ok(())
            }
        };

        if let Err(error) = result {
            self.classify_failure(name, &error);
        }
        if is_poll {
            let _ = self
                .queue
                .schedule(self.config.poll_interval(), DriverEvent::Poll);
        }
    }

    /// Exception policy shared by all handlers.
    fn classify_failure(&mut self, event: &str, error: &DriverError) {
        match error {
            DriverError::Client(KeeperClientError::Auth(_)) => {
                self.faults
                    .handle_fault(&format!("keeper authentication failure in {event}"), error);
            }
            DriverError::Client(KeeperClientError::Transient(_)) => {
                tracing::info!(event, %error, "transient keeper error, retrying on next poll");
            }
            DriverError::QueueClosed => {}
            _ => {
                self.faults
                    .handle_fault(&format!("unhandled fault in {event}"), error);
            }
        }
    }

    /// Checked state transition. An illegal transition is a programming
    /// error and surfaces through the classifier as an unhandled fault.
    pub(crate) fn transition(&mut self, to: DriverState) -> Result<()> {
        if !self.state.can_transition_to(to) {
            return Err(DriverError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        if self.state != to {
            tracing::debug!(from = %self.state, to = %to, "driver state transition");
        }
        self.state = to;
        self.observed_state.store(to.as_u8(), Ordering::Release);
        Ok(())
    }

    /// Replaces `leadership` with `f(leadership)` in one step.
    ///
    /// This is the single point through which Keeper writes flow: `f`
    /// typically calls the migration client and returns the state carrying
    /// the refreshed epoch node version.
    pub(crate) fn apply<F>(&mut self, op: &str, f: F) -> Result<()>
    where
        F: FnOnce(&LeadershipState) -> std::result::Result<LeadershipState, KeeperClientError>,
    {
        let after = f(&self.leadership)?;
        tracing::trace!(op, before = %self.leadership, after = %after, "leadership state updated");
        self.leadership = after;
        Ok(())
    }

    fn enqueue(&self, event: DriverEvent) -> Result<()> {
        match self.queue.append(event) {
            SubmitResult::Accepted => Ok(()),
            SubmitResult::Closed(_) => Err(DriverError::QueueClosed),
        }
    }

    // ========================================================================
    // Poll
    // ========================================================================

    /// Advances the state machine when no external event has. Each active
    /// state gets its work enqueued as a dedicated event so that external
    /// events can interleave.
    fn on_poll(&mut self) -> Result<()> {
        match self.state {
            DriverState::Uninitialized => self.recover(),
            DriverState::Inactive | DriverState::DualWrite => Ok(()),
            DriverState::WaitForControllerQuorum => {
                self.enqueue(DriverEvent::WaitForControllerQuorum)
            }
            DriverState::WaitForBrokers => self.enqueue(DriverEvent::WaitForBrokers),
            DriverState::BecomeController => self.enqueue(DriverEvent::BecomeController),
            DriverState::KeeperMigration => self.enqueue(DriverEvent::MigrateMetadata),
            DriverState::BrokerRpc => self.enqueue(DriverEvent::SendRpcs),
        }
    }

    // ========================================================================
    // Recovery
    // ========================================================================

    /// One-shot recovery of persisted migration progress. Runs on the
    /// first poll; the driver registers as a metadata publisher only after
    /// this succeeds, so no publication precedes recovery.
    fn recover(&mut self) -> Result<()> {
        let client = Arc::clone(&self.client);
        self.apply("recover", |state| {
            client.get_or_create_migration_recovery_state(state)
        })?;
        tracing::info!(leadership = %self.leadership, "recovered migration state from the keeper");
        if let Some(register) = self.initial_load.take() {
            register();
        }
        self.transition(DriverState::Inactive)
    }

    // ========================================================================
    // Leader Change
    // ========================================================================

    fn on_leader_change(&mut self, leader: LeaderAndEpoch) -> Result<()> {
        self.leader = leader;
        let id = leader.leader_id.map_or(-1, NodeId::as_i32);
        let epoch = leader.epoch;
        self.apply("leader-change", |state| {
            Ok(state.with_new_quorum_controller(id, epoch))
        })?;

        if leader.is_leader(self.node_id) {
            tracing::info!(%leader, "became quorum leader, evaluating migration");
            self.transition(DriverState::WaitForControllerQuorum)
        } else {
            tracing::info!(%leader, "not the quorum leader");
            self.transition(DriverState::Inactive)
        }
    }

    // ========================================================================
    // Controller Quorum Wait
    // ========================================================================

    fn on_wait_for_controller_quorum(&mut self) -> Result<()> {
        if self.state != DriverState::WaitForControllerQuorum {
            return Ok(());
        }
        if !self.first_publish {
            tracing::trace!("waiting for the first metadata publication");
            return Ok(());
        }

        match self.image.features.migration_phase {
            MigrationPhase::None => {
                tracing::error!("cluster is not configured for migration, going inactive");
                self.transition(DriverState::Inactive)
            }
            MigrationPhase::PreMigration => match self.readiness.reason_not_ready() {
                None => self.transition(DriverState::WaitForBrokers),
                Some(reason) => {
                    tracing::info!(
                        reason = %reason,
                        leader = %self.leader,
                        "controller quorum not ready for migration"
                    );
                    Ok(())
                }
            },
            MigrationPhase::Migration => {
                if self.leadership.migration_complete {
                    // controller restart after replay already finished
                    self.transition(DriverState::BecomeController)
                } else {
                    tracing::error!(
                        "log reports the migration phase but the keeper recovery state \
                         is incomplete, going inactive"
                    );
                    self.transition(DriverState::Inactive)
                }
            }
            MigrationPhase::PostMigration => {
                tracing::error!("migration already finalized, the driver should not be active");
                self.transition(DriverState::Inactive)
            }
        }
    }

    // ========================================================================
    // Broker Wait
    // ========================================================================

    fn on_wait_for_brokers(&mut self) -> Result<()> {
        if self.state != DriverState::WaitForBrokers {
            return Ok(());
        }
        if !self.first_publish || self.image.cluster.is_empty() {
            tracing::trace!("cluster image is empty, waiting");
            return Ok(());
        }

        let registered = self.client.read_broker_ids()?;
        if registered.is_empty() {
            tracing::info!("no brokers registered in the keeper yet");
            return Ok(());
        }
        let assigned = self.client.read_broker_ids_from_topic_assignments()?;

        let missing: Vec<NodeId> = registered
            .iter()
            .chain(assigned.iter())
            .filter(|id| !self.image.cluster.has_migrating_legacy_broker(**id))
            .copied()
            .collect();

        if missing.is_empty() {
            tracing::info!(
                brokers = registered.len(),
                "all legacy brokers are visible in the cluster image"
            );
            self.transition(DriverState::BecomeController)
        } else {
            tracing::info!(?missing, "legacy brokers not yet visible in the cluster image");
            Ok(())
        }
    }

    // ========================================================================
    // Claim Controller
    // ========================================================================

    fn on_become_controller(&mut self) -> Result<()> {
        if self.state != DriverState::BecomeController {
            return Ok(());
        }

        let client = Arc::clone(&self.client);
        self.apply("claim", |state| client.claim_controller_leadership(state))?;

        if !self.leadership.is_claimed() {
            tracing::info!("keeper controller node is held by another controller, retrying");
            return Ok(());
        }
        tracing::info!(
            epoch = self.leadership.keeper_controller_epoch,
            "claimed keeper controller leadership"
        );

        if self.leadership.migration_complete {
            self.transition(DriverState::BrokerRpc)
        } else {
            self.transition(DriverState::KeeperMigration)
        }
    }

    // ========================================================================
    // Broker RPCs
    // ========================================================================

    /// Pushes the current image to legacy brokers once the image has
    /// caught up to the replay watermark. There is no self-transition out
    /// of this state from a poll; a newer publish unblocks it.
    fn on_send_rpcs(&mut self) -> Result<()> {
        if self.state != DriverState::BrokerRpc {
            return Ok(());
        }
        if self.image.highest_offset_and_epoch() < self.leadership.replayed() {
            tracing::trace!(
                image = %self.image.highest,
                replayed = %self.leadership.replayed(),
                "image lags the replay watermark, waiting for a newer publish"
            );
            return Ok(());
        }

        self.propagator
            .send_rpcs_from_image(&self.image, self.leadership.keeper_controller_epoch);
        self.transition(DriverState::DualWrite)
    }
}

// ============================================================================
// Public Surface
// ============================================================================

/// Cheap cloneable handle: enqueues events and reads the state snapshot.
#[derive(Clone)]
pub struct MigrationDriverHandle {
    node_id: NodeId,
    queue: Arc<EventQueue<DriverEvent>>,
    observed_state: Arc<AtomicU8>,
}

impl MigrationDriverHandle {
    /// The driver state after every previously enqueued event has run.
    /// Blocks the caller only when waited on.
    pub fn state(&self) -> Completion<DriverState> {
        let (completer, result) = completion();
        let _ = self.queue.append(DriverEvent::InspectState(completer));
        result
    }

    /// Last state the worker published. May lag [`Self::state`] by the
    /// events still in flight.
    pub fn last_observed_state(&self) -> DriverState {
        DriverState::from_u8(self.observed_state.load(Ordering::Acquire))
            .unwrap_or(DriverState::Uninitialized)
    }

    /// Enqueues a publication and surfaces its completion to `done`.
    pub fn publish(
        &self,
        delta: MetadataDelta,
        image: MetadataImage,
        manifest: ImageManifest,
        done: ChangeCallback,
    ) {
        let change = MetadataChange {
            delta,
            image,
            manifest,
            done,
        };
        if let SubmitResult::Closed(DriverEvent::MetadataChange(change)) =
            self.queue.append(DriverEvent::MetadataChange(change))
        {
            (change.done)(Err(DriverError::QueueClosed));
        }
    }
}

impl MetadataPublisher for MigrationDriverHandle {
    fn name(&self) -> String {
        format!("KeeperMigrationDriver id={}", self.node_id)
    }

    fn on_leader_change(&self, leader: LeaderAndEpoch) {
        let _ = self.queue.append(DriverEvent::LeaderChange(leader));
    }

    fn on_metadata_update(
        &self,
        delta: MetadataDelta,
        image: MetadataImage,
        manifest: ImageManifest,
    ) {
        self.publish(delta, image, manifest, Box::new(|_| {}));
    }

    fn close(&self) {
        self.queue.close();
    }
}

/// Owns the worker thread. Construct, [`start`](Self::start), and
/// eventually [`shutdown`](Self::shutdown).
pub struct MigrationDriver {
    handle: MigrationDriverHandle,
    core: Option<DriverCore>,
    worker: Option<JoinHandle<()>>,
}

impl MigrationDriver {
    pub fn new(
        node_id: NodeId,
        config: DriverConfig,
        collaborators: Collaborators,
        initial_load: InitialLoadFn,
    ) -> Self {
        let queue = Arc::new(EventQueue::new());
        let observed_state = Arc::new(AtomicU8::new(DriverState::Uninitialized.as_u8()));
        let core = DriverCore::new(
            node_id,
            config,
            collaborators,
            Arc::clone(&queue),
            Arc::clone(&observed_state),
            initial_load,
        );
        Self {
            handle: MigrationDriverHandle {
                node_id,
                queue,
                observed_state,
            },
            core: Some(core),
            worker: None,
        }
    }

    pub fn handle(&self) -> MigrationDriverHandle {
        self.handle.clone()
    }

    /// Spawns the worker and seeds the first poll at the queue head.
    pub fn start(&mut self) -> std::io::Result<()> {
        let Some(core) = self.core.take() else {
            return Ok(());
        };
        let _ = self.handle.queue.prepend(DriverEvent::Poll);
        let worker = thread::Builder::new()
            .name("keeper-migration-driver".into())
            .spawn(move || core.run())?;
        self.worker = Some(worker);
        Ok(())
    }

    /// Closes the queue, lets queued events drain, and joins the worker.
    pub fn shutdown(&mut self) {
        self.handle.queue.close();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for MigrationDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}
