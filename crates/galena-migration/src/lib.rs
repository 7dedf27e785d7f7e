//! # galena-migration: Keeper-to-quorum metadata migration driver
//!
//! This crate implements the control plane that moves cluster metadata
//! out of the legacy Keeper coordination service and into the Galena
//! quorum log, live and one-way. A driver instance runs next to each
//! quorum controller replica; the one co-located with the current leader
//! does the work:
//!
//! 1. Recovers persisted migration progress from the Keeper.
//! 2. Claims exclusive Keeper controller leadership.
//! 3. Bulk-replays all Keeper metadata into the log.
//! 4. Enters dual-write, mirroring every log delta back into the Keeper.
//! 5. Keeps legacy-protocol brokers informed over RPC throughout.
//!
//! # Architecture
//!
//! The driver is a serial event-driven state machine. Three asynchronous
//! sources — quorum leadership changes, metadata publications, and a
//! periodic poll — enqueue events onto one [`queue::EventQueue`]; a
//! single worker thread dequeues and runs them one at a time. There are
//! no locks around driver state and no async runtime: a long-running
//! event simply blocks the worker while later events queue behind it.
//!
//! External collaborators are traits at the seams:
//! [`client::KeeperMigrationClient`] (all Keeper round-trips),
//! [`consumer::RecordConsumer`] (log ingestion),
//! [`propagator::RpcPropagator`] (legacy broker RPCs),
//! [`quorum::QuorumReadiness`] (peer migration support), and
//! [`fault::FaultHandler`] (faults the driver cannot handle locally).

pub mod client;
pub mod completion;
pub mod config;
pub mod consumer;
pub mod driver;
pub mod error;
pub mod event;
pub mod fault;
pub mod leadership;
pub mod propagator;
pub mod publisher;
pub mod queue;
pub mod quorum;
pub mod state;

mod dual_write;
mod replay;


pub use client::{BatchSink, BrokerSink, KeeperMigrationClient, RecordBatch};
pub use completion::{Completer, Completion, WaitError, completion};
pub use config::DriverConfig;
pub use consumer::RecordConsumer;
pub use driver::{Collaborators, InitialLoadFn, MigrationDriver, MigrationDriverHandle};
pub use error::{ConfigError, DriverError, KeeperClientError, Result};
pub use event::{ChangeCallback, DriverEvent, MetadataChange};
pub use fault::{FaultHandler, LoggingFaultHandler};
pub use leadership::{LeadershipState, UNCLAIMED_EPOCH_NODE_VERSION};
pub use propagator::RpcPropagator;
pub use publisher::MetadataPublisher;
pub use queue::{EventQueue, SubmitResult};
pub use quorum::QuorumReadiness;
pub use state::DriverState;
