//! Reconciliation core for taskdav.
//!
//! - [`task`]: the store-neutral task model and fingerprints
//! - [`plan`]: matching two snapshots into create/delete/update lists
//! - [`engine`]: applying a plan to a [`store::LocalStore`] and a [`store::RemoteStore`]
//! - [`local`] and [`remote`]: the Taskwarrior and CalDAV stores

pub mod config;
pub mod engine;
pub mod error;
pub mod local;
pub mod plan;
pub mod remote;
pub mod store;
pub mod task;

pub use engine::{ActionFailure, Category, CategoryOutcome, Engine, Mode, Reporter, RunSummary};
pub use error::{ErrorCategory, SyncError, SyncResult};
pub use plan::{Plan, PlanCounts, Side, TaskUpdate};
pub use task::{Priority, Status, Task, TaskRecord, TaskShell};
