//! shuffle-parity - differential harness for shuffle offload
//!
//! Runs one workload with the framework's native shuffle and again through
//! an external shuffle service, then proves the outputs byte-identical.
//!
//! # Quick Start
//!
//! ```ignore
//! use shuffle_parity::{ConfigurationMatrix, DualRunOrchestrator, SessionContext};
//!
//! let session = SessionContext::builder()
//!     .cluster(Box::new(my_cluster))
//!     .servers(Box::new(my_servers))
//!     .cluster_fs(Arc::new(LocalFileSystem::new()))
//!     .open()?;
//!
//! let outcomes = DualRunOrchestrator::new(&session, &my_workload)
//!     .run_matrix(&ConfigurationMatrix::full())?;
//! ```
//!
//! # Architecture
//!
//! - `parity_core`: data model, errors, job configuration, collaborator traits
//! - `parity_storage`: local and in-memory filesystems
//! - `parity_engine`: session, configurator, orchestrator, verifier

pub use parity_core::*;
pub use parity_engine::*;
pub use parity_storage::{copy_between, LocalFileSystem, MemoryFileSystem};
