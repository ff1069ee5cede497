//! Core types and traits for shuffle-parity
//!
//! This crate defines the foundational types used throughout the harness:
//! - TransportClientType, ResourceLimits, RunRole, RunMode, FileStatus
//! - JobConf: flat job property set and well-known keys
//! - OutputManifest, Mismatch, ComparisonResult: comparison model
//! - HarnessError / FsError: error taxonomy
//! - Traits: collaborator seams (FileSystem, Cluster, ShuffleServers, Workload)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod comparison;
pub mod error;
pub mod job_conf;
pub mod traits;
pub mod types;

pub use comparison::{
    is_sentinel, ComparisonResult, ContentDivergence, Mismatch, OutputManifest,
    StructuralMismatch, SUCCESS_MARKER,
};
pub use error::{FsError, FsResult, HarnessError, HarnessResult};
pub use job_conf::{keys, JobConf};
pub use traits::{Cluster, FileSystem, ServerConf, ServerKind, ShuffleServers, Workload};
pub use types::{FileStatus, ResourceLimits, RunMode, RunRole, TransportClientType};
