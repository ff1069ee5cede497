//! Error types for the parity harness
//!
//! A comparison sequence stops at the first error; the variant says which
//! stage stopped it. Filesystem failures keep their own `FsError` so callers
//! can tell a missing output directory from an unreadable part file.
//!
//! # Categories
//!
//! | Category | Variant | Fatal point |
//! |----------|---------|-------------|
//! | Precondition | `Configuration` | before any run is submitted |
//! | Execution | `JobExecution` | aborts the remaining comparison sequence |
//! | Equivalence | `Equivalence` | hard failure carrying the first divergence |
//! | Infrastructure | `Fs`, `Fixture` | propagated as-is |
//!
//! Nothing in the harness retries on any of these.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::comparison::Mismatch;
use crate::types::RunRole;

/// Result type alias for harness operations
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

/// Result type alias for filesystem collaborator operations
pub type FsResult<T> = std::result::Result<T, FsError>;

/// Errors raised by a `FileSystem` implementation
#[derive(Debug, Error)]
pub enum FsError {
    /// Path does not exist
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Directory operation on a file
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// File operation on a directory
    #[error("is a directory: {}", .0.display())]
    IsADirectory(PathBuf),

    /// Non-recursive delete of a populated directory
    #[error("directory not empty: {}", .0.display())]
    DirectoryNotEmpty(PathBuf),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Error taxonomy for the parity harness
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Missing build artifact or unmet environment precondition
    #[error("configuration error: {reason}")]
    Configuration {
        /// What precondition failed
        reason: String,
    },

    /// A submitted run finished with a non-zero exit status
    #[error("{workload} failed in {role} run with exit code {exit_code}")]
    JobExecution {
        /// Role of the failed run
        role: RunRole,
        /// Workload name
        workload: String,
        /// Exit status reported by the cluster
        exit_code: i32,
    },

    /// Reference and candidate outputs diverged
    #[error("equivalence mismatch: {0}")]
    Equivalence(Mismatch),

    /// Filesystem collaborator failure
    #[error("filesystem error: {0}")]
    Fs(#[from] FsError),

    /// Cluster or shuffle-server collaborator failure
    #[error("fixture error: {reason}")]
    Fixture {
        /// Collaborator-supplied description
        reason: String,
    },
}

impl HarnessError {
    /// Build a `Configuration` error
    pub fn configuration(reason: impl Into<String>) -> Self {
        HarnessError::Configuration {
            reason: reason.into(),
        }
    }

    /// Build a `Fixture` error
    pub fn fixture(reason: impl Into<String>) -> Self {
        HarnessError::Fixture {
            reason: reason.into(),
        }
    }

    /// True for the equivalence family (structural, content, aggregate)
    pub fn is_mismatch(&self) -> bool {
        matches!(self, HarnessError::Equivalence(_))
    }
}

impl From<io::Error> for HarnessError {
    fn from(e: io::Error) -> Self {
        HarnessError::Fs(FsError::Io(e))
    }
}
