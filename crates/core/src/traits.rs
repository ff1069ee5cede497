//! Collaborator traits
//!
//! The harness never touches a cluster, a shuffle server or a storage
//! substrate directly. Each is reached through one of the traits below so
//! the same orchestration runs against real processes or in-process fakes.

use std::io::{Read, Write};
use std::path::Path;

use crate::error::{FsResult, HarnessResult};
use crate::job_conf::JobConf;
use crate::types::{FileStatus, TransportClientType};

/// Storage abstraction every comparison is routed through
///
/// Implementations may be local disk, a distributed filesystem or an
/// in-memory map; the verifier only relies on the operations here.
///
/// Thread safety: implementations must be `Send + Sync` so a session can
/// hold them behind an `Arc`, although the harness itself calls them from
/// a single thread.
pub trait FileSystem: Send + Sync {
    /// List the direct children of a directory
    ///
    /// Order is unspecified; callers sort.
    ///
    /// # Errors
    ///
    /// `NotFound` if `dir` does not exist, `NotADirectory` if it is a file.
    fn list_status(&self, dir: &Path) -> FsResult<Vec<FileStatus>>;

    /// Open a file as a sequential byte stream
    ///
    /// # Errors
    ///
    /// `NotFound` if missing, `IsADirectory` for directories.
    fn open(&self, path: &Path) -> FsResult<Box<dyn Read + Send>>;

    /// Create (or truncate) a file, creating parent directories
    fn create(&self, path: &Path) -> FsResult<Box<dyn Write + Send>>;

    /// Copy a file within this filesystem
    fn copy(&self, src: &Path, dst: &Path) -> FsResult<()>;

    /// Delete a file or directory
    ///
    /// Returns `false` when nothing existed at `path`.
    ///
    /// # Errors
    ///
    /// `DirectoryNotEmpty` when `recursive` is false and `path` has children.
    fn delete(&self, path: &Path, recursive: bool) -> FsResult<bool>;

    /// Check whether anything exists at `path`
    fn exists(&self, path: &Path) -> bool;
}

/// The job tool run identically in every run of a comparison
pub trait Workload: Send + Sync {
    /// Human-readable name used in logs and errors
    fn name(&self) -> &str;

    /// Arguments handed to the tool on submission
    fn args(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Execution cluster collaborator
pub trait Cluster: Send {
    /// Start the cluster with the given session configuration
    fn start(&mut self, conf: &JobConf) -> HarnessResult<()>;

    /// Stop the cluster; called once per session
    fn stop(&mut self) -> HarnessResult<()>;

    /// Cluster-level configuration each run's job configuration starts from
    fn config(&self) -> JobConf;

    /// Submit a job and block until it reaches a terminal state
    ///
    /// The job may write back into `conf` (notably its output directory).
    /// Returns the job's exit status; zero is success. Any timeout or retry
    /// policy belongs to the cluster, not to the caller.
    fn submit(&self, conf: &mut JobConf, workload: &dyn Workload) -> HarnessResult<i32>;
}

/// Kind of shuffle-service process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerKind {
    /// Coordinator handing out worker assignments
    Coordinator,
    /// Shuffle worker speaking the given transport
    ShuffleServer(TransportClientType),
}

/// Configuration for one shuffle-service process, ports left unassigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConf {
    /// Process kind
    pub kind: ServerKind,
    /// Instance index, used to keep per-instance storage paths apart
    pub index: usize,
    /// Server properties
    pub conf: JobConf,
}

impl ServerConf {
    /// Coordinator configuration
    pub fn coordinator(conf: JobConf) -> Self {
        ServerConf {
            kind: ServerKind::Coordinator,
            index: 0,
            conf,
        }
    }

    /// Shuffle-server configuration for a transport
    pub fn shuffle_server(index: usize, transport: TransportClientType, conf: JobConf) -> Self {
        ServerConf {
            kind: ServerKind::ShuffleServer(transport),
            index,
            conf,
        }
    }
}

/// Shuffle-service collaborator (coordinator plus workers)
pub trait ShuffleServers: Send {
    /// Register a server configuration to be started
    fn store(&mut self, conf: ServerConf) -> HarnessResult<()>;

    /// Start every stored server
    fn start(&mut self, randomized_ports: bool) -> HarnessResult<()>;

    /// Coordinator endpoints jobs use to find workers, e.g. `host:port,host:port`
    fn quorum(&self) -> String;

    /// Stop every started server
    fn stop(&mut self) -> HarnessResult<()>;
}
