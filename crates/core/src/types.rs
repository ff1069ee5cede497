//! Core types for the parity harness
//!
//! This module defines the foundational types:
//! - TransportClientType: protocol variant a job uses to reach shuffle servers
//! - ResourceLimits: pinned task memory / sort-buffer sizes
//! - RunRole: named role of a run within a comparison sequence
//! - RunMode: baseline or shuffle-offload with its switches
//! - FileStatus: one entry of a directory listing

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Network protocol variant used by a job's shuffle client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportClientType {
    /// Plain gRPC transport
    Grpc,
    /// gRPC control plane with Netty data plane
    GrpcNetty,
}

impl TransportClientType {
    /// Every supported transport, in matrix order
    pub fn all() -> [TransportClientType; 2] {
        [TransportClientType::Grpc, TransportClientType::GrpcNetty]
    }

    /// Name written into job configuration
    pub fn name(&self) -> &'static str {
        match self {
            TransportClientType::Grpc => "GRPC",
            TransportClientType::GrpcNetty => "GRPC_NETTY",
        }
    }
}

impl fmt::Display for TransportClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransportClientType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GRPC" => Ok(TransportClientType::Grpc),
            "GRPC_NETTY" => Ok(TransportClientType::GrpcNetty),
            other => Err(format!("unknown transport client type '{}'", other)),
        }
    }
}

/// Fixed per-task resource sizes applied to every run
///
/// Pinning these removes resource variance as a confound when two runs
/// are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    /// Map container memory in MiB
    pub map_memory_mb: u32,
    /// Reduce container memory in MiB
    pub reduce_memory_mb: u32,
    /// Map-side sort buffer in MiB
    pub sort_buffer_mb: u32,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        ResourceLimits {
            map_memory_mb: 500,
            reduce_memory_mb: 2048,
            sort_buffer_mb: 128,
        }
    }
}

/// Role a run plays inside a comparison sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunRole {
    /// Baseline run without shuffle offload; ground truth for every comparison
    Reference,
    /// Offload run through the shuffle service, local spill
    StandardOffload,
    /// Offload run with reduce-side spill written to the shuffle service
    RemoteSpillOffload,
    /// Offload run with partitions merged on the shuffle service
    RemoteMergeOffload,
}

impl RunRole {
    /// Stable kebab-case label, also used in output directory names
    pub fn label(&self) -> &'static str {
        match self {
            RunRole::Reference => "reference",
            RunRole::StandardOffload => "standard-offload",
            RunRole::RemoteSpillOffload => "remote-spill-offload",
            RunRole::RemoteMergeOffload => "remote-merge-offload",
        }
    }

    /// True only for the ground-truth run
    pub fn is_reference(&self) -> bool {
        matches!(self, RunRole::Reference)
    }
}

impl fmt::Display for RunRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a run's shuffle is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// Framework-native shuffle
    Baseline,
    /// Shuffle routed through the external shuffle service
    Offload {
        /// Transport used to reach the shuffle servers
        client_type: TransportClientType,
        /// Merge partitions on the service side
        remote_merge: bool,
        /// Spill reduce buffers to the service instead of local disk
        remote_spill: bool,
    },
}

impl RunMode {
    /// True when the shuffle goes through the external service
    pub fn is_offload(&self) -> bool {
        matches!(self, RunMode::Offload { .. })
    }
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileStatus {
    /// Final path component
    pub name: String,
    /// Length in bytes as reported by the filesystem
    pub length: u64,
    /// Whether the entry is itself a directory
    pub is_dir: bool,
}

impl FileStatus {
    /// Create a status for a regular file
    pub fn file(name: impl Into<String>, length: u64) -> Self {
        FileStatus {
            name: name.into(),
            length,
            is_dir: false,
        }
    }

    /// Create a status for a directory
    pub fn dir(name: impl Into<String>) -> Self {
        FileStatus {
            name: name.into(),
            length: 0,
            is_dir: true,
        }
    }
}
