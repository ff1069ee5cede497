//! Shared fixtures for the parity matrix suite.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use parking_lot::Mutex;
use shuffle_parity::testing::{ClusterCalls, FakeCluster, FakeServers, ServerCalls};
use shuffle_parity::{FileSystem, HarnessConfig, LocalFileSystem, SessionContext};
use tempfile::TempDir;

pub const ARTIFACT: &str = "rss-client-mr-0.10.0-shaded.jar";

static INIT_TRACING: Once = Once::new();

pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Deterministic "sorted records" content for a part file.
pub fn records(count: usize, partition: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..count {
        writeln!(out, "key-{:06}\tpartition-{}\tvalue-{:08x}", i, partition, i * 7919).unwrap();
    }
    out
}

/// Two temp directories standing in for the build tree and the cluster.
pub struct Workspace {
    pub build_dir: TempDir,
    pub cluster_dir: TempDir,
    pub build_fs: LocalFileSystem,
    pub cluster_fs: LocalFileSystem,
}

impl Workspace {
    pub fn new() -> Self {
        init_tracing();
        let build_dir = TempDir::new().unwrap();
        let cluster_dir = TempDir::new().unwrap();
        let build_fs = LocalFileSystem::rooted(build_dir.path());
        let cluster_fs = LocalFileSystem::rooted(cluster_dir.path());
        Workspace {
            build_dir,
            cluster_dir,
            build_fs,
            cluster_fs,
        }
    }

    pub fn config(&self) -> HarnessConfig {
        HarnessConfig {
            required_env: vec![],
            ..HarnessConfig::default()
        }
    }

    /// Write the shaded client artifact into the build output.
    pub fn build_artifact(&self, config: &HarnessConfig) {
        let path = config.artifact_dir.join(ARTIFACT);
        let mut w = self.build_fs.create(&path).unwrap();
        w.write_all(b"PK\x03\x04shaded-client").unwrap();
        w.flush().unwrap();
    }

    /// Physical path of a logical cluster path.
    pub fn on_cluster(&self, logical: &Path) -> PathBuf {
        self.cluster_fs.resolve(logical)
    }

    /// Fake cluster writing four record partitions to the cluster directory.
    pub fn cluster(&self) -> FakeCluster {
        (0..4).fold(
            FakeCluster::new(Arc::new(self.cluster_fs.clone())),
            |cluster, p| cluster.with_part(format!("part-r-{:05}", p), records(50 + p * 13, p)),
        )
    }

    pub fn open(&self, cluster: FakeCluster, config: HarnessConfig) -> Opened {
        let servers = FakeServers::new("localhost:21000,localhost:21001");
        let cluster_calls = cluster.handle();
        let server_calls = servers.handle();
        let session = SessionContext::builder()
            .config(config)
            .cluster(Box::new(cluster))
            .servers(Box::new(servers))
            .cluster_fs(Arc::new(self.cluster_fs.clone()))
            .build_fs(Arc::new(self.build_fs.clone()))
            .open()
            .unwrap();
        Opened {
            session,
            cluster: cluster_calls,
            servers: server_calls,
        }
    }
}

pub struct Opened {
    pub session: SessionContext,
    pub cluster: Arc<Mutex<ClusterCalls>>,
    pub servers: Arc<Mutex<ServerCalls>>,
}
