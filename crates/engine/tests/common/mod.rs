//! Shared helpers for engine integration tests.
//!
//! Import via `mod common;`.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Once};

use parking_lot::Mutex;
use parity_engine::testing::{ClusterCalls, FakeCluster, FakeServers, ServerCalls};
use parity_engine::{HarnessConfig, SessionContext};
use parity_storage::MemoryFileSystem;

pub const ARTIFACT_DIR: &str = "/build/client-mr/core/target/shaded";
pub const ARTIFACT: &str = "rss-client-mr-0.10.0-shaded.jar";
pub const QUORUM: &str = "fake-coordinator:19999";

static INIT_TRACING: Once = Once::new();

/// Route harness logs through the test writer.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Config pointing at the in-memory layout, with no environment requirement.
pub fn test_config() -> HarnessConfig {
    HarnessConfig {
        artifact_dir: PathBuf::from(ARTIFACT_DIR),
        resources_dir: PathBuf::from("/build/localizedResources"),
        required_env: vec![],
        ..HarnessConfig::default()
    }
}

/// Place the client artifact plus a few decoys in the build output.
pub fn add_artifact(fs: &MemoryFileSystem) {
    fs.add_file(format!("{}/original-rss-client-mr.jar", ARTIFACT_DIR), b"orig".to_vec());
    fs.add_file(format!("{}/{}", ARTIFACT_DIR, ARTIFACT), b"PK\x03\x04client".to_vec());
    fs.add_file(format!("{}/rss-client-mr-tests.jar", ARTIFACT_DIR), b"tests".to_vec());
}

/// Deterministic bytes for part files.
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(17).wrapping_add(seed))
        .collect()
}

/// Fake cluster writing two parts (120 and 80 bytes) per run.
pub fn two_part_cluster(fs: &MemoryFileSystem) -> FakeCluster {
    FakeCluster::new(Arc::new(fs.clone()))
        .with_part("part-r-00000", pattern(120, 1))
        .with_part("part-r-00001", pattern(80, 2))
}

/// An open session plus handles onto the fakes' recorded calls.
pub struct TestSession {
    pub fs: MemoryFileSystem,
    pub session: SessionContext,
    pub cluster: Arc<Mutex<ClusterCalls>>,
    pub servers: Arc<Mutex<ServerCalls>>,
}

impl TestSession {
    /// Open a session over `fs` with `cluster` and default fake servers.
    pub fn open(fs: MemoryFileSystem, cluster: FakeCluster, config: HarnessConfig) -> Self {
        init_tracing();
        let servers = FakeServers::new(QUORUM);
        let cluster_calls = cluster.handle();
        let server_calls = servers.handle();
        let session = SessionContext::builder()
            .config(config)
            .cluster(Box::new(cluster))
            .servers(Box::new(servers))
            .cluster_fs(Arc::new(fs.clone()))
            .open()
            .unwrap();
        TestSession {
            fs,
            session,
            cluster: cluster_calls,
            servers: server_calls,
        }
    }

    /// Session with the artifact in place and a two-part workload output.
    pub fn standard() -> Self {
        let fs = MemoryFileSystem::new();
        add_artifact(&fs);
        let cluster = two_part_cluster(&fs);
        Self::open(fs, cluster, test_config())
    }
}
