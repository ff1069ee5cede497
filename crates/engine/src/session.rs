//! Session context
//!
//! A `SessionContext` owns everything shared by the runs of one test
//! session: the cluster and server fixtures, both filesystems, the harness
//! configuration and the staged client artifact. Orchestration and
//! verification borrow it; nothing is held in process-wide globals.
//!
//! The context is built once, used sequentially, and closed once. Dropping
//! an open context closes it.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use parity_core::{Cluster, FileSystem, HarnessError, HarnessResult, JobConf, ShuffleServers};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::HarnessConfig;
use crate::fixtures::{default_dynamic_conf, ClusterFixture, ServerFixture};

/// Client artifact staged into the cluster filesystem for this session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    /// Artifact file name, e.g. `rss-client-mr-0.10.0-shaded.jar`
    pub file_name: String,
    /// Location on the cluster filesystem
    pub shared_path: PathBuf,
}

/// Builder for [`SessionContext`]
#[derive(Default)]
pub struct SessionBuilder {
    config: Option<HarnessConfig>,
    cluster: Option<Box<dyn Cluster>>,
    servers: Option<Box<dyn ShuffleServers>>,
    cluster_fs: Option<Arc<dyn FileSystem>>,
    build_fs: Option<Arc<dyn FileSystem>>,
    dynamic_conf: Option<JobConf>,
    server_overrides: Option<JobConf>,
}

impl SessionBuilder {
    /// Harness configuration; defaults when unset
    pub fn config(mut self, config: HarnessConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Execution cluster collaborator (required)
    pub fn cluster(mut self, cluster: Box<dyn Cluster>) -> Self {
        self.cluster = Some(cluster);
        self
    }

    /// Shuffle-service collaborator (required)
    pub fn servers(mut self, servers: Box<dyn ShuffleServers>) -> Self {
        self.servers = Some(servers);
        self
    }

    /// Filesystem jobs write their output to (required)
    pub fn cluster_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.cluster_fs = Some(fs);
        self
    }

    /// Filesystem holding build outputs; the cluster filesystem when unset
    pub fn build_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.build_fs = Some(fs);
        self
    }

    /// Coordinator dynamic configuration; [`default_dynamic_conf`] when unset
    pub fn dynamic_conf(mut self, conf: JobConf) -> Self {
        self.dynamic_conf = Some(conf);
        self
    }

    /// Properties merged into every shuffle-server configuration
    pub fn server_overrides(mut self, conf: JobConf) -> Self {
        self.server_overrides = Some(conf);
        self
    }

    /// Validate, start the cluster, then start the shuffle servers
    ///
    /// If the servers fail to start the cluster is torn down again before
    /// the error is returned.
    pub fn open(self) -> HarnessResult<SessionContext> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let cluster = self
            .cluster
            .ok_or_else(|| HarnessError::configuration("session requires a cluster"))?;
        let servers = self
            .servers
            .ok_or_else(|| HarnessError::configuration("session requires shuffle servers"))?;
        let cluster_fs = self
            .cluster_fs
            .ok_or_else(|| HarnessError::configuration("session requires a cluster filesystem"))?;
        let build_fs = self.build_fs.unwrap_or_else(|| Arc::clone(&cluster_fs));
        let dynamic_conf = self
            .dynamic_conf
            .unwrap_or_else(|| default_dynamic_conf(&config.remote_storage_uri));

        let mut cluster = ClusterFixture::start(cluster, &config)?;
        let servers = match ServerFixture::setup(servers, &dynamic_conf, self.server_overrides.as_ref())
        {
            Ok(servers) => servers,
            Err(e) => {
                cluster.teardown(build_fs.as_ref(), &config.resources_dir);
                return Err(e);
            }
        };

        let session = SessionContext {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            config,
            cluster_fs,
            build_fs,
            cluster,
            servers,
            staged: Mutex::new(None),
            closed: false,
        };
        info!(target: "parity::session", session = %session.id, "Session opened");
        Ok(session)
    }
}

/// Session-scoped state shared by every run
pub struct SessionContext {
    id: Uuid,
    started_at: DateTime<Utc>,
    config: HarnessConfig,
    cluster_fs: Arc<dyn FileSystem>,
    build_fs: Arc<dyn FileSystem>,
    cluster: ClusterFixture,
    servers: ServerFixture,
    staged: Mutex<Option<StagedArtifact>>,
    closed: bool,
}

impl SessionContext {
    /// Start building a session
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Unique id of this session
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the session was opened
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Harness configuration
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Filesystem job outputs live on
    pub fn cluster_fs(&self) -> &dyn FileSystem {
        self.cluster_fs.as_ref()
    }

    /// Filesystem build artifacts live on
    pub fn build_fs(&self) -> &dyn FileSystem {
        self.build_fs.as_ref()
    }

    /// Cluster fixture
    pub fn cluster(&self) -> &ClusterFixture {
        &self.cluster
    }

    /// Coordinator quorum address
    pub fn quorum(&self) -> &str {
        self.servers.quorum()
    }

    /// Artifact staged so far, if any
    pub fn staged_artifact(&self) -> Option<StagedArtifact> {
        self.staged.lock().clone()
    }

    /// Return the staged artifact, staging it with `stage` on first use
    pub(crate) fn staged_artifact_or_try_init(
        &self,
        stage: impl FnOnce() -> HarnessResult<StagedArtifact>,
    ) -> HarnessResult<StagedArtifact> {
        let mut slot = self.staged.lock();
        if let Some(existing) = slot.as_ref() {
            if self.cluster_fs.exists(&existing.shared_path) {
                return Ok(existing.clone());
            }
            warn!(
                target: "parity::session",
                path = %existing.shared_path.display(),
                "Staged artifact disappeared, staging again"
            );
        }
        let staged = stage()?;
        *slot = Some(staged.clone());
        Ok(staged)
    }

    /// Whether `close` has run
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Tear down servers and cluster, then remove residual staging paths
    ///
    /// Runs once; later calls are no-ops. Every step is best-effort.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        self.servers.teardown();
        self.cluster
            .teardown(self.build_fs.as_ref(), &self.config.resources_dir);

        let shared_dir = &self.config.shared_artifact_dir;
        if self.cluster_fs.exists(shared_dir) {
            if let Err(e) = self.cluster_fs.delete(shared_dir, true) {
                warn!(
                    target: "parity::session",
                    path = %shared_dir.display(),
                    error = %e,
                    "Failed to remove shared artifact directory"
                );
            }
        }
        *self.staged.lock() = None;
        info!(target: "parity::session", session = %self.id, "Session closed");
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        self.close();
    }
}
