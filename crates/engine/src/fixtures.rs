//! Session-scoped fixtures around the cluster and shuffle-server collaborators
//!
//! Both fixtures are brought up once per session and torn down once at its
//! end. Teardown is best-effort: failures are logged and never override the
//! outcome of the comparisons that ran.

use std::path::Path;

use parity_core::{
    keys, Cluster, FileSystem, HarnessResult, JobConf, ServerConf, ShuffleServers,
    TransportClientType,
};
use tracing::{info, warn};

use crate::config::HarnessConfig;

/// Storage type advertised to shuffle servers by default
pub const DEFAULT_STORAGE_TYPE: &str = "MEMORY_LOCALFILE_HDFS";

/// Running execution cluster
pub struct ClusterFixture {
    cluster: Box<dyn Cluster>,
    running: bool,
}

impl ClusterFixture {
    /// Start `cluster` with the session's staging and priority settings
    pub fn start(mut cluster: Box<dyn Cluster>, config: &HarnessConfig) -> HarnessResult<Self> {
        let mut conf = JobConf::new();
        conf.set(keys::AM_STAGING_DIR, config.staging_dir.as_str());
        conf.set_int(
            keys::MAX_APPLICATION_PRIORITY,
            i64::from(config.max_application_priority),
        );
        cluster.start(&conf)?;
        info!(target: "parity::session", staging_dir = %config.staging_dir, "Cluster started");
        Ok(ClusterFixture {
            cluster,
            running: true,
        })
    }

    /// Collaborator handle for submissions
    pub fn cluster(&self) -> &dyn Cluster {
        self.cluster.as_ref()
    }

    /// Fresh copy of the cluster configuration each run starts from
    pub fn base_config(&self) -> JobConf {
        self.cluster.config()
    }

    /// Whether `teardown` has not run yet
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stop the cluster and remove the localized-resources directory
    ///
    /// Idempotent. Errors are logged, not returned.
    pub fn teardown(&mut self, build_fs: &dyn FileSystem, resources_dir: &Path) {
        if !self.running {
            return;
        }
        self.running = false;

        if let Err(e) = self.cluster.stop() {
            warn!(target: "parity::session", error = %e, "Cluster stop failed");
        }
        if build_fs.exists(resources_dir) {
            if let Err(e) = build_fs.delete(resources_dir, true) {
                warn!(
                    target: "parity::session",
                    path = %resources_dir.display(),
                    error = %e,
                    "Failed to clean up resources directory"
                );
            }
        }
        info!(target: "parity::session", "Cluster stopped");
    }
}

/// Running coordinator plus one shuffle server per transport
pub struct ServerFixture {
    servers: Box<dyn ShuffleServers>,
    quorum: String,
    running: bool,
}

impl ServerFixture {
    /// Store coordinator and worker configurations, then start on random ports
    ///
    /// `dynamic_conf` is merged into the coordinator configuration;
    /// `server_overrides`, when given, into every shuffle-server configuration.
    pub fn setup(
        mut servers: Box<dyn ShuffleServers>,
        dynamic_conf: &JobConf,
        server_overrides: Option<&JobConf>,
    ) -> HarnessResult<Self> {
        let mut coordinator = JobConf::new();
        coordinator.merge(dynamic_conf);
        servers.store(ServerConf::coordinator(coordinator))?;

        for (index, transport) in TransportClientType::all().into_iter().enumerate() {
            let mut conf = JobConf::new();
            conf.set(keys::RSS_SERVER_TYPE, transport.name());
            if let Some(overrides) = server_overrides {
                conf.merge(overrides);
            }
            servers.store(ServerConf::shuffle_server(index, transport, conf))?;
        }

        servers.start(true)?;
        let quorum = servers.quorum();
        info!(target: "parity::session", quorum = %quorum, "Shuffle servers started");
        Ok(ServerFixture {
            servers,
            quorum,
            running: true,
        })
    }

    /// Coordinator endpoints captured at start
    pub fn quorum(&self) -> &str {
        &self.quorum
    }

    /// Stop every server. Idempotent; errors are logged.
    pub fn teardown(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        if let Err(e) = self.servers.stop() {
            warn!(target: "parity::session", error = %e, "Shuffle server stop failed");
        }
    }
}

/// Coordinator dynamic configuration used by default
///
/// Points remote storage at `<remote_storage_uri>rss/test` and selects the
/// memory + local file + remote storage tiering.
pub fn default_dynamic_conf(remote_storage_uri: &str) -> JobConf {
    let mut conf = JobConf::new();
    conf.set(
        keys::COORDINATOR_REMOTE_STORAGE_PATH,
        format!("{}rss/test", remote_storage_uri),
    );
    conf.set(keys::RSS_STORAGE_TYPE, DEFAULT_STORAGE_TYPE);
    conf
}
