//! RunConfigurator: builds one run's job configuration
//!
//! Every run, baseline or offload, gets the same pinned resource sizes and
//! a fresh output directory. Offload runs additionally get the shuffle
//! service wiring: collector and consumer plugins, client type, quorum and
//! the client artifact on the container classpath.
//!
//! Precondition failures (missing environment, missing artifact) are
//! `HarnessError::Configuration` and are never retried.

use std::path::{Path, PathBuf};

use parity_core::{
    keys, HarnessError, HarnessResult, JobConf, ResourceLimits, RunMode, RunRole,
    TransportClientType,
};
use parity_storage::copy_between;
use tracing::{debug, info};
use uuid::Uuid;

use crate::session::{SessionContext, StagedArtifact};

/// App master entry point for offload runs
pub const OFFLOAD_APP_MASTER: &str = "org.apache.hadoop.mapreduce.v2.app.RssMRAppMaster";
/// Map output collector for offload runs
pub const OFFLOAD_MAP_OUTPUT_COLLECTOR: &str = "org.apache.hadoop.mapred.RssMapOutputCollector";
/// Shuffle consumer with client-side merge
pub const OFFLOAD_SHUFFLE_CONSUMER: &str = "org.apache.hadoop.mapreduce.task.reduce.RssShuffle";
/// Shuffle consumer reading partitions merged by the service
pub const REMOTE_MERGE_SHUFFLE_CONSUMER: &str =
    "org.apache.hadoop.mapreduce.task.reduce.RMRssShuffle";
/// Framework default container classpath, kept after the client artifact
pub const DEFAULT_APPLICATION_CLASSPATH: &str = "$HADOOP_MAPRED_HOME/share/hadoop/mapreduce/*,\
$HADOOP_MAPRED_HOME/share/hadoop/mapreduce/lib/*";

/// Fully built configuration for exactly one run
///
/// Immutable once built; the orchestrator consumes it by value.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfiguration {
    role: RunRole,
    mode: RunMode,
    resource_limits: ResourceLimits,
    output_directory: PathBuf,
    job_conf: JobConf,
}

impl RunConfiguration {
    /// Role of the run
    pub fn role(&self) -> RunRole {
        self.role
    }

    /// Baseline or offload switches
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Pinned resource sizes
    pub fn resource_limits(&self) -> ResourceLimits {
        self.resource_limits
    }

    /// Output directory assigned to the run
    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Complete job configuration
    pub fn job_conf(&self) -> &JobConf {
        &self.job_conf
    }

    /// Hand the job configuration over for submission
    pub fn into_job_conf(self) -> JobConf {
        self.job_conf
    }
}

/// Role implied by offload switches
pub fn offload_role(remote_merge: bool, remote_spill: bool) -> RunRole {
    if remote_merge {
        RunRole::RemoteMergeOffload
    } else if remote_spill {
        RunRole::RemoteSpillOffload
    } else {
        RunRole::StandardOffload
    }
}

/// Builds run configurations against a session
pub struct RunConfigurator<'s> {
    session: &'s SessionContext,
}

impl<'s> RunConfigurator<'s> {
    /// Bind to a session
    pub fn new(session: &'s SessionContext) -> Self {
        RunConfigurator { session }
    }

    /// Check environment and stage the client artifact
    ///
    /// Called before the first run of a sequence that contains offload runs
    /// so a missing precondition aborts before anything is submitted. A
    /// closed session has no cluster to submit to and fails as `Fixture`.
    pub fn preflight(&self) -> HarnessResult<StagedArtifact> {
        if self.session.is_closed() {
            return Err(HarnessError::fixture(format!(
                "session {} is closed",
                self.session.id()
            )));
        }
        self.check_environment()?;
        self.session
            .staged_artifact_or_try_init(|| self.stage_artifact())
    }

    /// Configuration for a baseline (reference) run
    pub fn configure_baseline(&self, base: &JobConf) -> RunConfiguration {
        let mut conf = base.clone();
        let limits = self.session.config().resources;
        pin_resources(&mut conf, &limits);
        let output_directory = self.allocate_output(RunRole::Reference, &mut conf);
        debug!(
            target: "parity::configure",
            output = %output_directory.display(),
            "Configured reference run"
        );
        RunConfiguration {
            role: RunRole::Reference,
            mode: RunMode::Baseline,
            resource_limits: limits,
            output_directory,
            job_conf: conf,
        }
    }

    /// Configuration for an offload run
    ///
    /// # Errors
    ///
    /// `Configuration` when a required environment variable is unset or no
    /// client artifact matches the configured prefix; filesystem errors from
    /// staging the artifact.
    pub fn configure(
        &self,
        base: &JobConf,
        client_type: TransportClientType,
        remote_merge: bool,
        remote_spill: bool,
    ) -> HarnessResult<RunConfiguration> {
        let artifact = self.preflight()?;
        let config = self.session.config();
        let role = offload_role(remote_merge, remote_spill);

        let mut conf = base.clone();
        let limits = config.resources;
        pin_resources(&mut conf, &limits);

        conf.set(
            keys::AM_COMMAND_OPTS,
            format!("-XX:+TraceClassLoading {}", OFFLOAD_APP_MASTER),
        );
        conf.set(
            keys::REDUCE_JAVA_OPTS,
            format!(
                "-XX:+TraceClassLoading -XX:MaxDirectMemorySize={}",
                config.reduce_direct_memory_bytes
            ),
        );
        conf.set(keys::MAP_OUTPUT_COLLECTOR, OFFLOAD_MAP_OUTPUT_COLLECTOR);
        if remote_merge {
            conf.set_bool(keys::RSS_REMOTE_MERGE_ENABLE, true);
            conf.set(keys::SHUFFLE_CONSUMER_PLUGIN, REMOTE_MERGE_SHUFFLE_CONSUMER);
        } else {
            conf.set(keys::SHUFFLE_CONSUMER_PLUGIN, OFFLOAD_SHUFFLE_CONSUMER);
        }
        conf.set_bool(keys::RSS_REDUCE_REMOTE_SPILL_ENABLED, remote_spill);

        self.add_artifact_to_classpath(&mut conf, &artifact);
        conf.set(keys::RSS_COORDINATOR_QUORUM, self.session.quorum());
        conf.set(keys::RSS_CLIENT_TYPE, client_type.name());

        let output_directory = self.allocate_output(role, &mut conf);
        debug!(
            target: "parity::configure",
            role = %role,
            client = %client_type,
            remote_merge,
            remote_spill,
            output = %output_directory.display(),
            "Configured offload run"
        );
        Ok(RunConfiguration {
            role,
            mode: RunMode::Offload {
                client_type,
                remote_merge,
                remote_spill,
            },
            resource_limits: limits,
            output_directory,
            job_conf: conf,
        })
    }

    /// Find the client artifact in the build output directory
    ///
    /// Returns the first regular file, in name order, whose name starts
    /// with the configured prefix.
    pub fn locate_artifact(&self) -> HarnessResult<String> {
        let config = self.session.config();
        let dir = &config.artifact_dir;
        let mut listing = self.session.build_fs().list_status(dir).map_err(|e| {
            HarnessError::configuration(format!(
                "cannot list artifact directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
        listing.sort_by(|a, b| a.name.cmp(&b.name));
        listing
            .into_iter()
            .find(|s| !s.is_dir && s.name.starts_with(&config.artifact_prefix))
            .map(|s| s.name)
            .ok_or_else(|| {
                HarnessError::configuration(format!(
                    "no artifact starting with '{}' in '{}'",
                    config.artifact_prefix,
                    dir.display()
                ))
            })
    }

    fn check_environment(&self) -> HarnessResult<()> {
        for var in &self.session.config().required_env {
            if std::env::var_os(var).is_none() {
                return Err(HarnessError::configuration(format!(
                    "environment variable {} must be set",
                    var
                )));
            }
        }
        Ok(())
    }

    fn stage_artifact(&self) -> HarnessResult<StagedArtifact> {
        let config = self.session.config();
        let file_name = self.locate_artifact()?;
        let src = config.artifact_dir.join(&file_name);
        let shared_path = config.shared_artifact_dir.join(&file_name);
        let bytes = copy_between(
            self.session.build_fs(),
            &src,
            self.session.cluster_fs(),
            &shared_path,
        )?;
        info!(
            target: "parity::configure",
            artifact = %file_name,
            shared = %shared_path.display(),
            bytes,
            "Staged client artifact"
        );
        Ok(StagedArtifact {
            file_name,
            shared_path,
        })
    }

    fn add_artifact_to_classpath(&self, conf: &mut JobConf, artifact: &StagedArtifact) {
        let shared_dir_name = self
            .session
            .config()
            .shared_artifact_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let shared = artifact.shared_path.to_string_lossy();
        conf.append_list(keys::CLASSPATH_FILES, &shared);

        let rest = conf
            .get(keys::APPLICATION_CLASSPATH)
            .unwrap_or(DEFAULT_APPLICATION_CLASSPATH)
            .to_string();
        conf.set(
            keys::APPLICATION_CLASSPATH,
            format!("$PWD/{}/{},{}", shared_dir_name, artifact.file_name, rest),
        );
    }

    fn allocate_output(&self, role: RunRole, conf: &mut JobConf) -> PathBuf {
        let dir = self
            .session
            .config()
            .output_root
            .join(format!("{}-{}", role.label(), Uuid::new_v4().simple()));
        conf.set(keys::OUTPUT_DIR, dir.to_string_lossy());
        dir
    }
}

fn pin_resources(conf: &mut JobConf, limits: &ResourceLimits) {
    conf.set(
        keys::MAP_JAVA_OPTS,
        format!("-Xmx{}m", limits.map_memory_mb),
    );
    conf.set_int(keys::MAP_MEMORY_MB, i64::from(limits.map_memory_mb));
    conf.set_int(keys::REDUCE_MEMORY_MB, i64::from(limits.reduce_memory_mb));
    conf.set_int(keys::IO_SORT_MB, i64::from(limits.sort_buffer_mb));
}
