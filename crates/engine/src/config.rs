//! Harness configuration via `parity.toml`
//!
//! Every path and fixed value the harness needs lives here so a suite can
//! point the harness at its own build layout without code changes. A
//! missing file means defaults; an invalid file is a configuration error.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use parity_core::{HarnessError, HarnessResult, ResourceLimits};

/// Config file name looked up in the suite directory.
pub const CONFIG_FILE_NAME: &str = "parity.toml";

/// Harness configuration loaded from `parity.toml`.
///
/// # Example
///
/// ```toml
/// artifact_dir = "client-mr/core/target/shaded"
/// artifact_prefix = "rss-client-mr"
///
/// [resources]
/// map_memory_mb = 500
/// reduce_memory_mb = 2048
/// sort_buffer_mb = 128
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Build output directory holding the shuffle client artifact (build filesystem).
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
    /// File-name prefix identifying the client artifact.
    #[serde(default = "default_artifact_prefix")]
    pub artifact_prefix: String,
    /// Shared-artifact directory on the cluster filesystem.
    #[serde(default = "default_shared_artifact_dir")]
    pub shared_artifact_dir: PathBuf,
    /// Parent of every per-run output directory (cluster filesystem).
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    /// Application-master staging directory handed to the cluster.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: String,
    /// Highest application priority the cluster accepts.
    #[serde(default = "default_max_application_priority")]
    pub max_application_priority: u32,
    /// Localized-resources directory removed at teardown (build filesystem).
    #[serde(default = "default_resources_dir")]
    pub resources_dir: PathBuf,
    /// Remote storage URI advertised to the coordinator.
    #[serde(default = "default_remote_storage_uri")]
    pub remote_storage_uri: String,
    /// Cap on reduce-task direct memory for offload runs, in bytes.
    #[serde(default = "default_reduce_direct_memory_bytes")]
    pub reduce_direct_memory_bytes: u64,
    /// Environment variables that must be set before any offload run.
    #[serde(default = "default_required_env")]
    pub required_env: Vec<String>,
    /// Fixed resource sizes pinned on every run.
    #[serde(default)]
    pub resources: ResourceLimits,
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("client-mr/core/target/shaded")
}

fn default_artifact_prefix() -> String {
    "rss-client-mr".to_string()
}

fn default_shared_artifact_dir() -> PathBuf {
    PathBuf::from("/rss.jar")
}

fn default_output_root() -> PathBuf {
    PathBuf::from("/tmp/TestMRJobs")
}

fn default_staging_dir() -> String {
    "/apps_staging_dir".to_string()
}

fn default_max_application_priority() -> u32 {
    10
}

fn default_resources_dir() -> PathBuf {
    PathBuf::from("target/TestMRJobs-tmpDir/localizedResources")
}

fn default_remote_storage_uri() -> String {
    "hdfs://localhost:8020/".to_string()
}

fn default_reduce_direct_memory_bytes() -> u64 {
    419_430_400
}

fn default_required_env() -> Vec<String> {
    vec!["JAVA_HOME".to_string()]
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            artifact_prefix: default_artifact_prefix(),
            shared_artifact_dir: default_shared_artifact_dir(),
            output_root: default_output_root(),
            staging_dir: default_staging_dir(),
            max_application_priority: default_max_application_priority(),
            resources_dir: default_resources_dir(),
            remote_storage_uri: default_remote_storage_uri(),
            reduce_direct_memory_bytes: default_reduce_direct_memory_bytes(),
            required_env: default_required_env(),
            resources: ResourceLimits::default(),
        }
    }
}

impl HarnessConfig {
    /// Check values that would make every run meaningless.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty artifact prefix, a zero
    /// resource size, or a shared-artifact directory without a file name.
    pub fn validate(&self) -> HarnessResult<()> {
        if self.artifact_prefix.trim().is_empty() {
            return Err(HarnessError::configuration(
                "artifact_prefix in parity.toml must not be empty",
            ));
        }
        let r = &self.resources;
        if r.map_memory_mb == 0 || r.reduce_memory_mb == 0 || r.sort_buffer_mb == 0 {
            return Err(HarnessError::configuration(format!(
                "resource sizes must be non-zero, got map={} reduce={} sort={}",
                r.map_memory_mb, r.reduce_memory_mb, r.sort_buffer_mb
            )));
        }
        if self.shared_artifact_dir.file_name().is_none() {
            return Err(HarnessError::configuration(format!(
                "shared_artifact_dir '{}' has no final component",
                self.shared_artifact_dir.display()
            )));
        }
        for (name, dir) in [
            ("shared_artifact_dir", &self.shared_artifact_dir),
            ("output_root", &self.output_root),
            ("resources_dir", &self.resources_dir),
        ] {
            if dir.components().any(|c| c == Component::ParentDir) {
                return Err(HarnessError::configuration(format!(
                    "{} '{}' must not contain '..'",
                    name,
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# shuffle-parity harness configuration
#
# Build output directory and file-name prefix of the shuffle client artifact.
# The first matching file (by name) is staged into the cluster filesystem.
artifact_dir = "client-mr/core/target/shaded"
artifact_prefix = "rss-client-mr"

# Shared-artifact directory on the cluster filesystem; removed at session end.
shared_artifact_dir = "/rss.jar"

# Every run writes to a fresh directory under this root.
output_root = "/tmp/TestMRJobs"

# Cluster bootstrap settings.
staging_dir = "/apps_staging_dir"
max_application_priority = 10

# Removed best-effort when the session closes.
resources_dir = "target/TestMRJobs-tmpDir/localizedResources"

# Remote storage advertised to the coordinator.
remote_storage_uri = "hdfs://localhost:8020/"

# Direct-memory cap for reduce tasks in offload runs (bytes).
reduce_direct_memory_bytes = 419430400

# Environment that must be present before an offload run is configured.
required_env = ["JAVA_HOME"]

# Pinned on every run so outputs never differ because of resources.
[resources]
map_memory_mb = 500
reduce_memory_mb = 2048
sort_buffer_mb = 128
"#
    }

    /// Parse config from TOML text and validate it.
    pub fn from_toml_str(content: &str) -> HarnessResult<Self> {
        let config: HarnessConfig = toml::from_str(content).map_err(|e| {
            HarnessError::configuration(format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::configuration(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> HarnessResult<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> HarnessResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> HarnessResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            HarnessError::configuration(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
