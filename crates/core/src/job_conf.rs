//! Job configuration map
//!
//! `JobConf` is the flat string-to-string property set a job is submitted
//! with. Property names follow the batch framework's own configuration keys
//! so a collaborator can hand them to the cluster verbatim.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known property names
pub mod keys {
    /// Directory a job writes its final output to
    pub const OUTPUT_DIR: &str = "mapreduce.output.fileoutputformat.outputdir";
    /// Map container memory (MiB)
    pub const MAP_MEMORY_MB: &str = "mapreduce.map.memory.mb";
    /// Reduce container memory (MiB)
    pub const REDUCE_MEMORY_MB: &str = "mapreduce.reduce.memory.mb";
    /// Map-side sort buffer (MiB)
    pub const IO_SORT_MB: &str = "mapreduce.task.io.sort.mb";
    /// JVM options for map tasks
    pub const MAP_JAVA_OPTS: &str = "mapreduce.map.java.opts";
    /// JVM options for reduce tasks
    pub const REDUCE_JAVA_OPTS: &str = "mapreduce.reduce.java.opts";
    /// Application-master launch options
    pub const AM_COMMAND_OPTS: &str = "yarn.app.mapreduce.am.command-opts";
    /// Map-side output collector implementation
    pub const MAP_OUTPUT_COLLECTOR: &str = "mapreduce.job.map.output.collector.class";
    /// Reduce-side shuffle consumer implementation
    pub const SHUFFLE_CONSUMER_PLUGIN: &str = "mapreduce.job.reduce.shuffle.consumer.plugin.class";
    /// Container classpath
    pub const APPLICATION_CLASSPATH: &str = "mapreduce.application.classpath";
    /// Files localized onto the task classpath
    pub const CLASSPATH_FILES: &str = "mapreduce.job.classpath.files";
    /// Application-master staging directory
    pub const AM_STAGING_DIR: &str = "yarn.app.mapreduce.am.staging-dir";
    /// Highest application priority the cluster accepts
    pub const MAX_APPLICATION_PRIORITY: &str = "yarn.cluster.max-application-priority";

    /// Shuffle-service coordinator endpoints
    pub const RSS_COORDINATOR_QUORUM: &str = "mapreduce.rss.coordinator.quorum";
    /// Shuffle-service transport client
    pub const RSS_CLIENT_TYPE: &str = "mapreduce.rss.client.type";
    /// Service-side partition merge
    pub const RSS_REMOTE_MERGE_ENABLE: &str = "mapreduce.rss.remote.merge.enable";
    /// Reduce spill to the shuffle service
    pub const RSS_REDUCE_REMOTE_SPILL_ENABLED: &str = "mapreduce.rss.reduce.remote.spill.enable";
    /// Storage type used by shuffle servers
    pub const RSS_STORAGE_TYPE: &str = "mapreduce.rss.storage.type";
    /// Transport a shuffle server listens with
    pub const RSS_SERVER_TYPE: &str = "rss.rpc.server.type";
    /// Remote storage root advertised by the coordinator
    pub const COORDINATOR_REMOTE_STORAGE_PATH: &str = "rss.coordinator.remote.storage.path";
}

/// Flat property set for one job submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConf {
    props: BTreeMap<String, String>,
}

impl JobConf {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a property
    pub fn get(&self, key: &str) -> Option<&str> {
        self.props.get(key).map(String::as_str)
    }

    /// Set a property, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.props.insert(key.into(), value.into());
    }

    /// Set a boolean property (`true` / `false`)
    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.set(key, value.to_string());
    }

    /// Set an integer property
    pub fn set_int(&mut self, key: impl Into<String>, value: i64) {
        self.set(key, value.to_string());
    }

    /// Parse a boolean property; missing or malformed reads as `None`
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Parse an integer property; missing or malformed reads as `None`
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Remove a property, returning its value
    pub fn unset(&mut self, key: &str) -> Option<String> {
        self.props.remove(key)
    }

    /// Append `value` to a comma-separated list property
    pub fn append_list(&mut self, key: &str, value: &str) {
        let joined = match self.get(key) {
            Some(existing) if !existing.is_empty() => format!("{},{}", existing, value),
            _ => value.to_string(),
        };
        self.set(key, joined);
    }

    /// Copy every property of `other` into `self`, overriding on conflict
    pub fn merge(&mut self, other: &JobConf) {
        for (k, v) in &other.props {
            self.props.insert(k.clone(), v.clone());
        }
    }

    /// Iterate properties in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.props.len()
    }

    /// True when no property is set
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for JobConf {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut conf = JobConf::new();
        for (k, v) in iter {
            conf.set(k, v);
        }
        conf
    }
}
