//! In-process collaborators for exercising the harness without a cluster
//!
//! - **FakeCluster**: "runs" a job by writing a fixed set of part files to
//!   the output directory named in its configuration. Per-role exit codes
//!   and output mutations inject failures and divergences.
//! - **FakeServers**: records stored server configurations and reports a
//!   fixed quorum.
//! - **StaticWorkload**: a named workload with fixed arguments.
//!
//! Each fake hands out a cloneable handle onto its recorded calls, so tests
//! can inspect them after the fake has been moved into a session.
//!
//! # Example
//!
//! ```ignore
//! let fs = MemoryFileSystem::new();
//! let cluster = FakeCluster::new(Arc::new(fs.clone()))
//!     .with_part("part-r-00000", vec![7u8; 120])
//!     .diverge(RunRole::RemoteSpillOffload, |parts| {
//!         parts[0].1.pop();
//!     });
//! let calls = cluster.handle();
//! ```

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use parity_core::{
    keys, Cluster, FileSystem, HarnessError, HarnessResult, JobConf, RunRole, ServerConf,
    ShuffleServers, Workload, SUCCESS_MARKER,
};

use crate::configurator::offload_role;

/// Part files a fake job writes, as (name, bytes)
pub type Parts = Vec<(String, Vec<u8>)>;

type Mutation = Box<dyn Fn(&mut Parts) + Send + Sync>;

/// Infer the role a configuration was built for
///
/// Baseline configurations carry no offload collector.
pub fn role_of(conf: &JobConf) -> RunRole {
    if conf.get(keys::MAP_OUTPUT_COLLECTOR).is_none() {
        return RunRole::Reference;
    }
    offload_role(
        conf.get_bool(keys::RSS_REMOTE_MERGE_ENABLE).unwrap_or(false),
        conf.get_bool(keys::RSS_REDUCE_REMOTE_SPILL_ENABLED)
            .unwrap_or(false),
    )
}

/// One recorded submission
#[derive(Debug, Clone)]
pub struct Submission {
    /// Role inferred from the configuration
    pub role: RunRole,
    /// Workload name
    pub workload: String,
    /// Workload arguments
    pub args: Vec<String>,
    /// Configuration as submitted
    pub conf: JobConf,
}

/// Calls recorded by a [`FakeCluster`]
#[derive(Debug, Default)]
pub struct ClusterCalls {
    /// Configuration passed to `start`
    pub started_with: Option<JobConf>,
    /// Number of `stop` calls
    pub stops: usize,
    /// Every submission in order
    pub submissions: Vec<Submission>,
}

impl ClusterCalls {
    /// Roles of every submission in order
    pub fn roles(&self) -> Vec<RunRole> {
        self.submissions.iter().map(|s| s.role).collect()
    }
}

/// Cluster that writes deterministic output through a `FileSystem`
pub struct FakeCluster {
    fs: Arc<dyn FileSystem>,
    base: JobConf,
    parts: Parts,
    write_marker: bool,
    no_output: bool,
    exit_codes: HashMap<RunRole, i32>,
    mutations: HashMap<RunRole, Mutation>,
    calls: Arc<Mutex<ClusterCalls>>,
}

impl FakeCluster {
    /// Cluster writing to `fs`, with no parts and a `_SUCCESS` marker
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        FakeCluster {
            fs,
            base: JobConf::new(),
            parts: Vec::new(),
            write_marker: true,
            no_output: false,
            exit_codes: HashMap::new(),
            mutations: HashMap::new(),
            calls: Arc::new(Mutex::new(ClusterCalls::default())),
        }
    }

    /// Add a part file every run writes
    pub fn with_part(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.parts.push((name.into(), data.into()));
        self
    }

    /// Base configuration returned by `config`
    pub fn with_base_config(mut self, base: JobConf) -> Self {
        self.base = base;
        self
    }

    /// Skip the completion marker
    pub fn without_marker(mut self) -> Self {
        self.write_marker = false;
        self
    }

    /// Jobs write nothing and clear their output directory setting
    pub fn without_output(mut self) -> Self {
        self.no_output = true;
        self
    }

    /// Runs of `role` report `exit_code` and write nothing
    pub fn fail(mut self, role: RunRole, exit_code: i32) -> Self {
        self.exit_codes.insert(role, exit_code);
        self
    }

    /// Apply `mutation` to the parts written by runs of `role`
    pub fn diverge(
        mut self,
        role: RunRole,
        mutation: impl Fn(&mut Parts) + Send + Sync + 'static,
    ) -> Self {
        self.mutations.insert(role, Box::new(mutation));
        self
    }

    /// Handle onto recorded calls
    pub fn handle(&self) -> Arc<Mutex<ClusterCalls>> {
        Arc::clone(&self.calls)
    }

    fn write_output(&self, dir: &Path, parts: &Parts) -> HarnessResult<()> {
        for (name, data) in parts {
            let mut out = self.fs.create(&dir.join(name))?;
            out.write_all(data)?;
            out.flush()?;
        }
        if self.write_marker {
            let mut marker = self.fs.create(&dir.join(SUCCESS_MARKER))?;
            marker.flush()?;
        }
        Ok(())
    }
}

impl Cluster for FakeCluster {
    fn start(&mut self, conf: &JobConf) -> HarnessResult<()> {
        self.calls.lock().started_with = Some(conf.clone());
        Ok(())
    }

    fn stop(&mut self) -> HarnessResult<()> {
        self.calls.lock().stops += 1;
        Ok(())
    }

    fn config(&self) -> JobConf {
        self.base.clone()
    }

    fn submit(&self, conf: &mut JobConf, workload: &dyn Workload) -> HarnessResult<i32> {
        let role = role_of(conf);
        self.calls.lock().submissions.push(Submission {
            role,
            workload: workload.name().to_string(),
            args: workload.args(),
            conf: conf.clone(),
        });

        if let Some(code) = self.exit_codes.get(&role) {
            return Ok(*code);
        }
        if self.no_output {
            conf.unset(keys::OUTPUT_DIR);
            return Ok(0);
        }

        let dir = conf
            .get(keys::OUTPUT_DIR)
            .map(PathBuf::from)
            .ok_or_else(|| HarnessError::fixture("job configuration has no output directory"))?;
        let mut parts = self.parts.clone();
        if let Some(mutate) = self.mutations.get(&role) {
            mutate(&mut parts);
        }
        self.write_output(&dir, &parts)?;
        Ok(0)
    }
}

/// Calls recorded by [`FakeServers`]
#[derive(Debug, Default)]
pub struct ServerCalls {
    /// Stored configurations in order
    pub stored: Vec<ServerConf>,
    /// Argument of the last `start`
    pub randomized_ports: Option<bool>,
    /// Number of `stop` calls
    pub stops: usize,
}

/// Shuffle servers that only record what they are given
pub struct FakeServers {
    quorum: String,
    fail_start: bool,
    calls: Arc<Mutex<ServerCalls>>,
}

impl FakeServers {
    /// Servers reporting `quorum`
    pub fn new(quorum: impl Into<String>) -> Self {
        FakeServers {
            quorum: quorum.into(),
            fail_start: false,
            calls: Arc::new(Mutex::new(ServerCalls::default())),
        }
    }

    /// `start` returns a fixture error
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Handle onto recorded calls
    pub fn handle(&self) -> Arc<Mutex<ServerCalls>> {
        Arc::clone(&self.calls)
    }
}

impl ShuffleServers for FakeServers {
    fn store(&mut self, conf: ServerConf) -> HarnessResult<()> {
        self.calls.lock().stored.push(conf);
        Ok(())
    }

    fn start(&mut self, randomized_ports: bool) -> HarnessResult<()> {
        self.calls.lock().randomized_ports = Some(randomized_ports);
        if self.fail_start {
            return Err(HarnessError::fixture("shuffle server port already bound"));
        }
        Ok(())
    }

    fn quorum(&self) -> String {
        self.quorum.clone()
    }

    fn stop(&mut self) -> HarnessResult<()> {
        self.calls.lock().stops += 1;
        Ok(())
    }
}

/// Workload identified only by name and arguments
#[derive(Debug, Clone)]
pub struct StaticWorkload {
    name: String,
    args: Vec<String>,
}

impl StaticWorkload {
    /// Workload without arguments
    pub fn new(name: impl Into<String>) -> Self {
        StaticWorkload {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl Workload for StaticWorkload {
    fn name(&self) -> &str {
        &self.name
    }

    fn args(&self) -> Vec<String> {
        self.args.clone()
    }
}
