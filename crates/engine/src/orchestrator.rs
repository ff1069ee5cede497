//! DualRunOrchestrator: sequences reference and offload runs and verifies them
//!
//! Runs are submitted one at a time through the session's cluster. Every
//! offload run in a sequence is compared against the one reference run of
//! that sequence. The first failed submission or failed comparison aborts the
//! sequence; nothing is retried.
//!
//! ## Sequences
//!
//! | Entry point | Order |
//! |-------------|-------|
//! | `run_comparison` | reference, standard offload (verify), remote-spill offload (verify) |
//! | `run_comparison_with_remote_merge` | remote-merge offload, reference (verify) |

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use parity_core::{
    keys, ComparisonResult, HarnessError, HarnessResult, RunRole, TransportClientType, Workload,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::configurator::{RunConfiguration, RunConfigurator};
use crate::matrix::{ConfigurationMatrix, MatrixPoint, Scenario};
use crate::session::SessionContext;
use crate::verifier::EquivalenceVerifier;

/// Record of one completed submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Role the run played
    pub role: RunRole,
    /// Output directory as left in the job configuration after submission
    pub output_directory: Option<PathBuf>,
    /// Exit status reported by the cluster
    pub exit_code: i32,
    /// Submission time
    pub started_at: DateTime<Utc>,
    /// Completion time
    pub finished_at: DateTime<Utc>,
}

/// An offload run and its verdict against the reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateOutcome {
    /// The offload run
    pub execution: ExecutionResult,
    /// Verdict against the reference output
    pub comparison: ComparisonResult,
}

/// Everything one comparison sequence produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonOutcome {
    /// Matrix point the sequence ran at
    pub point: MatrixPoint,
    /// The reference run
    pub reference: ExecutionResult,
    /// Offload runs in execution order
    pub candidates: Vec<CandidateOutcome>,
}

impl ComparisonOutcome {
    /// True when every candidate matched the reference
    pub fn all_passed(&self) -> bool {
        self.candidates.iter().all(|c| c.comparison.is_pass())
    }

    /// Serialize as pretty JSON for reports
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Drives comparison sequences for one workload within a session
pub struct DualRunOrchestrator<'s> {
    session: &'s SessionContext,
    workload: &'s dyn Workload,
}

impl<'s> DualRunOrchestrator<'s> {
    /// Bind a workload to a session
    pub fn new(session: &'s SessionContext, workload: &'s dyn Workload) -> Self {
        DualRunOrchestrator { session, workload }
    }

    /// Reference, then standard offload, then remote-spill offload
    ///
    /// Each offload run is verified against the same reference output
    /// immediately after it completes.
    ///
    /// # Errors
    ///
    /// `Configuration` before any submission when a precondition is unmet,
    /// `JobExecution` on a non-zero exit, `Equivalence` on the first
    /// failing comparison.
    pub fn run_comparison(
        &self,
        client_type: TransportClientType,
    ) -> HarnessResult<ComparisonOutcome> {
        let point = MatrixPoint::new(client_type, Scenario::Standard);
        let configurator = RunConfigurator::new(self.session);
        configurator.preflight()?;
        info!(target: "parity::run", point = %point, workload = self.workload.name(), "Starting comparison");

        let base = self.session.cluster().base_config();
        let reference = self.execute(configurator.configure_baseline(&base))?;

        let standard = self.execute(configurator.configure(&base, client_type, false, false)?)?;
        let standard = self.compare(&reference, standard)?;

        let base = self.session.cluster().base_config();
        let spill = self.execute(configurator.configure(&base, client_type, false, true)?)?;
        let spill = self.compare(&reference, spill)?;

        Ok(ComparisonOutcome {
            point,
            reference,
            candidates: vec![standard, spill],
        })
    }

    /// Remote-merge offload, then reference, verified once
    ///
    /// # Errors
    ///
    /// Same as [`run_comparison`](Self::run_comparison).
    pub fn run_comparison_with_remote_merge(
        &self,
        client_type: TransportClientType,
    ) -> HarnessResult<ComparisonOutcome> {
        let point = MatrixPoint::new(client_type, Scenario::RemoteMerge);
        let configurator = RunConfigurator::new(self.session);
        configurator.preflight()?;
        info!(target: "parity::run", point = %point, workload = self.workload.name(), "Starting comparison");

        let base = self.session.cluster().base_config();
        let merge = self.execute(configurator.configure(&base, client_type, true, false)?)?;

        let base = self.session.cluster().base_config();
        let reference = self.execute(configurator.configure_baseline(&base))?;
        let merge = self.compare(&reference, merge)?;

        Ok(ComparisonOutcome {
            point,
            reference,
            candidates: vec![merge],
        })
    }

    /// Run the sequence a matrix point names
    pub fn run_point(&self, point: MatrixPoint) -> HarnessResult<ComparisonOutcome> {
        match point.scenario {
            Scenario::Standard => self.run_comparison(point.client_type),
            Scenario::RemoteMerge => self.run_comparison_with_remote_merge(point.client_type),
        }
    }

    /// Run every point in order, stopping at the first failure
    pub fn run_matrix(&self, matrix: &ConfigurationMatrix) -> HarnessResult<Vec<ComparisonOutcome>> {
        matrix
            .points()
            .iter()
            .map(|point| self.run_point(*point))
            .collect()
    }

    fn execute(&self, run: RunConfiguration) -> HarnessResult<ExecutionResult> {
        let role = run.role();
        let mut conf = run.into_job_conf();
        let started_at = Utc::now();
        info!(target: "parity::run", role = %role, workload = self.workload.name(), "Submitting run");

        let exit_code = self
            .session
            .cluster()
            .cluster()
            .submit(&mut conf, self.workload)?;
        let finished_at = Utc::now();

        if exit_code != 0 {
            error!(target: "parity::run", role = %role, exit_code, "Run failed");
            return Err(HarnessError::JobExecution {
                role,
                workload: self.workload.name().to_string(),
                exit_code,
            });
        }

        let output_directory = conf.get(keys::OUTPUT_DIR).map(PathBuf::from);
        info!(
            target: "parity::run",
            role = %role,
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            "Run finished"
        );
        Ok(ExecutionResult {
            role,
            output_directory,
            exit_code,
            started_at,
            finished_at,
        })
    }

    fn compare(
        &self,
        reference: &ExecutionResult,
        candidate: ExecutionResult,
    ) -> HarnessResult<CandidateOutcome> {
        let verifier = EquivalenceVerifier::new(self.session.cluster_fs());
        let comparison = verifier.verify(
            reference.output_directory.as_deref(),
            candidate.output_directory.as_deref(),
        )?;
        if let ComparisonResult::Fail(mismatch) = comparison {
            error!(
                target: "parity::run",
                role = %candidate.role,
                mismatch = %mismatch,
                "Candidate diverged from reference"
            );
            return Err(HarnessError::Equivalence(mismatch));
        }
        Ok(CandidateOutcome {
            execution: candidate,
            comparison,
        })
    }
}
