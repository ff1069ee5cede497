//! Differential harness engine
//!
//! This crate runs one workload in baseline mode and through the shuffle
//! offload service, then proves the outputs byte-identical:
//! - Session: fixtures, filesystems and staged artifact, opened and closed once
//! - RunConfigurator: per-run job configuration
//! - DualRunOrchestrator: reference/offload sequencing (no retries)
//! - EquivalenceVerifier: structural, content and aggregate checks
//! - Configuration matrix: client type x scenario
//!
//! Runs are strictly sequential. The engine never talks to a cluster or
//! shuffle server directly; everything goes through the collaborator traits
//! in `parity_core`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod configurator;
pub mod fixtures;
pub mod matrix;
pub mod orchestrator;
pub mod session;
pub mod testing;
pub mod verifier;

pub use config::{HarnessConfig, CONFIG_FILE_NAME};
pub use configurator::{offload_role, RunConfiguration, RunConfigurator};
pub use fixtures::{default_dynamic_conf, ClusterFixture, ServerFixture, DEFAULT_STORAGE_TYPE};
pub use matrix::{ConfigurationMatrix, MatrixPoint, Scenario};
pub use orchestrator::{CandidateOutcome, ComparisonOutcome, DualRunOrchestrator, ExecutionResult};
pub use session::{SessionBuilder, SessionContext, StagedArtifact};
pub use verifier::{first_divergence, EquivalenceVerifier};
