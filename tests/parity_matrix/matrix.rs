//! Full matrix on disk: both client types, both scenarios.

use crate::common::*;
use shuffle_parity::{
    ComparisonResult, ConfigurationMatrix, DualRunOrchestrator, FileSystem, MatrixPoint, RunRole,
    Scenario, TransportClientType,
};
use shuffle_parity::testing::StaticWorkload;
use std::path::Path;

#[test]
fn full_matrix_passes_for_identical_outputs() {
    let ws = Workspace::new();
    let config = ws.config();
    ws.build_artifact(&config);
    let opened = ws.open(ws.cluster(), config);
    let workload = StaticWorkload::new("SecondarySort").arg("-m").arg("4");

    let outcomes = DualRunOrchestrator::new(&opened.session, &workload)
        .run_matrix(&ConfigurationMatrix::full())
        .unwrap();

    let points: Vec<MatrixPoint> = outcomes.iter().map(|o| o.point).collect();
    assert_eq!(points, ConfigurationMatrix::full().points().to_vec());

    let expected_bytes: u64 = (0..4).map(|p| records(50 + p * 13, p).len() as u64).sum();
    for outcome in &outcomes {
        for candidate in &outcome.candidates {
            assert_eq!(
                candidate.comparison,
                ComparisonResult::Pass {
                    files: 4,
                    aggregate_bytes: expected_bytes,
                }
            );
        }
    }

    let calls = opened.cluster.lock();
    assert!(!calls.submissions.is_empty());
    for submission in &calls.submissions {
        assert_eq!(submission.workload, "SecondarySort");
        assert_eq!(submission.args, vec!["-m", "4"]);
    }
}

#[test]
fn every_run_leaves_its_own_output_directory() {
    let ws = Workspace::new();
    let config = ws.config();
    ws.build_artifact(&config);
    let opened = ws.open(ws.cluster(), config);
    let workload = StaticWorkload::new("WordCount");

    let outcome = DualRunOrchestrator::new(&opened.session, &workload)
        .run_comparison(TransportClientType::Grpc)
        .unwrap();

    let mut dirs = vec![outcome.reference.output_directory.clone().unwrap()];
    dirs.extend(
        outcome
            .candidates
            .iter()
            .map(|c| c.execution.output_directory.clone().unwrap()),
    );
    for dir in &dirs {
        assert!(ws.on_cluster(dir).join("_SUCCESS").is_file());
        assert!(dir.starts_with("/tmp/TestMRJobs"));
    }
    dirs.sort();
    dirs.dedup();
    assert_eq!(dirs.len(), 3);
}

#[test]
fn artifact_crosses_filesystems_and_is_removed_at_close() {
    let ws = Workspace::new();
    let config = ws.config();
    ws.build_artifact(&config);
    let mut opened = ws.open(ws.cluster(), config);
    let workload = StaticWorkload::new("WordCount");

    DualRunOrchestrator::new(&opened.session, &workload)
        .run_point(MatrixPoint::new(
            TransportClientType::GrpcNetty,
            Scenario::RemoteMerge,
        ))
        .unwrap();

    let shared = Path::new("/rss.jar").join(ARTIFACT);
    assert!(ws.cluster_fs.exists(&shared));
    assert!(!ws.build_fs.exists(&shared));
    assert_eq!(
        std::fs::read(ws.on_cluster(&shared)).unwrap(),
        b"PK\x03\x04shaded-client"
    );
    assert_eq!(
        opened.cluster.lock().roles(),
        vec![RunRole::RemoteMergeOffload, RunRole::Reference]
    );

    opened.session.close();
    assert!(!ws.cluster_fs.exists(Path::new("/rss.jar")));
    assert_eq!(opened.servers.lock().stops, 1);
}
