//! Divergence and failure scenarios on disk.

use crate::common::*;
use shuffle_parity::testing::StaticWorkload;
use shuffle_parity::{
    ContentDivergence, DualRunOrchestrator, HarnessError, Mismatch, RunRole, StructuralMismatch,
    TransportClientType,
};

#[test]
fn single_flipped_byte_in_spill_run_is_located() {
    let ws = Workspace::new();
    let config = ws.config();
    ws.build_artifact(&config);
    let cluster = ws.cluster().diverge(RunRole::RemoteSpillOffload, |parts| {
        parts[2].1[17] = b'#';
    });
    let opened = ws.open(cluster, config);
    let workload = StaticWorkload::new("SecondarySort");

    let err = DualRunOrchestrator::new(&opened.session, &workload)
        .run_comparison(TransportClientType::GrpcNetty)
        .unwrap_err();

    let expected = records(50 + 2 * 13, 2)[17];
    match err {
        HarnessError::Equivalence(Mismatch::Content {
            file_index,
            file_name,
            offset,
            divergence,
        }) => {
            assert_eq!(file_index, 2);
            assert_eq!(file_name, "part-r-00002");
            assert_eq!(offset, 17);
            assert_eq!(
                divergence,
                ContentDivergence::ByteDiffers {
                    reference: expected,
                    candidate: b'#',
                }
            );
        }
        other => panic!("expected content mismatch, got {:?}", other),
    }
    // Standard offload passed before the spill run diverged.
    assert_eq!(opened.cluster.lock().submissions.len(), 3);
}

#[test]
fn renamed_part_is_structural_mismatch() {
    let ws = Workspace::new();
    let config = ws.config();
    ws.build_artifact(&config);
    let cluster = ws.cluster().diverge(RunRole::StandardOffload, |parts| {
        parts[3].0 = "part-m-00003".to_string();
    });
    let opened = ws.open(cluster, config);
    let workload = StaticWorkload::new("SecondarySort");

    let err = DualRunOrchestrator::new(&opened.session, &workload)
        .run_comparison(TransportClientType::Grpc)
        .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Equivalence(Mismatch::Structural(StructuralMismatch::FileName { .. }))
    ));
    assert_eq!(opened.cluster.lock().submissions.len(), 2);
}

#[test]
fn nonzero_exit_names_role_and_workload() {
    let ws = Workspace::new();
    let config = ws.config();
    ws.build_artifact(&config);
    let cluster = ws.cluster().fail(RunRole::RemoteMergeOffload, 255);
    let opened = ws.open(cluster, config);
    let workload = StaticWorkload::new("RandomTextWriter");

    let err = DualRunOrchestrator::new(&opened.session, &workload)
        .run_comparison_with_remote_merge(TransportClientType::Grpc)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "RandomTextWriter failed in remote-merge-offload run with exit code 255"
    );
}

#[test]
fn missing_build_output_fails_before_submission() {
    let ws = Workspace::new();
    let opened = ws.open(ws.cluster(), ws.config());
    let workload = StaticWorkload::new("SecondarySort");

    let err = DualRunOrchestrator::new(&opened.session, &workload)
        .run_comparison(TransportClientType::Grpc)
        .unwrap_err();
    assert!(matches!(err, HarnessError::Configuration { .. }));
    assert!(opened.cluster.lock().submissions.is_empty());
}
