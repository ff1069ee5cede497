//! Driving the harness from a `parity.toml` file.

use crate::common::*;
use shuffle_parity::testing::StaticWorkload;
use shuffle_parity::{
    keys, DualRunOrchestrator, HarnessConfig, TransportClientType, CONFIG_FILE_NAME,
};
use std::path::PathBuf;

#[test]
fn custom_layout_from_config_file() {
    let ws = Workspace::new();
    let path = ws.build_dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(
        &path,
        r#"
artifact_dir = "dist/shaded"
output_root = "/scratch/parity"
shared_artifact_dir = "/client.jar"
required_env = []

[resources]
sort_buffer_mb = 64
"#,
    )
    .unwrap();

    let config = HarnessConfig::load_or_default(&path).unwrap();
    assert_eq!(config.artifact_dir, PathBuf::from("dist/shaded"));
    ws.build_artifact(&config);

    let opened = ws.open(ws.cluster(), config);
    let workload = StaticWorkload::new("SecondarySort");
    let outcome = DualRunOrchestrator::new(&opened.session, &workload)
        .run_comparison(TransportClientType::Grpc)
        .unwrap();
    assert!(outcome.all_passed());

    let calls = opened.cluster.lock();
    let offload = &calls.submissions[1].conf;
    assert_eq!(offload.get_int(keys::IO_SORT_MB), Some(64));
    assert_eq!(offload.get_int(keys::MAP_MEMORY_MB), Some(500));
    assert!(offload
        .get(keys::APPLICATION_CLASSPATH)
        .unwrap()
        .starts_with(&format!("$PWD/client.jar/{},", ARTIFACT)));
    assert!(outcome
        .reference
        .output_directory
        .as_ref()
        .unwrap()
        .starts_with("/scratch/parity"));
}

#[test]
fn default_file_is_written_once() {
    let ws = Workspace::new();
    let path = ws.build_dir.path().join(CONFIG_FILE_NAME);

    HarnessConfig::write_default_if_missing(&path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("artifact_prefix = \"rss-client-mr\""));

    let config = HarnessConfig::load_or_default(&path).unwrap();
    assert_eq!(config, HarnessConfig::default());
}
