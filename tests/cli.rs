use assert_cmd::Command;
use predicates::prelude::*;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// A home directory whose config points at the fixtures and creates stores inside it.
fn home() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("graphseed.toml"),
        format!(
            "datasets_dir = \"datasets\"\nkg_datasets_dir = {:?}\nsampling_seed = 3\n",
            fixtures().display().to_string()
        ),
    )
    .unwrap();
    temp
}

fn graphseed() -> Command {
    let mut cmd = Command::cargo_bin("graphseed").unwrap();
    cmd.env_remove("GRAPHSEED_HOME").env("RUST_LOG", "warn");
    cmd
}

fn created_store(output: &[u8]) -> PathBuf {
    let value: serde_json::Value = serde_json::from_slice(output).unwrap();
    PathBuf::from(value["dataset"]["store_path"].as_str().unwrap())
}

#[test]
fn test_create_knowledge_graph_then_inspect() {
    let home = home();
    let output = graphseed()
        .args(["create", "--name", "FB15k train", "--kg", "FB15k", "--home"])
        .arg(home.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"specification_kind\": \"knowledge_graph\""))
        .stdout(predicate::str::contains("\"edge_batches\""))
        .get_output()
        .stdout
        .clone();
    let store = created_store(&output);
    assert!(store.starts_with(home.path().join("datasets")));
    assert!(store.to_string_lossy().ends_with("fb15k-train"));

    graphseed()
        .arg("inspect")
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"nodes\": 30"))
        .stdout(predicate::str::contains("\"edges\": 120"))
        .stdout(predicate::str::contains("FilmFilmGenre"));
}

#[test]
fn test_create_sampled_stix_dataset() {
    let home = home();
    let output = graphseed()
        .args(["create", "--name", "stix", "--count", "2", "--stix"])
        .arg(fixtures().join("stix/bundle.json"))
        .arg("--home")
        .arg(home.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sampling_count\": 2"))
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let nodes: u64 = report["report"]["node_counts"]
        .as_object()
        .unwrap()
        .values()
        .map(|v| v.as_u64().unwrap())
        .sum();
    assert_eq!(nodes, 2);
}

#[test]
fn test_conflicting_sources_are_rejected() {
    graphseed()
        .args(["create", "--name", "x", "--kg", "FB15k", "--stix", "bundle.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_invalid_sampling_fails() {
    let home = home();
    graphseed()
        .args(["create", "--name", "x", "--kg", "FB15k", "--ratio", "1.5", "--home"])
        .arg(home.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("sampling ratio"));
}

#[test]
fn test_inspect_missing_store() {
    let temp = TempDir::new().unwrap();
    graphseed()
        .arg("inspect")
        .arg(temp.path().join("nothing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no graph store found"));
}
