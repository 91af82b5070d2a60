//! Integration tests for the CLI over a state file

use std::path::Path;

use clap::Parser;
use nbox::cli::state::StateFile;
use nbox::cli::{execute, Cli};
use nbox::config::AppConfig;

async fn run(state: &Path, args: &[&str]) -> anyhow::Result<String> {
    let mut argv = vec!["nbox", "--state", state.to_str().unwrap()];
    argv.extend_from_slice(args);
    execute(Cli::try_parse_from(argv)?, &AppConfig::default()).await
}

#[tokio::test]
async fn test_template_upsert_build_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");

    let template = dir.path().join("env.json");
    std::fs::write(&template, r#"{"db": "{{ :service/:stage/db }}", "region": ":region"}"#).unwrap();
    let entries = dir.path().join("entries.json");
    std::fs::write(
        &entries,
        r#"[
            {"path": "billing/prod", "key": "db", "value": "postgres://db:5432", "type_validator_name": "string"},
            {"path": "billing/prod", "key": "port", "value": "not-a-number", "type_validator_name": "number"}
        ]"#,
    )
    .unwrap();

    let template_path = template.to_str().unwrap();
    let stored = run(&state, &["template", "set", "billing", "prod", "env.json", template_path])
        .await
        .unwrap();
    assert!(stored.contains("billing/prod/env.json"));

    let upserted =
        run(&state, &["--user", "ci", "upsert", entries.to_str().unwrap()]).await.unwrap();
    let results: serde_json::Value = serde_json::from_str(&upserted).unwrap();
    assert_eq!(results.as_array().unwrap().len(), 2);
    assert_eq!(results[0]["key"], "billing/prod/db");
    assert_eq!(results[0]["action"], "created");
    assert_eq!(results[1]["action"], "error");

    let built = run(&state, &["build", "billing", "prod", "env.json", "--arg", "region=eu-west-1"])
        .await
        .unwrap();
    assert_eq!(built, r#"{"db": "postgres://db:5432", "region": "eu-west-1"}"#);

    let vars = run(&state, &["vars", "billing", "prod", "env.json"]).await.unwrap();
    assert_eq!(vars, ":service/:stage/db");

    let saved = StateFile::read(&state).unwrap();
    assert_eq!(saved.entries.len(), 1);
    assert_eq!(saved.templates.len(), 1);
}

#[tokio::test]
async fn test_validator_commands_persist() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");

    run(&state, &["validator", "set", "semver", r"\d+\.\d+\.\d+"]).await.unwrap();
    let listed = run(&state, &["validator", "list"]).await.unwrap();
    let validators: serde_json::Value = serde_json::from_str(&listed).unwrap();
    assert_eq!(validators.as_array().unwrap().len(), 6);

    assert!(run(&state, &["validator", "delete", "json"]).await.is_err());
    run(&state, &["validator", "delete", "semver"]).await.unwrap();
    assert!(StateFile::read(&state).unwrap().validators.is_empty());
}

#[tokio::test]
async fn test_export_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    let entries = dir.path().join("entries.json");
    std::fs::write(&entries, r#"[{"path": "app", "key": "mode", "value": "fast"}]"#).unwrap();
    run(&state, &["upsert", entries.to_str().unwrap()]).await.unwrap();

    let out = dir.path().join("exports");
    std::fs::create_dir(&out).unwrap();
    let args = ["export", "--prefix", "app", "--format", "dotenv", "--output-dir", out.to_str().unwrap()];
    let summary = run(&state, &args).await.unwrap();
    assert!(summary.contains("1 entries"));

    let written: Vec<_> = std::fs::read_dir(&out).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(written.len(), 1);
    assert_eq!(std::fs::read_to_string(&written[0]).unwrap(), "MODE=fast\n");
}

#[tokio::test]
async fn test_environments_lists_default_prefix_first() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");

    let printed = run(&state, &["environments"]).await.unwrap();
    let environments: Vec<String> = serde_json::from_str(&printed).unwrap();
    assert_eq!(environments[0], "global/");
    assert!(environments.contains(&"staging/".to_string()));
    assert!(!state.exists());
}
