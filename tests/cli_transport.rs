//! CLI transport tests against fake `abstract-cli` executables
//!
//! Each test writes a small shell script into a temporary directory and
//! points the client at it.

#![cfg(unix)]

use abstract_sdk::transport::CliTransport;
use abstract_sdk::{Client, Credential, ErrorKind, ProjectDescriptor, TransportId};
use serde_json::Value;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write an executable script whose body runs after recording its arguments
fn fake_cli(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("abstract-cli");
    let args = dir.path().join("args");
    let script = format!(
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\n{}\n",
        args.display(),
        body
    );
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn recorded_args(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("args"))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn cli_client(cli_path: PathBuf, credential: Credential) -> Client {
    Client::builder()
        .credential(credential)
        .cli_path(cli_path)
        .api_url("https://api.example.test")
        .transports([TransportId::Cli])
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_token_and_api_url_precede_operation_args() {
    let dir = TempDir::new().unwrap();
    let cli = fake_cli(&dir, r#"echo '{"id": "p1", "name": "From CLI"}'"#);

    let client = cli_client(cli, Credential::token("secret"));
    let project = client.projects().info(&ProjectDescriptor::new("p1")).await.unwrap();
    assert_eq!(project.name, "From CLI");

    assert_eq!(
        recorded_args(dir.path()),
        vec![
            "--user-token",
            "secret",
            "--api-url",
            "https://api.example.test",
            "project",
            "load",
            "p1"
        ]
    );
}

#[tokio::test]
async fn test_share_credential_sends_no_token() {
    let dir = TempDir::new().unwrap();
    let cli = fake_cli(&dir, r#"echo '{"projects": [{"id": "p1", "name": "Shared"}]}'"#);

    let client = cli_client(cli, Credential::share_id("abc"));
    let projects = client.projects().list(None).await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "Shared");

    let args = recorded_args(dir.path());
    assert!(!args.iter().any(|a| a == "--user-token"));
    assert_eq!(args[0], "--api-url");
}

#[tokio::test]
async fn test_structured_stderr_maps_onto_kind() {
    let dir = TempDir::new().unwrap();
    let cli = fake_cli(
        &dir,
        r#"echo '{"code": "not_found", "message": "Project does not exist"}' >&2
exit 1"#,
    );

    let client = cli_client(cli, Credential::token("secret"));
    let err = client.projects().info(&ProjectDescriptor::new("p1")).await.unwrap_err();

    let failure = err.transport_error(TransportId::Cli).unwrap();
    assert_eq!(failure.kind, ErrorKind::NotFound);
    assert_eq!(failure.message, "Project does not exist");
    assert_eq!(failure.code.as_deref(), Some("not_found"));
}

#[tokio::test]
async fn test_rate_limit_code_maps_onto_kind() {
    let dir = TempDir::new().unwrap();
    let cli = fake_cli(
        &dir,
        r#"echo '{"code": "too_many_requests", "message": "slow down"}' >&2
exit 2"#,
    );

    let transport = CliTransport::new(&cli, "https://api.example.test", None);
    let err = transport.run(&["projects".to_string()]).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::RateLimited);
}

#[tokio::test]
async fn test_unstructured_stderr_is_kept_verbatim() {
    let dir = TempDir::new().unwrap();
    let cli = fake_cli(
        &dir,
        r#"echo 'segfault in renderer' >&2
exit 3"#,
    );

    let transport = CliTransport::new(&cli, "https://api.example.test", None);
    let err = transport.run(&["projects".to_string()]).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Other);
    assert_eq!(err.message, "segfault in renderer");
    assert_eq!(err.code.as_deref(), Some("3"));
}

#[tokio::test]
async fn test_empty_stdout_is_null() {
    let dir = TempDir::new().unwrap();
    let cli = fake_cli(&dir, "exit 0");

    let transport = CliTransport::new(&cli, "https://api.example.test", None);
    let value = transport.run(&["comment".to_string(), "delete".to_string()]).await.unwrap();
    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn test_failing_cli_falls_back_to_next_transport() {
    let dir = TempDir::new().unwrap();
    let cli = fake_cli(
        &dir,
        r#"echo '{"code": "unauthorized", "message": "bad token"}' >&2
exit 1"#,
    );

    let client = Client::builder()
        .access_token("secret")
        .cli_path(cli)
        .api_url("http://127.0.0.1:9")
        .transports([TransportId::Cli, TransportId::Api])
        .build()
        .unwrap();

    let err = client.projects().info(&ProjectDescriptor::new("p1")).await.unwrap_err();
    assert_eq!(err.transport_error(TransportId::Cli).unwrap().kind, ErrorKind::Unauthorized);
    assert_eq!(
        err.transport_error(TransportId::Api).unwrap().kind,
        ErrorKind::TransportUnavailable
    );
}
