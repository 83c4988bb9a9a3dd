//! Tests for the `vault-aws-credential-protocol` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn bin() -> Command {
    let mut cmd = Command::cargo_bin("vault-aws-credential-protocol").unwrap();
    for var in [
        "VAULT_ADDR",
        "VAULT_TOKEN",
        "VAULT_NAMESPACE",
        "VAULT_CACERT",
        "VAULT_SKIP_VERIFY",
        "VAULT_CLIENT_TIMEOUT",
        "VAULT_AWS_MOUNT",
        "VAULT_AWS_ROLE",
        "VAULT_AWS_SESSION_NAME",
        "VAULT_AWS_CACHE_DIR",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help() {
    bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--mount"))
        .stdout(predicate::str::contains("--no-cache"))
        .stdout(predicate::str::contains("clear-cache"));
}

#[test]
fn test_missing_role_fails() {
    bin()
        .args(["--mount", "aws"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("--role"));
}

#[test]
fn test_missing_token_fails_without_output() {
    let home = tempdir().unwrap();

    bin()
        .env("HOME", home.path())
        .args(["-m", "aws", "-r", "deploy", "--cache-dir"])
        .arg(home.path().join("cache"))
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("no vault token"));
}

#[test]
fn test_clear_cache() {
    let dir = tempdir().unwrap();
    let cache_dir = dir.path().join("cache");
    std::fs::create_dir_all(&cache_dir).unwrap();
    std::fs::write(cache_dir.join("ENTRY"), "x").unwrap();

    bin()
        .arg("clear-cache")
        .arg("--cache-dir")
        .arg(&cache_dir)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert!(!cache_dir.exists());

    // clearing again is not an error
    bin()
        .args(["clear-cache", "--cache-dir"])
        .arg(&cache_dir)
        .assert()
        .success();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_prints_credentials_and_caches_them() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/aws/sts/deploy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lease_duration": 3600,
            "data": {
                "access_key": "ASIACLI",
                "secret_key": "cli-secret",
                "security_token": "cli-token"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let cache_dir = dir.path().join("cache");
    let addr = server.uri();

    let run = move || {
        let output = bin()
            .env("VAULT_ADDR", &addr)
            .env("VAULT_TOKEN", "hvs.cli")
            .args(["--mount", "aws", "--role", "deploy", "--cache-dir"])
            .arg(&cache_dir)
            .output()
            .unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap()
    };

    let (first, second) = tokio::task::spawn_blocking(move || (run(), run()))
        .await
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&first).unwrap();
    assert_eq!(value["Version"], 1);
    assert_eq!(value["AccessKeyId"], "ASIACLI");
    assert_eq!(value["SecretAccessKey"], "cli-secret");
    assert_eq!(value["SessionToken"], "cli-token");

    // second run is served from the cache; the mock expects one request
    assert_eq!(first, second);
}
