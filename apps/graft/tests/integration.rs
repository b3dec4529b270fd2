//! Integration tests for the graft CLI

use std::fs;
use std::path::Path;
use std::process::Command;

fn graft(cache: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_graft"));
    command
        .env_remove("RUST_LOG")
        .env_remove("GRAFT_OFFLINE")
        .env_remove("GRAFT_PARALLELISM")
        .env_remove("GRAFT_CHECKSUM")
        .env("GRAFT_CACHE_DIR", cache)
        .env("XDG_CONFIG_HOME", cache.join("config"));
    command
}

/// Lay out a tiny `file://` repository with `app` depending on `lib`
fn publish_repository(root: &Path) {
    let app = root.join("org/example/app/1.0");
    let lib = root.join("org/example/lib/2.0");
    fs::create_dir_all(&app).unwrap();
    fs::create_dir_all(&lib).unwrap();

    fs::write(
        app.join("app-1.0.pom"),
        r"<project>
  <groupId>org.example</groupId>
  <artifactId>app</artifactId>
  <version>1.0</version>
  <dependencies>
    <dependency>
      <groupId>org.example</groupId>
      <artifactId>lib</artifactId>
      <version>2.0</version>
    </dependency>
  </dependencies>
</project>",
    )
    .unwrap();
    fs::write(app.join("app-1.0.jar"), b"app classes").unwrap();
    fs::write(
        lib.join("lib-2.0.pom"),
        r"<project>
  <groupId>org.example</groupId>
  <artifactId>lib</artifactId>
  <version>2.0</version>
</project>",
    )
    .unwrap();
    fs::write(lib.join("lib-2.0.jar"), b"lib classes").unwrap();
}

fn repository_url(root: &Path) -> String {
    format!("file://{}/", root.display())
}

#[test]
fn test_cli_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_graft"))
        .arg("--version")
        .output()
        .expect("Failed to execute graft");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("graft"));
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_graft"))
        .arg("--help")
        .output()
        .expect("Failed to execute graft");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Maven and Gradle dependency resolver"));
    assert!(stdout.contains("resolve"));
    assert!(stdout.contains("tree"));
    assert!(stdout.contains("classpath"));
    assert!(stdout.contains("fetch"));
}

#[test]
fn test_cli_invalid_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_graft"))
        .arg("invalid-command")
        .output()
        .expect("Failed to execute graft");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn test_resolve_requires_coordinates() {
    let output = Command::new(env!("CARGO_BIN_EXE_graft"))
        .arg("resolve")
        .output()
        .expect("Failed to execute graft");

    assert!(!output.status.success());
}

#[test]
fn test_malformed_coordinate_rejected() {
    let output = Command::new(env!("CARGO_BIN_EXE_graft"))
        .args(["tree", "org.example:app"])
        .output()
        .expect("Failed to execute graft");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("org.example:app"));
}

#[test]
fn test_classpath_from_file_repository() {
    let repo = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    publish_repository(repo.path());

    let output = graft(cache.path())
        .args(["classpath", "org.example:app:1.0", "--repo"])
        .arg(repository_url(repo.path()))
        .output()
        .expect("Failed to execute graft");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let entries: Vec<&str> = stdout.trim().split(':').collect();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].ends_with("app-1.0.jar"));
    assert!(entries[1].ends_with("lib-2.0.jar"));
    assert_eq!(fs::read(entries[1]).unwrap(), b"lib classes");
}

#[test]
fn test_json_resolve_reports_units() {
    let repo = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    publish_repository(repo.path());

    let output = graft(cache.path())
        .args(["--json", "resolve", "org.example:app:1.0", "--repo"])
        .arg(repository_url(repo.path()))
        .output()
        .expect("Failed to execute graft");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["command"], "resolve");
    assert_eq!(json["summary"]["units"], 2);
    assert_eq!(json["summary"]["errors"], 0);
    assert_eq!(json["units"][0]["coordinate"], "org.example:app:1.0");
    assert_eq!(json["units"][0]["dependencies"][0], "org.example:lib:2.0");
}

#[test]
fn test_offline_reuses_cache_only() {
    let repo = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    publish_repository(repo.path());
    let url = repository_url(repo.path());

    // Nothing cached yet: the root is unavailable, which is only a warning
    // without network access
    let output = graft(cache.path())
        .args(["--json", "--offline", "resolve", "org.example:app:1.0", "--repo", &url])
        .output()
        .expect("Failed to execute graft");
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["summary"]["units"], 1);
    assert_eq!(json["summary"]["warnings"], 1);
    assert_eq!(json["units"][0]["source"], "unavailable");

    let output = graft(cache.path())
        .args(["fetch", "org.example:app:1.0", "--repo", &url])
        .output()
        .expect("Failed to execute graft");
    assert!(output.status.success());

    let output = graft(cache.path())
        .args(["--json", "--offline", "resolve", "org.example:app:1.0", "--repo", &url])
        .output()
        .expect("Failed to execute graft");
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["summary"]["units"], 2);
    assert_eq!(json["summary"]["warnings"], 0);
}

#[test]
fn test_unknown_root_is_an_error_online() {
    let repo = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    publish_repository(repo.path());

    let output = graft(cache.path())
        .args(["resolve", "org.example:missing:1.0", "--repo"])
        .arg(repository_url(repo.path()))
        .output()
        .expect("Failed to execute graft");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no descriptor or module metadata available"));
    assert!(stderr.contains("resolution recorded 1 error"));
}
