//! Integration tests for packinfo-cli.
//!
//! Note: Tests use `unwrap`/`expect` which is acceptable in test code.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use flate2::Compression;
use flate2::write::GzEncoder;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use tempfile::TempDir;

const CONFIG: &str = r"
version: '0.8'
runs:
- architecture: sparc64
  distribution: [debian, '12']
  argv: [./simulate, --steps, '10']
  workingdir: /srv/sim
  exitcode: 0
inputs_outputs:
- {name: params, path: /srv/sim/params.txt, read_by_runs: [0]}
- {name: trace, path: /srv/sim/trace.log, written_by_runs: [0]}
packages: []
other_files: [/srv/sim/simulate]
";

fn packinfo_cmd() -> Command {
    cargo_bin_cmd!("packinfo")
}

fn append(builder: &mut tar::Builder<GzEncoder<fs::File>>, path: &str, data: &[u8]) {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, path, data).unwrap();
}

/// Writes a gzip pack holding `config` (if any) and a single data file.
fn create_pack(dir: &Path, config: Option<&str>) -> PathBuf {
    let path = dir.join("experiment.rpz");
    let file = fs::File::create(&path).expect("failed to create pack");
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

    if let Some(config) = config {
        append(&mut builder, "METADATA/config.yml", config.as_bytes());
    }
    append(&mut builder, "DATA/srv/sim/simulate", b"#!/bin/sh\necho simulated\n");

    builder.into_inner().unwrap().finish().unwrap();
    path
}

#[test]
fn test_version_flag() {
    packinfo_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("packinfo"));
}

#[test]
fn test_help_flag() {
    packinfo_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("cltools"));
}

/// An architecture no host runs on only makes unpackers incompatible; the
/// command itself still succeeds.
#[test]
fn test_info_succeeds_with_incompatible_unpackers() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let pack = create_pack(temp.path(), Some(CONFIG));

    packinfo_cmd()
        .arg("info")
        .arg(&pack)
        .assert()
        .success()
        .stdout(predicate::str::contains("----- Pack information -----"))
        .stdout(predicate::str::contains("Total packed paths: 1"))
        .stdout(predicate::str::contains("Executions (1):"))
        .stdout(predicate::str::contains("    ./simulate --steps 10"))
        .stdout(predicate::str::contains("        input files: params"))
        .stdout(predicate::str::contains("        output files: trace"))
        .stdout(predicate::str::contains("----- Unpackers -----"));
}

#[test]
fn test_info_without_metadata_fails() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let pack = create_pack(temp.path(), None);

    packinfo_cmd()
        .arg("info")
        .arg(&pack)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid pack metadata"))
        .stderr(predicate::str::contains("HINT"));
}

#[test]
fn test_info_missing_pack_fails() {
    let temp = TempDir::new().expect("failed to create temp dir");

    packinfo_cmd()
        .arg("info")
        .arg(temp.path().join("nope.rpz"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("I/O error"));
}

#[test]
fn test_info_json_output() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let pack = create_pack(temp.path(), Some(CONFIG));

    let output = packinfo_cmd()
        .arg("--json")
        .arg("info")
        .arg(&pack)
        .output()
        .expect("failed to run packinfo");
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is not JSON");
    assert_eq!(json["operation"], "info");
    assert_eq!(json["status"], "success");
    assert_eq!(json["data"]["pack"]["total_paths"], 1);
    assert_eq!(json["data"]["metadata"]["total_paths"], 1);
    assert_eq!(json["data"]["architecture"], "sparc64");
    assert_eq!(json["data"]["runs"][0]["termination"], "exitcode: 0");
}

#[test]
fn test_cltools_writes_modules() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let pack = create_pack(temp.path(), Some(CONFIG));
    let vistrails = temp.path().join("vistrails");

    packinfo_cmd()
        .arg("cltools")
        .arg(&pack)
        .arg("--vistrails-dir")
        .arg(&vistrails)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 1 CLTools module(s)"));

    let modules: Vec<PathBuf> = fs::read_dir(vistrails.join("CLTools"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].extension().unwrap(), "clt");

    let descriptor: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&modules[0]).unwrap()).unwrap();
    assert_eq!(descriptor["command"], "reprounzip-vistrails");
    assert_eq!(descriptor["args"][2][1], "input params");
    assert_eq!(descriptor["args"][3][1], "output trace");
}

#[test]
fn test_cltools_uses_home_by_default() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let pack = create_pack(temp.path(), Some(CONFIG));
    let home = temp.path().join("home");
    fs::create_dir(&home).unwrap();

    packinfo_cmd()
        .env("HOME", &home)
        .arg("cltools")
        .arg(&pack)
        .arg("--command")
        .arg("python -m reprounzip.plugins.vistrails")
        .assert()
        .success();

    let dir = home.join(".vistrails").join("CLTools");
    assert_eq!(fs::read_dir(dir).unwrap().count(), 1);
}

/// A pack without runs yields a warning; stdout must still hold exactly one
/// JSON document.
#[test]
fn test_cltools_json_stdout_is_single_document() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let pack = create_pack(temp.path(), Some("version: '0.8'\n"));

    let output = packinfo_cmd()
        .arg("--json")
        .arg("cltools")
        .arg(&pack)
        .arg("--vistrails-dir")
        .arg(temp.path().join("vistrails"))
        .output()
        .expect("failed to run packinfo");
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is not a single JSON document");
    assert_eq!(json["operation"], "cltools");
    assert_eq!(json["data"]["modules"], serde_json::json!([]));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no recorded runs"));
}

#[test]
fn test_vistrails_run_dry_run_prints_plan() {
    let temp = TempDir::new().expect("failed to create temp dir");

    packinfo_cmd()
        .arg("vistrails-run")
        .arg("docker")
        .arg(temp.path())
        .arg("--input-file")
        .arg("params:/data/params.txt")
        .arg("--output-file")
        .arg("trace:/data/out:trace.log")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::diff(
            "reprounzip docker upload . /data/params.txt:params\n\
             reprounzip docker run .\n\
             reprounzip docker download . trace:/data/out:trace.log\n",
        ));
}

#[test]
fn test_vistrails_run_rejects_binding_without_colon() {
    let temp = TempDir::new().expect("failed to create temp dir");

    packinfo_cmd()
        .arg("vistrails-run")
        .arg("docker")
        .arg(temp.path())
        .arg("--input-file")
        .arg("params")
        .arg("--dry-run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected NAME:PATH"));
}

/// Runs a stand-in front end that records its arguments, working directory
/// and environment for every step.
#[cfg(unix)]
#[test]
fn test_vistrails_run_invokes_launcher() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let unpacked = temp.path().join("unpacked");
    fs::create_dir(&unpacked).unwrap();
    let log = temp.path().join("calls.log");
    let script = temp.path().join("fake-reprounzip.sh");
    fs::write(
        &script,
        format!(
            "echo \"$(pwd -P)|$REPROUNZIP_NON_INTERACTIVE|$*\" >> '{}'\n",
            log.display()
        ),
    )
    .unwrap();
    let launcher = format!("sh {}", script.display());

    packinfo_cmd()
        .arg("vistrails-run")
        .arg("directory")
        .arg(&unpacked)
        .arg("--input-file")
        .arg("params:/data/params.txt")
        .arg("--output-file")
        .arg("trace:/data/trace.log")
        .arg("--launcher")
        .arg(&launcher)
        .assert()
        .success()
        .stdout(predicate::str::contains("Replayed 3 step(s)"));

    let unpacked = unpacked.canonicalize().unwrap();
    let calls = fs::read_to_string(&log).unwrap();
    let calls: Vec<&str> = calls.lines().collect();
    assert_eq!(
        calls,
        [
            format!("{}|y|directory upload . /data/params.txt:params", unpacked.display()),
            format!("{}|y|directory run .", unpacked.display()),
            format!("{}|y|directory download . trace:/data/trace.log", unpacked.display()),
        ]
    );
}

#[test]
fn test_vistrails_run_failing_step() {
    let temp = TempDir::new().expect("failed to create temp dir");

    packinfo_cmd()
        .arg("vistrails-run")
        .arg("docker")
        .arg(temp.path())
        .arg("--launcher")
        .arg("packinfo-no-such-launcher-7c2e")
        .assert()
        .failure()
        .stderr(predicate::str::contains("HINT"));
}

#[test]
fn test_completion_bash() {
    packinfo_cmd()
        .arg("completion")
        .arg("bash")
        .assert()
        .success()
        .stdout(predicate::str::contains("packinfo"));
}
