//! End-to-end CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn bonetexture() -> Command {
    let mut cmd = Command::cargo_bin("bonetexture").expect("binary not found");
    cmd.env_remove("BONETEXTURE_SCAN")
        .env_remove("BONETEXTURE_MASK")
        .env_remove("BONETEXTURE_FILTER_DIR")
        .env("NO_COLOR", "1");
    cmd
}

fn write_json(dir: &Path, name: &str, value: &serde_json::Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

/// A 2x2 scan spanning -500..3000 inside label 1, and its mask.
fn scan_and_mask(dir: &Path) -> (PathBuf, PathBuf) {
    let scan = write_json(
        dir,
        "scan.json",
        &serde_json::json!({
            "path": "scan.nrrd",
            "dimensions": [2, 2],
            "spacing": [0.5, 0.5],
            "origin": [0.0, 0.0],
            "voxels": [-500.0, 3000.0, 120.0, 9000.0]
        }),
    );
    let mask = write_json(
        dir,
        "mask.json",
        &serde_json::json!({
            "path": "mask.nrrd",
            "dimensions": [2, 2],
            "spacing": [0.5, 0.5],
            "origin": [0.0, 0.0],
            "labels": [1, 1, 1, 0]
        }),
    );
    (scan, mask)
}

#[test]
fn help_flag() {
    bonetexture()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--suggest-only"));
}

#[test]
fn version_flag() {
    bonetexture()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bonetexture"));
}

#[test]
fn completion_bash() {
    bonetexture()
        .args(["--completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bonetexture"));
}

#[test]
fn suggest_only_uses_masked_region() {
    let dir = tempfile::tempdir().unwrap();
    let (scan, mask) = scan_and_mask(dir.path());
    bonetexture()
        .arg("--scan")
        .arg(&scan)
        .arg("--mask")
        .arg(&mask)
        .arg("--suggest-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("binNumber = 400"))
        .stdout(predicate::str::contains("pixelIntensityMin = -500"))
        .stdout(predicate::str::contains("pixelIntensityMax = 3000"));
}

#[test]
fn suggest_only_without_mask_uses_whole_scan() {
    let dir = tempfile::tempdir().unwrap();
    let (scan, _) = scan_and_mask(dir.path());
    bonetexture()
        .arg("--scan")
        .arg(&scan)
        .arg("--suggest-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("binNumber = 1000"));
}

#[test]
fn missing_scan_is_input_error() {
    bonetexture()
        .arg("--suggest-only")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("please specify an input scan"));
}

#[test]
fn mismatched_mask_is_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let (scan, _) = scan_and_mask(dir.path());
    let mask = write_json(
        dir.path(),
        "small.json",
        &serde_json::json!({
            "path": "small.nrrd",
            "dimensions": [2, 1],
            "spacing": [0.5, 0.5],
            "origin": [0.0, 0.0]
        }),
    );
    bonetexture()
        .arg("--scan")
        .arg(&scan)
        .arg("--mask")
        .arg(&mask)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("must be the same size"));
}

#[test]
fn empty_selection_is_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let (scan, mask) = scan_and_mask(dir.path());
    bonetexture()
        .arg("--scan")
        .arg(&scan)
        .arg("--mask")
        .arg(&mask)
        .args(["--features", ""])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("at least one type of features"));
}

#[test]
fn unknown_family_is_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let (scan, _) = scan_and_mask(dir.path());
    bonetexture()
        .arg("--scan")
        .arg(&scan)
        .args(["--features", "glcm,lbp"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("unknown filter kind: lbp"));
}

#[test]
fn missing_filter_executable() {
    let dir = tempfile::tempdir().unwrap();
    let (scan, mask) = scan_and_mask(dir.path());
    let filters = tempfile::tempdir().unwrap();
    bonetexture()
        .arg("--scan")
        .arg(&scan)
        .arg("--mask")
        .arg(&mask)
        .arg("--filter-dir")
        .arg(filters.path())
        .args(["--features", "bm"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("computeBMFeatures"));
}

#[test]
fn invalid_timeout_is_rejected() {
    bonetexture().args(["--timeout", "soon"]).assert().failure();
}

#[cfg(unix)]
mod with_filters {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn install(dir: &Path, name: &str, output: &str) {
        let script = format!(
            "#!/bin/sh\nwhile [ $# -gt 0 ]; do\n  if [ \"$1\" = \"--returnparameterfile\" ]; then\n    echo \"outputVector = {output}\" > \"$2\"\n  fi\n  shift\ndone\n"
        );
        let path = dir.join(name);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn computes_and_exports_csv() {
        let dir = tempfile::tempdir().unwrap();
        let (scan, mask) = scan_and_mask(dir.path());
        let filters = tempfile::tempdir().unwrap();
        install(filters.path(), "computeBMFeatures", "0.25,0.1,0.4,2.5,12");
        let csv = dir.path().join("features.csv");

        bonetexture()
            .arg("--scan")
            .arg(&scan)
            .arg("--mask")
            .arg(&mask)
            .arg("--filter-dir")
            .arg(filters.path())
            .args(["--features", "bm", "--suggest", "-q", "--timeout", "30s"])
            .arg("--output")
            .arg(&csv)
            .assert()
            .success()
            .stdout(predicate::str::contains("TbN"));

        let text = std::fs::read_to_string(&csv).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[4], "BVTV,TbTh,TbSp,TbN,BSBV");
        assert_eq!(lines[5], "0.25,0.1,0.4,2.5,12");
    }

    #[test]
    fn summary_reports_success() {
        let dir = tempfile::tempdir().unwrap();
        let (scan, mask) = scan_and_mask(dir.path());
        let filters = tempfile::tempdir().unwrap();
        install(filters.path(), "computeBMFeatures", "0.25,0.1,0.4,2.5,12");

        bonetexture()
            .arg("--scan")
            .arg(&scan)
            .arg("--mask")
            .arg(&mask)
            .arg("--filter-dir")
            .arg(filters.path())
            .args(["--features", "bm", "--timeout", "30s"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[OK]\n"))
            .stdout(predicate::str::contains("[OK] 1 job(s) completed"));
    }

    #[test]
    fn malformed_output_fails_job() {
        let dir = tempfile::tempdir().unwrap();
        let (scan, mask) = scan_and_mask(dir.path());
        let filters = tempfile::tempdir().unwrap();
        install(filters.path(), "computeGLCMFeatures", "1,2,3");

        bonetexture()
            .arg("--scan")
            .arg(&scan)
            .arg("--mask")
            .arg(&mask)
            .arg("--filter-dir")
            .arg(filters.path())
            .args(["--features", "glcm", "-q", "--timeout", "30s"])
            .assert()
            .code(5)
            .stderr(predicate::str::contains("expected 8 components, got 3"));
    }
}
