//! Session scaffolding, compliance and migration through the idse-gov binary

use assert_cmd::Command;
use idse_governance::layout::{ArtifactKind, PathResolver};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn idse_gov(root: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("idse-gov").unwrap();
    cmd.arg("--root").arg(root.path()).env_remove("LLM_ID");
    cmd
}

fn create_session(root: &TempDir, project: &str, session: &str) {
    idse_gov(root)
        .args(["create-session", project, session, "alice"])
        .assert()
        .success();
}

fn write_all_artifacts(root: &TempDir, project: &str, session: &str) {
    let resolver = PathResolver::new(root.path());
    for artifact in ArtifactKind::ALL {
        let path = resolver.canonical_path(project, session, artifact);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, format!("# {}\n\nFilled in.\n", artifact.key())).unwrap();
    }
}

#[test]
fn test_create_session_scaffolds_layout_and_pointer() {
    let root = TempDir::new().unwrap();

    idse_gov(&root)
        .args(["create-session", "Acme", "launch", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Session Acme/launch ready"));

    let session_root = root.path().join("projects/Acme/sessions/launch");
    for stage in ["intents", "contexts", "specs", "plans", "tasks", "implementation", "feedback"] {
        assert!(session_root.join(stage).is_dir(), "missing {stage}");
    }
    assert_eq!(
        fs::read_to_string(session_root.join("metadata/.owner")).unwrap().trim(),
        "alice"
    );
    let pointer = fs::read_to_string(root.path().join("projects/Acme/CURRENT_SESSION")).unwrap();
    assert!(pointer.contains("session_id: launch"));
}

#[test]
fn test_create_session_rejects_path_like_names() {
    let root = TempDir::new().unwrap();

    idse_gov(&root)
        .args(["create-session", "Acme", "../escape", "alice"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid session identifier"));
    assert!(!root.path().join("projects").exists());
}

#[test]
fn test_check_compliance_fails_with_exit_two_and_writes_reports() {
    let root = TempDir::new().unwrap();
    create_session(&root, "Acme", "launch");

    idse_gov(&root)
        .args(["check-compliance", "--project", "Acme", "--session", "launch"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("missing-artifact"))
        .stdout(predicate::str::contains("FAIL"));

    let report_dir = root.path().join("reports/projects/Acme/sessions/launch");
    let text = fs::read_to_string(report_dir.join("check-compliance-report.txt")).unwrap();
    assert!(text.contains("Overall: FAIL"));
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(report_dir.join("check-compliance-report.json")).unwrap())
            .unwrap();
    assert_eq!(json["project"], "Acme");
    assert!(!json["findings"].as_array().unwrap().is_empty());
}

#[test]
fn test_check_compliance_passes_for_complete_session_via_pointer() {
    let root = TempDir::new().unwrap();
    create_session(&root, "Acme", "launch");
    write_all_artifacts(&root, "Acme", "launch");

    idse_gov(&root)
        .args(["check-compliance", "--project", "Acme", "--accept-projects-pointer"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PASS"));
}

#[test]
fn test_non_utf8_artifact_still_produces_reports() {
    let root = TempDir::new().unwrap();
    create_session(&root, "Acme", "launch");
    write_all_artifacts(&root, "Acme", "launch");

    let resolver = PathResolver::new(root.path());
    fs::write(
        resolver.canonical_path("Acme", "launch", ArtifactKind::Implementation),
        b"# Impl\n\xff\xfe caf\xe9\n",
    )
    .unwrap();
    fs::remove_file(resolver.canonical_path("Acme", "launch", ArtifactKind::Spec)).unwrap();

    idse_gov(&root)
        .args(["check-compliance", "--project", "Acme", "--session", "launch"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("missing-artifact"));

    let report_dir = root.path().join("reports/projects/Acme/sessions/launch");
    let text = fs::read_to_string(report_dir.join("check-compliance-report.txt")).unwrap();
    assert!(text.contains("Overall: FAIL (1 errors, 0 warnings)"));
    assert!(report_dir.join("check-compliance-report.json").is_file());

    idse_gov(&root)
        .args(["validate-artifacts", "--project", "Acme", "--session", "launch"])
        .assert()
        .code(2);
    assert!(report_dir.join("validate-artifacts-report.txt").is_file());
}

#[test]
fn test_legacy_only_artifact_fails_even_with_grace_flag() {
    let root = TempDir::new().unwrap();
    create_session(&root, "Acme", "launch");
    write_all_artifacts(&root, "Acme", "launch");

    let resolver = PathResolver::new(root.path());
    let canonical = resolver.canonical_path("Acme", "launch", ArtifactKind::Plan);
    let legacy = resolver.legacy_path("Acme", "launch", ArtifactKind::Plan);
    fs::create_dir_all(legacy.parent().unwrap()).unwrap();
    fs::rename(&canonical, &legacy).unwrap();

    idse_gov(&root)
        .args(["check-compliance", "--project", "Acme", "--session", "launch", "--accept-stage-root"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("legacy-path"));
}

#[test]
fn test_migrate_dry_run_then_execute() {
    let root = TempDir::new().unwrap();
    let resolver = PathResolver::new(root.path());
    let legacy = resolver.legacy_path("Acme", "launch", ArtifactKind::Intent);
    fs::create_dir_all(legacy.parent().unwrap()).unwrap();
    fs::write(&legacy, "# Intent\n").unwrap();
    let canonical = resolver.canonical_path("Acme", "launch", ArtifactKind::Intent);

    idse_gov(&root)
        .args(["migrate", "--project", "Acme", "--session", "launch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dry-run"))
        .stdout(predicate::str::contains("--execute"));
    assert!(!canonical.exists());

    idse_gov(&root)
        .args(["migrate", "--project", "Acme", "--session", "launch", "--execute"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 copied"));
    assert_eq!(fs::read_to_string(&canonical).unwrap(), "# Intent\n");
    assert!(legacy.exists());
}

#[test]
fn test_status_reports_sessions_as_json() {
    let root = TempDir::new().unwrap();
    create_session(&root, "Acme", "launch");

    let output = idse_gov(&root)
        .args(["status", "--project", "Acme", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let status: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(status["current_session"], "launch");
    assert_eq!(status["sessions"][0]["owner"], "alice");
}

#[test]
fn test_status_for_unknown_project_fails() {
    let root = TempDir::new().unwrap();

    idse_gov(&root)
        .args(["status", "--project", "Ghost"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no sessions directory"));
}
