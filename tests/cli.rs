//! Binary-level tests: exit codes and user-facing output.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn draftloop(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("draftloop").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("DRAFTLOOP_LLM_PROVIDER")
        .env_remove("GEMINI_API_KEY")
        .env_remove("OPENROUTER_API_KEY")
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("SERPER_API_KEY");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    draftloop(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("judge"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_shows_defaults_with_sources() {
    let dir = TempDir::new().unwrap();
    draftloop(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Effective configuration:"))
        .stdout(predicate::str::contains("llm_provider = gemini"))
        .stdout(predicate::str::contains("max_revisions = unlimited"));
}

#[test]
fn test_config_reports_cli_overrides() {
    let dir = TempDir::new().unwrap();
    draftloop(&dir)
        .args(["config", "--stage-timeout", "90"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stage_timeout = 90  (cli)"));
}

#[test]
fn test_stage_timeout_below_minimum_is_rejected() {
    let dir = TempDir::new().unwrap();
    draftloop(&dir)
        .args(["config", "--stage-timeout", "1"])
        .assert()
        .code(2);
}

#[test]
fn test_judge_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("article.md"), "Body").unwrap();
    draftloop(&dir)
        .args(["judge", "--outline", "missing.md", "--content", "article.md"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read outline file"));
}

#[test]
fn test_judge_without_api_key_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("outline.md"), "1. Intro").unwrap();
    std::fs::write(dir.path().join("article.md"), "Body").unwrap();
    draftloop(&dir)
        .args(["judge", "--outline", "outline.md", "--content", "article.md"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
}
