//! E2E tests for failure paths: exit codes, error text, and hints.

mod common;

use assert_cmd::Command;
use common::Repo;
use predicates::prelude::*;

#[test]
fn report_without_a_registry_suggests_building_one() {
    let repo = Repo::pets();
    repo.cmd()
        .arg("report")
        .assert()
        .failure()
        .stderr(predicate::str::contains("registry missing"))
        .stderr(predicate::str::contains("nodekeep registry build"));
}

#[test]
fn impact_for_an_unknown_component_fails_with_hint() {
    let repo = Repo::pets().built();
    repo.cmd()
        .args(["impact", "ghostNode"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("node 'ghostNode' is not in the registry"))
        .stderr(predicate::str::contains("nodekeep registry list"));
}

#[test]
fn malformed_config_is_fatal() {
    let repo = Repo::pets();
    repo.write("nodekeep.toml", "[metrics]\nhistory_cap = \"many\"\n");
    repo.cmd()
        .args(["registry", "build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"))
        .stderr(predicate::str::contains("nodekeep.toml"));
    assert!(!repo.join(".nodekeep/registry.json").exists());
}

#[test]
fn explicit_config_must_exist() {
    let repo = Repo::pets();
    repo.cmd()
        .arg("--config")
        .arg(repo.join("missing.toml"))
        .args(["registry", "build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.toml"));
}

#[test]
fn duplicate_strategies_in_config_are_rejected() {
    let repo = Repo::pets().built();
    repo.write(
        "nodekeep.toml",
        r#"[syntax]
checker = ""

[[fix.strategies]]
name = "a"
kind = "broken-link"
fixer = "x"
confidence = 10

[[fix.strategies]]
name = "b"
kind = "broken-link"
fixer = "y"
confidence = 10
"#,
    );
    repo.cmd()
        .arg("scan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid [fix] strategies in config"));
}

#[test]
fn corrupt_metrics_are_fatal_for_trend_only() {
    let repo = Repo::clean().built();
    repo.write(".nodekeep/metrics.json", "{ not json");
    repo.cmd()
        .arg("trend")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Hints:"));
    repo.cmd().arg("report").assert().success();
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    Command::new(env!("CARGO_BIN_EXE_nodekeep"))
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
