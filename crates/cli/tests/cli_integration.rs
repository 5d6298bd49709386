//! CLI integration tests for all subcommands.
//!
//! Uses `assert_cmd` to spawn the `statecase` binary and verify exit codes,
//! stdout content, and stderr content.
//!
//! Every test runs inside its own temporary directory so that a stray
//! `statecase.toml` or `.statecase/` store never leaks between tests.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper: create a Command for the `statecase` binary, rooted at `dir`.
fn statecase(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("statecase");
    cmd.current_dir(dir);
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

const SHOP_V1: &str = r#"{
  "version": "1.0",
  "applicationName": "shop",
  "metadata": { "generated": "2024-01-01T00:00:00Z" },
  "states": {
    "home": {
      "description": "Landing page",
      "actions": ["open-cart"],
      "transitions": { "open-cart": "cart" }
    },
    "cart": {
      "actions": ["back"],
      "transitions": { "back": "home" }
    }
  }
}"#;

const SHOP_V2: &str = r#"{
  "version": "1.1",
  "applicationName": "shop",
  "metadata": { "generated": "2024-02-01T00:00:00Z" },
  "states": {
    "home": {
      "description": "Landing page",
      "actions": ["open-cart"],
      "transitions": { "open-cart": "cart" }
    },
    "cart": {
      "actions": ["back", "pay"],
      "transitions": { "back": "home", "pay": "checkout" }
    },
    "checkout": {
      "description": "Checkout",
      "actions": ["done"],
      "transitions": { "done": "home" }
    }
  }
}"#;

const DANGLING: &str = r#"{
  "applicationName": "shop",
  "states": {
    "home": { "actions": ["go"], "transitions": { "go": "nowhere" } }
  }
}"#;

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    let dir = TempDir::new().unwrap();
    statecase(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Validate, diff, and version application state diagrams",
        ));
}

#[test]
fn version_exits_0() {
    let dir = TempDir::new().unwrap();
    statecase(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("statecase"));
}

// ──────────────────────────────────────────────
// 2. validate
// ──────────────────────────────────────────────

#[test]
fn validate_valid_diagram_exits_0() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "shop.json", SHOP_V1);
    statecase(dir.path())
        .args(["validate", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid: 0 error(s)"));
}

#[test]
fn validate_dangling_transition_exits_1() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "bad.json", DANGLING);
    statecase(dir.path())
        .args(["validate", file.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains(
            "State 'home' action 'go' targets missing state 'nowhere'",
        ));
}

#[test]
fn validate_json_output_lists_findings() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "bad.json", DANGLING);
    let output = statecase(dir.path())
        .args(["--output", "json", "validate", file.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["isValid"], false);
    let warnings = json["warnings"].as_array().unwrap();
    assert!(warnings
        .iter()
        .any(|w| w["level"] == "error" && w["field"] == "states.home.transitions.go"));
}

#[test]
fn validate_rejects_states_that_cannot_be_imported() {
    let dir = TempDir::new().unwrap();
    let file = write(
        dir.path(),
        "legacy.json",
        r#"{
          "applicationName": "shop",
          "states": {
            "home": { "actions": [], "transitions": {}, "implementation": "legacy" }
          }
        }"#,
    );
    statecase(dir.path())
        .args(["validate", file.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("unknown implementation \"legacy\""));

    statecase(dir.path())
        .args(["import", file.to_str().unwrap(), "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("import aborted"));
}

#[test]
fn validate_malformed_json_exits_1() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "broken.json", "{ not json");
    statecase(dir.path())
        .args(["validate", file.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error parsing"));
}

#[test]
fn validate_missing_application_name_exits_1() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "anon.json", r#"{ "states": {} }"#);
    statecase(dir.path())
        .args(["validate", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("applicationName"));
}

#[test]
fn validate_nonexistent_file_exits_1() {
    let dir = TempDir::new().unwrap();
    statecase(dir.path())
        .args(["validate", "missing.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error reading"));
}

#[test]
fn validate_empty_diagram_warns_but_passes() {
    let dir = TempDir::new().unwrap();
    let file = write(
        dir.path(),
        "empty.json",
        r#"{ "applicationName": "shop", "states": {} }"#,
    );
    statecase(dir.path())
        .args(["validate", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Diagram has no states"));
}

#[test]
fn validate_respects_configured_entry_points() {
    let dir = TempDir::new().unwrap();
    let file = write(
        dir.path(),
        "splash.json",
        r#"{
          "applicationName": "app",
          "states": {
            "menu": { "actions": ["x"], "transitions": { "x": "splash" } },
            "splash": { "actions": ["go"], "transitions": { "go": "menu" } }
          }
        }"#,
    );
    write(dir.path(), "statecase.toml", "entry_points = [\"splash\"]\n");

    // `splash` is the configured entry, so nothing is inferred.
    statecase(dir.path())
        .args(["validate", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("[info]").not());
}

#[test]
fn invalid_config_exits_1() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "shop.json", SHOP_V1);
    let config = write(dir.path(), "custom.toml", "retension = 3\n");
    statecase(dir.path())
        .args([
            "--config",
            config.to_str().unwrap(),
            "validate",
            file.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"));
}

// ──────────────────────────────────────────────
// 3. diff
// ──────────────────────────────────────────────

#[test]
fn diff_against_previous_file() {
    let dir = TempDir::new().unwrap();
    let v1 = write(dir.path(), "v1.json", SHOP_V1);
    let v2 = write(dir.path(), "v2.json", SHOP_V2);
    statecase(dir.path())
        .args([
            "diff",
            v2.to_str().unwrap(),
            "--previous",
            v1.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "1 added, 0 removed, 1 modified, 1 unchanged",
        ))
        .stdout(predicate::str::contains("+ checkout"))
        .stdout(predicate::str::contains("~ cart"))
        .stdout(predicate::str::contains("transition added: pay -> checkout"));
}

#[test]
fn diff_json_output_partitions_states() {
    let dir = TempDir::new().unwrap();
    let v1 = write(dir.path(), "v1.json", SHOP_V1);
    let v2 = write(dir.path(), "v2.json", SHOP_V2);
    let output = statecase(dir.path())
        .args([
            "--output",
            "json",
            "diff",
            v2.to_str().unwrap(),
            "--previous",
            v1.to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["added"], serde_json::json!(["checkout"]));
    assert_eq!(json["removed"], serde_json::json!([]));
    assert_eq!(json["unchanged"], serde_json::json!(["home"]));
    assert_eq!(json["modified"][0]["stateId"], "cart");
    assert_eq!(
        json["modified"][0]["changes"]["actionsAdded"],
        serde_json::json!(["pay"])
    );
}

#[test]
fn diff_with_empty_store_treats_every_state_as_new() {
    let dir = TempDir::new().unwrap();
    let v1 = write(dir.path(), "v1.json", SHOP_V1);
    statecase(dir.path())
        .args(["diff", v1.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("every state is new"))
        .stdout(predicate::str::contains("2 added, 0 removed"));
}

// ──────────────────────────────────────────────
// 4. import
// ──────────────────────────────────────────────

#[test]
fn import_without_yes_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let v1 = write(dir.path(), "v1.json", SHOP_V1);
    statecase(dir.path())
        .args(["import", v1.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Re-run with --yes"));

    statecase(dir.path())
        .args(["history", "shop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No stored versions of 'shop'."));
}

#[test]
fn import_invalid_diagram_aborts_without_saving() {
    let dir = TempDir::new().unwrap();
    let bad = write(dir.path(), "bad.json", DANGLING);
    statecase(dir.path())
        .args(["import", bad.to_str().unwrap(), "--yes"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("import aborted"));

    statecase(dir.path())
        .args(["latest", "shop"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no stored versions of 'shop'"));
}

#[test]
fn import_then_diff_against_store() {
    let dir = TempDir::new().unwrap();
    let v1 = write(dir.path(), "v1.json", SHOP_V1);
    let v2 = write(dir.path(), "v2.json", SHOP_V2);

    statecase(dir.path())
        .args(["import", v1.to_str().unwrap(), "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved statecase-states-shop-"))
        .stdout(predicate::str::contains(
            "TC-0001  [NEW] Verify new state: home (Landing page)",
        ));

    statecase(dir.path())
        .args(["diff", v2.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "1 added, 0 removed, 1 modified, 1 unchanged",
        ));
}

#[test]
fn import_writes_drafts_to_out_file() {
    let dir = TempDir::new().unwrap();
    let v1 = write(dir.path(), "v1.json", SHOP_V1);
    let v2 = write(dir.path(), "v2.json", SHOP_V2);
    let drafts = dir.path().join("drafts.json");

    statecase(dir.path())
        .args(["import", v1.to_str().unwrap(), "--yes"])
        .assert()
        .success();
    statecase(dir.path())
        .args([
            "import",
            v2.to_str().unwrap(),
            "--yes",
            "--policy",
            "transition-aware",
            "--out",
            drafts.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Drafts written to"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&drafts).unwrap()).unwrap();
    assert_eq!(json["applicationName"], "shop");
    let cases = json["testCases"].as_array().unwrap();
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0]["id"], "TC-0001");
    assert_eq!(cases[0]["codeChange"], "NEW");
    assert_eq!(cases[0]["testName"], "Verify new state: checkout (Checkout)");
    assert_eq!(cases[1]["id"], "TC-0002");
    assert_eq!(cases[1]["codeChange"], "MODIFIED_LOGIC");
    assert_eq!(cases[1]["stateId"], "cart");

    let functionality = json["existingFunctionality"].as_array().unwrap();
    assert_eq!(functionality.len(), 3);
    assert_eq!(functionality[2]["id"], "EF-0003");
}

#[test]
fn import_with_unwritable_out_saves_nothing() {
    let dir = TempDir::new().unwrap();
    let v1 = write(dir.path(), "v1.json", SHOP_V1);
    let out = dir.path().join("missing-dir").join("drafts.json");

    statecase(dir.path())
        .args(["import", v1.to_str().unwrap(), "--yes", "--out", out.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error writing"));

    statecase(dir.path())
        .args(["history", "shop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No stored versions of 'shop'."));

    // A retry still drafts every state as new.
    statecase(dir.path())
        .args(["import", v1.to_str().unwrap(), "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Drafted 2 test case(s)"));
}

#[test]
fn import_json_output_is_one_object() {
    let dir = TempDir::new().unwrap();
    let v1 = write(dir.path(), "v1.json", SHOP_V1);
    let output = statecase(dir.path())
        .args(["--output", "json", "import", v1.to_str().unwrap(), "--yes"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["applicationName"], "shop");
    assert_eq!(json["validation"]["isValid"], true);
    assert_eq!(json["diff"]["added"], serde_json::json!(["home", "cart"]));
    assert!(json["saved"]["key"]
        .as_str()
        .unwrap()
        .starts_with("statecase-states-shop-"));
    assert_eq!(json["drafts"]["testCases"].as_array().unwrap().len(), 2);
}

#[test]
fn import_evicts_beyond_retention() {
    let dir = TempDir::new().unwrap();
    let v1 = write(dir.path(), "v1.json", SHOP_V1);
    write(dir.path(), "statecase.toml", "retention = 1\n");

    statecase(dir.path())
        .args(["import", v1.to_str().unwrap(), "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Evicted").not());
    statecase(dir.path())
        .args(["import", v1.to_str().unwrap(), "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Evicted statecase-states-shop-"));
}

// ──────────────────────────────────────────────
// 5. history and latest
// ──────────────────────────────────────────────

#[test]
fn history_lists_newest_first() {
    let dir = TempDir::new().unwrap();
    let v1 = write(dir.path(), "v1.json", SHOP_V1);
    let v2 = write(dir.path(), "v2.json", SHOP_V2);
    for file in [&v1, &v2] {
        statecase(dir.path())
            .args(["--quiet", "import", file.to_str().unwrap(), "--yes"])
            .assert()
            .success();
    }

    let output = statecase(dir.path())
        .args(["--output", "json", "history", "shop"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["version"], "1.1");
    assert_eq!(entries[0]["stateCount"], 3);
    assert_eq!(entries[1]["version"], "1.0");
    assert!(entries[0]["timestamp"].as_u64() > entries[1]["timestamp"].as_u64());
}

#[test]
fn latest_prints_stored_diagram() {
    let dir = TempDir::new().unwrap();
    let v2 = write(dir.path(), "v2.json", SHOP_V2);
    statecase(dir.path())
        .args(["--quiet", "import", v2.to_str().unwrap(), "--yes"])
        .assert()
        .success();

    let output = statecase(dir.path())
        .args(["latest", "shop"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["applicationName"], "shop");
    let ids: Vec<&String> = json["states"].as_object().unwrap().keys().collect();
    assert_eq!(ids, vec!["home", "cart", "checkout"]);
}

#[test]
fn store_dir_flag_overrides_default_location() {
    let dir = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();
    let v1 = write(dir.path(), "v1.json", SHOP_V1);
    statecase(dir.path())
        .args([
            "--store-dir",
            store.path().to_str().unwrap(),
            "--quiet",
            "import",
            v1.to_str().unwrap(),
            "--yes",
        ])
        .assert()
        .success();

    assert!(!dir.path().join(".statecase").exists());
    statecase(dir.path())
        .args(["--store-dir", store.path().to_str().unwrap(), "latest", "shop"])
        .assert()
        .success();
}

#[test]
fn latest_unknown_app_exits_1() {
    let dir = TempDir::new().unwrap();
    statecase(dir.path())
        .args(["--output", "json", "latest", "nope"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("\"error\""));
}

#[test]
fn quiet_suppresses_output() {
    let dir = TempDir::new().unwrap();
    let bad = write(dir.path(), "bad.json", DANGLING);
    statecase(dir.path())
        .args(["--quiet", "validate", bad.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());
}
