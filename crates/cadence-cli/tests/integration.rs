use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use cadence_core::config::{Config, GateCheck, ModeConfig};
use cadence_core::engine::EngineSnapshot;

fn cadence(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cadence").unwrap();
    cmd.env("CADENCE_ROOT", dir.path());
    cmd
}

fn init_project(dir: &TempDir) {
    cadence(dir).arg("init").assert().success();
}

/// Run `cadence <args> --json` and parse stdout.
fn json_output(dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = cadence(dir).args(args).arg("--json").output().unwrap();
    assert!(
        output.status.success(),
        "command {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn start_instance(dir: &TempDir, template: &str) -> String {
    let instance = json_output(dir, &["start", template]);
    instance["id"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config_and_state() {
    let dir = TempDir::new().unwrap();
    cadence(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .cadence/config.yaml"))
        .stdout(predicate::str::contains("created: .cadence/state.yaml"));

    assert!(dir.path().join(".cadence/config.yaml").exists());
    assert!(dir.path().join(".cadence/state.yaml").exists());
}

#[test]
fn init_twice_leaves_files_alone() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    cadence(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:  .cadence/config.yaml"));
}

#[test]
fn commands_fail_before_init() {
    let dir = TempDir::new().unwrap();
    cadence(&dir)
        .args(["template", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[test]
fn template_list_shows_builtins() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    cadence(&dir)
        .args(["template", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("team"))
        .stdout(predicate::str::contains("tdd"));
}

#[test]
fn template_add_then_show() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    cadence(&dir)
        .args([
            "template",
            "add",
            "release",
            "--phases",
            "freeze, bake, ship",
            "--kind",
            "pipeline",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 phases"));

    cadence(&dir)
        .args(["template", "show", "release"])
        .assert()
        .success()
        .stdout(predicate::str::contains("freeze"))
        .stdout(predicate::str::contains("ship"));
}

#[test]
fn template_add_duplicate_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    cadence(&dir)
        .args(["template", "add", "team", "--phases", "a,b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn template_add_rejects_bad_slug() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    cadence(&dir)
        .args(["template", "add", "Bad_Slug", "--phases", "a,b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid slug"));
}

// ---------------------------------------------------------------------------
// Workflow lifecycle
// ---------------------------------------------------------------------------

#[test]
fn start_places_instance_at_first_phase() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let instance = json_output(&dir, &["start", "team"]);
    assert_eq!(instance["template_id"], "team");
    assert_eq!(instance["current_phase"], "plan");
    assert_eq!(instance["status"], "running");
}

#[test]
fn start_unknown_template_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    cadence(&dir)
        .args(["start", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("template not found"));
}

#[test]
fn start_stores_the_context() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let instance = json_output(&dir, &["start", "team", "--context", r#"{"ticket":"ABC-1"}"#]);
    assert_eq!(instance["context"]["ticket"], "ABC-1");
}

#[test]
fn malformed_context_is_rejected() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    cadence(&dir)
        .args(["start", "team", "--context", "{oops"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse --context"));
}

#[test]
fn advance_walks_to_completion() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let id = start_instance(&dir, "tdd");

    let after_first = json_output(&dir, &["advance", &id]);
    assert_eq!(after_first["current_phase"], "green");
    assert_eq!(after_first["status"], "running");

    let after_second = json_output(&dir, &["advance", &id]);
    assert_eq!(after_second["current_phase"], "refactor");
    assert_eq!(after_second["status"], "completed");
}

#[test]
fn advance_after_completion_is_a_noop() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let id = start_instance(&dir, "tdd");
    json_output(&dir, &["advance", &id]);
    json_output(&dir, &["advance", &id]);

    let again = json_output(&dir, &["advance", &id]);
    assert_eq!(again["current_phase"], "refactor");

    let stats = json_output(&dir, &["stats"]);
    assert_eq!(stats["total_transitions"], 2);
}

#[test]
fn advance_unknown_instance_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    cadence(&dir)
        .args(["advance", "no-such-id"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("instance not found"));
}

#[test]
fn jump_moves_backwards() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let id = start_instance(&dir, "tdd");
    json_output(&dir, &["advance", &id]);

    let instance = json_output(&dir, &["jump", &id, "red"]);
    assert_eq!(instance["current_phase"], "red");
    assert_eq!(instance["status"], "running");
}

#[test]
fn jump_to_foreign_phase_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let id = start_instance(&dir, "tdd");
    cadence(&dir)
        .args(["jump", &id, "ship"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid transition"));
}

#[test]
fn instance_list_hides_completed_by_default() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let done = start_instance(&dir, "tdd");
    let live = start_instance(&dir, "team");
    json_output(&dir, &["advance", &done]);
    json_output(&dir, &["advance", &done]);

    let active = json_output(&dir, &["instance", "list"]);
    let ids: Vec<&str> = active
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![live.as_str()]);

    let all = json_output(&dir, &["instance", "list", "--all"]);
    assert_eq!(all.as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Gates
// ---------------------------------------------------------------------------

#[test]
fn gate_blocks_until_context_satisfies_it() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let mut config = Config::load(dir.path()).unwrap();
    config
        .gates
        .insert("exec".into(), vec![GateCheck::RequireKey { key: "prd_done".into() }]);
    config.save(dir.path()).unwrap();

    let blocked = start_instance(&dir, "team");
    json_output(&dir, &["advance", &blocked]);
    cadence(&dir)
        .args(["advance", &blocked])
        .assert()
        .failure()
        .stderr(predicate::str::contains("gate rejected"));

    let ready = json_output(
        &dir,
        &["start", "team", "--context", r#"{"prd_done":true}"#],
    );
    let id = ready["id"].as_str().unwrap().to_string();
    json_output(&dir, &["advance", &id]);
    let instance = json_output(&dir, &["advance", &id]);
    assert_eq!(instance["current_phase"], "exec");
}

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

#[test]
fn detect_finds_mode_from_keywords() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    cadence(&dir)
        .args(["detect", "please build me a feature"])
        .assert()
        .success()
        .stdout(predicate::str::contains("autopilot"));
}

#[test]
fn detect_reports_no_match() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let value = json_output(&dir, &["detect", "hello world"]);
    assert!(value["mode"].is_null());
}

#[test]
fn trigger_runs_the_detected_mode() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let value = json_output(
        &dir,
        &["trigger", "don't stop until it's done", "--config", r#"{"goal":"ship"}"#],
    );
    assert_eq!(value["mode"], "ralph");
    assert_eq!(value["result"]["config"]["goal"], "ship");
}

#[test]
fn mode_start_runs_a_configured_command() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let mut config = Config::load(dir.path()).unwrap();
    config.modes.push(ModeConfig {
        name: "capture".into(),
        patterns: vec!["capture".into()],
        command: Some("cat".into()),
    });
    config.save(dir.path()).unwrap();

    let value = json_output(&dir, &["mode", "start", "capture", "--config", r#"{"x":1}"#]);
    assert_eq!(value["result"]["exit_code"], 0);
    assert!(value["result"]["stdout"]
        .as_str()
        .unwrap()
        .contains("\"x\":1"));
}

#[test]
fn mode_start_unknown_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    cadence(&dir)
        .args(["mode", "start", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("mode not found"));
}

#[test]
fn mode_list_shows_patterns() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    cadence(&dir)
        .args(["mode", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("autopilot"))
        .stdout(predicate::str::contains("don't stop"));
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[test]
fn stats_count_workflows_and_transitions() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    start_instance(&dir, "team");
    let id = start_instance(&dir, "tdd");
    json_output(&dir, &["advance", &id]);
    json_output(&dir, &["advance", &id]);

    let stats = json_output(&dir, &["stats"]);
    assert_eq!(stats["total_workflows"], 2);
    assert_eq!(stats["active_workflows"], 1);
    assert_eq!(stats["completed_workflows"], 1);
    assert_eq!(stats["total_transitions"], 2);
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[test]
fn config_validate_passes_on_fresh_project() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    cadence(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_flags_duplicate_templates() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let mut config = Config::load(dir.path()).unwrap();
    let copy = config.templates[0].clone();
    config.templates.push(copy);
    config.save(dir.path()).unwrap();

    cadence(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"));
}

#[test]
fn config_validate_warns_on_unknown_gate_stage() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let mut config = Config::load(dir.path()).unwrap();
    config
        .gates
        .insert("nonexistent".into(), vec![GateCheck::Truthy { key: "ok".into() }]);
    config.save(dir.path()).unwrap();

    cadence(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[warning]"));
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn state_survives_between_invocations() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let id = start_instance(&dir, "team");
    json_output(&dir, &["advance", &id]);

    let raw = std::fs::read_to_string(dir.path().join(".cadence/state.yaml")).unwrap();
    let snapshot: EngineSnapshot = serde_yaml::from_str(&raw).unwrap();
    assert_eq!(snapshot.instances.len(), 1);
    assert_eq!(snapshot.instances[0].current_phase, "prd");

    let shown = json_output(&dir, &["instance", "show", &id]);
    assert_eq!(shown["current_phase"], "prd");
}
