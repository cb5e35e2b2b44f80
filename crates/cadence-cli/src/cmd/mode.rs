use std::io::Write as _;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::Context as _;
use cadence_core::config::Config;
use cadence_core::detector::KeywordDetector;
use cadence_core::mode::ExecutionModeManager;
use cadence_core::{CadenceError, Result as CoreResult};
use clap::Subcommand;
use serde_json::{json, Value};

use crate::output;

#[derive(Subcommand)]
pub enum ModeSubcommand {
    /// List configured modes and their trigger patterns
    List,

    /// Run a mode directly, bypassing keyword detection
    Start {
        /// Mode name
        name: String,

        /// Mode configuration as JSON, passed through to the handler
        #[arg(long)]
        config: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: ModeSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ModeSubcommand::List => list(root, json),
        ModeSubcommand::Start { name, config } => start(root, &name, config.as_deref(), json),
    }
}

/// Build the keyword detector from the configured modes, preserving config
/// order so ties resolve to the mode listed first.
pub fn build_detector(config: &Config) -> KeywordDetector {
    let mut detector = KeywordDetector::new();
    for mode in &config.modes {
        for pattern in &mode.patterns {
            detector.add_keyword(&mode.name, pattern);
        }
    }
    detector
}

/// Build the mode manager from the configured modes. A mode with a command
/// runs it through `sh -c` with the config JSON on stdin; a mode without
/// one just echoes its invocation.
pub fn build_manager(config: &Config) -> ExecutionModeManager {
    let mut manager = ExecutionModeManager::with_policy(config.exclusivity);
    for mode in &config.modes {
        match &mode.command {
            Some(command) => manager.register_mode(
                &mode.name,
                shell_handler(mode.name.clone(), command.clone()),
            ),
            None => manager.register_mode(&mode.name, echo_handler(mode.name.clone())),
        }
    }
    manager
}

/// Handler for modes that declare a command. The command runs under `sh -c`
/// with the mode config as JSON on stdin. Stderr flows through so the
/// command's log lines appear in the terminal.
fn shell_handler(
    name: String,
    command: String,
) -> impl Fn(&Value) -> CoreResult<Value> + Send + Sync {
    move |config: &Value| {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| CadenceError::ModeFailed(format!("failed to spawn '{command}': {e}")))?;

        let payload = serde_json::to_string(config)?;
        if let Some(stdin) = child.stdin.as_mut() {
            stdin
                .write_all(payload.as_bytes())
                .map_err(|e| CadenceError::ModeFailed(format!("failed to write stdin: {e}")))?;
        }

        let out = child
            .wait_with_output()
            .map_err(|e| CadenceError::ModeFailed(e.to_string()))?;
        let stdout = String::from_utf8_lossy(&out.stdout).trim().to_string();

        if !out.status.success() {
            return Err(CadenceError::ModeFailed(format!(
                "mode '{name}' exited with {}",
                out.status
            )));
        }

        Ok(json!({
            "mode": name,
            "exit_code": out.status.code(),
            "stdout": stdout,
        }))
    }
}

/// Handler for modes without a command. Echoes the invocation so detection
/// and exclusivity can be exercised without side effects.
fn echo_handler(name: String) -> impl Fn(&Value) -> CoreResult<Value> + Send + Sync {
    move |config: &Value| {
        Ok(json!({
            "mode": name,
            "config": config,
        }))
    }
}

/// Parse `--config` as arbitrary JSON. `None` means an empty object.
fn parse_mode_config(raw: Option<&str>) -> anyhow::Result<Value> {
    match raw {
        Some(raw) => serde_json::from_str(raw).context("failed to parse --config as JSON"),
        None => Ok(json!({})),
    }
}

pub fn detect(root: &Path, text: &str, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root)?;
    let detector = build_detector(&config);
    let detected = detector.detect(text);

    if json {
        return output::print_json(&json!({ "mode": detected }));
    }
    match detected {
        Some(mode) => println!("{mode}"),
        None => println!("no mode matched"),
    }
    Ok(())
}

pub fn trigger(
    root: &Path,
    text: &str,
    config_json: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let mode_config = parse_mode_config(config_json)?;
    let config = Config::load(root)?;
    let detector = build_detector(&config);

    let Some(mode) = detector.detect(text) else {
        if json {
            return output::print_json(&json!({ "mode": null, "result": null }));
        }
        println!("no mode matched");
        return Ok(());
    };
    let mode = mode.to_string();

    let mut manager = build_manager(&config);
    let result = manager
        .start_mode(&mode, &mode_config)
        .with_context(|| format!("mode '{mode}' failed"))?;

    if json {
        return output::print_json(&json!({ "mode": mode, "result": result }));
    }
    println!("Triggered mode '{mode}'.");
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root)?;

    if json {
        return output::print_json(&config.modes);
    }

    if config.modes.is_empty() {
        println!("No modes configured.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = config
        .modes
        .iter()
        .map(|m| {
            vec![
                m.name.clone(),
                m.patterns.join(", "),
                m.command.clone().unwrap_or_else(|| "(echo)".to_string()),
            ]
        })
        .collect();
    output::print_table(&["NAME", "PATTERNS", "COMMAND"], &rows);
    Ok(())
}

fn start(root: &Path, name: &str, config_json: Option<&str>, json: bool) -> anyhow::Result<()> {
    let mode_config = parse_mode_config(config_json)?;
    let config = Config::load(root)?;
    let mut manager = build_manager(&config);

    let result = manager
        .start_mode(name, &mode_config)
        .with_context(|| format!("mode '{name}' failed"))?;

    if json {
        return output::print_json(&json!({ "mode": name, "result": result }));
    }
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
