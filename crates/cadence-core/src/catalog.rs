use crate::config::ModeConfig;
use crate::template::WorkflowTemplate;

// ---------------------------------------------------------------------------
// Built-in templates and modes
// ---------------------------------------------------------------------------

/// Templates seeded into a fresh project config.
pub fn builtin_templates() -> Vec<WorkflowTemplate> {
    vec![
        WorkflowTemplate::new(
            "team",
            "Team Pipeline",
            vec!["plan", "prd", "exec", "verify", "fix"],
        )
        .with_kind("pipeline")
        .with_description("Plan the work, write the prd, execute, verify, fix findings"),
        WorkflowTemplate::new("tdd", "Test-Driven Loop", vec!["red", "green", "refactor"])
            .with_kind("loop")
            .with_description("Write a failing test, make it pass, clean up"),
    ]
}

/// Modes seeded into a fresh project config. No command attached: the
/// dispatch layer echoes the configuration until one is configured.
pub fn builtin_modes() -> Vec<ModeConfig> {
    vec![
        ModeConfig {
            name: "autopilot".to_string(),
            patterns: vec!["build me".to_string(), "autopilot".to_string()],
            command: None,
        },
        ModeConfig {
            name: "ralph".to_string(),
            patterns: vec!["don't stop".to_string(), "ralph".to_string()],
            command: None,
        },
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
