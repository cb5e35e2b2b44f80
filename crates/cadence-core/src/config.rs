use crate::catalog;
use crate::error::{CadenceError, Result};
use crate::instance::Context;
use crate::mode::ExclusivityPolicy;
use crate::paths;
use crate::template::WorkflowTemplate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// GateCheck
// ---------------------------------------------------------------------------

/// Declarative gate check against the instance context. All checks listed for
/// a stage must pass; `compile_checks` folds them into the single predicate
/// the validator holds per stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateCheck {
    /// The context contains `key`, whatever its value.
    RequireKey { key: String },
    /// The context value at `key` equals `value` exactly.
    Equals { key: String, value: Value },
    /// The context value at `key` is true, a nonzero number, or a non-empty
    /// string, array, or object.
    Truthy { key: String },
}

impl GateCheck {
    pub fn passes(&self, ctx: &Context) -> bool {
        match self {
            GateCheck::RequireKey { key } => ctx.contains_key(key),
            GateCheck::Equals { key, value } => ctx.get(key) == Some(value),
            GateCheck::Truthy { key } => match ctx.get(key) {
                Some(Value::Bool(b)) => *b,
                Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
                Some(Value::String(s)) => !s.is_empty(),
                Some(Value::Array(a)) => !a.is_empty(),
                Some(Value::Object(o)) => !o.is_empty(),
                Some(Value::Null) | None => false,
            },
        }
    }
}

/// Fold a stage's checks into one predicate suitable for
/// `GateValidator::add_rule`. An empty list compiles to a pass-through.
pub fn compile_checks(checks: Vec<GateCheck>) -> impl Fn(&Context) -> bool + Send + Sync {
    move |ctx| checks.iter().all(|c| c.passes(ctx))
}

// ---------------------------------------------------------------------------
// ModeConfig
// ---------------------------------------------------------------------------

/// An execution mode as configured: detector trigger patterns plus an
/// optional shell command the dispatch layer wraps into the handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeConfig {
    pub name: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: ProjectConfig,
    #[serde(default)]
    pub templates: Vec<WorkflowTemplate>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub gates: HashMap<String, Vec<GateCheck>>,
    #[serde(default)]
    pub modes: Vec<ModeConfig>,
    #[serde(default)]
    pub exclusivity: ExclusivityPolicy,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: ProjectConfig {
                name: project_name.into(),
                description: None,
            },
            templates: catalog::builtin_templates(),
            gates: HashMap::new(),
            modes: catalog::builtin_modes(),
            exclusivity: ExclusivityPolicy::default(),
        }
    }

    pub fn gates_for(&self, stage: &str) -> &[GateCheck] {
        self.gates.get(stage).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn mode(&self, name: &str) -> Option<&ModeConfig> {
        self.modes.iter().find(|m| m.name == name)
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(CadenceError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // 1. Templates must be structurally sound and unique by id. Either
        //    problem makes engine construction fail, so these are errors.
        let mut seen_templates = std::collections::HashSet::new();
        for template in &self.templates {
            if !seen_templates.insert(template.id.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("duplicate template id '{}'", template.id),
                });
                continue;
            }
            if let Err(e) = template.validate() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: e.to_string(),
                });
            }
            if paths::validate_slug(&template.id).is_err() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("template id '{}' is not a slug", template.id),
                });
            }
        }

        // 2. Gate stages should belong to some template; a check on a stage
        //    no template declares can never fire.
        for (stage, checks) in &self.gates {
            let known = self
                .templates
                .iter()
                .any(|t| t.contains_phase(stage));
            if !known {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("gate stage '{stage}' does not appear in any template"),
                });
            }
            if checks.is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("gate stage '{stage}' has no checks"),
                });
            }
        }

        // 3. Modes: duplicates replace each other at registration time;
        //    a mode without patterns can never be detected.
        let mut seen_modes = std::collections::HashSet::new();
        for mode in &self.modes {
            if !seen_modes.insert(mode.name.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("duplicate mode '{}'", mode.name),
                });
            }
            if mode.patterns.is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("mode '{}' has no trigger patterns", mode.name),
                });
            }
            if let Some(command) = &mode.command {
                if command.trim().is_empty() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!("mode '{}' has an empty command", mode.name),
                    });
                }
            }
            if paths::validate_slug(&mode.name).is_err() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("mode name '{}' is not a slug", mode.name),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
