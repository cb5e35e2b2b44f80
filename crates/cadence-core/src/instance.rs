use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied key/value payload carried by an instance. Opaque to the
/// engine; read only by gate predicates.
pub type Context = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// InstanceStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Running,
    Completed,
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstanceStatus::Running => "running",
            InstanceStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// WorkflowInstance
// ---------------------------------------------------------------------------

/// A live run of a template. `current_phase` is always one of the bound
/// template's phases; `started_at` never changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub id: String,
    pub template_id: String,
    pub current_phase: String,
    #[serde(default)]
    pub context: Context,
    pub started_at: DateTime<Utc>,
    pub status: InstanceStatus,
}

impl WorkflowInstance {
    pub fn new(
        template_id: impl Into<String>,
        first_phase: impl Into<String>,
        context: Context,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            template_id: template_id.into(),
            current_phase: first_phase.into(),
            context,
            started_at,
            status: InstanceStatus::Running,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == InstanceStatus::Completed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
