use crate::error::{CadenceError, Result};
use crate::registry::OrderedTable;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// WorkflowTemplate
// ---------------------------------------------------------------------------

fn default_kind() -> String {
    "workflow".to_string()
}

/// An ordered phase sequence. Templates are immutable after registration:
/// the registry only ever hands out shared references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    pub phases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl WorkflowTemplate {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        phases: Vec<impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: default_kind(),
            phases: phases.into_iter().map(Into::into).collect(),
            description: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Structural checks: a usable template has an id and a non-empty phase
    /// list with no repeated phase.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(CadenceError::InvalidTemplate {
                id: self.id.clone(),
                reason: "id is empty".to_string(),
            });
        }
        if self.phases.is_empty() {
            return Err(CadenceError::InvalidTemplate {
                id: self.id.clone(),
                reason: "phase list is empty".to_string(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        for phase in &self.phases {
            if !seen.insert(phase.as_str()) {
                return Err(CadenceError::InvalidTemplate {
                    id: self.id.clone(),
                    reason: format!("duplicate phase '{phase}'"),
                });
            }
        }
        Ok(())
    }

    pub fn phase_index(&self, phase: &str) -> Option<usize> {
        self.phases.iter().position(|p| p == phase)
    }

    pub fn contains_phase(&self, phase: &str) -> bool {
        self.phase_index(phase).is_some()
    }

    pub fn first_phase(&self) -> Option<&str> {
        self.phases.first().map(|p| p.as_str())
    }

    pub fn last_phase(&self) -> Option<&str> {
        self.phases.last().map(|p| p.as_str())
    }
}

// ---------------------------------------------------------------------------
// TemplateRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    table: OrderedTable<WorkflowTemplate>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template exactly as supplied. Fails on structural problems
    /// or an id collision; never mutates what the caller passed in.
    pub fn register(&mut self, template: WorkflowTemplate) -> Result<()> {
        template.validate()?;
        let id = template.id.clone();
        if !self.table.insert(id.clone(), template) {
            return Err(CadenceError::DuplicateTemplate(id));
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&WorkflowTemplate> {
        self.table
            .get(id)
            .ok_or_else(|| CadenceError::TemplateNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.table.contains(id)
    }

    /// Templates in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &WorkflowTemplate> {
        self.table.iter().map(|(_, t)| t)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
