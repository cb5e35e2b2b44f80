use crate::clock::{Clock, SystemClock};
use crate::error::{CadenceError, Result};
use crate::gate::GateValidator;
use crate::instance::{Context, InstanceStatus, WorkflowInstance};
use crate::registry::OrderedTable;
use crate::template::{TemplateRegistry, WorkflowTemplate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// WorkflowStats
// ---------------------------------------------------------------------------

/// Lifetime counters. `total_workflows` and `total_transitions` only ever
/// grow; the active/completed pair partitions the live instances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStats {
    #[serde(default)]
    pub total_workflows: u64,
    #[serde(default)]
    pub active_workflows: u64,
    #[serde(default)]
    pub completed_workflows: u64,
    #[serde(default)]
    pub total_transitions: u64,
}

// ---------------------------------------------------------------------------
// EngineSnapshot
// ---------------------------------------------------------------------------

/// Serializable image of the engine's data model. The engine itself never
/// touches disk; a caller decides where and in what encoding this lands.
/// `stats` is optional so snapshots written by older collaborators still
/// restore; missing counters are derived from the instance list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSnapshot {
    #[serde(default)]
    pub templates: Vec<WorkflowTemplate>,
    #[serde(default)]
    pub instances: Vec<WorkflowInstance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<WorkflowStats>,
}

// ---------------------------------------------------------------------------
// WorkflowEngine
// ---------------------------------------------------------------------------

/// Orchestrates workflow instances over registered templates: gated,
/// forward-only phase advancement plus free positioning for fixed-pipeline
/// callers. Synchronous and single-threaded; callers that share an engine
/// across threads supply their own lock.
#[derive(Debug)]
pub struct WorkflowEngine {
    templates: TemplateRegistry,
    instances: OrderedTable<WorkflowInstance>,
    gates: GateValidator,
    stats: WorkflowStats,
    clock: Arc<dyn Clock>,
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowEngine {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            templates: TemplateRegistry::new(),
            instances: OrderedTable::new(),
            gates: GateValidator::new(),
            stats: WorkflowStats::default(),
            clock,
        }
    }

    // ---------------------------------------------------------------------------
    // Templates
    // ---------------------------------------------------------------------------

    pub fn register_template(&mut self, template: WorkflowTemplate) -> Result<()> {
        let id = template.id.clone();
        self.templates.register(template)?;
        debug!(template = %id, "template registered");
        Ok(())
    }

    pub fn template(&self, id: &str) -> Result<&WorkflowTemplate> {
        self.templates.get(id)
    }

    /// Templates in registration order.
    pub fn templates(&self) -> impl Iterator<Item = &WorkflowTemplate> {
        self.templates.iter()
    }

    // ---------------------------------------------------------------------------
    // Gates
    // ---------------------------------------------------------------------------

    /// Register a gate predicate for `stage`, replacing any existing rule.
    pub fn add_gate<F>(&mut self, stage: impl Into<String>, predicate: F)
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.gates.add_rule(stage, predicate);
    }

    pub fn gates(&self) -> &GateValidator {
        &self.gates
    }

    // ---------------------------------------------------------------------------
    // Instance lifecycle
    // ---------------------------------------------------------------------------

    /// Start a new instance of `template_id` at its first phase. Returns the
    /// generated instance id.
    pub fn start(&mut self, template_id: &str, context: Context) -> Result<String> {
        let template = self.templates.get(template_id)?;
        let Some(first) = template.first_phase() else {
            return Err(CadenceError::InvalidTemplate {
                id: template.id.clone(),
                reason: "phase list is empty".to_string(),
            });
        };

        let instance =
            WorkflowInstance::new(template_id, first, context, self.clock.now());
        let id = instance.id.clone();
        info!(
            instance = %id,
            template = %template_id,
            phase = %instance.current_phase,
            "workflow started"
        );
        self.instances.insert(id.clone(), instance);
        self.stats.total_workflows += 1;
        self.stats.active_workflows += 1;
        Ok(id)
    }

    /// Advance an instance to its next sequential phase. A completed
    /// instance, or one already sitting on its final phase, is a no-op that
    /// answers with the current phase. A gate rejection leaves the instance
    /// untouched.
    pub fn advance(&mut self, instance_id: &str) -> Result<String> {
        let instance = self.get(instance_id)?;
        if instance.is_completed() {
            return Ok(instance.current_phase.clone());
        }

        let template = self.templates.get(&instance.template_id)?;
        let index = Self::position(template, instance)?;
        let next_index = index + 1;
        let Some(next_phase) = template.phases.get(next_index) else {
            // Final phase of a single-phase template: nowhere to go.
            return Ok(instance.current_phase.clone());
        };
        let next_phase = next_phase.clone();

        if !self.gates.validate(&next_phase, &instance.context) {
            debug!(
                instance = %instance_id,
                stage = %next_phase,
                "gate rejected advance"
            );
            return Err(CadenceError::GateRejected { stage: next_phase });
        }

        let completes = next_index + 1 == template.phases.len();
        self.apply_transition(instance_id, next_phase, completes)
    }

    /// Move an instance to any declared phase of its template, in either
    /// direction. Membership and the target's gate are the only checks; this
    /// is what fixed-pipeline orchestration uses to loop back (verify to fix
    /// to exec). Completed instances are no-ops like `advance`.
    pub fn jump_to_stage(&mut self, instance_id: &str, stage: &str) -> Result<String> {
        let instance = self.get(instance_id)?;
        if instance.is_completed() {
            return Ok(instance.current_phase.clone());
        }

        let template = self.templates.get(&instance.template_id)?;
        if !template.contains_phase(stage) {
            return Err(CadenceError::InvalidTransition {
                from: instance.current_phase.clone(),
                to: stage.to_string(),
                reason: format!("template '{}' has no phase '{stage}'", template.id),
            });
        }

        if !self.gates.validate(stage, &instance.context) {
            debug!(instance = %instance_id, stage = %stage, "gate rejected jump");
            return Err(CadenceError::GateRejected {
                stage: stage.to_string(),
            });
        }

        let completes = template.last_phase() == Some(stage);
        self.apply_transition(instance_id, stage.to_string(), completes)
    }

    /// Commit a validated transition: set the phase, bump counters, flip to
    /// completed when the target is the template's final phase.
    fn apply_transition(
        &mut self,
        instance_id: &str,
        target: String,
        completes: bool,
    ) -> Result<String> {
        let instance = self
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| CadenceError::InstanceNotFound(instance_id.to_string()))?;

        let from = std::mem::replace(&mut instance.current_phase, target.clone());
        self.stats.total_transitions += 1;

        if completes {
            instance.status = InstanceStatus::Completed;
            self.stats.active_workflows = self.stats.active_workflows.saturating_sub(1);
            self.stats.completed_workflows += 1;
            info!(
                instance = %instance_id,
                from = %from,
                to = %target,
                "workflow completed"
            );
        } else {
            debug!(
                instance = %instance_id,
                from = %from,
                to = %target,
                "phase transition"
            );
        }
        Ok(target)
    }

    // ---------------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------------

    pub fn instance(&self, id: &str) -> Result<&WorkflowInstance> {
        self.get(id)
    }

    /// All instances in start order.
    pub fn instances(&self) -> impl Iterator<Item = &WorkflowInstance> {
        self.instances.iter().map(|(_, i)| i)
    }

    /// Running instances in start order.
    pub fn active_instances(&self) -> impl Iterator<Item = &WorkflowInstance> {
        self.instances().filter(|i| !i.is_completed())
    }

    pub fn stats(&self) -> WorkflowStats {
        self.stats
    }

    fn get(&self, id: &str) -> Result<&WorkflowInstance> {
        self.instances
            .get(id)
            .ok_or_else(|| CadenceError::InstanceNotFound(id.to_string()))
    }

    fn position(template: &WorkflowTemplate, instance: &WorkflowInstance) -> Result<usize> {
        template
            .phase_index(&instance.current_phase)
            .ok_or_else(|| CadenceError::InvalidTransition {
                from: instance.current_phase.clone(),
                to: instance.current_phase.clone(),
                reason: format!(
                    "phase is not part of template '{}'",
                    instance.template_id
                ),
            })
    }

    // ---------------------------------------------------------------------------
    // Snapshot / restore
    // ---------------------------------------------------------------------------

    /// Clone the data model out for a persistence collaborator.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            templates: self.templates.iter().cloned().collect(),
            instances: self.instances.iter().map(|(_, i)| i.clone()).collect(),
            stats: Some(self.stats),
        }
    }

    /// Load a snapshot into this engine. Templates already registered (for
    /// example from config) win over their snapshot copies; the instance
    /// table is replaced wholesale. Every restored instance must reference a
    /// known template and sit on one of its phases.
    pub fn restore(&mut self, snapshot: EngineSnapshot) -> Result<()> {
        for template in snapshot.templates {
            if self.templates.contains(&template.id) {
                continue;
            }
            self.templates.register(template)?;
        }

        let mut derived = WorkflowStats::default();
        let mut instances = OrderedTable::new();
        for instance in snapshot.instances {
            let template = self.templates.get(&instance.template_id)?;
            let index = Self::position(template, &instance)?;

            derived.total_workflows += 1;
            derived.total_transitions += index as u64;
            if instance.is_completed() {
                derived.completed_workflows += 1;
            } else {
                derived.active_workflows += 1;
            }
            instances.insert(instance.id.clone(), instance);
        }

        self.instances = instances;
        self.stats = snapshot.stats.unwrap_or(derived);
        debug!(
            templates = self.templates.len(),
            instances = self.instances.len(),
            "snapshot restored"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
