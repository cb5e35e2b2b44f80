use crate::error::{CadenceError, Result};
use crate::graph::TransitionGraph;
use crate::registry::OrderedTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

// ---------------------------------------------------------------------------
// ModeState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeState {
    Idle,
    Running,
    Stopped,
}

impl fmt::Display for ModeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModeState::Idle => "idle",
            ModeState::Running => "running",
            ModeState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Legal mode lifecycle. Re-entry while running and restart after a stop are
/// both permitted; there is no way from idle straight to stopped.
fn lifecycle() -> TransitionGraph<ModeState> {
    let mut g = TransitionGraph::new(ModeState::Idle);
    g.add_edge(ModeState::Idle, ModeState::Running);
    g.add_edge(ModeState::Running, ModeState::Running);
    g.add_edge(ModeState::Running, ModeState::Stopped);
    g.add_edge(ModeState::Stopped, ModeState::Running);
    g
}

// ---------------------------------------------------------------------------
// ModeHandler
// ---------------------------------------------------------------------------

/// The work a mode performs: configuration in, result out, may fail. Handlers
/// run synchronously on the caller's thread and are never interrupted or
/// timed out by the manager.
pub trait ModeHandler: Send + Sync {
    fn run(&self, config: &serde_json::Value) -> Result<serde_json::Value>;
}

impl<F> ModeHandler for F
where
    F: Fn(&serde_json::Value) -> Result<serde_json::Value> + Send + Sync,
{
    fn run(&self, config: &serde_json::Value) -> Result<serde_json::Value> {
        self(config)
    }
}

// ---------------------------------------------------------------------------
// ExclusivityPolicy
// ---------------------------------------------------------------------------

/// What `start_mode` does while another mode is active. `Overwrite` moves the
/// active pointer without stopping the prior handler (the historical
/// behavior); `Strict` rejects instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusivityPolicy {
    #[default]
    Overwrite,
    Strict,
}

// ---------------------------------------------------------------------------
// ExecutionModeManager
// ---------------------------------------------------------------------------

struct ModeEntry {
    handler: Box<dyn ModeHandler>,
    state: TransitionGraph<ModeState>,
}

/// Registry of named execution modes with at most one active at a time.
#[derive(Default)]
pub struct ExecutionModeManager {
    modes: OrderedTable<ModeEntry>,
    active: Option<String>,
    policy: ExclusivityPolicy,
}

impl ExecutionModeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: ExclusivityPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> ExclusivityPolicy {
        self.policy
    }

    /// Register a mode. Re-registering replaces the handler and resets the
    /// lifecycle to idle; the registration position is kept.
    pub fn register_mode(&mut self, name: impl Into<String>, handler: impl ModeHandler + 'static) {
        self.modes.upsert(
            name,
            ModeEntry {
                handler: Box::new(handler),
                state: lifecycle(),
            },
        );
    }

    /// Run a mode's handler to completion and return its result verbatim.
    ///
    /// The active pointer moves to `name` before the handler is invoked and
    /// stays there afterwards, success or failure; only `stop_mode` clears
    /// it. Under the default policy a start while another mode is active
    /// simply overwrites the pointer; the prior handler is not signalled.
    pub fn start_mode(
        &mut self,
        name: &str,
        config: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        if !self.modes.contains(name) {
            return Err(CadenceError::ModeNotFound(name.to_string()));
        }
        if self.policy == ExclusivityPolicy::Strict {
            if let Some(active) = &self.active {
                if active != name {
                    return Err(CadenceError::ModeActive {
                        active: active.clone(),
                        requested: name.to_string(),
                    });
                }
            }
        }

        self.active = Some(name.to_string());
        info!(mode = %name, "mode started");

        let entry = self
            .modes
            .get_mut(name)
            .ok_or_else(|| CadenceError::ModeNotFound(name.to_string()))?;
        entry.state.transition(ModeState::Running);
        entry.handler.run(config)
    }

    /// Clear the active pointer. Idempotent when nothing is active. The
    /// previously active mode is marked stopped but its handler is not
    /// signalled; a handler still running simply runs out.
    pub fn stop_mode(&mut self) {
        if let Some(name) = self.active.take() {
            if let Some(entry) = self.modes.get_mut(&name) {
                entry.state.transition(ModeState::Stopped);
            }
            info!(mode = %name, "mode stopped");
        }
    }

    pub fn active_mode(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn mode_state(&self, name: &str) -> Option<ModeState> {
        self.modes.get(name).map(|e| *e.state.current_state())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.modes.contains(name)
    }

    /// Modes and their lifecycle states, in registration order.
    pub fn modes(&self) -> impl Iterator<Item = (&str, ModeState)> {
        self.modes
            .iter()
            .map(|(name, entry)| (name, *entry.state.current_state()))
    }
}

impl fmt::Debug for ExecutionModeManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionModeManager")
            .field("modes", &self.modes.keys().collect::<Vec<_>>())
            .field("active", &self.active)
            .field("policy", &self.policy)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
