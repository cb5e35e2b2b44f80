use std::path::Path;

use anyhow::Context as _;
use cadence_core::config::{compile_checks, Config};
use cadence_core::engine::{EngineSnapshot, WorkflowEngine};
use cadence_core::{io, paths};

/// Everything a workflow command needs: the project config plus an engine
/// rebuilt from that config and the persisted snapshot.
pub struct Store {
    pub config: Config,
    pub engine: WorkflowEngine,
}

impl Store {
    /// Load `.cadence/config.yaml` and `.cadence/state.yaml` and rebuild the
    /// engine. Config templates are registered before the snapshot is
    /// restored so edits to the config win over the copies stored in the
    /// snapshot. Declarative gate checks are compiled into predicates here.
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        let config = Config::load(root).context("failed to load config")?;

        let mut engine = WorkflowEngine::new();
        for template in &config.templates {
            engine
                .register_template(template.clone())
                .with_context(|| format!("invalid template '{}' in config", template.id))?;
        }
        for (stage, checks) in &config.gates {
            engine.add_gate(stage.clone(), compile_checks(checks.clone()));
        }

        let state_path = paths::state_path(root);
        if state_path.exists() {
            let raw = std::fs::read_to_string(&state_path)
                .with_context(|| format!("failed to read {}", state_path.display()))?;
            let snapshot: EngineSnapshot =
                serde_yaml::from_str(&raw).context("failed to parse workflow state")?;
            engine
                .restore(snapshot)
                .context("failed to restore workflow state")?;
        }

        Ok(Self { config, engine })
    }

    /// Write the engine's data model back to `.cadence/state.yaml`.
    pub fn save(&self, root: &Path) -> anyhow::Result<()> {
        let snapshot = self.engine.snapshot();
        let raw = serde_yaml::to_string(&snapshot).context("failed to serialize workflow state")?;
        io::atomic_write(&paths::state_path(root), raw.as_bytes())
            .context("failed to write workflow state")?;
        Ok(())
    }
}
