use std::path::Path;

use anyhow::Context as _;
use cadence_core::config::Config;
use cadence_core::engine::EngineSnapshot;
use cadence_core::{io, paths};

/// Create `.cadence/` with a starter config (seeded with the built-in
/// templates and modes) and an empty state file. Re-running is safe:
/// existing files are left untouched.
pub fn run(root: &Path) -> anyhow::Result<()> {
    io::ensure_dir(&paths::cadence_dir(root)).context("failed to create .cadence directory")?;

    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    let config = serde_yaml::to_string(&Config::new(name))?;
    report(
        paths::CONFIG_FILE,
        io::write_if_missing(&paths::config_path(root), config.as_bytes())
            .context("failed to write config")?,
    );

    let state = serde_yaml::to_string(&EngineSnapshot::default())?;
    report(
        paths::STATE_FILE,
        io::write_if_missing(&paths::state_path(root), state.as_bytes())
            .context("failed to write state")?,
    );

    println!();
    println!("Next steps:");
    println!("  cadence template list        # see the built-in templates");
    println!("  cadence start team           # start a workflow");
    println!("  cadence detect \"<request>\"   # see which mode a request triggers");

    Ok(())
}

fn report(file: &str, created: bool) {
    if created {
        println!("created: {file}");
    } else {
        println!("exists:  {file}");
    }
}
