use std::path::Path;

use anyhow::Context as _;
use cadence_core::instance::{Context as WorkflowContext, WorkflowInstance};
use clap::Subcommand;

use crate::output;
use crate::store::Store;

#[derive(Subcommand)]
pub enum InstanceSubcommand {
    /// List instances (active only by default)
    List {
        /// Include completed instances
        #[arg(long)]
        all: bool,
    },

    /// Show one instance in full
    Show {
        /// Instance id
        id: String,
    },
}

pub fn run(root: &Path, subcmd: InstanceSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        InstanceSubcommand::List { all } => list(root, all, json),
        InstanceSubcommand::Show { id } => show(root, &id, json),
    }
}

/// Parse `--context` as a JSON object. `None` means an empty context.
/// Anything that is valid JSON but not an object is rejected before the
/// engine ever sees it.
fn parse_context(raw: Option<&str>) -> anyhow::Result<WorkflowContext> {
    let Some(raw) = raw else {
        return Ok(WorkflowContext::new());
    };
    let value: serde_json::Value =
        serde_json::from_str(raw).context("failed to parse --context as JSON")?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => anyhow::bail!("--context must be a JSON object"),
    }
}

pub fn start(root: &Path, template: &str, context: Option<&str>, json: bool) -> anyhow::Result<()> {
    let context = parse_context(context)?;

    let mut store = Store::open(root)?;
    let id = store.engine.start(template, context)?;
    store.save(root)?;

    let instance = store.engine.instance(&id)?;
    if json {
        return output::print_json(instance);
    }
    println!(
        "Started '{template}' as {id} at phase '{}'.",
        instance.current_phase
    );
    Ok(())
}

pub fn advance(root: &Path, instance_id: &str, json: bool) -> anyhow::Result<()> {
    let mut store = Store::open(root)?;
    let phase = store
        .engine
        .advance(instance_id)
        .with_context(|| format!("cannot advance '{instance_id}'"))?;
    store.save(root)?;

    let instance = store.engine.instance(instance_id)?;
    if json {
        return output::print_json(instance);
    }
    if instance.is_completed() {
        println!("Instance {instance_id} completed at phase '{phase}'.");
    } else {
        println!("Instance {instance_id} advanced to phase '{phase}'.");
    }
    Ok(())
}

pub fn jump(root: &Path, instance_id: &str, stage: &str, json: bool) -> anyhow::Result<()> {
    let mut store = Store::open(root)?;
    let phase = store
        .engine
        .jump_to_stage(instance_id, stage)
        .with_context(|| format!("cannot jump '{instance_id}' to '{stage}'"))?;
    store.save(root)?;

    let instance = store.engine.instance(instance_id)?;
    if json {
        return output::print_json(instance);
    }
    if instance.is_completed() {
        println!("Instance {instance_id} completed at phase '{phase}'.");
    } else {
        println!("Instance {instance_id} jumped to phase '{phase}'.");
    }
    Ok(())
}

fn list(root: &Path, all: bool, json: bool) -> anyhow::Result<()> {
    let store = Store::open(root)?;
    let instances: Vec<&WorkflowInstance> = if all {
        store.engine.instances().collect()
    } else {
        store.engine.active_instances().collect()
    };

    if json {
        return output::print_json(&instances);
    }

    if instances.is_empty() {
        if all {
            println!("No instances. Start one with 'cadence start <template>'.");
        } else {
            println!("No active instances.");
        }
        return Ok(());
    }

    let rows: Vec<Vec<String>> = instances
        .iter()
        .map(|i| {
            vec![
                i.id.clone(),
                i.template_id.clone(),
                i.current_phase.clone(),
                i.status.to_string(),
                i.started_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();
    output::print_table(&["ID", "TEMPLATE", "PHASE", "STATUS", "STARTED"], &rows);
    Ok(())
}

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let store = Store::open(root)?;
    let instance = store.engine.instance(id)?;
    let template = store.engine.template(&instance.template_id)?;

    if json {
        return output::print_json(instance);
    }

    println!("Instance:  {}", instance.id);
    println!("Template:  {}", instance.template_id);
    println!("Status:    {}", instance.status);
    println!(
        "Started:   {}",
        instance.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Phases:");
    for phase in &template.phases {
        let marker = if phase == &instance.current_phase {
            "*"
        } else {
            " "
        };
        println!("  {marker} {phase}");
    }
    if !instance.context.is_empty() {
        println!("Context:");
        for (key, value) in &instance.context {
            println!("  {key}: {value}");
        }
    }
    Ok(())
}
