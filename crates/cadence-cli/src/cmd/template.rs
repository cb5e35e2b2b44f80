use std::path::Path;

use anyhow::Context as _;
use cadence_core::config::Config;
use cadence_core::paths::validate_slug;
use cadence_core::template::WorkflowTemplate;
use cadence_core::CadenceError;
use clap::Subcommand;

use crate::output;
use crate::store::Store;

#[derive(Subcommand)]
pub enum TemplateSubcommand {
    /// List registered templates
    List,

    /// Show one template in full
    Show {
        /// Template id
        id: String,
    },

    /// Add a template to the project config
    Add {
        /// Template id (lowercase slug)
        id: String,

        /// Ordered phase names, comma-separated, e.g. "plan,exec,verify"
        #[arg(long)]
        phases: String,

        /// Human-readable name
        #[arg(long)]
        name: Option<String>,

        /// Template kind, e.g. "pipeline" or "loop"
        #[arg(long)]
        kind: Option<String>,

        /// One-line description
        #[arg(long)]
        description: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: TemplateSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        TemplateSubcommand::List => list(root, json),
        TemplateSubcommand::Show { id } => show(root, &id, json),
        TemplateSubcommand::Add {
            id,
            phases,
            name,
            kind,
            description,
        } => add(root, id, phases, name, kind, description, json),
    }
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let store = Store::open(root)?;
    let templates: Vec<&WorkflowTemplate> = store.engine.templates().collect();

    if json {
        return output::print_json(&templates);
    }

    if templates.is_empty() {
        println!("No templates. Add one with 'cadence template add'.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = templates
        .iter()
        .map(|t| {
            vec![
                t.id.clone(),
                t.kind.clone(),
                t.phases.len().to_string(),
                t.phases.join(", "),
            ]
        })
        .collect();
    output::print_table(&["ID", "KIND", "PHASES", "SEQUENCE"], &rows);
    Ok(())
}

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let store = Store::open(root)?;
    let template = store
        .engine
        .template(id)
        .with_context(|| format!("template '{id}'"))?;

    if json {
        return output::print_json(template);
    }

    println!("Template:  {}", template.id);
    if !template.name.is_empty() {
        println!("Name:      {}", template.name);
    }
    println!("Kind:      {}", template.kind);
    if let Some(desc) = &template.description {
        println!("About:     {desc}");
    }
    println!("Phases:");
    for (i, phase) in template.phases.iter().enumerate() {
        println!("  {}. {phase}", i + 1);
    }
    Ok(())
}

fn add(
    root: &Path,
    id: String,
    phases: String,
    name: Option<String>,
    kind: Option<String>,
    description: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    validate_slug(&id).with_context(|| format!("template id '{id}'"))?;

    let phase_list: Vec<String> = phases
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    let mut template = WorkflowTemplate::new(&id, name.unwrap_or_default(), phase_list);
    if let Some(kind) = kind {
        template = template.with_kind(kind);
    }
    if let Some(description) = description {
        template = template.with_description(description);
    }
    template.validate().context("invalid template")?;

    let mut config = Config::load(root)?;
    if config.templates.iter().any(|t| t.id == template.id) {
        return Err(CadenceError::DuplicateTemplate(template.id).into());
    }
    config.templates.push(template.clone());
    config.save(root).context("failed to save config")?;

    if json {
        return output::print_json(&template);
    }
    println!(
        "Added template '{}' with {} phases.",
        template.id,
        template.phases.len()
    );
    Ok(())
}
