mod cmd;
mod output;
mod root;
mod store;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, mode::ModeSubcommand, template::TemplateSubcommand,
    workflow::InstanceSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cadence",
    about = "Workflow orchestration engine — phased templates, gated transitions, execution modes",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .cadence/ or .git/)
    #[arg(long, global = true, env = "CADENCE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize cadence in the current project
    Init,

    /// Manage workflow templates
    Template {
        #[command(subcommand)]
        subcommand: TemplateSubcommand,
    },

    /// Start a workflow instance from a template
    Start {
        /// Template id to instantiate
        template: String,

        /// Initial context as a JSON object, e.g. '{"ticket":"ABC-1"}'
        #[arg(long)]
        context: Option<String>,
    },

    /// Advance an instance to its next phase
    Advance {
        /// Instance id (as printed by `cadence start`)
        instance: String,
    },

    /// Jump an instance to any phase of its template
    Jump {
        /// Instance id
        instance: String,

        /// Target phase name
        stage: String,
    },

    /// Inspect workflow instances
    Instance {
        #[command(subcommand)]
        subcommand: InstanceSubcommand,
    },

    /// Detect which execution mode a request would trigger
    Detect {
        /// Free-form request text
        text: String,
    },

    /// Detect a mode from request text and run it
    Trigger {
        /// Free-form request text
        text: String,

        /// Mode configuration as JSON, passed through to the handler
        #[arg(long)]
        config: Option<String>,
    },

    /// Manage execution modes
    Mode {
        #[command(subcommand)]
        subcommand: ModeSubcommand,
    },

    /// Show workflow counters
    Stats,

    /// Validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root_path = cli.root.as_deref();
    let root = root::resolve_root(root_path);

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Template { subcommand } => cmd::template::run(&root, subcommand, cli.json),
        Commands::Start { template, context } => {
            cmd::workflow::start(&root, &template, context.as_deref(), cli.json)
        }
        Commands::Advance { instance } => cmd::workflow::advance(&root, &instance, cli.json),
        Commands::Jump { instance, stage } => {
            cmd::workflow::jump(&root, &instance, &stage, cli.json)
        }
        Commands::Instance { subcommand } => cmd::workflow::run(&root, subcommand, cli.json),
        Commands::Detect { text } => cmd::mode::detect(&root, &text, cli.json),
        Commands::Trigger { text, config } => {
            cmd::mode::trigger(&root, &text, config.as_deref(), cli.json)
        }
        Commands::Mode { subcommand } => cmd::mode::run(&root, subcommand, cli.json),
        Commands::Stats => cmd::stats::run(&root, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
