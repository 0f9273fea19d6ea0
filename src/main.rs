use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dagger_index::{Config, DaggerIndex, DeclId, ProjectModel};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dagger-index")]
#[command(about = "Index and query Dagger dependency-injection relationships")]
#[command(version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
))]
struct Cli {
    /// Index file (overrides config and DAGGER_INDEX_PATH)
    #[arg(long, global = true)]
    index: Option<PathBuf>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Index files sequentially
    #[arg(long, global = true)]
    no_parallel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index declaration facts (JSON files or directories)
    Index {
        /// Facts files or directories
        #[arg(required = true)]
        facts: Vec<PathBuf>,
        /// Reindex every file even if its hash is unchanged
        #[arg(long)]
        force: bool,
    },
    /// Show the elements related to a declaration
    Related {
        /// Facts files or directories
        #[arg(required = true)]
        facts: Vec<PathBuf>,
        /// Qualified class name
        #[arg(long)]
        class: String,
        /// Method or field name (`<init>` for the constructor)
        #[arg(long)]
        member: Option<String>,
        /// Parameter name of the member
        #[arg(long, requires = "member")]
        parameter: Option<String>,
    },
    /// Show index statistics
    Stats,
    /// Remove every entry from the index
    Clear,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = DaggerIndex::with_config(load_config(&cli)?)?;

    match cli.command {
        Commands::Index { facts, force } => {
            let model = load_model(&facts)?;
            print_json(&client.index(&model, force)?)
        }
        Commands::Related {
            facts,
            class,
            member,
            parameter,
        } => {
            let model = load_model(&facts)?;
            let id = find_declaration(&model, &class, member.as_deref(), parameter.as_deref())?;
            print_json(&client.related(&model, id)?)
        }
        Commands::Stats => print_json(&client.stats()?),
        Commands::Clear => print_json(&client.clear()?),
    }
}

/// Config file, then environment, then command-line flags
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_or_default()?,
    };
    config.apply_env_overrides();
    if let Some(index) = &cli.index {
        config.index.path = index.clone();
    }
    if cli.no_parallel {
        config.indexing.parallel = false;
    }
    config.validate()?;
    Ok(config)
}

fn load_model(facts: &[PathBuf]) -> Result<ProjectModel> {
    let model = ProjectModel::load(facts).context("Failed to load declaration facts")?;
    tracing::info!("Loaded {} declarations", model.len());
    Ok(model)
}

fn find_declaration(
    model: &ProjectModel,
    class: &str,
    member: Option<&str>,
    parameter: Option<&str>,
) -> Result<DeclId> {
    let Some(class_id) = model.class(class) else {
        bail!("Class not found: {}", class);
    };
    let Some(member) = member else {
        return Ok(class_id);
    };

    let simple_name = class.rsplit('.').next().unwrap_or(class);
    let member_id = if member == "<init>" || member == simple_name {
        model.constructor(class_id)
    } else {
        model.member(class_id, member)
    };
    let Some(member_id) = member_id else {
        bail!("Member not found: {}#{}", class, member);
    };

    match parameter {
        Some(parameter) => model
            .parameter(member_id, parameter)
            .with_context(|| format!("Parameter not found: {}#{}({})", class, member, parameter)),
        None => Ok(member_id),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
