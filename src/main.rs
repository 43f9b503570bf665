//! widgets-rs - Command Line Entry Point
//!
//! Loads generated programs and re-emits, inspects or runs the trees they
//! build.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use widgets_rs::{ProgramLoader, ResourceTree, Settings, SourceCompiler};

#[derive(Parser)]
#[command(name = "widgets-rs")]
#[command(about = "Load, inspect and regenerate resource tree programs")]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a program and print the program regenerated from its tree
    Render {
        /// Path to the program
        program: PathBuf,
    },
    /// Print the values of a program's tree as JSON
    Values {
        /// Path to the program
        program: PathBuf,
        /// Collapse nested values into one id to value map
        #[arg(long)]
        flatten: bool,
        /// Child ids separated by '/', starting below the root
        #[arg(long)]
        path: Option<String>,
    },
    /// Run the lifecycle over a program's tree and print the values
    Run {
        /// Path to the program
        program: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,widgets_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::load_or_default(cli.config.or_else(Settings::default_path));

    match cli.command {
        Commands::Render { program } => {
            let tree = load(&settings, &program)?;
            let source = SourceCompiler::new(&settings.compiler)
                .render_program(&tree)
                .context("Failed to render program")?;
            print!("{}", source);
        }
        Commands::Values {
            program,
            flatten,
            path,
        } => {
            let tree = load(&settings, &program)?;
            print_values(&tree, path.as_deref(), flatten)?;
        }
        Commands::Run { program } => {
            let mut tree = load(&settings, &program)?;
            tree.run().context("Failed to run tree")?;
            tracing::info!("Ran {} nodes", tree.len());
            print_values(&tree, None, false)?;
        }
    }
    Ok(())
}

fn load(settings: &Settings, program: &Path) -> anyhow::Result<ResourceTree> {
    ProgramLoader::new(settings)
        .load_file(program)
        .with_context(|| format!("Failed to load {}", program.display()))
}

fn print_values(tree: &ResourceTree, path: Option<&str>, flatten: bool) -> anyhow::Result<()> {
    let segments: Vec<&str> = path
        .map(|p| p.split('/').filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    let values = tree.all_values(&segments, flatten)?;
    println!("{}", serde_json::to_string_pretty(&values)?);
    Ok(())
}
