use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use codenest_project::{Command, ExpansionSet, FileTree, TabSession, Workspace};
use codenest_settings::{Preferences, PreferencesStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "codenest-cli",
    about = "Drive a CodeNest project workspace from the command line",
    author,
    version
)]
struct Cli {
    /// Preferences JSON file; built-in defaults apply when it does not exist.
    #[arg(long, global = true, value_name = "FILE")]
    preferences: Option<PathBuf>,
    /// Log every applied command to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the seeded project tree.
    Tree(TreeArgs),
    /// Apply a JSON array of commands to the seeded workspace and print the result.
    Replay(ReplayArgs),
    /// Inspect or create preference files.
    #[command(subcommand)]
    Preferences(PreferencesCommand),
}

#[derive(Args)]
struct TreeArgs {
    /// Expand every folder instead of showing only the root.
    #[arg(long)]
    expand_all: bool,
}

#[derive(Args)]
struct ReplayArgs {
    /// Script file containing the commands.
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,
    /// Output format for the final workspace state.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum PreferencesCommand {
    /// Print the effective preferences as JSON.
    Show,
    /// Write a preferences file filled with defaults.
    Init(PreferencesInitArgs),
}

#[derive(Args)]
struct PreferencesInitArgs {
    /// Destination file path.
    #[arg(long, value_name = "FILE")]
    output: PathBuf,
    /// Replace the file if it already exists.
    #[arg(long)]
    force: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        preferences,
        command,
        ..
    } = cli;
    let preferences = load_preferences(preferences.as_deref())?;
    match command {
        Commands::Tree(args) => execute_tree(args, &preferences),
        Commands::Replay(args) => execute_replay(args, &preferences),
        Commands::Preferences(PreferencesCommand::Show) => {
            println!("{}", serde_json::to_string_pretty(&preferences)?);
            Ok(())
        }
        Commands::Preferences(PreferencesCommand::Init(args)) => execute_preferences_init(args),
    }
}

fn load_preferences(path: Option<&Path>) -> Result<Preferences> {
    match path {
        Some(path) => {
            let store = PreferencesStore::load(path)
                .with_context(|| format!("cannot load preferences from {}", path.display()))?;
            Ok(store.preferences().clone())
        }
        None => Ok(Preferences::default()),
    }
}

fn execute_tree(args: TreeArgs, preferences: &Preferences) -> Result<()> {
    let workspace = Workspace::seeded(preferences.workspace_options());
    let expansion = if args.expand_all {
        all_folders(workspace.tree())
    } else {
        workspace.expansion().clone()
    };
    print!("{}", render_tree(workspace.tree(), &expansion));
    Ok(())
}

fn execute_replay(args: ReplayArgs, preferences: &Preferences) -> Result<()> {
    let script = fs::read_to_string(&args.script)
        .with_context(|| format!("cannot read script {}", args.script.display()))?;
    let commands = Command::parse_script(&script)
        .with_context(|| format!("invalid command script {}", args.script.display()))?;

    let mut workspace = Workspace::seeded(preferences.workspace_options());
    let total = commands.len();
    for command in commands {
        workspace.apply(command);
    }
    info!(commands = total, revision = workspace.tree().revision(), "replay finished");

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&workspace.snapshot())?);
        }
        OutputFormat::Text => {
            print!("{}", render_tree(workspace.tree(), workspace.expansion()));
            println!();
            print!("{}", render_tabs(workspace.tabs()));
            println!("{}", workspace.status());
        }
    }
    Ok(())
}

fn execute_preferences_init(args: PreferencesInitArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        bail!(
            "{} already exists (use --force to replace it)",
            args.output.display()
        );
    }
    PreferencesStore::new(args.output.clone(), Preferences::default())
        .save()
        .with_context(|| format!("cannot write {}", args.output.display()))?;
    println!("wrote {}", args.output.display());
    Ok(())
}

fn all_folders(tree: &FileTree) -> ExpansionSet {
    tree.iter()
        .filter(|node| node.is_folder())
        .map(|node| node.id)
        .collect()
}

fn render_tree(tree: &FileTree, expansion: &ExpansionSet) -> String {
    let mut out = String::new();
    for row in tree.visible_rows(expansion) {
        let marker = match (row.node.is_folder(), row.expanded) {
            (true, true) => "v ",
            (true, false) => "> ",
            (false, _) => "  ",
        };
        out.push_str(&"  ".repeat(row.depth));
        out.push_str(marker);
        out.push_str(&row.node.name);
        if let Some(language) = row.node.language() {
            out.push_str(&format!(" ({language})"));
        }
        out.push('\n');
    }
    out
}

fn render_tabs(tabs: &TabSession) -> String {
    let mut out = String::new();
    for tab in tabs.tabs() {
        let active = if tab.active { "*" } else { " " };
        let modified = if tab.modified { " [modified]" } else { "" };
        out.push_str(&format!("{active} {} {}{modified}\n", tab.name, tab.path));
    }
    out
}
