mod app;
mod check;
mod manifest;

use anyhow::{Context, Result};
use argvkit::{CompletionInput, Shell};
use clap::{Parser, Subcommand};
use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};
use tracing_subscriber::{EnvFilter, fmt};

use crate::app::build_application;
use crate::manifest::{load_manifest, write_default_manifest};

#[derive(Parser)]
#[command(name = "argvkit")]
#[command(version, about = "Parse, dispatch and complete command lines declared in a manifest", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an example argvkit.json
    Init(InitArgs),

    /// Validate every command in the manifest and print its usage
    Check(CheckArgs),

    /// Split a raw command line into tokens (JSON)
    Tokenize(TokenizeArgs),

    /// Run a command line against the manifest; commands echo their input as JSON
    Run(RunArgs),

    /// Print shell-completion suggestions for a partial command line
    Complete(CompleteArgs),
}

#[derive(Parser)]
struct InitArgs {
    /// Project directory (default: current directory)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Replace an existing manifest
    #[arg(long)]
    force: bool,
}

#[derive(Parser)]
struct CheckArgs {
    /// Path to the manifest (default: ./argvkit.json)
    #[arg(short, long, env = "ARGVKIT_MANIFEST", value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Only output JSON (no human-readable output)
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct TokenizeArgs {
    /// The command line to split
    #[arg(value_name = "LINE", allow_hyphen_values = true)]
    line: String,
}

#[derive(Parser)]
struct RunArgs {
    /// Path to the manifest (default: ./argvkit.json)
    #[arg(short, long, env = "ARGVKIT_MANIFEST", value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Arguments for the application, after `--`
    #[arg(last = true, value_name = "ARGV")]
    argv: Vec<String>,
}

#[derive(Parser)]
struct CompleteArgs {
    /// Path to the manifest (default: ./argvkit.json)
    #[arg(short, long, env = "ARGVKIT_MANIFEST", value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Output format of the suggestions
    #[arg(short, long, default_value = "bash", value_name = "SHELL")]
    shell: Shell,

    /// Index of the word under the cursor in the --input tokens
    #[arg(
        short,
        long,
        value_name = "N",
        conflicts_with = "line",
        required_unless_present = "line"
    )]
    current: Option<usize>,

    /// One word of the command line, program name first (repeatable)
    #[arg(short, long = "input", value_name = "TOKEN", allow_hyphen_values = true)]
    input: Vec<String>,

    /// The raw command line, program name first (COMP_LINE)
    #[arg(long, value_name = "LINE", allow_hyphen_values = true)]
    line: Option<String>,

    /// Cursor position in --line, in characters not bytes
    #[arg(long, value_name = "P", requires = "line")]
    point: Option<usize>,

    /// Print the completion classification as JSON instead of suggestions
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => init(args),
        Commands::Check(args) => check_command(args),
        Commands::Tokenize(args) => tokenize_command(args),
        Commands::Run(args) => {
            let code = run_command(args)?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Commands::Complete(args) => complete_command(args),
    }
}

fn init(args: InitArgs) -> Result<()> {
    let dir = args.dir.unwrap_or_else(|| PathBuf::from("."));

    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory: {}", dir.display()))?;

    let manifest_path = write_default_manifest(&dir, args.force)?;

    eprintln!("Created: {}", manifest_path.display());
    eprintln!("\nNext steps:");
    eprintln!("  1. Edit argvkit.json to declare your commands");
    eprintln!("  2. Run: argvkit check");
    eprintln!("  3. Try: argvkit run -- deploy --help");

    Ok(())
}

fn check_command(args: CheckArgs) -> Result<()> {
    tracing::debug!("executing check command");
    let loaded = load_manifest(args.manifest.as_deref())?;
    let report = check::check_manifest(&loaded)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    eprintln!("=== Manifest Check Results ===");
    eprintln!("Manifest: {}", report.manifest);
    eprintln!("Application: {} {}", report.application, report.version);
    eprintln!("Commands: {}", report.commands.len());
    eprintln!();
    for command in &report.commands {
        let mut notes = Vec::new();
        if !command.aliases.is_empty() {
            notes.push(format!("aliases: {}", command.aliases.join(", ")));
        }
        if command.hidden {
            notes.push("hidden".to_string());
        }
        if notes.is_empty() {
            println!("{}", command.usage);
        } else {
            println!("{} ({})", command.usage, notes.join("; "));
        }
    }
    eprintln!();
    eprintln!("OK: All command definitions are valid");

    Ok(())
}

fn tokenize_command(args: TokenizeArgs) -> Result<()> {
    let tokens = argvkit::tokenize(&args.line);
    println!("{}", serde_json::to_string(&tokens)?);
    Ok(())
}

fn run_command(args: RunArgs) -> Result<i32> {
    tracing::debug!(argv = ?args.argv, "executing run command");
    let loaded = load_manifest(args.manifest.as_deref())?;
    let app = build_application(&loaded.manifest, std::env::var("SHELL_VERBOSITY").ok())?;

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();
    let code = app.run(&args.argv, &mut out, &mut err);
    out.flush().context("failed to flush stdout")?;
    err.flush().context("failed to flush stderr")?;
    Ok(code)
}

fn complete_command(args: CompleteArgs) -> Result<()> {
    let loaded = load_manifest(args.manifest.as_deref())?;
    let app = build_application(&loaded.manifest, None)?;

    let input = match (&args.line, args.current) {
        (Some(line), _) => {
            let point = args.point.unwrap_or_else(|| line.chars().count());
            CompletionInput::from_line(line, point)
        }
        (None, Some(current)) => CompletionInput::from_tokens(args.input, current)?,
        (None, None) => anyhow::bail!("either --current or --line is required"),
    };
    // The first word is the program name.
    let input = input.skip(1);
    tracing::debug!(tokens = ?input.tokens(), cursor = input.cursor(), "executing complete command");

    if args.debug {
        let state = app.completion_state(input.tokens(), input.cursor())?;
        println!("{}", serde_json::to_string(&state)?);
        return Ok(());
    }

    let suggestions = app.complete(input.tokens(), input.cursor())?;
    print!("{}", args.shell.render(&suggestions));
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}
