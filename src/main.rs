use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use krt_lint::config::{Config, OutputFormat};
use krt_lint::manifest::{check_manifest_file, parse_manifest_file, serialize_manifest};

#[derive(Parser)]
#[command(name = "krt-lint")]
#[command(about = "Validate KRT workflow manifests", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a manifest and report every error found
    Validate {
        /// Path to manifest YAML file
        file: PathBuf,
        /// Report format (defaults to the configured one)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
        /// Validate the manifest as written, without filling defaults
        #[arg(long)]
        no_defaults: bool,
    },
    /// Print a manifest with every default filled in
    Defaults {
        /// Path to manifest YAML file
        file: PathBuf,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::PowerShell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so reports on stdout stay machine-readable.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "krt_lint=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load();
    debug!(?config, "loaded configuration");

    match cli.command {
        Commands::Validate {
            file,
            format,
            no_defaults,
        } => {
            let format = format.map(OutputFormat::from).unwrap_or(config.output.format);
            let apply = config.validation.apply_defaults && !no_defaults;
            let valid = cmd_validate(&file, format, apply)?;
            if !valid {
                std::process::exit(1);
            }
        }
        Commands::Defaults { file, output } => cmd_defaults(&file, output.as_deref())?,
        Commands::Completions { shell } => cmd_completions(shell)?,
    }

    Ok(())
}

fn cmd_completions(shell: CompletionShell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(Shell::from(shell), &mut cmd, bin_name, &mut std::io::stdout());
    Ok(())
}

/// Returns whether the manifest is valid.
fn cmd_validate(file: &Path, format: OutputFormat, apply: bool) -> anyhow::Result<bool> {
    let err = match check_manifest_file(file, apply) {
        Ok(manifest) => {
            if format == OutputFormat::Json {
                let report = serde_json::json!({ "valid": true, "errors": [] });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("✓ Manifest '{}' is valid", file.display());
                println!();
                println!("  Version: {}", manifest.version);
                println!("  Workflows: {}", manifest.workflows.len());
                println!("  Processes: {}", manifest.process_count());
            }
            return Ok(true);
        }
        Err(e) => e,
    };

    let Some(errors) = err.validation_errors() else {
        if format != OutputFormat::Json {
            return Err(err.into());
        }
        let report = serde_json::json!({
            "valid": false,
            "errors": [{ "code": err.code(), "path": file.display().to_string(), "message": err.to_string() }],
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(false);
    };

    warn!(file = %file.display(), errors = errors.len(), "manifest rejected");
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&errors.to_json())?);
    } else {
        println!("✗ Manifest '{}' has {} error(s)", file.display(), errors.len());
        println!();
        for error in errors {
            println!("  [{}] {}", error.kind.code(), error);
        }
    }
    Ok(false)
}

fn cmd_defaults(file: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let manifest = parse_manifest_file(file)?;
    let yaml = serialize_manifest(&manifest)?;

    match output {
        Some(path) => {
            std::fs::write(path, yaml)?;
            println!("✓ Wrote {}", path.display());
        }
        None => print!("{yaml}"),
    }
    Ok(())
}
