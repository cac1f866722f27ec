use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use yamlreplace::config::Config;
use yamlreplace::file::loader::{load_resources, load_resources_from_stdin};
use yamlreplace::file::saver::{render_resources, save_resources};
use yamlreplace::replacement::{ReplacementConfig, Replacer};

/// yamlreplace - copy values between YAML resources using field paths
#[derive(Parser)]
#[command(name = "yamlreplace")]
#[command(version)]
#[command(about = "Apply replacement rules to a YAML resource stream", long_about = None)]
struct Cli {
    /// Resource file (`-` or omitted reads stdin). A single ResourceList
    /// document may carry the rules in its functionConfig.
    input: Option<PathBuf>,

    /// Rules file with a `replacements` list
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log each rule and field write to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.into()))
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Config::load();

    let input = match cli.input.as_deref() {
        Some(path) if path.as_os_str() != "-" => load_resources(path)?,
        _ => {
            if io::stdin().is_terminal() {
                anyhow::bail!("No input: pass a resource file or pipe resources on stdin");
            }
            load_resources_from_stdin()?
        }
    };

    let rules = match (&cli.config, &input.function_config) {
        (Some(path), _) => ReplacementConfig::load_from_path(path)?,
        (None, Some(function_config)) => ReplacementConfig::from_value(function_config.clone())
            .context("Failed to parse functionConfig")?,
        (None, None) => anyhow::bail!("No rules: pass --config or use a ResourceList with functionConfig"),
    };

    let replacer = Replacer::with_options(&rules, &settings.replacer_options())
        .context("Invalid replacement rules")?;
    info!(rules = replacer.replacements().len(), resources = input.resources.len(), "Running replacements");

    let mut resources = input.resources;
    replacer
        .execute(&mut resources)
        .context("Replacement failed")?;

    match cli.output {
        Some(path) => save_resources(&path, &resources, &input.format, &settings)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let rendered = render_resources(&resources, &input.format)?;
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")?;
            stdout.flush()?;
        }
    }

    Ok(())
}
