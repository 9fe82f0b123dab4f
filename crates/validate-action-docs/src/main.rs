//! Command-line entry point

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use action_docs_examples::ValidationOptions;
use action_docs_schema::ActionIdentity;
use validate_action_docs::{RunConfig, run, write_json, write_text};

#[derive(Parser, Debug)]
#[command(name = "validate-action-docs")]
#[command(about = "Check action usage examples in documentation against the action manifests")]
#[command(version)]
struct Cli {
    /// Repository root to scan
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Repository identifier, as `owner/name`
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: String,

    /// Identifier of the repository this one was forked from
    #[arg(long, value_name = "OWNER/NAME")]
    parent: Option<String>,

    /// Documentation files to check (glob patterns relative to the root)
    #[arg(long = "docs", value_name = "PATTERN", default_values_t = vec!["**/*.md".to_string()])]
    docs: Vec<String>,

    /// Also report required inputs missing from example steps
    #[arg(long)]
    check_required: bool,

    /// Output results as JSONL
    #[arg(long)]
    json: bool,

    /// Show debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "validate_action_docs=debug,action_docs_schema=debug,action_docs_examples=debug"
    } else {
        "validate_action_docs=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = RunConfig {
        root: cli.root,
        identity: ActionIdentity {
            repository: cli.repository,
            parent: cli.parent,
        },
        docs: cli.docs,
        options: ValidationOptions {
            check_required_inputs: cli.check_required,
        },
    };

    let outcome = run(&config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        write_json(&mut out, &outcome)?;
    } else {
        write_text(&mut out, &outcome)?;
    }

    Ok(if outcome.summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
