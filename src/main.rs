//! cades-batch - Batch document signer
//!
//! Signs folders of documents with detached long-term signatures.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use dialoguer::{Confirm, Password, theme::ColorfulTheme};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use cades_batch::application::BatchSigner;
use cades_batch::application::dto::BatchSummary;
use cades_batch::domain::entities::CancellationToken;
use cades_batch::infrastructure::persistence::JsonFileLedger;
use cades_batch::infrastructure::providers::SoftwareProvider;
use cades_batch::infrastructure::scanning::{find_unsigned_files, remove_signatures};
use cades_batch::presentation::cli::{Cli, Commands, ProgressReporter, SignArgs};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Sign(args) => run_sign(&args),
        Commands::Scan { root, ext } => run_scan(&root, &ext),
        Commands::Clean { root, yes } => run_clean(&root, yes),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_sign(args: &SignArgs) -> Result<ExitCode> {
    let config = args.to_config().context("Invalid configuration")?;

    let password = match &args.password {
        Some(password) => password.clone(),
        None => Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Key password")
            .allow_empty_password(true)
            .interact()
            .context("Failed to read key password")?,
    };

    let cancellation = CancellationToken::new();
    let token = cancellation.clone();
    ctrlc::set_handler(move || token.cancel()).context("Failed to set Ctrl+C handler")?;

    let mut signer = BatchSigner::new(config, Arc::new(SoftwareProvider::new()))
        .context("Invalid configuration")?
        .with_cancellation(cancellation.clone());

    if let Some(path) = &args.ledger {
        let ledger = JsonFileLedger::open(path)
            .with_context(|| format!("Failed to open ledger {}", path.display()))?;
        signer = signer.with_ledger(Arc::new(ledger));
    }

    let reporter = ProgressReporter::pending();
    let start = Instant::now();
    let results = signer
        .sign_documents_batch(
            &args.root,
            &password,
            args.output.as_deref(),
            Some(reporter.signing_callback()),
        )
        .with_context(|| format!("Failed to sign documents in {}", args.root.display()))?;
    reporter.clear();

    if results.is_empty() {
        println!("{}", style("Nothing to sign: every document already has a signature.").green());
        return Ok(ExitCode::SUCCESS);
    }

    let summary = BatchSummary::from_results(&results, start.elapsed());
    if summary.all_succeeded() {
        println!("{}", style(&summary).green());
    } else {
        println!("{}", style(&summary).yellow());
    }

    if cancellation.is_cancelled() {
        println!("{}", style("Signing was interrupted.").yellow().bold());
    }

    Ok(if summary.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_scan(root: &Path, extensions: &[String]) -> Result<ExitCode> {
    let files = find_unsigned_files(root, extensions)
        .with_context(|| format!("Failed to scan {}", root.display()))?;

    for file in &files {
        println!("{}", file.display());
    }
    println!(
        "{} {}",
        style(files.len()).cyan().bold(),
        style("unsigned document(s)").cyan()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_clean(root: &Path, skip_confirm: bool) -> Result<ExitCode> {
    if !skip_confirm {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Delete every signature under {}?", root.display()))
            .default(false)
            .interact()
            .context("Failed to confirm")?;

        if !confirmed {
            println!("\nOperation cancelled.");
            return Ok(ExitCode::SUCCESS);
        }
    }

    let removed =
        remove_signatures(root).with_context(|| format!("Failed to clean {}", root.display()))?;
    println!("{} {}", style(removed).cyan().bold(), style("signature(s) removed").cyan());
    Ok(ExitCode::SUCCESS)
}
