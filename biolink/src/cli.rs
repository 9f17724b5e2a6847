///
/// This module implements the CLI interface for biolink: command parsing, argument validation,
/// the async entrypoint, and user-visible output.
///
/// All domain logic (config model, localization pipeline, favicons, contact cards) lives in the
/// [`biolink-core`] crate. This module only wires it to files, the environment and stdout.
///
/// ## How To Use
/// - For command-line users: use the installed `biolink` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`biolink-core`]: ../../biolink-core/
use crate::load_config::load_config;
use anyhow::{Context, Result};
use biolink_core::assets::{resolved_asset, Availability};
use biolink_core::config::SiteConfig;
use biolink_core::contract::{AssetKind, DownloadOutcome};
use biolink_core::download::HttpFetcher;
use biolink_core::envfile::render_localized_env;
use biolink_core::page::PageModel;
use biolink_core::pipeline::{localize, FaviconOutcome, LocalizationReport};
use biolink_core::vcard::{self, generate_contact_card, ContactCardInput};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI for biolink: build-time tooling for a link-in-bio page.
#[derive(Parser)]
#[clap(
    name = "biolink",
    version,
    about = "Localize remote profile assets and generate the contact card for a link-in-bio page"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to an optional YAML file with build settings
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Env file to load before `.env.local` and `.env`
    #[clap(long)]
    pub env_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download remote assets into the public directory and derive favicons
    Localize {
        #[clap(flatten)]
        config: ConfigArgs,
        /// Also write an env file pointing every localized asset at its local path
        #[clap(long)]
        write_env: Option<PathBuf>,
    },
    /// Generate the vCard contact file
    Vcard {
        #[clap(flatten)]
        config: ConfigArgs,
        /// Output path (defaults to `<name>.vcf` in the current directory)
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Print the resolved page model as JSON
    PageData {
        #[clap(flatten)]
        config: ConfigArgs,
    },
}

fn load(args: &ConfigArgs) -> Result<SiteConfig> {
    load_config(args.config.as_deref(), args.env_file.as_deref())
}

fn fetcher_for(config: &SiteConfig) -> Result<HttpFetcher> {
    HttpFetcher::new(Duration::from_secs(config.build.timeout_secs))
        .context("Failed to construct HTTP client")
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Localize { config, write_env } => {
            let config = load(&config)?;
            tracing::info!(command = "localize", "Starting asset localization");
            let fetcher = fetcher_for(&config)?;
            let report = localize(&config, &fetcher)
                .await
                .context("Asset localization failed")?;
            print_summary(&report);

            if let Some(path) = write_env {
                write_env_file(&config, &path)?;
            }

            match &report.favicons {
                FaviconOutcome::Failed(reason) => {
                    tracing::error!(command = "localize", error = %reason, "Favicon generation failed");
                    anyhow::bail!("favicon generation failed: {reason}")
                }
                _ => {
                    tracing::info!(command = "localize", failed = report.failed_count(), "Localization complete");
                    Ok(())
                }
            }
        }
        Commands::Vcard { config, output } => {
            let config = load(&config)?;
            tracing::info!(command = "vcard", "Generating contact card");
            let fetcher = fetcher_for(&config)?;

            let mut input = ContactCardInput::from(&config);
            // A localized copy beats the configured remote URL.
            if let Availability::Local(path) = resolved_asset(&config, AssetKind::ProfileImage) {
                input.profile_image = Some(path);
            }
            let card = generate_contact_card(&input, &fetcher, Some(&config.build.public_dir)).await;

            let output = output.unwrap_or_else(|| PathBuf::from(vcard::file_name(&config.profile.name)));
            write_output(&output, &card.render())?;
            println!("Wrote {}", output.display());
            tracing::info!(command = "vcard", output = %output.display(), "Contact card written");
            Ok(())
        }
        Commands::PageData { config } => {
            let config = load(&config)?;
            let model = PageModel::from_config(&config);
            let json = serde_json::to_string_pretty(&model).context("Failed to serialize page model")?;
            println!("{json}");
            Ok(())
        }
    }
}

fn print_summary(report: &LocalizationReport) {
    for download in &report.downloads {
        let name = download.spec.kind.file_name();
        match &download.outcome {
            DownloadOutcome::Downloaded { bytes } => println!("downloaded {name} ({bytes} bytes)"),
            DownloadOutcome::Skipped => println!("skipped    {name}"),
            DownloadOutcome::Failed { reason } => println!("failed     {name}: {reason}"),
        }
    }
    match &report.favicons {
        FaviconOutcome::Generated(set) => println!("favicons   {} files", set.files().count()),
        FaviconOutcome::Skipped => println!("favicons   skipped"),
        FaviconOutcome::Failed(reason) => println!("favicons   failed: {reason}"),
    }
    println!(
        "marker     {} local assets at {}",
        report.marker.assets.len(),
        report.marker.generated_at
    );
}

fn write_env_file(config: &SiteConfig, path: &Path) -> Result<()> {
    write_output(path, &render_localized_env(config))?;
    println!("Wrote {}", path.display());
    tracing::info!(env_file = %path.display(), "Localized env file written");
    Ok(())
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}
