//! CLI entry point for the chapter harvester.

use anyhow::{Context, Result};
use clap::Parser;
use harvester_core::chapter::ChapterIdentifier;
use harvester_core::config::HarvestConfig;
use harvester_core::runner::HarvestRunner;
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let mut config = HarvestConfig::load(&args.profile)
        .with_context(|| format!("cannot load profile {}", args.profile.display()))?;
    args.apply_overrides(&mut config);
    config.validate().context("invalid harvest profile")?;

    let identifiers = config.identifiers()?;
    let runner = config.build_runner()?;

    if args.dry_run {
        print_targets(&config, &runner, &identifiers);
        return Ok(());
    }

    info!(
        chapters = identifiers.len(),
        output_dir = %config.download.output_dir.display(),
        "Harvester starting"
    );
    harvest(&config, &runner, &identifiers).await
}

fn print_targets(config: &HarvestConfig, runner: &HarvestRunner, identifiers: &[ChapterIdentifier]) {
    for target in runner.resolver().resolve_all(identifiers) {
        println!(
            "{}\t{}",
            target.request_url,
            config.download.output_dir.join(&target.folder_name).display()
        );
    }
}

#[cfg(feature = "chromium")]
async fn harvest(
    config: &HarvestConfig,
    runner: &HarvestRunner,
    identifiers: &[ChapterIdentifier],
) -> Result<()> {
    use harvester_core::acquire::RenderedPageAcquirer;
    use harvester_core::renderer::chromium::ChromiumSession;

    let session = ChromiumSession::launch(&config.launch_options())
        .await
        .context("failed to launch browser")?;
    let mut acquirer = RenderedPageAcquirer::new(session, config.missing_detector())
        .with_deferred_attributes(config.selectors.deferred_attributes.clone())
        .with_lazy_load(config.lazy_load_settings())
        .with_navigation_timeout(config.navigation_timeout());

    let report = runner.run(&mut acquirer, identifiers).await;
    acquirer.into_session().close().await;

    for chapter in report.chapters() {
        info!(outcome = chapter.outcome.label(), "{}", chapter.summary_line());
    }
    info!(
        downloaded = report.downloaded(),
        skipped = report.skipped(),
        failed = report.failed(),
        assets_written = report.assets_written(),
        assets_failed = report.assets_failed(),
        "Harvest complete"
    );
    Ok(())
}

#[cfg(not(feature = "chromium"))]
#[allow(clippy::unused_async)]
async fn harvest(
    _config: &HarvestConfig,
    _runner: &HarvestRunner,
    _identifiers: &[ChapterIdentifier],
) -> Result<()> {
    anyhow::bail!("built without the `chromium` feature; only --dry-run is available")
}
