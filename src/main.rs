use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use update_resolver::config::{self, ResolverConfig};
use update_resolver::update::date::parse_date;
use update_resolver::update::feed::{Feed, FetchOutcome};
use update_resolver::update::labels::EnglishLabels;
use update_resolver::update::notices::RenderedNotice;
use update_resolver::update::package::{Environment, Package, PackageKind, Summary};

#[derive(Parser)]
#[command(name = "update-resolver")]
#[command(version, about = "Update and security-advisory resolution for packages")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Also write logs to the log file in the data directory
    #[arg(long, global = true)]
    log_file: bool,

    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a package for updates and known vulnerabilities
    Check(CheckArgs),
}

#[derive(Args)]
struct CheckArgs {
    /// Feed document to read
    #[arg(long, conflicts_with = "feed_dir")]
    feed: Option<PathBuf>,

    /// Directory containing `security.json` and `plugins/<name>.json`
    #[arg(long)]
    feed_dir: Option<PathBuf>,

    /// Installed version (defaults to the host version for the system)
    #[arg(long)]
    current: Option<String>,

    /// Check the named plugin instead of the host system
    #[arg(long)]
    plugin: Option<String>,

    /// Only report security relevant updates
    #[arg(long)]
    security_only: bool,

    #[arg(long)]
    host_version: Option<String>,

    #[arg(long)]
    runtime_version: Option<String>,

    /// License renewal date (YYYY-MM-DD)
    #[arg(long)]
    license_renewal: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    #[serde(flatten)]
    summary: Summary,
    notices: Vec<RenderedNotice>,
    errors: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = init_logging(cli.verbose, cli.log_file)?;

    let config = ResolverConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Check(args) => check(args, &config),
    }
}

fn init_logging(verbose: u8, log_file: bool) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let stderr = fmt::layer().with_target(false).with_writer(std::io::stderr);

    if !log_file {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr)
            .init();
        return Ok(None);
    }

    let log_path = config::log_path();
    let (Some(dir), Some(file_name)) = (log_path.parent(), log_path.file_name()) else {
        bail!("Invalid log path: {}", log_path.display());
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        dir, file_name,
    ));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr)
        .with(fmt::layer().json().with_writer(writer))
        .init();

    Ok(Some(guard))
}

fn check(args: CheckArgs, config: &ResolverConfig) -> Result<()> {
    let kind = match args.plugin {
        Some(name) => PackageKind::Plugin { name },
        None => PackageKind::System,
    };

    let host_version = args.host_version.or_else(|| config.host_version.clone());
    let current = match (&kind, args.current) {
        (_, Some(current)) => current,
        (PackageKind::System, None) => host_version
            .clone()
            .context("No installed version given, use --current or --host-version")?,
        (PackageKind::Plugin { .. }, None) => {
            bail!("No installed plugin version given, use --current")
        }
    };

    let license_renewal = match args.license_renewal {
        Some(renewal) => Some(
            parse_date(&renewal)
                .with_context(|| format!("Invalid license renewal date: {renewal}"))?,
        ),
        None => config.license_renewal(),
    };

    let environment = Environment {
        host_version,
        runtime_version: args
            .runtime_version
            .or_else(|| config.runtime_version.clone()),
        license_renewal,
        ..Default::default()
    };

    let feed_path = match (args.feed, args.feed_dir.or_else(|| config.feed_dir.clone())) {
        (Some(feed), _) => feed,
        (None, Some(dir)) => dir.join(format!("{}.json", kind.key())),
        (None, None) => bail!("No feed given, use --feed or --feed-dir"),
    };
    info!("Reading update data from {}", feed_path.display());

    let outcome = FetchOutcome::from(Feed::load(&feed_path));
    let package = Package::from_fetch(
        kind,
        current,
        outcome,
        args.security_only || config.security_only,
        &environment,
    );

    let report = Report {
        summary: package.summary(&EnglishLabels),
        notices: package.notices().render(&EnglishLabels),
        errors: package.error_messages(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &Report) {
    let summary = &report.summary;
    match &summary.plugin_name {
        Some(name) => println!("{} {}", name, summary.current_version),
        None => println!("Kirby {}", summary.current_version),
    }
    println!("  {} (latest: {})", summary.label, summary.latest_version);
    if let Some(url) = &summary.url {
        println!("  {}", url);
    }

    for notice in &report.notices {
        println!("[{}] {}", notice.icon, notice.text);
        if let Some(link) = &notice.link {
            println!("  {}", link);
        }
    }

    for error in &report.errors {
        eprintln!("error: {}", error);
    }
}
