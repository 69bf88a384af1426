use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use repo_pulse::config::Config;
use repo_pulse::{PulseClient, ScanReport};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT_HASH"),
    " ",
    env!("GIT_COMMIT_DATE"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

/// Show recent commits from every git repository under a directory
#[derive(Parser, Debug)]
#[command(name = "repo-pulse", version = VERSION, about, long_about = None)]
struct Args {
    /// Directory to search for repositories
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Directory levels to search, counting the root itself
    #[arg(short, long)]
    depth: Option<usize>,

    /// Days of history to show
    #[arg(long)]
    days: Option<u32>,

    /// Maximum commits read from each repository
    #[arg(long)]
    max_commits: Option<usize>,

    /// Number of repositories queried at once
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Seconds allowed for each batch of queries
    #[arg(long)]
    timeout: Option<u64>,

    /// Only commits by this author; "me" uses your git identity
    #[arg(short, long)]
    author: Option<String>,

    /// Extra directory-name substrings to skip (repeatable)
    #[arg(long = "ignore", value_name = "PATTERN")]
    ignore: Vec<String>,

    /// Config file (default: platform config dir)
    #[arg(long, env = "REPO_PULSE_CONFIG")]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Print one merged list instead of grouping by repository
    #[arg(long, conflicts_with = "json")]
    timeline: bool,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    // Logs go to stderr so stdout stays clean for results
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => Config::with_file(path)?,
        None => Config::new()?,
    };
    let client = PulseClient::with_config(config);

    let root = args
        .root
        .canonicalize()
        .with_context(|| format!("Cannot access {}", args.root.display()))?;

    let mut request = client.scan_config(&root);
    if let Some(depth) = args.depth {
        request.max_depth = depth;
    }
    if let Some(days) = args.days {
        request.days_back = days;
    }
    if let Some(max) = args.max_commits {
        request.max_commits_per_repository = max;
    }
    if let Some(limit) = args.concurrency {
        request.concurrency_limit = limit;
    }
    if let Some(secs) = args.timeout {
        request.timeout = Duration::from_secs(secs);
    }
    if args.author.is_some() {
        request.author_filter = args.author.clone();
    }
    request.ignore_patterns.extend(args.ignore.iter().cloned());

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted; stopping running queries");
                cancel.cancel();
            }
        }
    });

    let report = client.scan_cancellable(&request, cancel).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if args.timeline {
        print_timeline(&report, &root);
    } else {
        print_grouped(&report, &root);
    }

    if report.timed_out() {
        eprintln!(
            "warning: {} repositories did not answer in time; results are incomplete",
            report.repositories_timed_out
        );
    }

    Ok(())
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Path relative to the scan root, or the root's own name for the root itself
fn display_path(path: &std::path::Path, root: &std::path::Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.display().to_string(),
        _ => path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string()),
    }
}

fn print_grouped(report: &ScanReport, root: &std::path::Path) {
    if report.repositories.is_empty() {
        println!(
            "No recent commits in {} repositories.",
            report.repositories_found
        );
        return;
    }

    for repo in &report.repositories {
        println!("{}", display_path(&repo.path, root));
        for commit in &repo.commits {
            println!(
                "  {}  {}  [{}]  {}  ({})",
                commit.date,
                short_id(&commit.id),
                commit.branch,
                commit.message,
                commit.author
            );
        }
        println!();
    }

    println!(
        "{} commits in {} of {} repositories ({}ms)",
        report.commit_count(),
        report.repositories.len(),
        report.repositories_found,
        report.duration_ms
    );
}

fn print_timeline(report: &ScanReport, root: &std::path::Path) {
    for (path, commit) in report.timeline() {
        println!(
            "{}  {:<24}  {}  {}  ({})",
            commit.date,
            display_path(path, root),
            short_id(&commit.id),
            commit.message,
            commit.author
        );
    }
}
