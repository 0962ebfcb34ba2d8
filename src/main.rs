//! schulnetz-watch main entry point
//!
//! Command-line interface: logs into the portal, fetches a snapshot of the
//! report pages, writes it as JSON, and optionally diffs it against an
//! earlier snapshot.

use anyhow::Context;
use clap::Parser;
use schulnetz_watch::config::load_config;
use schulnetz_watch::session::{Credentials, HttpTransport, Session};
use schulnetz_watch::{diff_snapshots, fetch_snapshot, Snapshot, SnapshotDiff};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;

/// schulnetz-watch: a change watcher for schulNetz-style school portals
///
/// Logs into the configured portal, fetches the grade, absence and account
/// pages plus the teacher and student exports, cross-links everything into
/// one snapshot, and writes it as JSON for later diffing.
#[derive(Parser, Debug)]
#[command(name = "schulnetz-watch")]
#[command(version)]
#[command(about = "Fetch and diff school portal snapshots", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be fetched without logging in
    #[arg(long)]
    dry_run: bool,

    /// Diff the fresh snapshot against a previously written snapshot file
    #[arg(long, value_name = "FILE", conflicts_with = "dry_run")]
    diff: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_fetch(config, cli.diff.as_deref()).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("schulnetz_watch=info,warn"),
            1 => EnvFilter::new("schulnetz_watch=debug,info"),
            2 => EnvFilter::new("schulnetz_watch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would happen
fn handle_dry_run(config: &schulnetz_watch::Config) {
    println!("=== schulnetz-watch dry run ===\n");

    println!("Portal:");
    println!("  Base URL: {}", config.portal.base_url);
    println!("  Account: {}", config.credentials.username);

    println!("\nSession:");
    println!("  Heartbeat: every {} minutes", config.session.heartbeat_minutes);

    println!("\nOutput:");
    println!("  Snapshot: {}", config.output.snapshot_path);

    println!("\nWould fetch: grade overview, absence overview, account");
    println!("transactions, teacher export, student export");
    println!("\n✓ Configuration is valid");
}

/// Handles the main fetch operation, with an optional diff against an
/// earlier snapshot file
async fn handle_fetch(
    config: schulnetz_watch::Config,
    diff_against: Option<&Path>,
) -> anyhow::Result<()> {
    let base_url = Url::parse(&config.portal.base_url)?;
    let credentials = Credentials {
        username: config.credentials.username.clone(),
        password: config.credentials.password.clone(),
    };
    let transport = Arc::new(HttpTransport::new()?);
    let session = Session::new(
        base_url,
        credentials,
        Duration::from_secs(config.session.heartbeat_minutes * 60),
        transport,
    );

    session.login().await?;

    let snapshot = match fetch_snapshot(&session).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            // The session is already torn down on fetch failure; nothing to
            // log out of.
            return Err(e.into());
        }
    };

    session.logout().await?;

    print_summary(&snapshot);

    if let Some(previous_path) = diff_against {
        let previous = read_snapshot(previous_path)
            .with_context(|| format!("failed to read {}", previous_path.display()))?;
        let diff = diff_snapshots(&previous, &snapshot);
        print_diff(&diff);
    }

    write_snapshot(&snapshot, Path::new(&config.output.snapshot_path))
        .with_context(|| format!("failed to write {}", config.output.snapshot_path))?;
    println!("\n✓ Snapshot written to: {}", config.output.snapshot_path);

    Ok(())
}

fn print_summary(snapshot: &Snapshot) {
    println!("=== Snapshot ===\n");
    println!("  Teachers: {}", snapshot.teachers.len());
    println!("  Students: {}", snapshot.students.len());
    println!("  Subjects: {}", snapshot.subjects.len());
    println!("  Grades: {}", snapshot.grades.len());
    println!("  Absences: {}", snapshot.absences.len());
    println!("  Absence reports: {}", snapshot.absence_reports.len());
    println!("  Open absences: {}", snapshot.open_absences.len());
    println!("  Late absences: {}", snapshot.late_absences.len());
    println!("  Transactions: {}", snapshot.transactions.len());

    if !snapshot.issues.is_empty() {
        println!("\n  Issues ({}):", snapshot.issues.len());
        for issue in &snapshot.issues {
            println!("    {}", issue);
        }
    }
}

fn print_diff(diff: &SnapshotDiff) {
    println!("\n=== Changes since previous snapshot ===\n");
    if diff.is_empty() {
        println!("  No changes");
        return;
    }

    print_diff_line("Teachers", diff.teachers.added.len(), diff.teachers.modified.len(), diff.teachers.removed.len());
    print_diff_line("Students", diff.students.added.len(), diff.students.modified.len(), diff.students.removed.len());
    print_diff_line("Subjects", diff.subjects.added.len(), diff.subjects.modified.len(), diff.subjects.removed.len());
    print_diff_line("Grades", diff.grades.added.len(), diff.grades.modified.len(), diff.grades.removed.len());
    print_diff_line("Absences", diff.absences.added.len(), diff.absences.modified.len(), diff.absences.removed.len());
    print_diff_line(
        "Absence reports",
        diff.absence_reports.added.len(),
        diff.absence_reports.modified.len(),
        diff.absence_reports.removed.len(),
    );
    print_diff_line(
        "Open absences",
        diff.open_absences.added.len(),
        diff.open_absences.modified.len(),
        diff.open_absences.removed.len(),
    );
    print_diff_line(
        "Late absences",
        diff.late_absences.added.len(),
        diff.late_absences.modified.len(),
        diff.late_absences.removed.len(),
    );
    print_diff_line(
        "Transactions",
        diff.transactions.added.len(),
        diff.transactions.modified.len(),
        diff.transactions.removed.len(),
    );
}

fn print_diff_line(label: &str, added: usize, modified: usize, removed: usize) {
    if added + modified + removed > 0 {
        println!("  {}: +{} ~{} -{}", label, added, modified, removed);
    }
}

fn read_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_snapshot(snapshot: &Snapshot, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json)?;
    Ok(())
}
