//! Reqforge - artifact baseline and revision-history tool.
//!
//! This is the main entry point for the reqforge CLI.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reqforge_core::{
    revision_history, ArtifactKind, ArtifactRecord, ProjectSession, SnapshotKind,
};
use reqforge_storage::json::project_storage;
use reqforge_util::log::{self, LogConfig, LogLevel};
use reqforge_util::time::format_ms;
use reqforge_vcs::GitArtifactStore;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "reqforge")]
#[command(author, version, about = "Artifact baseline and revision-history tool", long_about = None)]
struct Cli {
    /// Project root directory
    #[arg(short = 'C', long, default_value = ".")]
    root: PathBuf,

    /// Project display name (used when the project is first opened)
    #[arg(long, default_value = "Untitled Project")]
    name: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a project repository
    Init,
    /// Create an artifact file and register it in the project
    Add {
        /// Artifact kind (requirement, usecase, testcase, information, risk)
        kind: String,
        /// Artifact ID, e.g. REQ-001
        id: String,
        /// Artifact title
        #[arg(short, long, default_value = "")]
        title: String,
        /// Initial revision label
        #[arg(short, long, default_value = "01")]
        revision: String,
    },
    /// Commit an artifact file's current content
    Commit {
        /// Artifact kind
        kind: String,
        /// Artifact ID
        id: String,
        /// Commit message
        #[arg(short, long)]
        message: String,
    },
    /// Show an artifact's revision history
    History {
        /// Artifact kind
        kind: String,
        /// Artifact ID
        id: String,
        /// Only show revisions after this baseline
        #[arg(long)]
        since_baseline: Option<String>,
    },
    /// Manage baselines
    Baseline {
        #[command(subcommand)]
        command: BaselineCommands,
    },
    /// Manage version snapshots
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommands,
    },
    /// Print the revision-history section for an export
    Report {
        /// Export this baseline instead of the current state
        #[arg(long)]
        baseline: Option<String>,
    },
}

#[derive(Subcommand)]
enum BaselineCommands {
    /// Create a baseline pinning every artifact's current commit
    Create {
        /// Baseline name
        name: String,
        /// Baseline description
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// List baselines
    List,
}

#[derive(Subcommand)]
enum SnapshotCommands {
    /// List retained version snapshots
    List,
    /// Restore the project state from a snapshot
    Restore {
        /// Snapshot ID
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    log::init(LogConfig {
        print: cli.verbose,
        level: if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        },
        include_location: false,
    });

    if let Commands::Init = cli.command {
        GitArtifactStore::init(&cli.root)
            .with_context(|| format!("failed to initialize {}", cli.root.display()))?;
        println!("Initialized project at {}", cli.root.display());
        return Ok(());
    }

    let store = Arc::new(GitArtifactStore::new(&cli.root));
    let storage = project_storage(&cli.root);
    let session = ProjectSession::open(&cli.root, &cli.name, store, storage)
        .await
        .context("failed to open project session")?;

    let result = run(&cli.command, &session).await;
    session.dispose().await;
    result
}

async fn run(command: &Commands, session: &ProjectSession) -> Result<()> {
    match command {
        Commands::Init => unreachable!("handled before the session opens"),

        Commands::Add {
            kind,
            id,
            title,
            revision,
        } => {
            let kind = parse_kind(kind)?;
            let content = format!(
                "---\nid: {id}\ntitle: {title}\nrevision: \"{revision}\"\n---\n\n{title}\n"
            );
            session.write_artifact(kind, id, &content).await?;
            let commit = session
                .commit_artifact(kind, id, &format!("Add {id}"))
                .await?;
            session
                .mutate_collections(|c| {
                    let records = c.by_kind_mut(kind);
                    if !records.iter().any(|r| r.id == *id) {
                        records.push(ArtifactRecord::new(id));
                    }
                })
                .await?;
            println!("Added {} ({})", id, &commit.hash[..7.min(commit.hash.len())]);
        }

        Commands::Commit { kind, id, message } => {
            let kind = parse_kind(kind)?;
            let commit = session.commit_artifact(kind, id, message).await?;
            println!(
                "Committed {} ({})",
                id,
                &commit.hash[..7.min(commit.hash.len())]
            );
        }

        Commands::History {
            kind,
            id,
            since_baseline,
        } => {
            let kind = parse_kind(kind)?;
            let since_ms = match since_baseline {
                Some(baseline_id) => {
                    let baseline = session
                        .baselines()
                        .get(baseline_id)
                        .await?
                        .with_context(|| format!("baseline {baseline_id} not found"))?;
                    Some(baseline.timestamp_ms)
                }
                None => None,
            };

            let commits = session.windows().commits_since(kind, id, since_ms).await?;
            if commits.is_empty() {
                println!("No revisions for {id}");
                return Ok(());
            }

            let labels = session.labels();
            let path = kind.file_path(id);
            println!("{:<10} {:<5} {:<25} {:<16} Description", "Commit", "Rev", "Date", "Author");
            for commit in &commits {
                let revision = labels.label_at_commit(kind, &path, &commit.hash).await;
                println!(
                    "{:<10} {:<5} {:<25} {:<16} {}",
                    &commit.hash[..7.min(commit.hash.len())],
                    revision,
                    format_ms(commit.timestamp_ms),
                    commit.author,
                    commit.message,
                );
            }
        }

        Commands::Baseline { command } => match command {
            BaselineCommands::Create { name, description } => {
                let collections = session.collections().await;
                let baseline = session
                    .baselines()
                    .create_baseline(name, description, &collections)
                    .await?;
                // The baseline is also a point in the undo history.
                session
                    .snapshots()
                    .record_snapshot(
                        SnapshotKind::Baseline,
                        format!("Baseline: {name}"),
                        Some(name.clone()),
                    )
                    .await?;
                println!(
                    "Created baseline \"{}\" (v{}, {} artifacts pinned)",
                    baseline.name,
                    baseline.version,
                    baseline.artifact_commits.len()
                );
            }
            BaselineCommands::List => {
                let baselines = session.baselines().list().await?;
                if baselines.is_empty() {
                    println!("No baselines");
                    return Ok(());
                }
                for baseline in baselines {
                    println!(
                        "{}  v{}  {}  \"{}\"  ({} artifacts)",
                        baseline.id,
                        baseline.version,
                        format_ms(baseline.timestamp_ms),
                        baseline.name,
                        baseline.artifact_commits.len()
                    );
                }
            }
        },

        Commands::Snapshot { command } => match command {
            SnapshotCommands::List => {
                let snapshots = session.snapshots().list().await?;
                if snapshots.is_empty() {
                    println!("No version snapshots");
                    return Ok(());
                }
                for snapshot in snapshots {
                    println!(
                        "{}  {:<9}  {}  {}",
                        snapshot.id,
                        snapshot.kind.as_str(),
                        format_ms(snapshot.timestamp_ms),
                        snapshot.message
                    );
                }
            }
            SnapshotCommands::Restore { id } => {
                let restored = session.snapshots().restore_version(id).await?;
                println!("Restored \"{}\" ({})", restored.message, restored.id);
            }
        },

        Commands::Report { baseline } => {
            let collections = session.collections().await;
            let artifacts = collections.tracked();
            let history = revision_history(
                &session.baselines(),
                &session.windows(),
                &session.labels(),
                &artifacts,
                baseline.as_deref(),
            )
            .await?;

            match history {
                Some(history) => print!("{}", history.to_markdown()),
                None => println!("No revisions in the window; section omitted."),
            }
        }
    }

    Ok(())
}

fn parse_kind(s: &str) -> Result<ArtifactKind> {
    match ArtifactKind::parse(s) {
        Some(kind) => Ok(kind),
        None => bail!(
            "unknown artifact kind \"{s}\" (expected requirement, usecase, testcase, information or risk)"
        ),
    }
}
