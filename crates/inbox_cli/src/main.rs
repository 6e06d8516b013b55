//! `inbox` command-line front end.
//!
//! # Responsibility
//! - Drive the inbox core against a SQLite file from the shell.
//! - Layer flags and environment over the TOML configuration file.
//!
//! # Invariants
//! - Every submission waits for its classification before the process exits.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use inbox_core::{
    conversion_suggestions, init_logging, next_steps, ClassificationOutcome, InboxConfig,
    InboxView, Item, ItemId, ItemStatus, ItemType, KeywordClassifier, LifecycleEngine,
    SqliteItemStore, Submission,
};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_DB_FILE: &str = "inbox.db";

#[derive(Parser)]
#[command(name = "inbox")]
#[command(version)]
#[command(about = "Capture inbox: classify, bucket and convert captured items")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "INBOX_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, env = "INBOX_DB")]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files
    #[arg(long, env = "INBOX_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture text or a URL
    Submit {
        content: String,

        /// Item type: text or url
        #[arg(short = 't', long = "type", default_value = "text")]
        kind: ItemType,
    },

    /// Capture an uploaded file
    Upload { path: PathBuf },

    /// Show the inbox buckets
    List {
        /// Show the archive instead of tasks and knowledge
        #[arg(long)]
        archived: bool,

        /// Dump every stored item, deleted ones included
        #[arg(long, conflicts_with = "archived")]
        all: bool,
    },

    /// Show one item
    Show { id: ItemId },

    /// Archive an item
    Archive { id: ItemId },

    /// Delete an item (it stays addressable by id)
    Delete { id: ItemId },

    /// Create a derived task from an item
    Convert {
        id: ItemId,

        /// Derived task text
        #[arg(required_unless_present = "suggestion")]
        content: Option<String>,

        /// Use the numbered suggestion from `inbox suggest`
        #[arg(short, long, conflicts_with = "content")]
        suggestion: Option<usize>,
    },

    /// List conversion suggestions for an item
    Suggest { id: ItemId },

    /// Retry classification for a pending item
    Reclassify { id: ItemId },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => InboxConfig::load(path)?,
        None => InboxConfig::default(),
    };

    if let Some(log_dir) = cli.log_dir.as_ref().or(config.log_dir.as_ref()) {
        init_logging(config.effective_log_level(), log_dir)?;
    }

    let db_path = cli
        .db
        .or_else(|| config.database_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE));
    let engine = open_engine(&db_path, &config)?;

    match cli.command {
        Commands::Submit { content, kind } => {
            if kind == ItemType::File {
                bail!("files must be captured with `inbox upload <path>`");
            }
            let submission = engine.submit(content, kind)?;
            report_submission(&engine, submission).await?;
        }
        Commands::Upload { path } => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("failed to read `{}`", path.display()))?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| anyhow!("`{}` has no file name", path.display()))?;
            let submission = engine.submit_file(&bytes, &filename).await?;
            report_submission(&engine, submission).await?;
        }
        Commands::List { archived, all } => list(&engine, archived, all)?,
        Commands::Show { id } => show(&engine.get(id)?),
        Commands::Archive { id } => {
            let item = engine.set_status(id, ItemStatus::Archived)?;
            println!("{} {}", item.id, item.status);
        }
        Commands::Delete { id } => {
            let item = engine.set_status(id, ItemStatus::Deleted)?;
            println!("{} {}", item.id, item.status);
        }
        Commands::Convert {
            id,
            content,
            suggestion,
        } => {
            let derived_content = match (content, suggestion) {
                (Some(content), _) => content,
                (None, Some(index)) => pick_suggestion(&engine.get(id)?, index)?,
                (None, None) => bail!("provide derived content or --suggestion"),
            };
            let derived = engine.convert(id, derived_content)?;
            show(&derived);
        }
        Commands::Suggest { id } => {
            let item = engine.get(id)?;
            for (index, suggestion) in conversion_suggestions(&item).iter().enumerate() {
                println!("{}. {}", index + 1, suggestion);
            }
        }
        Commands::Reclassify { id } => {
            let outcome = engine.reclassify(id)?.await??;
            print_outcome(&outcome);
        }
    }

    Ok(())
}

fn open_engine(db_path: &Path, config: &InboxConfig) -> Result<LifecycleEngine<SqliteItemStore>> {
    let store = SqliteItemStore::open(db_path)
        .with_context(|| format!("failed to open inbox database `{}`", db_path.display()))?;
    info!(
        "event=cli_start module=cli status=ok summary_sentences={}",
        config.classifier.summary_sentences
    );
    Ok(LifecycleEngine::new(
        store,
        Arc::new(KeywordClassifier::new(config.classifier)),
    ))
}

async fn report_submission(
    engine: &LifecycleEngine<SqliteItemStore>,
    submission: Submission,
) -> Result<()> {
    let id = submission.item.id;
    match submission.classification {
        Some(handle) => print_outcome(&handle.await??),
        None => println!("{id} pending (text extraction failed; run `inbox reclassify {id}` later)"),
    }
    show(&engine.get(id)?);
    Ok(())
}

fn print_outcome(outcome: &ClassificationOutcome) {
    match outcome {
        ClassificationOutcome::Applied(item) => println!("{} classified", item.id),
        ClassificationOutcome::AlreadyClassified(item) => {
            println!("{} already classified", item.id)
        }
        ClassificationOutcome::Failed(failure) => println!("classification failed: {failure}"),
    }
}

fn list(engine: &LifecycleEngine<SqliteItemStore>, archived: bool, all: bool) -> Result<()> {
    if all {
        for item in engine.list_items()? {
            print_row(&item);
        }
        return Ok(());
    }

    let buckets = engine.buckets()?;
    match buckets.view(archived) {
        InboxView::Inbox { tasks, knowledge } => {
            println!("== tasks ({})", tasks.len());
            tasks.iter().for_each(print_row);
            println!("== knowledge ({})", knowledge.len());
            knowledge.iter().for_each(print_row);
        }
        InboxView::Archived(items) => {
            println!("== archived ({})", items.len());
            items.iter().for_each(print_row);
        }
    }
    Ok(())
}

fn print_row(item: &Item) {
    println!(
        "{}  {:<8} {:<4} {}  [{}]",
        item.id,
        item.status,
        item.kind,
        item.display_summary(),
        item.tags.labels().join(", ")
    );
}

fn show(item: &Item) {
    println!("id:         {}", item.id);
    println!("type:       {}", item.kind);
    println!("status:     {}", item.status);
    println!("created_at: {}", item.created_at.to_rfc3339());
    println!("summary:    {}", item.display_summary());
    println!("tags:       {}", item.tags.labels().join(", "));
    if let Some(parent) = item.derived_from {
        println!("derived_from: {parent}");
        println!("next steps:");
        for step in next_steps(&item.content) {
            println!("  - {step}");
        }
    }
    println!();
    println!("{}", item.content);
}

fn pick_suggestion(item: &Item, index: usize) -> Result<String> {
    let suggestions = conversion_suggestions(item);
    index
        .checked_sub(1)
        .and_then(|position| suggestions.get(position).cloned())
        .ok_or_else(|| anyhow!("suggestion must be between 1 and {}", suggestions.len()))
}
