use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "prep")]
#[command(about = "Track interview prep: practice logs, topics and job applications")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name for remote sync configuration (also selects the
    /// profile `config init` writes)
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record and review practice sessions
    Log {
        #[command(subcommand)]
        command: LogCommands,
    },
    /// Browse the topic catalog
    Topic {
        #[command(subcommand)]
        command: TopicCommands,
    },
    /// Track job applications
    #[command(alias = "apps")]
    App {
        #[command(subcommand)]
        command: AppCommands,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Show the dashboard (default)
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Merge local data with the remote row
    Sync {
        #[command(subcommand)]
        command: Option<SyncCommands>,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Export visible data
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum LogCommands {
    /// Log a practice session
    #[command(alias = "new")]
    Add {
        /// Minutes spent practicing
        #[arg(short, long)]
        minutes: u32,
        /// Session date (defaults to today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
        /// Questions per resource, e.g. `leetcode=3` (repeatable)
        #[arg(short, long = "resource", value_name = "NAME=COUNT")]
        resources: Vec<String>,
        /// Topic id, id prefix or name (repeatable)
        #[arg(short, long = "topic", value_name = "TOPIC")]
        topics: Vec<String>,
        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List recent practice sessions
    List {
        /// Number of sessions to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a practice session
    Edit {
        /// Log ID or unique ID prefix
        id: String,
        #[arg(short, long)]
        minutes: Option<u32>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
        /// Replace resources, e.g. `leetcode=3` (repeatable)
        #[arg(short, long = "resource", value_name = "NAME=COUNT")]
        resources: Vec<String>,
        /// Replace topics (repeatable)
        #[arg(short, long = "topic", value_name = "TOPIC")]
        topics: Vec<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Delete a practice session
    Delete {
        /// Log ID or unique ID prefix
        id: String,
    },
}

#[derive(Subcommand)]
pub enum TopicCommands {
    /// List topics with practice stats
    List {
        /// Only show topics in this category
        #[arg(short, long)]
        category: Option<String>,
        /// Hide topics moved to revision
        #[arg(long)]
        open: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move a topic to casual revision
    Complete {
        /// Topic id, id prefix or name
        topic: String,
        /// Move the topic back to active practice
        #[arg(long)]
        undo: bool,
    },
    /// Rebuild practice counts from the logs
    Recompute,
}

#[derive(Subcommand)]
pub enum AppCommands {
    /// Track a new application
    #[command(alias = "new")]
    Add {
        /// Company name
        company: String,
        /// Role title
        #[arg(short, long, default_value = "")]
        title: String,
        /// Posting URL
        #[arg(long)]
        link: Option<String>,
        /// Application date (defaults to today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
        /// Pipeline stage (defaults to Applied)
        #[arg(short, long)]
        status: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List active and stale applications
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an application
    Update {
        /// Application ID or unique ID prefix
        id: String,
        #[arg(long)]
        company: Option<String>,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(long)]
        link: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
        #[arg(short, long)]
        status: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Delete an application
    Delete {
        /// Application ID or unique ID prefix
        id: String,
    },
    /// Mark applications untouched for two weeks as stale
    Sweep,
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Print current settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set one option; the value is parsed as JSON, falling back to text
    Set { key: String, value: String },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Show sync configuration and local state
    Status,
    /// List recently resolved sync conflicts
    Conflicts {
        /// Number of conflicts to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Remote table name
        #[arg(long, value_name = "TABLE")]
        table: Option<String>,
        /// Shared row key; use the same value on every device
        #[arg(long, value_name = "ID")]
        user_id: Option<String>,
        /// How syncs reconcile local and remote data
        #[arg(long, value_enum)]
        sync_mode: Option<SyncModeArg>,
        /// Keep the current active profile
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the resolved profile
    Show,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SyncModeArg {
    Merge,
    LastModified,
}

impl From<ExportFormat> for preptrack_core::export::ExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => Self::Json,
            ExportFormat::Markdown => Self::Markdown,
        }
    }
}

impl From<SyncModeArg> for preptrack_core::config::SyncMode {
    fn from(mode: SyncModeArg) -> Self {
        match mode {
            SyncModeArg::Merge => Self::Merge,
            SyncModeArg::LastModified => Self::LastModified,
        }
    }
}
