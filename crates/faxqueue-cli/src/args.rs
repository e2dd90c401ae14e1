use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// faxqueue - producer front end for the fax job spool
#[derive(Parser, Debug)]
#[command(name = "faxqueue")]
#[command(version)]
#[command(about = "Queue, cancel and inspect fax jobs", long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short = 'c', long = "config", env = "FAXQUEUE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Spool root, overrides `base_directory` from the configuration
    #[arg(long = "base", global = true)]
    pub base: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long = "json-logs", global = true)]
    pub json_logs: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the spool, bucket and database layout
    Init,

    /// List source buckets, or the sendable documents in one bucket
    Sources {
        bucket: Option<String>,
    },

    /// Queue one job per selected document
    Submit(SubmitArgs),

    /// Ask the worker to abort a queued or processing job
    Cancel {
        job_id: String,
        /// `queue` or `processing`
        stage: String,
    },

    /// Stage counts and the active job preview
    Status {
        /// Maximum number of active jobs to show
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Most recent outcome records of an archive
    Archive {
        kind: ArchiveArg,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print an outcome record, or the path of a companion artifact
    Fetch {
        kind: ArchiveArg,
        name: String,
    },

    /// Delete or adopt failure records
    Cleanup {
        action: CleanupAction,
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Manage the address book
    #[command(subcommand)]
    Contacts(ContactsCommand),
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Source bucket
    #[arg(long)]
    pub src: String,

    /// Document file name inside the bucket (repeatable)
    #[arg(long = "file", required = true)]
    pub files: Vec<String>,

    #[arg(long, default_value = "")]
    pub name: String,

    #[arg(long, default_value = "")]
    pub number: String,

    /// Address book entry used for an empty name or number
    #[arg(long = "contact")]
    pub contact: Option<i64>,

    /// Enable error correction mode
    #[arg(long)]
    pub ecm: bool,

    /// `fine` or `standard`
    #[arg(long, default_value = "fine")]
    pub resolution: String,

    /// Store the recipient in the address book afterwards
    #[arg(long = "save-contact")]
    pub save_contact: bool,
}

#[derive(Subcommand, Debug)]
pub enum ContactsCommand {
    List,
    Save {
        /// Existing contact to update
        #[arg(long)]
        id: Option<i64>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        number: String,
        #[arg(long, default_value = "")]
        note: String,
    },
    Delete {
        id: i64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveArg {
    Success,
    Failure,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CleanupAction {
    Delete,
    Adopt,
}
