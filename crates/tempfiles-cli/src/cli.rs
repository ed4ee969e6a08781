//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tempfiles", about = "Manage short-lived uploaded files", version)]
pub struct Cli {
    /// Storage root. Overrides TEMPFILES_ROOT.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a local file as a new temporary file
    Create {
        /// File to store
        path: PathBuf,
        /// Stored filename (defaults to the source basename)
        #[arg(long)]
        name: Option<String>,
        /// Arbitrary metadata as a JSON object
        #[arg(long)]
        data: Option<String>,
        /// Id of the creating user
        #[arg(long)]
        owner: Option<String>,
        /// Remove the source file after storing it
        #[arg(long)]
        delete_original: bool,
    },
    /// Print a file's descriptor
    Get { id: String },
    /// Write a file's contents to stdout
    Cat { id: String },
    /// List stored files
    List {
        /// Only files past their expiry
        #[arg(long)]
        expired: bool,
    },
    /// Protect a file from deletion
    Lock { id: String },
    /// Allow a file to be deleted again
    Unlock { id: String },
    /// Delete a file unless it is locked
    Delete { id: String },
    /// Delete every expired, unlocked file
    Cleanup,
    /// Delete every file, locked or not
    Clear {
        /// Required; this cannot be undone
        #[arg(long)]
        yes: bool,
        /// Also remove record directories whose manifest is missing or unreadable
        #[arg(long)]
        include_corrupt: bool,
    },
    /// Run background reclamation for the configured mode until Ctrl-C
    ///
    /// Queued mode sweeps on the configured interval as well, since
    /// reclaims scheduled by other processes are not visible here.
    Watch,
}
