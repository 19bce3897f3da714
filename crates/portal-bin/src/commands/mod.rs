//! Subcommand definitions and handlers.

pub mod auth;
pub mod messages;
pub mod org;
pub mod prefs;
pub mod projects;
pub mod users;

use clap::Subcommand;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum MessagesCommand {
    /// List messages and the unread count
    List,
    /// Send a new message
    Send {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        content: String,
        /// low, medium, high or urgent
        #[arg(long, default_value = "medium")]
        priority: String,
        #[arg(long, default_value = "general")]
        category: String,
    },
    /// Reply to a message
    Reply { id: String, content: String },
    /// Mark a message as read
    Read { id: String },
    /// Poll for new messages until interrupted
    Watch,
}

#[derive(Subcommand)]
pub enum ProjectsCommand {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        client_id: Option<String>,
        #[arg(long)]
        budget: Option<f64>,
    },
    Update {
        id: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        progress: Option<u8>,
        #[arg(long)]
        priority: Option<String>,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum UsersCommand {
    List,
    /// Activate or deactivate an account
    Update {
        id: String,
        #[arg(long)]
        active: Option<bool>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        company: Option<String>,
    },
    /// Deactivate an account
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum OrgCommand {
    /// Active memberships and the current organization
    List,
    /// Change the current organization
    Switch { org_id: String },
    /// Projects of the current organization
    Projects,
    /// Files of the current organization
    Files,
    /// Upload a file into the current organization
    Upload {
        file: PathBuf,
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Short-lived download link for a file path
    DownloadUrl { path: String },
    /// Create an organization
    Create {
        name: String,
        #[arg(long, default_value = "")]
        slug: String,
    },
}

#[derive(Subcommand)]
pub enum PrefsCommand {
    /// Print theme and profile preferences
    Show,
    /// Set or toggle the theme
    Theme {
        /// light or dark; toggles when omitted
        value: Option<String>,
    },
    /// Change one profile preference, e.g. `notifications.sms true`
    Set { key: String, value: String },
}

/// Pretty-print a value as JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> crate::app::CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
