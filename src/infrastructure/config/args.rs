//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::app_config::{LogLevel, ThemeMode};
use crate::domain::entities::{SortKey, SortOrder};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "carousel",
    version,
    about = "A terminal client for the Carousel image gallery",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Base URL of the gallery backend.
    #[arg(long, env = "CAROUSEL_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Bearer token, used when none is stored in the keyring.
    #[arg(long, env = "CAROUSEL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-attempt request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Retries for transient failures.
    #[arg(long)]
    pub retry_attempts: Option<u32>,

    /// Records per gallery page.
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Serve sample records when the backend is unreachable.
    #[arg(long)]
    pub offline_fallback: Option<bool>,

    /// Complete uploads locally when the backend is unreachable.
    #[arg(long)]
    pub simulate_offline_uploads: Option<bool>,

    /// Action to run; defaults to `browse`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands; `browse` runs when none is given.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print one page of the gallery.
    List {
        /// Page number.
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Sort field.
        #[arg(long, value_enum, default_value_t = SortKey::Date)]
        sort: SortKey,
        /// Sort direction.
        #[arg(long, value_enum, default_value_t = SortOrder::Desc)]
        order: SortOrder,
        /// Client-side filter over title, description, tags and filename.
        #[arg(long)]
        filter: Option<String>,
    },
    /// Search the gallery.
    Search {
        /// Search text.
        query: String,
        /// Page number.
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Upload one or more images.
    Upload {
        /// Files to upload.
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
        /// Title; defaults to each file's name without extension.
        #[arg(long)]
        title: Option<String>,
        /// Description.
        #[arg(long)]
        description: Option<String>,
        /// Comma-separated tags.
        #[arg(long)]
        tags: Option<String>,
    },
    /// Change an image's title, description or tags.
    Edit {
        /// Image identifier.
        id: String,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New description.
        #[arg(long)]
        description: Option<String>,
        /// New comma-separated tags, replacing the old ones.
        #[arg(long)]
        tags: Option<String>,
    },
    /// Delete an image.
    Delete {
        /// Image identifier.
        id: String,
    },
    /// Sign in and store the token in the system keyring.
    Login {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Password; prompted for when omitted.
        #[arg(long, env = "CAROUSEL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Keep the token for this run only.
        #[arg(long)]
        no_persist: bool,
    },
    /// Sign out and forget the stored token.
    Logout,
    /// Create an account.
    Register {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Display name.
        #[arg(long)]
        username: String,
        /// Password; prompted for when omitted.
        #[arg(long, env = "CAROUSEL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Show the signed-in account.
    Whoami,
    /// Show the profile, or update it when any field is given.
    Profile {
        /// New display name.
        #[arg(long)]
        username: Option<String>,
        /// New email.
        #[arg(long)]
        email: Option<String>,
        /// New biography.
        #[arg(long)]
        bio: Option<String>,
    },
    /// Show or set the theme preference.
    Theme {
        /// New mode.
        #[arg(value_enum)]
        mode: Option<ThemeMode>,
    },
    /// Check backend health.
    Health,
    /// Browse the gallery interactively.
    Browse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_arguments() {
        let args = CliArgs::parse_from([
            "carousel", "upload", "a.png", "b.jpg", "--title", "T", "--tags", "x, y",
        ]);

        let Some(Command::Upload { files, title, tags, .. }) = args.command else {
            panic!("expected upload command");
        };
        assert_eq!(files.len(), 2);
        assert_eq!(title.as_deref(), Some("T"));
        assert_eq!(tags.as_deref(), Some("x, y"));
    }

    #[test]
    fn test_list_defaults() {
        let args = CliArgs::parse_from(["carousel", "list"]);
        let Some(Command::List { page, sort, order, .. }) = args.command else {
            panic!("expected list command");
        };
        assert_eq!(page, 1);
        assert_eq!(sort, SortKey::Date);
        assert_eq!(order, SortOrder::Desc);
    }

    #[test]
    fn test_upload_requires_files() {
        assert!(CliArgs::try_parse_from(["carousel", "upload"]).is_err());
    }
}
