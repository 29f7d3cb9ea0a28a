use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Returns the version string, including git hash and commit date for non-release builds.
/// Format: "0.3.0" for releases, "0.3.0@abc1234 2024-01-15 14:30" for dev builds
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("WRITEDOWN_GIT_HASH");
    const COMMIT_DATE: &str = env!("WRITEDOWN_COMMIT_DATE");
    const IS_RELEASE: &str = env!("WRITEDOWN_IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{} {}", VERSION, GIT_HASH, COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "writedown",
    bin_name = "writedown",
    version = get_version()
)]
#[command(about = "One line in: search, edit, list by tag, or add a note", long_about = None)]
#[command(after_help = "Input forms:\n  /regex/           search\n  s/re/repl/ID      edit note ID\n  #tag @context     list notes carrying every tag\n  anything else     add a note (or the configured fallback)\n\nWith no input, piped stdin is added; otherwise notes are listed.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// A file to add, or text to act on (words are joined with spaces)
    pub input: Vec<String>,

    /// Backend to use (example, t, json)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub backend: Option<String>,

    /// Backend option, repeatable (e.g. -o json_path=notes.json)
    #[arg(
        short = 'o',
        long = "option",
        value_name = "KEY=VALUE",
        value_parser = parse_key_value,
        global = true,
        help_heading = "Options"
    )]
    pub options: Vec<(String, String)>,

    /// Characters that start a tag
    #[arg(short, long, global = true, help_heading = "Options")]
    pub prefixes: Option<String>,

    /// Configuration directory
    #[arg(short, long = "config", value_name = "DIR", global = true, help_heading = "Options")]
    pub config_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got `{}`", s)),
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search notes with a regular expression
    #[command(display_order = 1)]
    Search { pattern: String },

    /// List notes, only those carrying every given tag
    #[command(alias = "ls", display_order = 2)]
    List { tags: Vec<String> },

    /// Add a note
    #[command(alias = "n", display_order = 3)]
    Add {
        /// Note words (joined with spaces)
        #[arg(required = true, num_args = 1..)]
        content: Vec<String>,
    },

    /// Replace matches of REGEX in a note
    #[command(alias = "e", display_order = 4)]
    Edit {
        id: String,
        regex: String,
        replacement: String,
    },

    /// Archive a note
    #[command(alias = "a", display_order = 5)]
    Archive { id: String },

    /// Move a note to the trash
    #[command(alias = "rm", display_order = 6)]
    Remove {
        id: String,

        /// Delete for good instead of trashing
        #[arg(long)]
        purge: bool,
    },

    /// Get or set configuration
    #[command(display_order = 10)]
    Config {
        /// Configuration key (e.g., backend, prefixes, json_path)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}
