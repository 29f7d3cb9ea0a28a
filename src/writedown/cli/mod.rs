//! # CLI Behavior
//!
//! One possible client for writedown. The CLI is the only place that knows about terminal
//! I/O, exit codes, and output formatting.
//!
//! ## Naked Execution
//!
//! Without a subcommand the input decides what happens:
//!
//! - `writedown notes.txt`: the file's contents are added as a note.
//! - `writedown "/milk/"`: the text is classified and acted on (search here).
//! - `echo "buy milk" | writedown`: piped input is added.
//! - `writedown`: notes are listed (or the configured `default_action` runs).
//!
//! Words are joined with spaces into one input, so only a single word can name a file:
//! `writedown todo.txt extra` acts on the text `todo.txt extra`, even when `todo.txt` exists.
//!
//! ## Settings
//!
//! `config.json` in the config directory provides defaults; `--backend`, `--option`,
//! and `--prefixes` override it for one run. `WRITEDOWN_HOME` points both the config and
//! the default note file at one directory. `WRITEDOWN_LOG` sets the log filter.

mod commands;
mod render;
mod setup;

pub use commands::run;
