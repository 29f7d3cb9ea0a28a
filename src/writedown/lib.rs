//! # WriteDown
//!
//! WriteDown is a **backend-agnostic note-taking front end**. You type one line; it works
//! out whether you meant to search, edit, list by tag, or write a new note, and sends the
//! request to whichever note store is configured.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (cli/, wired by main.rs)                               │
//! │  - Parses arguments, reads config, prints replies           │
//! │  - The ONLY place that knows about stdout/exit codes        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API (api.rs)                                               │
//! │  - Facade over the selected backend                         │
//! │  - Dispatches callables, classifies and routes input        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Adapters (adapter/)                                        │
//! │  - One implementation of the six note operations per store  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Input Language
//!
//! | Input              | Meaning                                  |
//! |--------------------|------------------------------------------|
//! | `/regex/`          | search                                   |
//! | `s/re/repl/ID`     | edit note `ID`                           |
//! | `#tag @context`    | list notes carrying every tag            |
//! | anything else      | handed to the fallback (default: add)    |
//!
//! See [`input::classify`] for the exact rules.
//!
//! ## No I/O Assumptions in Core
//!
//! Everything below the CLI returns `Result<CmdResult>` or `Result<Value>` and never
//! prints. The only exception is the `t` backend, which by nature runs a subprocess.
//!
//! ## Module Overview
//!
//! - [`api`]: The facade, callable dispatch, process-wide backend selection
//! - [`adapter`]: Backend contract, registry and the built-in backends
//! - [`callable`]: Callable references and the values they exchange
//! - [`input`]: Input classification and source routing
//! - [`config`]: Configuration file
//! - [`model`]: Replies (`CmdResult`, `CmdMessage`)
//! - [`error`]: Error types
//! - `cli`: Argument parsing and printing for the binary (not part of the lib API)

pub mod adapter;
pub mod api;
pub mod callable;
pub mod config;
pub mod error;
pub mod input;
pub mod model;
