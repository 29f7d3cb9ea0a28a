//! Backend keeping every note in one JSON file.
//!
//! Options:
//!
//! - `json_path`: the file (default `notes.json` in the user data directory)
//!
//! ## Storage Format
//!
//! ```text
//! {
//!   "last_id": 2,
//!   "notes": [
//!     { "id": 1, "content": "...", "created_at": "...", "updated_at": "...",
//!       "archived_at": null, "deleted_at": null },
//!     { "id": 2, ... }
//!   ]
//! }
//! ```
//!
//! `last_id` is the last id handed out. Ids are sequential and never reused. Archived and
//! trashed notes stay in the file but are hidden from `search` and `list`; `remove` without
//! trash drops the entry. The file is rewritten through a temporary file and a rename, so an
//! interrupted write never leaves half a database behind.

use super::{Adapter, EditOptions, ListOptions, Options};
use crate::callable::{Callable, Dispatch, Value};
use crate::error::{Result, WriteDownError};
use crate::model::{CmdMessage, CmdResult};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_FILENAME: &str = "notes.json";
const LINE_BREAK: &str = " ⏎ ";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    pub id: u64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Note {
    pub fn new(id: u64, content: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            content,
            created_at: now,
            updated_at: now,
            archived_at: None,
            deleted_at: None,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Neither archived nor in the trash.
    pub fn is_active(&self) -> bool {
        !self.is_archived() && !self.is_deleted()
    }

    /// `<id> - <content>` on a single line.
    pub fn line(&self) -> String {
        format!("{} - {}", self.id, self.content.replace('\n', LINE_BREAK))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct NoteFile {
    #[serde(default)]
    last_id: u64,
    #[serde(default)]
    notes: Vec<Note>,
}

impl NoteFile {
    fn find_mut(&mut self, id: &str) -> Result<&mut Note> {
        let wanted = parse_id(id)?;
        self.notes
            .iter_mut()
            .find(|n| n.id == wanted)
            .ok_or_else(|| WriteDownError::NoteNotFound(id.to_string()))
    }
}

fn parse_id(id: &str) -> Result<u64> {
    id.trim()
        .parse()
        .map_err(|_| WriteDownError::NoteNotFound(id.to_string()))
}

#[derive(Debug, Clone)]
pub struct JsonAdapter {
    path: PathBuf,
}

impl JsonAdapter {
    pub fn create(options: &Options) -> Result<Box<dyn Adapter>> {
        Ok(Box::new(Self::from_options(options)?))
    }

    pub fn from_options(options: &Options) -> Result<Self> {
        let path = match options.get("json_path") {
            Some(path) => PathBuf::from(path),
            None => ProjectDirs::from("com", "writedown", "writedown")
                .map(|dirs| dirs.data_dir().join(DEFAULT_FILENAME))
                .ok_or_else(|| {
                    WriteDownError::Config(
                        "Could not determine data directory, set json_path".to_string(),
                    )
                })?,
        };
        Ok(Self::new(path))
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<NoteFile> {
        if !self.path.exists() {
            return Ok(NoteFile::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(NoteFile::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, file: &NoteFile) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(file)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), notes = file.notes.len(), "saved notes");
        Ok(())
    }

    fn show(&self, id: &str) -> Result<CmdResult> {
        let wanted = parse_id(id)?;
        let file = self.load()?;
        let note = file
            .notes
            .iter()
            .find(|n| n.id == wanted && !n.is_deleted())
            .ok_or_else(|| WriteDownError::NoteNotFound(id.to_string()))?;

        let age = Utc::now().signed_duration_since(note.created_at);
        let added = timeago::Formatter::new().convert(age.to_std().unwrap_or_default());
        let mut result =
            CmdResult::default().with_lines(note.content.lines().map(str::to_string).collect());
        result.add_message(CmdMessage::info(format!("Note {} added {}", note.id, added)));
        if note.is_archived() {
            result.add_message(CmdMessage::info("Archived"));
        }
        Ok(result)
    }
}

impl Adapter for JsonAdapter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn search(&self, pattern: &str) -> Result<CmdResult> {
        let regex = Regex::new(pattern)?;
        let file = self.load()?;
        let lines: Vec<String> = file
            .notes
            .iter()
            .filter(|n| n.is_active() && regex.is_match(&n.content))
            .map(Note::line)
            .collect();
        if lines.is_empty() {
            return Ok(CmdResult::message(CmdMessage::info("Nothing found!")));
        }
        Ok(CmdResult::default().with_lines(lines))
    }

    fn list(
        &self,
        options: &ListOptions,
        filter: Option<&Callable>,
        dispatcher: &dyn Dispatch,
    ) -> Result<CmdResult> {
        let tags: Vec<String> = options.tags().map(str::to_lowercase).collect();
        if tags.iter().any(|tag| tag.starts_with('?')) {
            return match options.tags().collect::<Vec<_>>().as_slice() {
                [only] => self.show(&only[1..]),
                _ => Err(WriteDownError::Usage("?id".to_string())),
            };
        }

        let file = self.load()?;
        let mut lines = Vec::new();
        for note in file.notes.iter().filter(|n| n.is_active()) {
            let content = note.content.to_lowercase();
            if !tags.iter().all(|tag| content.contains(tag.as_str())) {
                continue;
            }
            if let Some(filter) = filter {
                let keep = dispatcher.apply(filter, &[Value::Text(note.content.clone())])?;
                if !keep.is_truthy() {
                    continue;
                }
            }
            lines.push(note.line());
        }
        Ok(CmdResult::default().with_lines(lines))
    }

    fn add(&self, content: &str) -> Result<CmdResult> {
        let content = content.trim_end();
        if content.trim().is_empty() {
            return Err(WriteDownError::invalid_argument("add", "note is empty"));
        }

        let mut file = self.load()?;
        let id = file
            .last_id
            .max(file.notes.iter().map(|n| n.id).max().unwrap_or(0))
            + 1;
        file.last_id = id;
        file.notes.push(Note::new(id, content.to_string()));
        self.save(&file)?;

        Ok(CmdResult::message(CmdMessage::success(format!(
            "Note {} added.",
            id
        ))))
    }

    fn edit(&self, id: &str, options: &EditOptions) -> Result<CmdResult> {
        let regex = Regex::new(&options.regex)?;
        let mut file = self.load()?;
        let note = file.find_mut(id)?;
        if note.is_deleted() {
            return Err(WriteDownError::NoteNotFound(id.to_string()));
        }

        let edited = regex
            .replace_all(&note.content, options.replacement.as_str())
            .into_owned();
        if edited == note.content {
            return Ok(CmdResult::message(CmdMessage::warning(format!(
                "Nothing to change in note {}.",
                note.id
            ))));
        }
        note.content = edited;
        note.updated_at = Utc::now();
        let line = note.line();
        self.save(&file)?;

        Ok(CmdResult::default()
            .with_lines(vec![line])
            .with_message(CmdMessage::success("Edited.")))
    }

    fn archive(&self, id: &str) -> Result<CmdResult> {
        let mut file = self.load()?;
        let note = file.find_mut(id)?;
        if note.is_deleted() {
            return Err(WriteDownError::NoteNotFound(id.to_string()));
        }
        if note.is_archived() {
            return Err(WriteDownError::AlreadyArchived(id.to_string()));
        }
        note.archived_at = Some(Utc::now());
        let id = note.id;
        self.save(&file)?;

        Ok(CmdResult::message(CmdMessage::success(format!(
            "{} archived.",
            id
        ))))
    }

    fn remove(&self, id: &str, trash: bool) -> Result<CmdResult> {
        let mut file = self.load()?;
        let message = if trash {
            let note = file.find_mut(id)?;
            if note.is_deleted() {
                return Err(WriteDownError::NoteNotFound(id.to_string()));
            }
            note.deleted_at = Some(Utc::now());
            format!("{} trashed", note.id)
        } else {
            let wanted = parse_id(id)?;
            let before = file.notes.len();
            file.notes.retain(|n| n.id != wanted);
            if file.notes.len() == before {
                return Err(WriteDownError::NoteNotFound(id.to_string()));
            }
            format!("{} removed", wanted)
        };
        self.save(&file)?;

        Ok(CmdResult::message(CmdMessage::success(message)))
    }
}
