//! Backend for [t](https://github.com/sjl/t), the command-line todo list.
//!
//! Every operation runs `t.py --task-dir <dir> --list <list> ...` and reads its output.
//! Options:
//!
//! - `t_command`: program to run, optionally followed by leading arguments
//!   (default `t.py`)
//! - `task_dir`: directory holding the task lists (default `$HOME/tasks`)
//! - `list`: name of the task list (default `tasks`)
//!
//! `t` prints one task per line as `<id> - <text>`, with ` ⏎ ` standing in for line
//! breaks inside a task. Listing with a single `?<id>` tag shows that task in full.
//!
//! Removing tasks and filter functions are not supported.

use super::{Adapter, EditOptions, ListOptions, Options};
use crate::callable::{Callable, Dispatch};
use crate::error::{Result, WriteDownError};
use crate::model::{CmdMessage, CmdResult};
use directories::BaseDirs;
use regex::{Regex, RegexBuilder};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const DEFAULT_COMMAND: &str = "t.py";
const DEFAULT_LIST: &str = "tasks";
const LINE_BREAK: &str = " ⏎ ";
const MAX_LINE_WIDTH: usize = 80;
const ELLIPSIS: &str = " ...";

#[derive(Debug, Clone)]
pub struct TAdapter {
    program: String,
    leading_args: Vec<String>,
    task_dir: PathBuf,
    list: String,
}

impl TAdapter {
    pub fn create(options: &Options) -> Result<Box<dyn Adapter>> {
        Ok(Box::new(Self::from_options(options)?))
    }

    pub fn from_options(options: &Options) -> Result<Self> {
        let mut words = options
            .get("t_command")
            .unwrap_or(DEFAULT_COMMAND)
            .split_whitespace()
            .map(str::to_string);
        let program = words
            .next()
            .ok_or_else(|| WriteDownError::Config("t_command is empty".to_string()))?;
        let leading_args = words.collect();

        let task_dir = match options.get("task_dir") {
            Some(dir) => PathBuf::from(dir),
            None => BaseDirs::new()
                .map(|dirs| dirs.home_dir().join("tasks"))
                .ok_or_else(|| {
                    WriteDownError::Config(
                        "Could not determine home directory, set task_dir".to_string(),
                    )
                })?,
        };
        let list = options.get("list").unwrap_or(DEFAULT_LIST).to_string();

        Ok(Self {
            program,
            leading_args,
            task_dir,
            list,
        })
    }

    /// The full command line for a `t` invocation with extra arguments.
    pub fn command_line(&self, args: &[&str]) -> Vec<String> {
        let mut line = vec![self.program.clone()];
        line.extend(self.leading_args.iter().cloned());
        line.push("--task-dir".to_string());
        line.push(self.task_dir.to_string_lossy().into_owned());
        line.push("--list".to_string());
        line.push(self.list.clone());
        line.extend(args.iter().map(|a| a.to_string()));
        line
    }

    fn command(&self, args: &[&str]) -> Command {
        let line = self.command_line(args);
        debug!(command = ?line, "running t");
        let mut cmd = Command::new(&line[0]);
        cmd.args(&line[1..]);
        cmd
    }

    fn spawn_error(&self, e: std::io::Error) -> WriteDownError {
        WriteDownError::Command(format!("Failed to run {}: {}", self.program, e))
    }

    /// Runs `t` with arguments, failing when it exits unsuccessfully.
    fn run(&self, args: &[&str]) -> Result<()> {
        let status = self
            .command(args)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| self.spawn_error(e))?;
        if status.success() {
            Ok(())
        } else {
            Err(WriteDownError::Command(format!(
                "{} exited with {}",
                self.program, status
            )))
        }
    }

    /// All tasks of the list, one per line.
    fn tasks(&self) -> Result<Vec<String>> {
        let output = self
            .command(&[])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;
        if !output.status.success() {
            return Err(WriteDownError::Command(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect())
    }

    fn show(&self, id: &str) -> Result<CmdResult> {
        let line_of_task = Regex::new(&format!(r"^{}\s+-\s+", regex::escape(id)))?;
        let task = self
            .tasks()?
            .into_iter()
            .find(|line| line_of_task.is_match(line.trim()))
            .ok_or_else(|| WriteDownError::NoteNotFound(id.to_string()))?;
        let lines = task
            .replace(LINE_BREAK, "\n")
            .lines()
            .map(str::to_string)
            .collect();
        Ok(CmdResult::default().with_lines(lines))
    }
}

/// Cuts lines wider than the terminal budget, leaving a visible marker.
fn truncate_line(line: &str) -> String {
    if line.width() <= MAX_LINE_WIDTH {
        return line.to_string();
    }
    let budget = MAX_LINE_WIDTH - ELLIPSIS.len();
    let mut result = String::new();
    let mut width = 0;
    for c in line.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > budget {
            break;
        }
        result.push(c);
        width += w;
    }
    result.push_str(ELLIPSIS);
    result
}

impl Adapter for TAdapter {
    fn name(&self) -> &'static str {
        "t"
    }

    fn search(&self, pattern: &str) -> Result<CmdResult> {
        let regex = Regex::new(pattern)?;
        let lines = self
            .tasks()?
            .into_iter()
            .filter(|line| regex.is_match(line))
            .collect();
        Ok(CmdResult::default().with_lines(lines))
    }

    fn list(
        &self,
        options: &ListOptions,
        filter: Option<&Callable>,
        _dispatcher: &dyn Dispatch,
    ) -> Result<CmdResult> {
        if filter.is_some() {
            return Err(WriteDownError::not_supported(self.name(), "filter functions"));
        }

        let tags: Vec<&str> = options.tags().collect();
        if tags.iter().any(|tag| tag.starts_with('?')) {
            return match tags.as_slice() {
                [only] => self.show(&only[1..]),
                _ => Err(WriteDownError::Usage("t ?id".to_string())),
            };
        }

        let matchers = tags
            .iter()
            .map(|tag| {
                RegexBuilder::new(&regex::escape(tag))
                    .case_insensitive(true)
                    .build()
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let lines = self
            .tasks()?
            .into_iter()
            .filter(|line| matchers.iter().all(|m| m.is_match(line)))
            .map(|line| truncate_line(&line))
            .collect();
        Ok(CmdResult::default().with_lines(lines))
    }

    fn add(&self, content: &str) -> Result<CmdResult> {
        let mut child = self
            .command(&[])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let written = match child.stdin.take() {
            // Dropping stdin closes the pipe so t sees end of input.
            Some(mut stdin) => stdin.write_all(content.as_bytes()),
            None => Ok(()),
        };
        let status = child.wait().map_err(|e| self.spawn_error(e))?;
        written.map_err(|e| {
            WriteDownError::Command(format!("Failed to write to {}: {}", self.program, e))
        })?;

        if status.success() {
            Ok(CmdResult::message(CmdMessage::success("Task added.")))
        } else {
            Err(WriteDownError::Command(format!(
                "{} exited with {}",
                self.program, status
            )))
        }
    }

    fn edit(&self, id: &str, options: &EditOptions) -> Result<CmdResult> {
        let substitution = format!("/{}/{}/", options.regex, options.replacement);
        self.run(&["-e", id, &substitution])?;
        Ok(CmdResult::message(CmdMessage::success(format!(
            "Task {} edited.",
            id
        ))))
    }

    fn archive(&self, id: &str) -> Result<CmdResult> {
        self.run(&["-f", id])?;
        Ok(CmdResult::message(CmdMessage::success(format!(
            "Task {} finished.",
            id
        ))))
    }

    fn remove(&self, _id: &str, _trash: bool) -> Result<CmdResult> {
        Err(WriteDownError::not_supported(self.name(), "remove"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::Value;
    use std::fs;
    use tempfile::TempDir;

    struct NoDispatch;

    impl Dispatch for NoDispatch {
        fn apply(&self, _f: &Callable, _args: &[Value]) -> Result<Value> {
            Ok(Value::Nil)
        }
    }

    // Stands in for t.py: lists `$dir/$list`, appends piped input to `$dir/added`
    // and logs -e / -f invocations to `$dir/log`.
    const FAKE_T: &str = r#"
dir="$2"; list="$4"; shift 4
case "$1" in
  "") cat >> "$dir/added"; [ -f "$dir/$list" ] && cat "$dir/$list"; exit 0 ;;
  -f) echo "finish $2" >> "$dir/log" ;;
  -e) echo "edit $2 $3" >> "$dir/log" ;;
  *) exit 3 ;;
esac
"#;

    fn setup(tasks: &str) -> (TempDir, TAdapter) {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake_t.sh");
        fs::write(&script, FAKE_T).unwrap();
        fs::write(dir.path().join("tasks"), tasks).unwrap();

        let options = Options::new()
            .with("t_command", format!("sh {}", script.display()))
            .with("task_dir", dir.path().to_string_lossy());
        let adapter = TAdapter::from_options(&options).unwrap();
        (dir, adapter)
    }

    const TASKS: &str = "\
1 - call mom @phone
2 - buy milk @shop #food
3 - write report ⏎ with charts @office
";

    #[test]
    fn test_command_line_defaults() {
        let options = Options::new().with("task_dir", "/tmp/tasks");
        let adapter = TAdapter::from_options(&options).unwrap();
        assert_eq!(
            adapter.command_line(&["-f", "3"]),
            vec!["t.py", "--task-dir", "/tmp/tasks", "--list", "tasks", "-f", "3"]
        );
    }

    #[test]
    fn test_command_line_with_custom_command_and_list() {
        let options = Options::new()
            .with("t_command", "python3 /opt/t/t.py")
            .with("task_dir", "/data")
            .with("list", "work");
        let adapter = TAdapter::from_options(&options).unwrap();
        assert_eq!(
            adapter.command_line(&[]),
            vec!["python3", "/opt/t/t.py", "--task-dir", "/data", "--list", "work"]
        );
    }

    #[test]
    fn test_empty_command_is_a_config_error() {
        let options = Options::new().with("t_command", "  ").with("task_dir", "/x");
        assert!(matches!(
            TAdapter::from_options(&options),
            Err(WriteDownError::Config(_))
        ));
    }

    #[test]
    fn test_truncate_line() {
        let short = "1 - short";
        assert_eq!(truncate_line(short), short);

        let long = format!("1 - {}", "x".repeat(100));
        let cut = truncate_line(&long);
        assert!(cut.ends_with(" ..."));
        assert_eq!(cut.width(), MAX_LINE_WIDTH);
    }

    #[test]
    fn test_truncate_counts_display_width() {
        let wide = "漢".repeat(50);
        let cut = truncate_line(&wide);
        assert!(cut.width() <= MAX_LINE_WIDTH);
        assert!(cut.ends_with(" ..."));
    }

    #[cfg(unix)]
    #[test]
    fn test_search_filters_by_regex() {
        let (_dir, adapter) = setup(TASKS);
        let result = adapter.search("m[io]lk|mom").unwrap();
        assert_eq!(
            result.lines,
            vec!["1 - call mom @phone", "2 - buy milk @shop #food"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_search_rejects_bad_regex() {
        let (_dir, adapter) = setup(TASKS);
        assert!(matches!(adapter.search("("), Err(WriteDownError::Regex(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_list_all() {
        let (_dir, adapter) = setup(TASKS);
        let result = adapter.list(&ListOptions::new(), None, &NoDispatch).unwrap();
        assert_eq!(result.lines.len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_list_requires_every_tag_case_insensitively() {
        let (_dir, adapter) = setup(TASKS);
        let mut options = ListOptions::new();
        options.insert("@", vec!["@SHOP".to_string()]);
        options.insert("#", vec!["#food".to_string()]);
        let result = adapter.list(&options, None, &NoDispatch).unwrap();
        assert_eq!(result.lines, vec!["2 - buy milk @shop #food"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_list_show_single_task() {
        let (_dir, adapter) = setup(TASKS);
        let mut options = ListOptions::new();
        options.insert("?", vec!["?3".to_string()]);
        let result = adapter.list(&options, None, &NoDispatch).unwrap();
        assert_eq!(
            result.lines,
            vec!["3 - write report", "with charts @office"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_list_show_unknown_task() {
        let (_dir, adapter) = setup(TASKS);
        let mut options = ListOptions::new();
        options.insert("?", vec!["?9".to_string()]);
        assert!(matches!(
            adapter.list(&options, None, &NoDispatch),
            Err(WriteDownError::NoteNotFound(id)) if id == "9"
        ));
    }

    #[test]
    fn test_list_show_with_other_tags_is_usage_error() {
        let adapter = TAdapter::from_options(&Options::new().with("task_dir", "/x")).unwrap();
        let mut options = ListOptions::new();
        options.insert("?", vec!["?3".to_string()]);
        options.insert("@", vec!["@office".to_string()]);
        assert!(matches!(
            adapter.list(&options, None, &NoDispatch),
            Err(WriteDownError::Usage(_))
        ));
    }

    #[test]
    fn test_filter_function_not_supported() {
        let adapter = TAdapter::from_options(&Options::new().with("task_dir", "/x")).unwrap();
        let filter = Callable::Symbol("id");
        assert!(matches!(
            adapter.list(&ListOptions::new(), Some(&filter), &NoDispatch),
            Err(WriteDownError::NotSupported { backend: "t", .. })
        ));
    }

    #[test]
    fn test_remove_not_supported() {
        let adapter = TAdapter::from_options(&Options::new().with("task_dir", "/x")).unwrap();
        assert!(matches!(
            adapter.remove("1", true),
            Err(WriteDownError::NotSupported {
                backend: "t",
                operation: "remove"
            })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_add_pipes_content() {
        let (dir, adapter) = setup("");
        adapter.add("new task @home").unwrap();
        let added = fs::read_to_string(dir.path().join("added")).unwrap();
        assert_eq!(added, "new task @home");
    }

    #[cfg(unix)]
    #[test]
    fn test_edit_and_archive_invoke_t() {
        let (dir, adapter) = setup(TASKS);
        let edit = EditOptions {
            regex: "milk".into(),
            replacement: "oat milk".into(),
        };
        adapter.edit("2", &edit).unwrap();
        adapter.archive("1").unwrap();

        let log = fs::read_to_string(dir.path().join("log")).unwrap();
        assert_eq!(log, "edit 2 /milk/oat milk/\nfinish 1\n");
    }

    #[test]
    fn test_missing_program_is_a_command_error() {
        let options = Options::new()
            .with("t_command", "writedown-no-such-t-binary")
            .with("task_dir", "/x");
        let adapter = TAdapter::from_options(&options).unwrap();
        assert!(matches!(
            adapter.search("x"),
            Err(WriteDownError::Command(_))
        ));
    }
}
