//! # Input Sources
//!
//! Where the text comes from decides what happens to it:
//!
//! 1. `writedown notes.txt`: the first argument is an existing file, whose contents go
//!    to the file handler.
//! 2. `writedown "/descri[bp]/"`: any other first argument goes to the argument
//!    handler as-is.
//! 3. `echo "buy milk" | writedown`: with no argument, piped standard input goes to
//!    the stdin handler.
//! 4. `writedown`: nothing at all runs the default handler.
//!
//! Standard input only counts when it is neither a terminal nor closed. A stdin that is
//! redirected from `/dev/null` (as under cron, or when a parent process closes it and
//! the runtime reopens the descriptor) is treated as closed.

use crate::callable::{Callable, Dispatch, Value};
use crate::error::{Result, WriteDownError};
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

/// Standard input as seen by the router.
pub trait InputStream {
    fn is_terminal(&self) -> bool;
    fn is_closed(&self) -> bool;
    fn read_all(&mut self) -> io::Result<String>;
}

/// The process's real standard input.
#[derive(Debug, Default)]
pub struct StdinStream;

impl InputStream for StdinStream {
    fn is_terminal(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn is_closed(&self) -> bool {
        stdin_is_closed()
    }

    fn read_all(&mut self) -> io::Result<String> {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(unix)]
fn stdin_is_closed() -> bool {
    use std::os::fd::AsFd;
    use std::os::unix::fs::{FileTypeExt, MetadataExt};

    let fd = match io::stdin().as_fd().try_clone_to_owned() {
        Ok(fd) => fd,
        Err(_) => return true,
    };
    let stdin = std::fs::File::from(fd);
    match (stdin.metadata(), std::fs::metadata("/dev/null")) {
        (Ok(meta), Ok(null)) => meta.file_type().is_char_device() && meta.rdev() == null.rdev(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn stdin_is_closed() -> bool {
    false
}

/// The capability set a frontend offers to the router.
pub trait Frontend {
    /// Store content as a new note.
    fn add(&self, content: &str) -> Result<Value>;
    /// Classify text and act on it.
    fn attack(&self, text: &str) -> Result<Value>;
    /// Show notes when there is no input at all.
    fn list(&self) -> Result<Value>;
}

/// One callable per input origin.
#[derive(Debug, Clone)]
pub struct Handlers {
    pub on_arg_text: Callable,
    pub on_file: Callable,
    pub on_stdin: Callable,
    pub on_default: Option<Callable>,
}

impl Default for Handlers {
    /// Identity for every origin and no default handler.
    fn default() -> Self {
        Self {
            on_arg_text: Callable::Symbol("id"),
            on_file: Callable::Symbol("id"),
            on_stdin: Callable::Symbol("id"),
            on_default: None,
        }
    }
}

impl Handlers {
    /// File and stdin contents are added, an argument is attacked, no input lists.
    pub fn from_frontend<F: Frontend + 'static>(frontend: Rc<F>) -> Self {
        let adder = Rc::clone(&frontend);
        let add = Callable::inline(move |args| adder.add(text_arg("add", args)?));
        let attacker = Rc::clone(&frontend);
        let attack = Callable::inline(move |args| attacker.attack(text_arg("attack", args)?));
        let lister = frontend;
        let list = Callable::inline(move |_| lister.list());

        Self {
            on_arg_text: attack,
            on_file: add.clone(),
            on_stdin: add,
            on_default: Some(list),
        }
    }

    pub fn with_default(mut self, on_default: Callable) -> Self {
        self.on_default = Some(on_default);
        self
    }
}

fn text_arg<'a>(method: &str, args: &'a [Value]) -> Result<&'a str> {
    args.first()
        .and_then(Value::as_text)
        .ok_or_else(|| WriteDownError::invalid_argument(method, "expected one text argument"))
}

/// Where the input was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Argument(String),
    Stdin,
    Default,
}

/// Picks the input origin without reading anything.
pub fn select_source(argv: &[String], stdin: &dyn InputStream) -> Source {
    match argv.first() {
        Some(first) if Path::new(first).is_file() => Source::File(PathBuf::from(first)),
        Some(first) => Source::Argument(first.clone()),
        None if !stdin.is_terminal() && !stdin.is_closed() => Source::Stdin,
        None => Source::Default,
    }
}

/// Reads the selected input and hands it to the matching handler.
pub fn route<D: Dispatch + ?Sized>(
    dispatcher: &D,
    argv: &[String],
    stdin: &mut dyn InputStream,
    handlers: &Handlers,
) -> Result<Value> {
    let source = select_source(argv, stdin);
    debug!(?source, "routing input");

    match source {
        Source::File(path) => {
            let bytes = std::fs::read(&path)?;
            let contents = String::from_utf8_lossy(&bytes).into_owned();
            dispatcher.apply(&handlers.on_file, &[Value::Text(contents)])
        }
        Source::Argument(text) => dispatcher.apply(&handlers.on_arg_text, &[Value::Text(text)]),
        Source::Stdin => {
            let contents = stdin.read_all()?;
            dispatcher.apply(&handlers.on_stdin, &[Value::Text(contents)])
        }
        Source::Default => match &handlers.on_default {
            Some(handler) => dispatcher.apply(handler, &[]),
            None => Err(WriteDownError::InvalidCallableKind(
                "no default handler".to_string(),
            )),
        },
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Scripted standard input.
    pub struct MockStdin {
        pub terminal: bool,
        pub closed: bool,
        pub content: String,
        pub reads: usize,
    }

    impl MockStdin {
        pub fn terminal() -> Self {
            Self {
                terminal: true,
                closed: false,
                content: String::new(),
                reads: 0,
            }
        }

        pub fn piped(content: &str) -> Self {
            Self {
                terminal: false,
                closed: false,
                content: content.to_string(),
                reads: 0,
            }
        }

        pub fn closed() -> Self {
            Self {
                terminal: false,
                closed: true,
                content: String::new(),
                reads: 0,
            }
        }
    }

    impl InputStream for MockStdin {
        fn is_terminal(&self) -> bool {
            self.terminal
        }

        fn is_closed(&self) -> bool {
            self.closed
        }

        fn read_all(&mut self) -> io::Result<String> {
            self.reads += 1;
            Ok(self.content.clone())
        }
    }

    /// Dispatcher that only knows inline callables.
    struct InlineOnly;

    impl Dispatch for InlineOnly {
        fn apply(&self, f: &Callable, args: &[Value]) -> Result<Value> {
            match f {
                Callable::Inline(func) => func(args),
                other => Err(WriteDownError::UndefinedMethod(format!("{:?}", other))),
            }
        }
    }

    fn tagging(tag: &'static str) -> Callable {
        Callable::inline(move |args| {
            let text = args.first().and_then(Value::as_text).unwrap_or("");
            Ok(Value::Text(format!("{}:{}", tag, text)))
        })
    }

    fn handlers() -> Handlers {
        Handlers {
            on_arg_text: tagging("arg"),
            on_file: tagging("file"),
            on_stdin: tagging("stdin"),
            on_default: Some(Callable::inline(|_| Ok(Value::from("default")))),
        }
    }

    #[test]
    fn test_existing_file_wins_over_argument() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "from file").unwrap();

        let argv = vec![path.to_string_lossy().to_string()];
        let mut stdin = MockStdin::piped("ignored");
        let result = route(&InlineOnly, &argv, &mut stdin, &handlers()).unwrap();

        assert_eq!(result, Value::from("file:from file"));
        assert_eq!(stdin.reads, 0);
    }

    #[test]
    fn test_argument_that_is_not_a_file() {
        let argv = vec!["/milk/".to_string()];
        let mut stdin = MockStdin::piped("ignored");
        let result = route(&InlineOnly, &argv, &mut stdin, &handlers()).unwrap();
        assert_eq!(result, Value::from("arg:/milk/"));
        assert_eq!(stdin.reads, 0);
    }

    #[test]
    fn test_directory_argument_is_literal_text() {
        let dir = tempfile::tempdir().unwrap();
        let argv = vec![dir.path().to_string_lossy().to_string()];
        let source = select_source(&argv, &MockStdin::terminal());
        assert_eq!(source, Source::Argument(argv[0].clone()));
    }

    #[test]
    fn test_only_first_argument_counts() {
        let argv = vec!["first".to_string(), "second".to_string()];
        let mut stdin = MockStdin::terminal();
        let result = route(&InlineOnly, &argv, &mut stdin, &handlers()).unwrap();
        assert_eq!(result, Value::from("arg:first"));
    }

    #[test]
    fn test_piped_stdin() {
        let mut stdin = MockStdin::piped("buy milk\n");
        let result = route(&InlineOnly, &[], &mut stdin, &handlers()).unwrap();
        assert_eq!(result, Value::from("stdin:buy milk\n"));
        assert_eq!(stdin.reads, 1);
    }

    #[test]
    fn test_terminal_stdin_runs_default() {
        let mut stdin = MockStdin::terminal();
        let result = route(&InlineOnly, &[], &mut stdin, &handlers()).unwrap();
        assert_eq!(result, Value::from("default"));
        assert_eq!(stdin.reads, 0);
    }

    #[test]
    fn test_closed_stdin_runs_default() {
        let mut stdin = MockStdin::closed();
        let result = route(&InlineOnly, &[], &mut stdin, &handlers()).unwrap();
        assert_eq!(result, Value::from("default"));
    }

    #[test]
    fn test_missing_default_handler_is_an_error() {
        let mut stdin = MockStdin::terminal();
        let handlers = Handlers {
            on_default: None,
            ..handlers()
        };
        let err = route(&InlineOnly, &[], &mut stdin, &handlers).unwrap_err();
        assert!(matches!(err, WriteDownError::InvalidCallableKind(_)));
    }

    struct RecordingFrontend {
        calls: RefCell<Vec<String>>,
    }

    impl Frontend for RecordingFrontend {
        fn add(&self, content: &str) -> Result<Value> {
            self.calls.borrow_mut().push(format!("add {}", content));
            Ok(Value::Nil)
        }

        fn attack(&self, text: &str) -> Result<Value> {
            self.calls.borrow_mut().push(format!("attack {}", text));
            Ok(Value::Nil)
        }

        fn list(&self) -> Result<Value> {
            self.calls.borrow_mut().push("list".to_string());
            Ok(Value::Nil)
        }
    }

    #[test]
    fn test_frontend_wiring() {
        let frontend = Rc::new(RecordingFrontend {
            calls: RefCell::new(Vec::new()),
        });
        let handlers = Handlers::from_frontend(Rc::clone(&frontend));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todo.txt");
        std::fs::write(&path, "call mom").unwrap();

        route(
            &InlineOnly,
            &[path.to_string_lossy().to_string()],
            &mut MockStdin::terminal(),
            &handlers,
        )
        .unwrap();
        route(
            &InlineOnly,
            &["#home".to_string()],
            &mut MockStdin::terminal(),
            &handlers,
        )
        .unwrap();
        route(&InlineOnly, &[], &mut MockStdin::piped("piped"), &handlers).unwrap();
        route(&InlineOnly, &[], &mut MockStdin::terminal(), &handlers).unwrap();

        assert_eq!(
            *frontend.calls.borrow(),
            vec!["add call mom", "attack #home", "add piped", "list"]
        );
    }
}
