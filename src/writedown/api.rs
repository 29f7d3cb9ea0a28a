//! # API Facade
//!
//! [`WriteDownApi`] is the single entry point for every operation, whatever the UI:
//!
//! - the six note operations, forwarded to the selected [`Adapter`]
//! - [`apply`](WriteDownApi::apply), the callable dispatcher
//! - [`parse_input`](WriteDownApi::parse_input) and [`attack`](WriteDownApi::attack),
//!   which classify text and act on it
//! - [`receive_input`](WriteDownApi::receive_input), which picks the input source
//!
//! The facade is also the *default receiver* for callables: a method name such as
//! `"search"` or `"add_one"` is resolved against the facade's method table when the
//! callable is applied. The table starts with the built-in methods (`id`, `search`,
//! `list`, `add`, `edit`, `archive`, `remove`, `attack`); more can be added with
//! [`define_method`](WriteDownApi::define_method).
//!
//! ## Process-wide selection
//!
//! A process works with one backend. [`init_adapter`] builds the facade from the options
//! and installs it once; [`current`] hands it out afterwards. Initializing twice is an
//! error. Tests and embedders that want several instances can use
//! [`WriteDownApi::new`] directly and skip the global.

use crate::adapter::{Adapter, BackendRegistry, EditOptions, ListOptions, Options};
use crate::callable::{Callable, Dispatch, Method, MethodFn, Value};
use crate::error::{Result, WriteDownError};
use crate::input::{self, classify, Command, Handlers, InputStream, PrefixSet, TagSet};
use crate::model::CmdResult;
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Method used for plain text when nothing else is configured.
pub const DEFAULT_FALLBACK: &str = "add";

static CURRENT: OnceCell<WriteDownApi> = OnceCell::new();

/// Selects the backend named in `options` for the rest of the process.
pub fn init_adapter(options: Options) -> Result<&'static WriteDownApi> {
    WriteDownApi::new(options)?.install()
}

/// The facade installed by [`init_adapter`].
pub fn current() -> Result<&'static WriteDownApi> {
    CURRENT.get().ok_or(WriteDownError::NotInitialized)
}

pub struct WriteDownApi {
    options: Options,
    adapter: Box<dyn Adapter>,
    methods: BTreeMap<&'static str, MethodFn>,
    prefixes: PrefixSet,
    fallback: String,
}

impl std::fmt::Debug for WriteDownApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteDownApi")
            .field("backend", &self.adapter.name())
            .field("options", &self.options)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("prefixes", &self.prefixes)
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl WriteDownApi {
    /// Builds the facade with the built-in backends.
    pub fn new(options: Options) -> Result<Self> {
        Self::with_registry(options, &BackendRegistry::builtin())
    }

    /// Builds the facade, looking the backend up in `registry`.
    pub fn with_registry(options: Options, registry: &BackendRegistry) -> Result<Self> {
        let adapter = registry.create(&options)?;
        info!(backend = adapter.name(), "adapter initialized");

        let mut api = Self {
            options,
            adapter,
            methods: BTreeMap::new(),
            prefixes: PrefixSet::default(),
            fallback: DEFAULT_FALLBACK.to_string(),
        };
        api.define_builtins();
        Ok(api)
    }

    /// Prefix characters used by [`attack`](Self::attack).
    pub fn with_prefixes(mut self, prefixes: PrefixSet) -> Self {
        self.prefixes = prefixes;
        self
    }

    /// Method applied to plain text by [`attack`](Self::attack).
    pub fn with_fallback(mut self, method: impl Into<String>) -> Self {
        self.fallback = method.into();
        self
    }

    /// Makes this facade the process-wide selection.
    pub fn install(self) -> Result<&'static Self> {
        if let Some(existing) = CURRENT.get() {
            return Err(WriteDownError::AlreadyInitialized(
                existing.backend().to_string(),
            ));
        }
        CURRENT
            .set(self)
            .map_err(|rejected| WriteDownError::AlreadyInitialized(rejected.backend().to_string()))?;
        current()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn backend(&self) -> &'static str {
        self.adapter.name()
    }

    pub fn prefixes(&self) -> &PrefixSet {
        &self.prefixes
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    // --- Callables ---

    /// Adds or replaces a method on the default receiver.
    pub fn define_method(&mut self, name: &'static str, func: MethodFn) {
        self.methods.insert(name, func);
    }

    /// A callable bound to the named method.
    pub fn method(&self, name: &str) -> Result<Callable> {
        self.methods
            .get_key_value(name)
            .map(|(&name, &func)| Callable::Method(Method { name, func }))
            .ok_or_else(|| WriteDownError::UndefinedMethod(name.to_string()))
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Invokes a callable, resolving names against this receiver.
    pub fn apply(&self, f: &Callable, args: &[Value]) -> Result<Value> {
        match f {
            Callable::Inline(func) => func(args),
            Callable::Method(method) => (method.func)(self, args),
            Callable::Symbol(name) => {
                let func = self.resolve(name)?;
                func(self, args)
            }
            Callable::Name(name) => {
                let func = self.resolve(name)?;
                func(self, args)
            }
        }
    }

    fn resolve(&self, name: &str) -> Result<MethodFn> {
        debug!(method = name, "resolving method");
        self.methods
            .get(name)
            .copied()
            .ok_or_else(|| WriteDownError::UndefinedMethod(name.to_string()))
    }

    // --- Note operations ---

    pub fn search(&self, pattern: &str) -> Result<CmdResult> {
        self.adapter.search(pattern)
    }

    pub fn list(&self, options: &ListOptions, filter: Option<&Callable>) -> Result<CmdResult> {
        self.adapter.list(options, filter, self)
    }

    pub fn add(&self, content: &str) -> Result<CmdResult> {
        self.adapter.add(content)
    }

    pub fn edit(&self, id: &str, options: &EditOptions) -> Result<CmdResult> {
        self.adapter.edit(id, options)
    }

    pub fn archive(&self, id: &str) -> Result<CmdResult> {
        self.adapter.archive(id)
    }

    pub fn remove(&self, id: &str, trash: bool) -> Result<CmdResult> {
        self.adapter.remove(id, trash)
    }

    // --- Input ---

    /// Classifies `pattern`; plain text is handed to `fallback` and replaced by its result.
    pub fn parse_input(
        &self,
        pattern: &str,
        prefixes: &PrefixSet,
        fallback: &Callable,
    ) -> Result<Command<Value>> {
        classify(pattern, prefixes).try_map_plain(|text| self.apply(fallback, &[Value::Text(text)]))
    }

    /// Classifies text and runs the matching note operation.
    ///
    /// A regex searches, a substitution edits the note named by its selector, tags list
    /// the notes carrying them, and plain text goes to the fallback method.
    pub fn attack(&self, text: &str) -> Result<Value> {
        let fallback = Callable::Name(self.fallback.clone());
        let command = self.parse_input(text, &self.prefixes, &fallback)?;
        debug!(kind = command.kind(), "attacking input");

        match command {
            Command::Regex(pattern) => Ok(self.search(&pattern)?.into()),
            Command::Substitution(s) => Ok(self.edit(&s.selector, &EditOptions::from(&s))?.into()),
            Command::Tags(tags) => Ok(self.list(&ListOptions::from(tags), None)?.into()),
            Command::PlainText(result) => Ok(result),
        }
    }

    /// Reads input from the first argument, a file, or stdin and runs the matching handler.
    pub fn receive_input(
        &self,
        argv: &[String],
        stdin: &mut dyn InputStream,
        handlers: &Handlers,
    ) -> Result<Value> {
        input::route(self, argv, stdin, handlers)
    }

    fn define_builtins(&mut self) {
        self.define_method("id", builtin_id);
        self.define_method("search", builtin_search);
        self.define_method("list", builtin_list);
        self.define_method("add", builtin_add);
        self.define_method("edit", builtin_edit);
        self.define_method("archive", builtin_archive);
        self.define_method("remove", builtin_remove);
        self.define_method("attack", builtin_attack);
    }
}

impl Dispatch for WriteDownApi {
    fn apply(&self, f: &Callable, args: &[Value]) -> Result<Value> {
        WriteDownApi::apply(self, f, args)
    }
}

fn text_arg<'a>(method: &str, args: &'a [Value], index: usize) -> Result<&'a str> {
    args.get(index).and_then(Value::as_text).ok_or_else(|| {
        WriteDownError::invalid_argument(method, format!("argument {} must be text", index + 1))
    })
}

fn id_arg(method: &str, args: &[Value], index: usize) -> Result<String> {
    match args.get(index) {
        Some(Value::Text(id)) => Ok(id.clone()),
        Some(Value::Int(id)) => Ok(id.to_string()),
        _ => Err(WriteDownError::invalid_argument(
            method,
            format!("argument {} must be a note id", index + 1),
        )),
    }
}

fn builtin_id(_api: &WriteDownApi, args: &[Value]) -> Result<Value> {
    Ok(args.first().cloned().unwrap_or_default())
}

fn builtin_search(api: &WriteDownApi, args: &[Value]) -> Result<Value> {
    Ok(api.search(text_arg("search", args, 0)?)?.into())
}

/// Every argument is split into tags; no argument lists everything.
fn builtin_list(api: &WriteDownApi, args: &[Value]) -> Result<Value> {
    let mut tags = TagSet::new();
    for index in 0..args.len() {
        text_arg("list", args, index)?
            .split_whitespace()
            .for_each(|token| tags.push(token));
    }
    Ok(api.list(&ListOptions::from(tags), None)?.into())
}

fn builtin_add(api: &WriteDownApi, args: &[Value]) -> Result<Value> {
    Ok(api.add(text_arg("add", args, 0)?)?.into())
}

fn builtin_edit(api: &WriteDownApi, args: &[Value]) -> Result<Value> {
    let id = id_arg("edit", args, 0)?;
    let options = EditOptions {
        regex: text_arg("edit", args, 1)?.to_string(),
        replacement: text_arg("edit", args, 2)?.to_string(),
    };
    Ok(api.edit(&id, &options)?.into())
}

fn builtin_archive(api: &WriteDownApi, args: &[Value]) -> Result<Value> {
    Ok(api.archive(&id_arg("archive", args, 0)?)?.into())
}

fn builtin_remove(api: &WriteDownApi, args: &[Value]) -> Result<Value> {
    let id = id_arg("remove", args, 0)?;
    let trash = match args.get(1) {
        None => true,
        Some(Value::Bool(trash)) => *trash,
        Some(_) => {
            return Err(WriteDownError::invalid_argument(
                "remove",
                "argument 2 must be a boolean",
            ))
        }
    };
    Ok(api.remove(&id, trash)?.into())
}

fn builtin_attack(api: &WriteDownApi, args: &[Value]) -> Result<Value> {
    api.attack(text_arg("attack", args, 0)?)
}
