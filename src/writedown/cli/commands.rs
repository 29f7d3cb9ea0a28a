use super::render::print_value;
use super::setup::{Cli, Commands};
use clap::Parser;
use directories::ProjectDirs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use writedown::adapter::{EditOptions, ListOptions};
use writedown::api::WriteDownApi;
use writedown::callable::{Callable, Value};
use writedown::config::WriteDownConfig;
use writedown::error::{Result, WriteDownError};
use writedown::input::{Frontend, Handlers, PrefixSet, StdinStream};
use writedown::model::{CmdMessage, CmdResult};

const HOME_ENV: &str = "WRITEDOWN_HOME";
const LOG_ENV: &str = "WRITEDOWN_LOG";
const NOTES_FILENAME: &str = "notes.json";

struct AppContext {
    api: &'static WriteDownApi,
    default_action: Option<String>,
}

/// What the router can do on behalf of the command line.
struct CliFrontend {
    api: &'static WriteDownApi,
}

impl Frontend for CliFrontend {
    fn add(&self, content: &str) -> Result<Value> {
        Ok(self.api.add(content)?.into())
    }

    fn attack(&self, text: &str) -> Result<Value> {
        self.api.attack(text)
    }

    fn list(&self) -> Result<Value> {
        Ok(self.api.list(&ListOptions::new(), None)?.into())
    }
}

struct Dirs {
    config: PathBuf,
    data: PathBuf,
}

pub fn run() -> Result<()> {
    let Cli {
        command,
        input,
        backend,
        options,
        prefixes,
        config_dir,
        verbose,
    } = Cli::parse();
    init_logging(verbose);
    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let dirs = resolve_dirs(config_dir.as_deref())?;
    debug!(config = %dirs.config.display(), data = %dirs.data.display(), "directories");
    let stored = WriteDownConfig::load(&dirs.config)?;

    let mut config = stored.clone();
    if let Some(backend) = backend {
        config.backend = backend;
    }
    if let Some(prefixes) = prefixes {
        config.prefixes = prefixes;
    }
    config.options.extend(options);
    let ctx = || init_context(&config, &dirs);

    match command {
        Some(Commands::Search { pattern }) => print_value(&ctx()?.api.search(&pattern)?.into()),
        Some(Commands::List { tags }) => handle_list(&ctx()?, tags),
        Some(Commands::Add { content }) => {
            print_value(&ctx()?.api.add(&content.join(" "))?.into())
        }
        Some(Commands::Edit {
            id,
            regex,
            replacement,
        }) => {
            let options = EditOptions { regex, replacement };
            print_value(&ctx()?.api.edit(&id, &options)?.into())
        }
        Some(Commands::Archive { id }) => print_value(&ctx()?.api.archive(&id)?.into()),
        Some(Commands::Remove { id, purge }) => {
            print_value(&ctx()?.api.remove(&id, !purge)?.into())
        }
        Some(Commands::Config { key, value }) => handle_config(&dirs.config, stored, key, value),
        None => handle_input(&ctx()?, input),
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();
}

fn resolve_dirs(config_override: Option<&Path>) -> Result<Dirs> {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|h| !h.is_empty()) {
        let home = PathBuf::from(home);
        return Ok(Dirs {
            config: config_override.map(Path::to_path_buf).unwrap_or_else(|| home.clone()),
            data: home,
        });
    }

    let proj_dirs = ProjectDirs::from("com", "writedown", "writedown")
        .ok_or_else(|| WriteDownError::Config("could not determine config directory".into()))?;
    Ok(Dirs {
        config: config_override
            .map(Path::to_path_buf)
            .unwrap_or_else(|| proj_dirs.config_dir().to_path_buf()),
        data: proj_dirs.data_dir().to_path_buf(),
    })
}

fn init_context(config: &WriteDownConfig, dirs: &Dirs) -> Result<AppContext> {
    let mut options = config.to_options();
    if !options.contains("json_path") {
        options.set(
            "json_path",
            dirs.data.join(NOTES_FILENAME).to_string_lossy().into_owned(),
        );
    }

    let mut api = WriteDownApi::new(options)?.with_prefixes(PrefixSet::from(config.prefixes.as_str()));
    if let Some(fallback) = config.fallback_method()? {
        api = api.with_fallback(fallback);
    }
    let default_action = config.default_action_method()?;
    for method in [Some(api.fallback()), default_action.as_deref()].into_iter().flatten() {
        if !api.has_method(method) {
            return Err(WriteDownError::UndefinedMethod(method.to_string()));
        }
    }

    Ok(AppContext {
        api: api.install()?,
        default_action,
    })
}

fn handle_input(ctx: &AppContext, input: Vec<String>) -> Result<()> {
    let argv = if input.is_empty() {
        Vec::new()
    } else {
        vec![input.join(" ")]
    };

    let mut handlers = Handlers::from_frontend(Rc::new(CliFrontend { api: ctx.api }));
    if let Some(action) = &ctx.default_action {
        handlers = handlers.with_default(Callable::Name(action.clone()));
    }

    let value = ctx.api.receive_input(&argv, &mut StdinStream, &handlers)?;
    print_value(&value)
}

fn handle_list(ctx: &AppContext, tags: Vec<String>) -> Result<()> {
    let args: Vec<Value> = tags.into_iter().map(Value::Text).collect();
    let value = ctx.api.apply(&Callable::Symbol("list"), &args)?;
    print_value(&value)
}

fn handle_config(
    config_dir: &Path,
    mut config: WriteDownConfig,
    key: Option<String>,
    value: Option<String>,
) -> Result<()> {
    let result = match (key, value) {
        (None, _) => CmdResult::default().with_lines(
            config
                .entries()
                .into_iter()
                .map(|(k, v)| format!("{} = {}", k, v))
                .collect(),
        ),
        (Some(key), None) => match config.get(&key) {
            Some(v) => CmdResult::default().with_lines(vec![format!("{} = {}", key, v)]),
            None => CmdResult::message(CmdMessage::warning(format!("{} is not set", key))),
        },
        (Some(key), Some(value)) => {
            config.set(&key, &value)?;
            config.save(config_dir)?;
            CmdResult::message(CmdMessage::success(format!("{} = {}", key, value)))
        }
    };
    print_value(&result.into())
}
