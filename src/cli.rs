use std::path::{Path, PathBuf};

mod card;
mod draw;
mod history;
mod list;
mod play;
mod prompt;
mod settings;
mod status;
mod terminal;

use anyhow::Context;
use clap::ArgAction;
use draw::{Draw, Finish, Reset};
use funs::{Config, DataMode, Outcome, Picker, SourceFetcher, StateFile, storage::is_remote};
use history::History;
use list::List;
use prompt::Prompt;
use settings::{Settings, Source, Upload};
use status::Status;
use tracing::instrument;

/// Name of the optional configuration file in the root directory.
const CONFIG_FILE: &str = "funs.toml";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The directory holding `funs.toml` and any relative data paths
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    /// Where to keep history and settings (defaults to the user data
    /// directory)
    #[arg(long, global = true, value_name = "FILE")]
    state: Option<PathBuf>,

    /// Only ideas in this category
    #[arg(long, global = true)]
    category: Option<String>,

    /// Only ideas tagged with this need
    #[arg(long, global = true)]
    need: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let session = Session {
            root: self.root,
            state: self.state,
            category: self.category,
            need: self.need,
        };

        self.command
            .unwrap_or_else(|| Command::Status(Status::default()))
            .run(&session)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show catalog size, history size and settings (default)
    Status(Status),

    /// Draw the next idea
    Draw(Draw),

    /// Mark an idea as done
    ///
    /// Without an id, finishes the idea from the last draw.
    Done(Finish),

    /// Mark an idea as skipped
    ///
    /// Without an id, skips the idea from the last draw.
    Skip(Finish),

    /// Remove the most recent history entry
    Undo,

    /// Forget the whole history
    Reset(Reset),

    /// Show recent history
    History(History),

    /// List the ideas passing the current filters
    List(List),

    /// Show or change the scheduling settings
    Settings(Settings),

    /// Load ideas from a CSV or JSON file and keep it for later sessions
    Upload(Upload),

    /// Switch between the data URL and the uploaded file
    Source(Source),

    /// Draw a prompt from one of the prompt pools
    Prompt(Prompt),

    /// Pick ideas interactively
    Play,
}

impl Command {
    fn run(self, session: &Session) -> anyhow::Result<()> {
        match self {
            Self::Status(command) => command.run(session)?,
            Self::Draw(command) => command.run(session)?,
            Self::Done(command) => command.run(session, Outcome::Done)?,
            Self::Skip(command) => command.run(session, Outcome::Skipped)?,
            Self::Undo => draw::undo(session)?,
            Self::Reset(command) => command.run(session)?,
            Self::History(command) => command.run(session)?,
            Self::List(command) => command.run(session)?,
            Self::Settings(command) => command.run(session)?,
            Self::Upload(command) => command.run(session)?,
            Self::Source(command) => command.run(session)?,
            Self::Prompt(command) => command.run(session)?,
            Self::Play => play::run(session)?,
        }
        Ok(())
    }
}

/// The global options every command opens the picker with.
#[derive(Debug, Clone)]
pub struct Session {
    root: PathBuf,
    state: Option<PathBuf>,
    category: Option<String>,
    need: Option<String>,
}

impl Session {
    pub fn config(&self) -> Config {
        load_config(&self.root)
    }

    pub fn fetcher(&self) -> SourceFetcher {
        SourceFetcher::new(&self.root)
    }

    fn store(&self) -> anyhow::Result<StateFile> {
        match &self.state {
            Some(path) => Ok(StateFile::new(path)),
            None => StateFile::default_location()
                .context("No user data directory found; pass --state to choose a state file"),
        }
    }

    /// Opens the picker without loading the catalog.
    #[instrument(level = "debug", skip(self))]
    pub fn open(&self) -> anyhow::Result<Picker<StateFile>> {
        let store = self.store()?;
        tracing::debug!(path = %store.path().display(), "Opening state");
        let mut picker = Picker::open(store, self.config());
        picker.set_filters(self.category.clone(), self.need.clone());
        Ok(picker)
    }

    /// Opens the picker and loads the catalog.
    pub fn open_loaded(&self) -> anyhow::Result<Picker<StateFile>> {
        let mut picker = self.open()?;
        self.load_catalog(&mut picker)?;
        Ok(picker)
    }

    /// Opens the picker and loads the catalog if possible.
    ///
    /// For commands that still make sense without titles.
    pub fn open_lenient(&self) -> anyhow::Result<Picker<StateFile>> {
        let mut picker = self.open()?;
        if let Err(e) = self.load_catalog(&mut picker) {
            tracing::warn!("{e:#}");
        }
        Ok(picker)
    }

    pub fn load_catalog(&self, picker: &mut Picker<StateFile>) -> anyhow::Result<usize> {
        let mode = picker.state().effective_mode();
        self.with_spinner(picker, mode, |picker, fetcher| picker.reload(fetcher))
    }

    pub fn switch_source(
        &self,
        picker: &mut Picker<StateFile>,
        mode: DataMode,
    ) -> anyhow::Result<usize> {
        self.with_spinner(picker, mode, |picker, fetcher| picker.use_mode(mode, fetcher))
    }

    fn with_spinner<T, E>(
        &self,
        picker: &mut Picker<StateFile>,
        mode: DataMode,
        load: impl FnOnce(&mut Picker<StateFile>, &SourceFetcher) -> Result<T, E>,
    ) -> anyhow::Result<T>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let url = picker.state().data_url.clone();
        let spinner = (mode == DataMode::Url && is_remote(&url))
            .then(|| terminal::spinner(format!("Fetching {url}")));

        let result = load(picker, &self.fetcher());

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        result.context("Couldn't load ideas")
    }
}

fn load_config(root: &Path) -> Config {
    let path = root.join(CONFIG_FILE);
    Config::load(&path).unwrap_or_else(|e| {
        tracing::debug!("Failed to load config: {e}");
        Config::default()
    })
}
