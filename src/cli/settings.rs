use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use funs::{
    DataMode,
    domain::item::{MAX_DURATION, MIN_DURATION},
};
use tracing::instrument;

use super::{Session, terminal::Colorize};

#[derive(Debug, Parser)]
pub struct Settings {
    /// Treat ideas picked within this many days as recent
    #[arg(long, value_name = "DAYS")]
    avoid_days: Option<u32>,

    /// Treat the last N distinct ideas as recent
    #[arg(long, value_name = "N")]
    avoid_count: Option<usize>,

    /// Only offer ideas lasting at most this many minutes
    #[arg(
        long,
        value_name = "MINUTES",
        value_parser = clap::value_parser!(u32).range(i64::from(MIN_DURATION)..=i64::from(MAX_DURATION)),
    )]
    max_duration: Option<u32>,

    /// Where to load ideas from: a path relative to the root, or an http(s)
    /// URL. Pass an empty string to restore the default.
    #[arg(long, value_name = "URL")]
    data_url: Option<String>,
}

impl Settings {
    #[instrument(level = "debug", skip(self, session))]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let mut picker = session.open()?;
        let before = picker.settings();

        let settings = funs::Settings {
            avoid_days: self.avoid_days.unwrap_or(before.avoid_days),
            avoid_count: self.avoid_count.unwrap_or(before.avoid_count),
            max_duration: self.max_duration.unwrap_or(before.max_duration),
        };
        if settings != before {
            picker.set_settings(settings);
            println!("{}", "Settings saved.".success());
        }

        if let Some(url) = &self.data_url {
            picker.set_data_url(url);
            println!("{} {}", "Data URL:".success(), picker.state().data_url);
        }

        println!("avoid days   {}", settings.avoid_days);
        println!("avoid count  {}", settings.avoid_count);
        println!("max minutes  {}", settings.max_duration);
        println!("data url     {}", picker.state().data_url);
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Upload {
    /// A CSV or JSON catalog file
    file: PathBuf,
}

impl Upload {
    #[instrument(level = "debug", skip(self, session))]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let text = fs::read_to_string(&self.file)
            .with_context(|| format!("failed to read {}", self.file.display()))?;
        let name = self
            .file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut picker = session.open()?;
        let count = picker
            .upload(&name, text)
            .with_context(|| format!("Couldn't load ideas from {}", self.file.display()))?;

        println!("{} {count} ideas from {name}", "Loaded".success());
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Source {
    /// Which source to load ideas from
    #[arg(value_enum)]
    mode: SourceMode,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum SourceMode {
    /// The data URL from the settings
    Url,
    /// The last uploaded file
    Upload,
}

impl From<SourceMode> for DataMode {
    fn from(mode: SourceMode) -> Self {
        match mode {
            SourceMode::Url => Self::Url,
            SourceMode::Upload => Self::Upload,
        }
    }
}

impl Source {
    #[instrument(level = "debug", skip(self, session))]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let mut picker = session.open()?;
        let mode = DataMode::from(self.mode);

        if mode == DataMode::Upload && picker.state().uploaded_data.is_none() {
            println!(
                "{}",
                "No uploaded file yet; using the data URL. Upload one with 'funs upload'."
                    .warning()
            );
        }

        let count = session.switch_source(&mut picker, mode)?;
        let label = picker
            .state()
            .last_source
            .as_ref()
            .map_or("", |source| source.label.as_str());
        println!("{} {count} ideas from {label}", "Loaded".success());
        Ok(())
    }
}
