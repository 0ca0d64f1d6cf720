use anyhow::Context;
use clap::Parser;
use funs::{Counts, DataMode, Need, Settings};
use serde::Serialize;
use tracing::instrument;

use super::{
    Session,
    terminal::{Colorize, is_narrow},
};

#[derive(Debug, Parser, Default)]
#[command(about = "Show catalog size, history size and settings")]
pub struct Status {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    visible: usize,
    total: usize,
    history: usize,
    settings: Settings,
    data_url: &'a str,
    data_mode: DataMode,
    source: Option<&'a str>,
    pending: Option<Pending<'a>>,
    categories: Vec<&'a str>,
    needs: Vec<Need>,
}

#[derive(Debug, Serialize)]
struct Pending<'a> {
    id: &'a str,
    title: &'a str,
}

impl Status {
    #[instrument(level = "debug", skip(self, session))]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let picker = session.open_lenient()?;
        let Counts {
            visible,
            total,
            history,
        } = picker.counts();

        let pending = picker
            .history()
            .last()
            .filter(|entry| entry.is_pending())
            .map(|entry| Pending {
                id: entry.id.as_str(),
                title: picker.title_of(&entry.id),
            });

        let state = picker.state();
        let report = Report {
            visible,
            total,
            history,
            settings: state.settings,
            data_url: &state.data_url,
            data_mode: state.effective_mode(),
            source: state.last_source.as_ref().map(|source| source.label.as_str()),
            pending,
            categories: picker.catalog().categories(),
            needs: picker.catalog().needs(),
        };

        match self.output {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(std::io::stdout(), &report)
                    .context("failed to render json output")?;
                println!();
            }
            OutputFormat::Table => output_table(&report),
        }

        Ok(())
    }
}

fn output_table(report: &Report<'_>) {
    println!(
        "{} visible • {} total • {} picks in history",
        report.visible, report.total, report.history
    );

    if report.total == 0 {
        println!(
            "{}",
            "No ideas loaded. Check the data URL with 'funs settings'.".warning()
        );
    }

    println!();
    let settings = report.settings;
    let source = report.source.unwrap_or(report.data_url);
    let rows = [
        ("Avoid days", settings.avoid_days.to_string()),
        ("Avoid count", settings.avoid_count.to_string()),
        ("Max minutes", settings.max_duration.to_string()),
        ("Source", source.to_string()),
        ("Categories", joined(report.categories.iter().copied())),
        ("Needs", joined(report.needs.iter().map(Need::as_str))),
    ];

    if is_narrow() {
        for (label, value) in rows {
            println!("{label}: {value}");
        }
    } else {
        for (label, value) in rows {
            println!("{label:<12} {value}");
        }
    }

    if let Some(pending) = &report.pending {
        println!();
        println!(
            "Waiting on: {} {}",
            pending.title.info(),
            "(finish with 'funs done' or 'funs skip')".dim()
        );
    }
}

fn joined<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let values: Vec<_> = values.collect();
    if values.is_empty() {
        "-".to_string()
    } else {
        values.join(", ")
    }
}
