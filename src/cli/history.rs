use anyhow::Context;
use chrono::{DateTime, Local, Utc};
use clap::Parser;
use funs::Action;
use serde::Serialize;
use tracing::instrument;

use super::{
    Session,
    status::OutputFormat,
    terminal::{Colorize, is_narrow},
};

#[derive(Debug, Parser)]
pub struct History {
    /// How many entries to show, newest first
    #[arg(short = 'n', long, default_value_t = 20)]
    limit: usize,

    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Serialize)]
struct Row<'a> {
    id: &'a str,
    title: &'a str,
    action: Action,
    at: DateTime<Utc>,
}

impl History {
    #[instrument(level = "debug", skip(self, session))]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let picker = session.open_lenient()?;

        let rows: Vec<_> = picker
            .history()
            .iter()
            .rev()
            .take(self.limit)
            .map(|entry| Row {
                id: entry.id.as_str(),
                title: picker.title_of(&entry.id),
                action: entry.action,
                at: entry.done_at.or(entry.skipped_at).unwrap_or(entry.at),
            })
            .collect();

        match self.output {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(std::io::stdout(), &rows)
                    .context("failed to render json output")?;
                println!();
            }
            OutputFormat::Table => render_table(&rows),
        }
        Ok(())
    }
}

fn render_table(rows: &[Row<'_>]) {
    if rows.is_empty() {
        println!("{}", "No picks yet. Start with 'funs draw'.".dim());
        return;
    }

    let narrow = is_narrow();
    for row in rows {
        let when = row.at.with_timezone(&Local).format("%Y-%m-%d %H:%M");
        let action = match row.action {
            Action::Drawn => action_label(row.action).info(),
            Action::Done => action_label(row.action).success(),
            Action::Skipped => action_label(row.action).warning(),
        };
        if narrow {
            println!("{} {action}", row.title);
        } else {
            println!("{} {action:<8} {}", when.to_string().dim(), row.title);
        }
    }
}

/// How an action is shown to the user.
pub const fn action_label(action: Action) -> &'static str {
    match action {
        Action::Drawn => "drawn",
        Action::Done => "done",
        Action::Skipped => "skipped",
    }
}
