use anyhow::Context;
use clap::Parser;
use funs::Item;
use serde::Serialize;
use tracing::instrument;

use super::{
    Session,
    status::OutputFormat,
    terminal::{Colorize, is_narrow},
};

/// Command arguments for `funs list`.
#[derive(Debug, Parser)]
pub struct List {
    /// Leave out ideas that came up recently
    #[arg(long)]
    hide_recent: bool,

    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

#[derive(Debug, Serialize)]
struct Row<'a> {
    #[serde(flatten)]
    item: &'a Item,
    recent: bool,
}

impl List {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let picker = session.open_loaded()?;
        let recent = picker.avoid_set();
        let filters = picker.filters();

        let rows: Vec<_> = picker
            .catalog()
            .filtered(&filters)
            .map(|item| Row {
                item,
                recent: recent.contains(&item.id),
            })
            .filter(|row| !self.hide_recent || !row.recent)
            .collect();

        match self.output {
            OutputFormat::Json => render_json(&rows)?,
            OutputFormat::Table => render_table(&rows),
        }
        Ok(())
    }
}

fn render_table(rows: &[Row<'_>]) {
    if rows.is_empty() {
        println!("{}", "No ideas match the current filters.".warning());
        return;
    }

    let narrow = is_narrow();
    let headers: &[&str] = if narrow {
        &["Title", "Min"]
    } else {
        &["Id", "Title", "Category", "Min", "Needs"]
    };

    let data: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let item = row.item;
            let minutes = item.duration_minutes.to_string();
            if narrow {
                vec![item.title.clone(), minutes]
            } else {
                let needs: Vec<_> = item.needs.iter().map(|need| need.as_str()).collect();
                vec![
                    item.id.to_string(),
                    item.title.clone(),
                    item.category.clone().unwrap_or_default(),
                    minutes,
                    needs.join(", "),
                ]
            }
        })
        .collect();

    // Determine column widths for alignment.
    let widths = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            data.iter()
                .map(|row| row[idx].chars().count())
                .max()
                .unwrap_or(0)
                .max(header.len())
        })
        .collect::<Vec<_>>();

    for (header, width) in headers.iter().zip(&widths) {
        print!("{header:<width$}  ");
    }
    println!();

    for width in &widths {
        print!("{:-<width$}  ", "");
    }
    println!();

    for (row, values) in rows.iter().zip(data) {
        for (idx, value) in values.iter().enumerate() {
            let width = widths[idx];
            print!("{value:<width$}  ");
        }
        if row.recent {
            print!("{}", "recent".warning());
        }
        println!();
    }
}

fn render_json(rows: &[Row<'_>]) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(std::io::stdout(), rows).context("failed to render json output")?;
    println!();
    Ok(())
}
