use anyhow::{Context, bail};
use clap::Parser;
use dialoguer::Confirm;
use funs::{Outcome, Picker, StateFile};
use tracing::instrument;

use super::{Session, card, history::action_label, terminal::Colorize};

#[derive(Debug, Parser)]
pub struct Draw {
    /// Show the next idea without recording it
    #[arg(long)]
    peek: bool,
}

impl Draw {
    #[instrument(level = "debug", skip(self, session))]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let mut picker = session.open_loaded()?;

        let item = if self.peek {
            picker.peek().cloned()
        } else {
            picker.draw().cloned()
        };

        match item {
            Some(item) => card::print(&picker, &item),
            None => println!("{}", "No ideas match the current filters.".warning()),
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Finish {
    /// The idea to finish (defaults to the last drawn idea)
    id: Option<String>,
}

impl Finish {
    #[instrument(level = "debug", skip(self, session))]
    pub fn run(self, session: &Session, outcome: Outcome) -> anyhow::Result<()> {
        let mut picker = session.open_loaded()?;

        let shown = match &self.id {
            Some(id) => picker.pick(id).is_some(),
            None => picker.resume().is_some(),
        };
        if !shown {
            match self.id {
                Some(id) => bail!("No idea with id '{id}' passes the current filters"),
                None => bail!("Nothing drawn to finish. Draw an idea first, or pass its id."),
            }
        }

        let finished = match outcome {
            Outcome::Done => picker.done(),
            Outcome::Skipped => picker.skip(),
        }
        .context("No idea on show")?;

        let verb = match outcome {
            Outcome::Done => "Done".success(),
            Outcome::Skipped => "Skipped".warning(),
        };
        println!("{verb}: {}", picker.title_of(&finished.finished));

        if let Some(next) = finished.next {
            print_next(&picker, next.as_str());
        }
        Ok(())
    }
}

fn print_next(picker: &Picker<StateFile>, id: &str) {
    if let Some(item) = picker.catalog().get(id) {
        println!();
        card::print(picker, item);
    }
}

#[instrument(level = "debug", skip(session))]
pub fn undo(session: &Session) -> anyhow::Result<()> {
    let mut picker = session.open_lenient()?;

    match picker.undo() {
        Some(entry) => println!(
            "Removed '{}' ({})",
            picker.title_of(&entry.id),
            action_label(entry.action)
        ),
        None => println!("{}", "History is empty.".dim()),
    }
    Ok(())
}

#[derive(Debug, Parser)]
pub struct Reset {
    /// Don't ask for confirmation
    #[arg(short, long)]
    yes: bool,
}

impl Reset {
    #[instrument(level = "debug", skip(self, session))]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let mut picker = session.open()?;
        let entries = picker.history().len();

        if entries == 0 {
            println!("{}", "History is already empty.".dim());
            return Ok(());
        }

        if !self.yes {
            let confirmed = Confirm::new()
                .with_prompt(format!("Forget all {entries} history entries?"))
                .default(false)
                .interact()
                .context("failed to read confirmation")?;
            if !confirmed {
                println!("{}", "Kept history.".dim());
                return Ok(());
            }
        }

        picker.reset_history();
        println!("{} {entries} entries cleared", "Reset:".success());
        Ok(())
    }
}
