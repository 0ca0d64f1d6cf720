//! The interactive picking loop.

use std::fmt;

use anyhow::Context;
use dialoguer::Select;
use funs::{Finished, Picker, PromptPools, SourceFetcher, StateFile};
use tracing::instrument;

use super::{Session, card, history::action_label, prompt, terminal::Colorize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Draw,
    Peek,
    Pick,
    Done,
    Skip,
    Clear,
    Prompt,
    Undo,
    Quit,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Draw => "Draw",
            Self::Peek => "Peek at the next one",
            Self::Pick => "Pick from the list",
            Self::Done => "Done",
            Self::Skip => "Skip",
            Self::Clear => "Put it back",
            Self::Prompt => "Another prompt",
            Self::Undo => "Undo last",
            Self::Quit => "Quit",
        })
    }
}

#[instrument(level = "debug", skip(session))]
pub fn run(session: &Session) -> anyhow::Result<()> {
    let mut picker = session.open_loaded()?;
    let prompts = PromptPools::new(session.fetcher());

    if let Some(item) = picker.resume().cloned() {
        println!("{}", "Picking up where you left off:".dim());
        card::print(&picker, &item);
        println!();
    }

    loop {
        let counts = picker.counts();
        println!(
            "{}",
            format!(
                "{} visible • {} total • {} picks in history",
                counts.visible, counts.total, counts.history
            )
            .dim()
        );

        let steps = steps(&picker);
        let choice = Select::new()
            .with_prompt("What next?")
            .items(&steps)
            .default(0)
            .interact_opt()
            .context("failed to read choice")?;
        let step = choice.map_or(Step::Quit, |index| steps[index]);
        println!();

        match step {
            Step::Draw => {
                let item = picker.draw().cloned();
                show(&picker, item.as_ref());
            }
            Step::Peek => {
                let item = picker.peek().cloned();
                show(&picker, item.as_ref());
            }
            Step::Pick => pick(&mut picker)?,
            Step::Done => {
                let finished = picker.done();
                report(&picker, &"Done".success(), finished);
            }
            Step::Skip => {
                let finished = picker.skip();
                report(&picker, &"Skipped".warning(), finished);
            }
            Step::Clear => {
                picker.clear();
            }
            Step::Prompt => draw_prompt(&picker, &prompts)?,
            Step::Undo => {
                if let Some(entry) = picker.undo() {
                    println!(
                        "Removed '{}' ({})",
                        picker.title_of(&entry.id),
                        action_label(entry.action)
                    );
                }
            }
            Step::Quit => return Ok(()),
        }
        println!();
    }
}

fn steps(picker: &Picker<StateFile>) -> Vec<Step> {
    let mut steps = vec![Step::Draw, Step::Peek, Step::Pick];
    if let Some(item) = picker.current() {
        steps.extend([Step::Done, Step::Skip, Step::Clear]);
        if picker.pool_for(item).is_some() {
            steps.push(Step::Prompt);
        }
    }
    if !picker.history().is_empty() {
        steps.push(Step::Undo);
    }
    steps.push(Step::Quit);
    steps
}

fn show(picker: &Picker<StateFile>, item: Option<&funs::Item>) {
    match item {
        Some(item) => card::print(picker, item),
        None => println!("{}", "No ideas match the current filters.".warning()),
    }
}

fn pick(picker: &mut Picker<StateFile>) -> anyhow::Result<()> {
    let candidates = picker.candidates();
    if candidates.is_empty() {
        show(picker, None);
        return Ok(());
    }

    let titles: Vec<_> = candidates.iter().map(|id| picker.title_of(id)).collect();
    let choice = Select::new()
        .with_prompt("Which one?")
        .items(&titles)
        .default(0)
        .interact_opt()
        .context("failed to read choice")?;

    if let Some(index) = choice {
        let item = picker.pick(candidates[index].as_str()).cloned();
        show(picker, item.as_ref());
    }
    Ok(())
}

fn report(picker: &Picker<StateFile>, verb: &str, finished: Option<Finished>) {
    let Some(finished) = finished else {
        return;
    };
    println!("{verb}: {}", picker.title_of(&finished.finished));

    if let Some(item) = finished.next.and_then(|next| picker.catalog().get(next.as_str())) {
        println!();
        card::print(picker, item);
    }
}

fn draw_prompt(
    picker: &Picker<StateFile>,
    prompts: &PromptPools<SourceFetcher>,
) -> anyhow::Result<()> {
    let Some(pool) = picker.current().and_then(|item| picker.pool_for(item)) else {
        return Ok(());
    };

    match prompt::draw(prompts, pool)? {
        Some(text) => println!("{} {text}", format!("{}:", pool.label).info()),
        None => println!("{}", format!("{} is empty.", pool.label).warning()),
    }
    Ok(())
}
