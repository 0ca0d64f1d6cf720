//! `funs`: draw a short activity, with memory of what came up recently.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
