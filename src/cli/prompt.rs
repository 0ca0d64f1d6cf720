use anyhow::{Context, bail};
use clap::Parser;
use funs::{PoolConfig, PromptPools, SourceFetcher};
use tracing::instrument;

use super::{Session, terminal::Colorize};

#[derive(Debug, Parser)]
pub struct Prompt {
    /// The pool to draw from, e.g. `charades`
    pool: String,

    /// How many prompts to draw. No prompt repeats until the pool runs out.
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,
}

impl Prompt {
    #[instrument(level = "debug", skip(self, session))]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let config = session.config();
        let Some(pool) = config.pool(&self.pool) else {
            let names: Vec<_> = config.pools().iter().map(|pool| pool.name.as_str()).collect();
            bail!(
                "No prompt pool named '{}'. Known pools: {}",
                self.pool,
                names.join(", ")
            );
        };

        let pools = PromptPools::new(session.fetcher());
        for _ in 0..self.count {
            match draw(&pools, pool)? {
                Some(prompt) => println!("{prompt}"),
                None => {
                    println!("{}", format!("{} is empty.", pool.label).warning());
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Draws one prompt from `pool`.
pub fn draw(pools: &PromptPools<SourceFetcher>, pool: &PoolConfig) -> anyhow::Result<Option<String>> {
    pools
        .draw(&pool.source)
        .with_context(|| format!("Couldn't load {}", pool.label))
}
