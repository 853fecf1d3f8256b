use anyhow::Result;
use tracing::info;

use eko_agent::config::AgentConfig;
use eko_agent::names::WikipediaNames;
use eko_agent::runner::{self, FighterOutcome};
use eko_agent::transport::HttpTransport;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    eko_agent::init_tracing();

    let mut config = AgentConfig::from_env()?;
    config.apply_args(std::env::args().skip(1))?;

    let transport = HttpTransport::new(&config)?;
    let mut names = WikipediaNames::with_timeout(config.request_timeout)?;
    let summary = runner::run(&config, &transport, &mut names)?;

    for (id, outcome) in &summary.outcomes {
        if let FighterOutcome::Skipped { reason } = outcome {
            info!(fighter = %id, %reason, "not processed");
        }
    }
    info!(
        processed = summary.processed(),
        skipped = summary.skipped(),
        created = summary.created,
        "run complete"
    );
    Ok(())
}
