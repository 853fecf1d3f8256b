use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use eko_agent::config::DEFAULT_HOUSE_MANAGER;
use eko_agent::decisions::{Baseline, decide};
use eko_agent::extract::extract_fighter;

fn main() -> Result<()> {
    eko_agent::init_tracing();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        bail!("usage: inspect_page <control-page.html> [fighter_id]");
    };
    let id = args.next().unwrap_or_else(|| "0".to_string());

    let html = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let record = extract_fighter(&id, &html)
        .with_context(|| format!("extract fighter from {}", path.display()))?;
    let decision = decide(&record, &Baseline::resolve(&record, None), DEFAULT_HOUSE_MANAGER);

    println!("{}", serde_json::to_string_pretty(&record)?);
    println!("Archetype: {}", record.archetype);
    println!("Grade: {:.2}", record.grade);
    println!(
        "Weight: {} fight / {} cut ({}weight)",
        record.weight.fight, record.weight.cut, record.division.correct
    );
    println!(
        "Training: {} / {}{}",
        decision.training.first,
        decision.training.second,
        if decision.training.intensive { " (intensive)" } else { "" }
    );
    println!("Plan: {}", decision.plan);
    if let Some(departure) = decision.departure {
        println!("Departure: {departure:?}");
    }
    for command in &decision.commands {
        println!("Would send {} {:?}", command.name(), command.fields());
    }
    Ok(())
}
