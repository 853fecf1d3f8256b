use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::decisions::{Baseline, Command, Decision, decide};
use crate::extract::extract_fighter;
use crate::names::NameGenerator;
use crate::persist::{self, FighterSnapshot};
use crate::record::FighterRecord;
use crate::roster::{Census, parse_roster, plan_replenishment};
use crate::scout::scout_opponent;
use crate::transport::{Transport, fields};

#[derive(Debug, Clone, PartialEq)]
pub enum FighterOutcome {
    Processed { commands: usize, failed: usize },
    Skipped { reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub outcomes: Vec<(String, FighterOutcome)>,
    pub created: usize,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, FighterOutcome::Processed { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.processed()
    }
}

/// One batch pass over the roster. The snapshot is written even when a step
/// fails, unless this is a dry run.
pub fn run(
    config: &AgentConfig,
    transport: &dyn Transport,
    names: &mut dyn NameGenerator,
) -> Result<RunSummary> {
    let previous = config
        .snapshot_path
        .as_deref()
        .map(persist::load)
        .unwrap_or_default();
    let mut snapshot = HashMap::new();
    let mut summary = RunSummary::default();

    let result = run_roster(config, transport, names, &previous, &mut snapshot, &mut summary);

    if config.dry_run {
        info!("dry run, snapshot left untouched");
    } else if let Some(path) = config.snapshot_path.as_deref() {
        if snapshot.is_empty() {
            warn!("no fighters processed, keeping previous snapshot");
        } else if let Err(err) = persist::save(path, &snapshot) {
            warn!("failed to save snapshot: {err:#}");
            if result.is_ok() {
                return Err(err);
            }
        } else {
            info!(path = %path.display(), fighters = snapshot.len(), "snapshot saved");
        }
    }

    result.map(|_| summary)
}

fn run_roster(
    config: &AgentConfig,
    transport: &dyn Transport,
    names: &mut dyn NameGenerator,
    previous: &HashMap<String, FighterSnapshot>,
    snapshot: &mut HashMap<String, FighterSnapshot>,
    summary: &mut RunSummary,
) -> Result<()> {
    let ids = fighter_ids(config, transport)?;
    info!(fighters = ids.len(), dry_run = config.dry_run, "starting run");

    let mut census = Census::new();
    for id in ids {
        let prior = previous.get(&id);
        match process_fighter(config, transport, &id, prior) {
            Ok(done) => {
                if done.decision.departure.is_none() {
                    census.record(done.record.archetype, done.record.height);
                    snapshot.insert(id.clone(), done.snapshot);
                }
                summary.outcomes.push((
                    id,
                    FighterOutcome::Processed {
                        commands: done.decision.commands.len(),
                        failed: done.failed,
                    },
                ));
            }
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(fighter = %id, %reason, "skipping fighter");
                if let Some(prior) = prior {
                    snapshot.insert(id.clone(), prior.clone());
                }
                summary.outcomes.push((id, FighterOutcome::Skipped { reason }));
            }
        }
    }

    if config.replenish {
        replenish(config, transport, names, &census, summary);
    }
    Ok(())
}

fn fighter_ids(config: &AgentConfig, transport: &dyn Transport) -> Result<Vec<String>> {
    if !config.fighters.is_empty() {
        return Ok(config.fighters.clone());
    }
    let page = transport.send("eko_all_fighters_brief", &[]);
    if page.is_empty() {
        bail!("roster page unavailable");
    }
    Ok(parse_roster(&page))
}

struct Processed {
    record: FighterRecord,
    decision: Decision,
    snapshot: FighterSnapshot,
    failed: usize,
}

fn process_fighter(
    config: &AgentConfig,
    transport: &dyn Transport,
    id: &str,
    prior: Option<&FighterSnapshot>,
) -> Result<Processed> {
    let page = transport.send("eko_control_fighter", &fields(&[("team_id", id)]));
    if page.is_empty() {
        bail!("control page unavailable");
    }
    let mut record = extract_fighter(id, &page).context("control page incomplete")?;

    if let Some(opponent) = record.opponent.as_mut() {
        let tactics = scout_opponent(transport, opponent, &record.name);
        opponent.tactics = tactics;
    }
    debug!(fighter = %id, ?record, "extracted");

    let baseline = Baseline::resolve(&record, prior);
    let decision = decide(&record, &baseline, &config.house_manager);
    let training = format!("{}/{}", decision.training.first, decision.training.second);
    info!(
        fighter = %id,
        name = %record.name,
        archetype = record.archetype,
        grade = record.grade,
        %training,
        intensive = decision.training.intensive,
        plan = %decision.plan,
        writes = decision.commands.len(),
        "decided"
    );

    let mut snapshot = FighterSnapshot::from_decision(&record, &decision);
    let mut failed = 0;
    for command in &decision.commands {
        if send_command(config, transport, command) {
            continue;
        }
        failed += 1;
        // Leave the old baseline in place so the write is retried next run.
        match command {
            Command::Train { .. } => snapshot.training = prior.and_then(|p| p.training),
            Command::SelectPlan { .. } => {
                snapshot.fight_plan = prior.and_then(|p| p.fight_plan.clone())
            }
            Command::ChangeDivision { .. } => {
                snapshot.requested_division = prior.and_then(|p| p.requested_division.clone())
            }
            _ => {}
        }
    }

    Ok(Processed {
        record,
        decision,
        snapshot,
        failed,
    })
}

/// Sends one write, or only logs it on a dry run. False when the server
/// never confirmed the write.
fn send_command(config: &AgentConfig, transport: &dyn Transport, command: &Command) -> bool {
    if config.dry_run {
        info!(command = command.name(), fields = ?command.fields(), "dry run, not sent");
        return true;
    }
    let body = transport.send(command.name(), &command.fields());
    if body.is_empty() {
        warn!(command = command.name(), "write not confirmed");
        return false;
    }
    debug!(command = command.name(), "write sent");
    true
}

fn replenish(
    config: &AgentConfig,
    transport: &dyn Transport,
    names: &mut dyn NameGenerator,
    census: &Census,
    summary: &mut RunSummary,
) {
    if !config.fighters.is_empty() {
        warn!("replenishment needs the full roster, skipped for a partial run");
        return;
    }
    if summary.skipped() > 0 {
        warn!(skipped = summary.skipped(), "roster census incomplete, replenishment skipped");
        return;
    }
    let planned = plan_replenishment(census, names, &mut rand::thread_rng());
    for fighter in planned {
        let command = Command::CreateFighter(fighter);
        if send_command(config, transport, &command) {
            summary.created += 1;
        }
    }
}
