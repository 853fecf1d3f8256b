use crate::fight_plan::{FightPlan, decide_fight_plan, plan_matches};
use crate::persist::FighterSnapshot;
use crate::record::{FighterRecord, TrainingState};
use crate::roster::NewFighter;
use crate::training::{TrainingOrder, decide_training, needs_update};

const RETIRE_INJURY_RATIO: f64 = 35.0;
const FRESH_RATING: i32 = 18;
const VETERAN_STATUS: i32 = 18;

/// One outgoing write to the game server.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Train {
        team: String,
        order: TrainingOrder,
    },
    SelectPlan {
        team: String,
        plan: String,
    },
    ChangeDivision {
        team: String,
        division: String,
    },
    Retire {
        team_id: String,
    },
    Transfer {
        team: String,
        to_manager: String,
    },
    CreateFighter(NewFighter),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Train { .. } => "eko_training",
            Command::SelectPlan { .. } => "eko_select_orders",
            Command::ChangeDivision { .. } => "eko_change_division",
            Command::Retire { .. } => "eko_retire_byid",
            Command::Transfer { .. } => "eko_transfer",
            Command::CreateFighter(_) => "eko_create_fighter",
        }
    }

    pub fn fields(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = Vec::new();
        let mut push = |k: &str, v: String| out.push((k.to_string(), v));
        match self {
            Command::Train { team, order } => {
                push("your_team", team.clone());
                push("train", order.first.training_choice().to_string());
                push("train2", order.second.training_choice().to_string());
                if order.intensive {
                    push("intensive", "1".to_string());
                }
            }
            Command::SelectPlan { team, plan } => {
                push("your_team", team.clone());
                push("strategy_choice", plan.clone());
            }
            Command::ChangeDivision { team, division } => {
                push("your_team", team.clone());
                push("division", format!("{division}weight"));
            }
            Command::Retire { team_id } => {
                push("verify_retire", "1".to_string());
                push("team_id", team_id.clone());
            }
            Command::Transfer { team, to_manager } => {
                push("to_manager", to_manager.clone());
                push("your_team", team.clone());
            }
            Command::CreateFighter(f) => {
                push("competition", "eko".to_string());
                push("region", "0".to_string());
                push("team", f.name.clone());
                push("height", f.height.to_string());
                push("strength", f.strength.to_string());
                push("ko_punch", f.knockout_punch.to_string());
                push("speed", f.speed.to_string());
                push("agility", f.agility.to_string());
                push("chin", f.chin.to_string());
                push("condition", f.conditioning.to_string());
                push("cut", "1".to_string());
                push("build", f.build.to_string());
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    Retire,
    Transfer,
}

/// Too many injury points for the fighter's experience: contenders and
/// veterans retire, everyone else goes to the house manager.
pub fn departure(fighter: &FighterRecord) -> Option<Departure> {
    let ratio = fighter.injury_points as f64 / (fighter.status as f64 + 1.0);
    if ratio <= RETIRE_INJURY_RATIO {
        return None;
    }
    if fighter.division.is_contender() || fighter.status > VETERAN_STATUS {
        Some(Departure::Retire)
    } else {
        Some(Departure::Transfer)
    }
}

/// Division the fighter should move to, if any. Fresh fighters outside the
/// contenders pool are left where they are.
pub fn division_change(fighter: &FighterRecord) -> Option<&str> {
    let d = &fighter.division;
    if d.current.is_empty() || d.correct.is_empty() || d.current == d.correct {
        return None;
    }
    if fighter.rating == FRESH_RATING && !d.is_contender() {
        return None;
    }
    Some(d.correct.as_str())
}

/// What the remote side is known to be configured with: the scraped page
/// and whatever this agent sent on a previous run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Baseline {
    pub scraped_training: Option<TrainingState>,
    pub scraped_plan: Option<String>,
    pub saved_training: Option<TrainingState>,
    pub saved_plan: Option<String>,
    pub saved_division: Option<String>,
}

impl Baseline {
    pub fn resolve(fighter: &FighterRecord, previous: Option<&FighterSnapshot>) -> Self {
        Self {
            scraped_training: fighter.training,
            scraped_plan: fighter.fight_plan.clone(),
            saved_training: previous.and_then(|p| p.training),
            saved_plan: previous.and_then(|p| p.fight_plan.clone()),
            saved_division: previous.and_then(|p| p.requested_division.clone()),
        }
    }

    fn training_differs(&self, order: &TrainingOrder) -> bool {
        needs_update(self.scraped_training.as_ref(), order)
            && needs_update(self.saved_training.as_ref(), order)
    }

    fn plan_differs(&self, plan: &FightPlan) -> bool {
        !plan_matches(self.scraped_plan.as_deref(), plan)
            && !plan_matches(self.saved_plan.as_deref(), plan)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub training: TrainingOrder,
    pub plan: FightPlan,
    pub departure: Option<Departure>,
    /// Division a change was requested for, this run or an earlier one.
    pub requested_division: Option<String>,
    pub commands: Vec<Command>,
}

impl Decision {
    pub fn training_state(&self) -> TrainingState {
        TrainingState {
            first: Some(self.training.first),
            second: Some(self.training.second),
            intensive: self.training.intensive,
        }
    }
}

/// Derives every write for one fighter from its current record. Running it
/// again with the resulting snapshot as baseline yields no commands.
pub fn decide(fighter: &FighterRecord, baseline: &Baseline, house_manager: &str) -> Decision {
    let training = decide_training(fighter);
    let plan = decide_fight_plan(fighter);
    let departure = departure(fighter);
    let mut commands = Vec::new();
    let mut requested_division = None;

    match departure {
        Some(Departure::Retire) => commands.push(Command::Retire {
            team_id: fighter.id.clone(),
        }),
        Some(Departure::Transfer) => commands.push(Command::Transfer {
            team: fighter.name.clone(),
            to_manager: house_manager.to_string(),
        }),
        None => {
            if let Some(division) = division_change(fighter) {
                requested_division = Some(division.to_string());
                if baseline.saved_division.as_deref() != Some(division) {
                    commands.push(Command::ChangeDivision {
                        team: fighter.name.clone(),
                        division: division.to_string(),
                    });
                }
            }
            if baseline.plan_differs(&plan) {
                commands.push(Command::SelectPlan {
                    team: fighter.name.clone(),
                    plan: plan.label(),
                });
            }
            if baseline.training_differs(&training) {
                commands.push(Command::Train {
                    team: fighter.name.clone(),
                    order: training,
                });
            }
        }
    }

    Decision {
        training,
        plan,
        departure,
        requested_division,
        commands,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CutResistance, DivisionPlacement, RecordLine, Stat, Stats, Weight};

    fn fighter() -> FighterRecord {
        FighterRecord {
            id: "1695000".to_string(),
            name: "df".to_string(),
            stats: Stats {
                strength: 13,
                knockout_punch: 0,
                speed: 18,
                agility: 7,
                chin: 9,
                conditioning: 12,
            },
            cut: CutResistance::High,
            rating: 0,
            status: 0,
            height: 22,
            build: -2,
            weight: Weight { fight: 312, cut: 301 },
            injury_points: 0,
            record: RecordLine::default(),
            division: DivisionPlacement {
                current: "heavy".to_string(),
                region: "1234567891".to_string(),
                correct: "heavy".to_string(),
            },
            training: None,
            fight_plan: None,
            opponent: None,
            archetype: 2,
            grade: 0.0,
        }
    }

    fn snapshot_after(f: &FighterRecord, d: &Decision) -> FighterSnapshot {
        FighterSnapshot::from_decision(f, d)
    }

    #[test]
    fn training_command_fields() {
        let cmd = Command::Train {
            team: "df".to_string(),
            order: TrainingOrder {
                first: Stat::Chin,
                second: Stat::Conditioning,
                intensive: true,
            },
        };
        assert_eq!(cmd.name(), "eko_training");
        let fields = cmd.fields();
        assert_eq!(fields[1], ("train".to_string(), "sparring (CHN)".to_string()));
        assert_eq!(fields[2], ("train2".to_string(), "road work (CND)".to_string()));
        assert_eq!(fields[3], ("intensive".to_string(), "1".to_string()));
    }

    #[test]
    fn division_command_appends_weight() {
        let cmd = Command::ChangeDivision {
            team: "df".to_string(),
            division: "super-middle".to_string(),
        };
        assert_eq!(
            cmd.fields()[1],
            ("division".to_string(), "super-middleweight".to_string())
        );
    }

    #[test]
    fn heavy_injuries_retire_or_transfer() {
        let mut f = fighter();
        f.status = 4;
        f.injury_points = 175;
        assert_eq!(departure(&f), None);
        f.injury_points = 176;
        assert_eq!(departure(&f), Some(Departure::Transfer));
        f.division.region = "contenders".to_string();
        assert_eq!(departure(&f), Some(Departure::Retire));

        let d = decide(&f, &Baseline::default(), "77894");
        assert_eq!(d.commands, vec![Command::Retire { team_id: f.id.clone() }]);

        f.status = i32::MAX;
        assert_eq!(departure(&f), None);
    }

    #[test]
    fn transfer_goes_to_house_manager() {
        let mut f = fighter();
        f.injury_points = 100;
        let d = decide(&f, &Baseline::default(), "77894");
        assert_eq!(d.commands.len(), 1);
        assert_eq!(d.commands[0].name(), "eko_transfer");
        assert_eq!(
            d.commands[0].fields()[0],
            ("to_manager".to_string(), "77894".to_string())
        );
    }

    #[test]
    fn fresh_fighters_outside_contenders_keep_division() {
        let mut f = fighter();
        f.division.current = "cruiser".to_string();
        f.rating = 18;
        assert_eq!(division_change(&f), None);
        f.division.region = "contenders".to_string();
        assert_eq!(division_change(&f), Some("heavy"));
        f.rating = 17;
        f.division.region = "1".to_string();
        assert_eq!(division_change(&f), Some("heavy"));
    }

    #[test]
    fn first_run_writes_plan_and_training() {
        let d = decide(&fighter(), &Baseline::default(), "77894");
        let names: Vec<_> = d.commands.iter().map(Command::name).collect();
        assert_eq!(names, vec!["eko_select_orders", "eko_training"]);
    }

    #[test]
    fn second_run_with_snapshot_is_silent() {
        let mut f = fighter();
        f.division.current = "cruiser".to_string();
        let first = decide(&f, &Baseline::default(), "77894");
        assert_eq!(first.commands.len(), 3);

        let snap = snapshot_after(&f, &first);
        let second = decide(&f, &Baseline::resolve(&f, Some(&snap)), "77894");
        assert!(second.commands.is_empty(), "{:?}", second.commands);
        assert_eq!(second.requested_division.as_deref(), Some("heavy"));
    }

    #[test]
    fn matching_remote_state_needs_no_write() {
        let mut f = fighter();
        let d = decide(&f, &Baseline::default(), "77894");
        f.training = Some(d.training_state());
        f.fight_plan = Some(d.plan.label());
        let again = decide(&f, &Baseline::resolve(&f, None), "77894");
        assert!(again.commands.is_empty());
    }
}
