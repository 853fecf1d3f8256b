use std::fmt;

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::metrics::HEAVY_FIGHT_WEIGHT;
use crate::record::{BUCKETS, BucketSummary, FighterRecord};
use crate::tactics::{STYLE_ALLOUT, STYLE_CLINCH, STYLE_INSIDE, STYLE_ROPES};

const BASE_PLANS: [&str; 6] = [
    "417clinchR",
    "5H105alloutR",
    "5H105insideR",
    "5H114alloutR",
    "5H114insideR",
    "5H87alloutR",
];
const TALL_OPPONENT_PLAN: &str = "6H122alloutR";
const ALLOUT_PLANS: [&str; 3] = ["5H105alloutR", "5H114alloutR", "5H87alloutR"];

const FLASH_LIMIT: f64 = 0.7;
const WEARDOWN_LIMIT: f64 = 0.8;
const BALANCED_LIMIT: f64 = 0.9;
const SLAP_LIMIT: f64 = 0.9;

/// Strategy label: a template plus a round-repeat digit, e.g. `5H105insideR2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FightPlan {
    pub template: &'static str,
    pub repeat: u8,
}

impl FightPlan {
    fn new(template: &'static str, repeat: u8) -> Self {
        Self { template, repeat }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FightPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.template, self.repeat)
    }
}

/// `id + sum(record) * fight_weight`. A new bout result moves the seed.
pub fn plan_seed(fighter: &FighterRecord) -> u64 {
    let seed = fighter
        .numeric_id()
        .wrapping_add(fighter.record.sum().wrapping_mul(fighter.weight.fight as i64));
    seed as u64
}

pub fn seeded_rng(fighter: &FighterRecord) -> StdRng {
    StdRng::seed_from_u64(plan_seed(fighter))
}

/// Plan from the fighter's own seeded stream.
pub fn decide_fight_plan(fighter: &FighterRecord) -> FightPlan {
    select_plan(fighter, &mut seeded_rng(fighter))
}

pub fn select_plan<R: Rng>(fighter: &FighterRecord, rng: &mut R) -> FightPlan {
    let mut plan = base_plan(fighter, rng);
    let Some(opponent) = &fighter.opponent else {
        return plan;
    };
    // Earliest rounds are applied last so they have the final say.
    for idx in (0..BUCKETS).rev() {
        if let Some(over) = bucket_override(fighter, &opponent.tactics[idx], idx) {
            plan = over;
        }
    }
    plan
}

fn base_plan<R: Rng>(fighter: &FighterRecord, rng: &mut R) -> FightPlan {
    let hd = fighter.height_differential();
    let chin = fighter.stats.chin;

    let template = if chin < 15 {
        BASE_PLANS[rng.gen_range(0..BASE_PLANS.len())]
    } else {
        let idx = rng.gen_range(0..=BASE_PLANS.len());
        BASE_PLANS.get(idx).copied().unwrap_or(TALL_OPPONENT_PLAN)
    };
    let tall = if fighter.height > 14 { 1 } else { 3 };
    let repeats = [1, 1, tall, tall, if hd <= 0 { 1 } else { 3 }];
    let mut plan = FightPlan::new(template, repeats[rng.gen_range(0..repeats.len())]);

    if rng.gen_range(0..7) == 0 && hd <= 3 {
        let pick = ["5H87clinchR", "5H105ringR"][rng.gen_range(0..2)];
        plan = FightPlan::new(pick, plan.repeat);
    }

    if fighter.weight.fight < HEAVY_FIGHT_WEIGHT {
        // Long careers of draws with almost no stoppages.
        let record = &fighter.record;
        let rarely_stopped = record.draws > 9
            && (record.knocked_out as f64 / record.draws as f64) < 0.1;
        if rng.gen_range(0..7) < 5 && (hd >= 10 || rarely_stopped) {
            plan = FightPlan::new(TALL_OPPONENT_PLAN, rng.gen_range(1..=3));
        } else if hd <= 0 && rng.gen_range(0..5) == 0 {
            plan = FightPlan::new("5H114insideR", 1);
        } else if hd <= 0 {
            plan = FightPlan::new("5H87ringR", 1);
        } else if hd <= 3 && rng.gen_range(0..2) == 1 {
            plan = FightPlan::new("5H105insideR", 1);
        } else if hd <= 3 {
            let pick = ["5H87clinchR", "5H105clinchR"][rng.gen_range(0..2)];
            plan = FightPlan::new(pick, 1);
        }
    }

    if fighter.rating >= 28 && hd >= 3 {
        plan = FightPlan::new("4H97ringR", 1);
    }
    if rng.gen_range(0..10) == 0 {
        plan = FightPlan::new("6H113alloutR", 1);
    }
    if chin > 23 {
        let tall_pick = if hd > 0 { TALL_OPPONENT_PLAN } else { "5H105alloutR" };
        let idx = rng.gen_range(0..=ALLOUT_PLANS.len());
        let pick = ALLOUT_PLANS.get(idx).copied().unwrap_or(tall_pick);
        plan = FightPlan::new(pick, rng.gen_range(1..=2));
    }
    plan
}

/// Counter for one bucket's dominant tendency. Buckets without history
/// never override.
pub fn bucket_override(
    fighter: &FighterRecord,
    bucket: &BucketSummary,
    idx: usize,
) -> Option<FightPlan> {
    if !bucket.has_history() {
        return None;
    }
    let hd = fighter.height_differential();
    let chin = fighter.stats.chin;
    let top = bucket.top_style as usize;
    let repeat = idx as u8 + 1;

    let template = if top == STYLE_ALLOUT && bucket.unique_styles <= 1 {
        if hd > 0 { "5H87clinchR" } else { "5H105insideR" }
    } else if bucket.flash > FLASH_LIMIT
        && (top == STYLE_INSIDE || top == STYLE_ALLOUT)
        && bucket.unique_styles <= 2
    {
        if hd >= 3 { "5H87clinchR" } else { "5H105ringR" }
    } else if bucket.flash > FLASH_LIMIT {
        if hd >= 3 {
            "5H87clinchR"
        } else if chin < 15 {
            "4H97ringR"
        } else {
            "5H105insideR"
        }
    } else if bucket.weardown > WEARDOWN_LIMIT {
        if matches!(top, STYLE_INSIDE | STYLE_CLINCH | STYLE_ROPES) {
            if hd > 0 { "5H87clinchR" } else { "5H114insideR" }
        } else if hd > 0 {
            "5H105alloutR"
        } else {
            "4H97ringR"
        }
    } else if bucket.balanced > BALANCED_LIMIT {
        if fighter.record.wins > fighter.record.losses {
            "5H105insideR"
        } else {
            TALL_OPPONENT_PLAN
        }
    } else if bucket.slap > SLAP_LIMIT {
        if hd <= 0 { "5H114alloutR" } else { "5H105clinchR" }
    } else {
        return None;
    };
    Some(FightPlan::new(template, repeat))
}

/// True when the configured plan already matches.
pub fn plan_matches(current: Option<&str>, plan: &FightPlan) -> bool {
    current.is_some_and(|c| c.trim().eq_ignore_ascii_case(&plan.label()))
}
