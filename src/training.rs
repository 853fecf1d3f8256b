use serde::{Deserialize, Serialize};

use crate::archetype::{Archetype, archetype};
use crate::record::{FighterRecord, Stat, TrainingState};

const MIN_CONDITIONING: i32 = 6;
const MAX_CONDITIONING: i32 = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingOrder {
    pub first: Stat,
    pub second: Stat,
    pub intensive: bool,
}

fn chin_floor(status: i32) -> i32 {
    11 + status.div_euclid(5)
}

pub fn is_intensive(fighter: &FighterRecord) -> bool {
    let s = &fighter.stats;
    s.chin < chin_floor(fighter.status)
        || !(MIN_CONDITIONING..=MAX_CONDITIONING).contains(&s.conditioning)
        || fighter.status - fighter.rating > 2
}

struct Pass<'a> {
    fighter: &'a FighterRecord,
    arch: &'a Archetype,
    prior: Option<Stat>,
    base_aps: f64,
}

impl Pass<'_> {
    /// Stat value as if the slot already chosen this run had been trained.
    fn value(&self, stat: Stat) -> i32 {
        self.fighter.stats.get(stat).saturating_add(i32::from(self.prior == Some(stat)))
    }

    fn pick(&self, first_pass: bool, intensive: bool) -> Stat {
        let f = self.fighter;
        let s = &f.stats;

        if first_pass
            && !intensive
            && (f.rating == 18
                || f.rating == 28
                || f.rating < f.status
                || s.knockout_punch < s.strength.div_euclid(3))
        {
            return Stat::KnockoutPunch;
        }

        if self.value(Stat::Conditioning) < MIN_CONDITIONING {
            return Stat::Conditioning;
        }

        let chin_target =
            (self.arch.chin as f64 - 10.0 - f.height as f64 / 3.5) * f.status as f64 / 28.0;
        if s.chin < chin_floor(f.status) || ((self.value(Stat::Chin) - 10) as f64) < chin_target {
            return Stat::Chin;
        }

        let agility_gap = self.base_aps * self.arch.agility - self.value(Stat::Agility) as f64;
        let speed_gap = self.base_aps * self.arch.speed - self.value(Stat::Speed) as f64;
        if agility_gap > 0.0 && agility_gap <= speed_gap {
            return Stat::Agility;
        }
        if speed_gap > 0.0 {
            return Stat::Speed;
        }

        Stat::KnockoutPunch
    }
}

/// Chooses both training slots. The second pass sees the first slot as
/// already trained, but stats themselves are never mutated.
pub fn decide_training(fighter: &FighterRecord) -> TrainingOrder {
    let arch = archetype(fighter.archetype);
    let intensive = is_intensive(fighter);
    let base_aps = fighter.stats.base_aps() as f64;

    let first = Pass {
        fighter,
        arch,
        prior: None,
        base_aps,
    }
    .pick(true, intensive);

    let grows_base = matches!(first, Stat::Strength | Stat::Speed | Stat::Agility);
    let second = Pass {
        fighter,
        arch,
        prior: Some(first),
        base_aps: base_aps + if grows_base { 1.0 } else { 0.0 },
    }
    .pick(false, intensive);

    TrainingOrder {
        first,
        second,
        intensive,
    }
}

/// True when the configured training differs from `order`. An unset second
/// slot on the remote side is not treated as a difference.
pub fn needs_update(current: Option<&TrainingState>, order: &TrainingOrder) -> bool {
    let Some(current) = current else {
        return true;
    };
    current.first != Some(order.first)
        || current.second.is_some_and(|s| s != order.second)
        || current.intensive != order.intensive
}
