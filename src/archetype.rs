use crate::record::Stats;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Archetype {
    pub strength: f64,
    pub speed: f64,
    pub agility: f64,
    /// Chin a fully experienced (status 28) fighter of this type should carry.
    pub chin: i32,
    /// Height new fighters of this type are created at when none exist yet.
    pub height: i32,
    /// How many fighters of this type the roster wants per height.
    pub desired: usize,
}

pub const ARCHETYPES: [Archetype; 4] = [
    Archetype {
        strength: 0.45,
        speed: 0.33,
        agility: 0.22,
        chin: 19,
        height: 12,
        desired: 3,
    },
    Archetype {
        strength: 0.55,
        speed: 0.30,
        agility: 0.15,
        chin: 22,
        height: 10,
        desired: 1,
    },
    Archetype {
        strength: 0.46,
        speed: 0.25,
        agility: 0.29,
        chin: 20,
        height: 14,
        desired: 2,
    },
    Archetype {
        strength: 0.38,
        speed: 0.30,
        agility: 0.32,
        chin: 19,
        height: 16,
        desired: 0,
    },
];

pub fn archetype(idx: usize) -> &'static Archetype {
    &ARCHETYPES[idx.min(ARCHETYPES.len() - 1)]
}

/// Nearest archetype by summed absolute share error; ties go to the lowest index.
pub fn classify(stats: &Stats, table: &[Archetype]) -> usize {
    let base = stats.base_aps() as f64;
    let mut best = 0;
    let mut best_diff = f64::INFINITY;
    for (idx, t) in table.iter().enumerate() {
        let diff = (base * t.strength - stats.strength as f64).abs()
            + (base * t.speed - stats.speed as f64).abs()
            + (base * t.agility - stats.agility as f64).abs();
        if diff < best_diff {
            best_diff = diff;
            best = idx;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(strength: i32, speed: i32, agility: i32) -> Stats {
        Stats {
            strength,
            speed,
            agility,
            ..Stats::default()
        }
    }

    #[test]
    fn even_split_lands_on_balanced_type() {
        let s = stats(10, 10, 10);
        assert_eq!(classify(&s, &ARCHETYPES), 3);
        assert_eq!(classify(&s, &ARCHETYPES), classify(&s, &ARCHETYPES));
    }

    #[test]
    fn power_heavy_fighter_is_slugger() {
        assert_eq!(classify(&stats(22, 12, 6), &ARCHETYPES), 1);
    }

    #[test]
    fn ties_resolve_to_first_entry() {
        let table = [ARCHETYPES[2], ARCHETYPES[2]];
        assert_eq!(classify(&stats(13, 18, 7), &table), 0);
    }

    #[test]
    fn zero_stats_still_classify() {
        assert_eq!(classify(&Stats::default(), &ARCHETYPES), 0);
    }
}
