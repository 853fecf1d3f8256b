use crate::record::{FighterRecord, Weight};

/// Upper cut-weight bound (pounds) of each division, ascending.
pub const MAX_WEIGHTS: [i32; 17] = [
    106, 109, 112, 115, 118, 122, 126, 130, 135, 141, 147, 153, 160, 167, 175, 200, 1000,
];

pub const DIVISIONS: [&str; 17] = [
    "straw",
    "junior-fly",
    "fly",
    "super-fly",
    "bantam",
    "super-bantam",
    "feather",
    "super-feather",
    "light",
    "super-light",
    "welter",
    "super-welter",
    "middle",
    "super-middle",
    "light-heavy",
    "cruiser",
    "heavy",
];

/// Fight weights at or above this are treated as heavyweight material.
pub const HEAVY_FIGHT_WEIGHT: i32 = 200;

const NEUTRAL_STAT: f64 = 10.0;

/// Inches above five feet. Non-numeric parts count as zero.
pub fn height_inches(feet: &str, inches: &str) -> i32 {
    let feet = feet.trim().parse::<i32>().unwrap_or(0);
    let inches = inches.trim().parse::<i32>().unwrap_or(0);
    12 * (feet - 5) + inches
}

fn neutral_if_nonfinite(x: f64) -> f64 {
    if x.is_finite() { x } else { NEUTRAL_STAT }
}

pub fn signed_root(x: f64) -> f64 {
    let x = neutral_if_nonfinite(x);
    if x > NEUTRAL_STAT {
        (x - NEUTRAL_STAT).sqrt()
    } else {
        -(NEUTRAL_STAT - x).sqrt()
    }
}

/// Returns `(fight weight, cut weight)` in pounds.
///
/// Rounding is half-away-from-zero throughout. Non-finite stat inputs are
/// read as 10, which makes their factor a no-op.
pub fn compute_weight(
    height: i32,
    strength: f64,
    agility: f64,
    conditioning: f64,
    build: i32,
) -> Weight {
    let frame = (height as f64 + 60.0).powi(3);
    let fight = (frame
        * (0.0005 + build as f64 * 0.00001)
        * (1.0 + signed_root(strength) * 0.05)
        * (1.0 - signed_root(agility) * 0.05)
        - 0.49999)
        .round();
    let conditioning = neutral_if_nonfinite(conditioning);
    let cut = (fight * (0.995 - conditioning * 0.0025)).round();
    Weight {
        fight: fight as i32,
        cut: cut as i32,
    }
}

/// Index into [`DIVISIONS`]: how many bounds lie strictly below `cut_weight`.
pub fn division_index(cut_weight: i32) -> usize {
    let idx = MAX_WEIGHTS.iter().filter(|max| **max < cut_weight).count();
    idx.min(DIVISIONS.len() - 1)
}

pub fn division_for(cut_weight: i32) -> &'static str {
    DIVISIONS[division_index(cut_weight)]
}

pub fn grade(fighter: &FighterRecord) -> f64 {
    let stats = &fighter.stats;
    let wins = fighter.record.wins as f64;
    let draws = fighter.record.draws as f64;
    let status = fighter.status as f64;
    let injury = fighter.injury_points as f64;

    let health = 42.0 * (1.0 - (injury / (status + 1.0) / 38.0).min(1.0));
    let results = (10.0 + (wins + draws).min(10.0)) * wins / (wins + draws + 0.001);
    let rating = 13.0 * fighter.rating as f64 / 28.0;
    let experience = 12.0 * wins.min(20.0) / 20.0;
    let base = stats.base_aps() as f64;
    let power = if base > 0.0 {
        3.0 * stats.strength as f64 / base
    } else {
        0.0
    };
    let kp = 2.0 / (stats.knockout_punch as f64 + 1.0);

    (health + results + rating + experience + power + kp) / fighter.cut.rating() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CutResistance, DivisionPlacement, RecordLine, Stats};

    #[test]
    fn weight_matches_formula_for_sample_fighter() {
        // 6'10", light build, 13 strength, 7 agility, 12 conditioning.
        let w = compute_weight(22, 13.0, 7.0, 12.0, -2);
        assert_eq!(w.fight, 312);
        assert_eq!(w.cut, 301);
        assert_eq!(w, compute_weight(22, 13.0, 7.0, 12.0, -2));
    }

    #[test]
    fn cut_weight_never_exceeds_fight_weight() {
        for conditioning in [0.0, 6.0, 11.0, 20.0] {
            for height in [-8, 0, 10, 24] {
                let w = compute_weight(height, 12.0, 9.0, conditioning, 0);
                assert!(w.cut <= w.fight, "{height} {conditioning}: {w:?}");
            }
        }
    }

    #[test]
    fn nonfinite_stats_are_neutral() {
        let neutral = compute_weight(10, 10.0, 10.0, 10.0, 0);
        assert_eq!(compute_weight(10, f64::NAN, f64::INFINITY, f64::NAN, 0), neutral);
        assert_eq!(signed_root(f64::NAN), 0.0);
        assert_eq!(signed_root(14.0), 2.0);
        assert_eq!(signed_root(6.0), -2.0);
    }

    #[test]
    fn height_defaults_missing_parts_to_zero() {
        assert_eq!(height_inches("6", "10"), 22);
        assert_eq!(height_inches("5", ""), 0);
        assert_eq!(height_inches("4", "x"), -12);
        assert_eq!(height_inches("", ""), -60);
    }

    #[test]
    fn division_bucket_boundaries() {
        assert_eq!(division_index(106), 0);
        assert_eq!(division_index(107), 1);
        assert_eq!(division_index(200), 15);
        assert_eq!(division_index(201), 16);
        assert_eq!(division_for(301), "heavy");
        assert_eq!(division_index(5000), 16);
    }

    fn graded(stats: Stats, cut: CutResistance, record: RecordLine) -> FighterRecord {
        FighterRecord {
            id: "1".to_string(),
            name: "G".to_string(),
            stats,
            cut,
            rating: 0,
            status: 0,
            height: 22,
            build: 0,
            weight: Weight::default(),
            injury_points: 0,
            record,
            division: DivisionPlacement::default(),
            training: None,
            fight_plan: None,
            opponent: None,
            archetype: 0,
            grade: 0.0,
        }
    }

    #[test]
    fn grade_of_fresh_sample_fighter() {
        let stats = Stats {
            strength: 13,
            knockout_punch: 0,
            speed: 18,
            agility: 7,
            chin: 9,
            conditioning: 12,
        };
        let f = graded(stats, CutResistance::High, RecordLine::default());
        let expected = (42.0 + 3.0 * 13.0 / 38.0 + 2.0) / 3.0;
        assert!((grade(&f) - expected).abs() < 1e-9, "{}", grade(&f));
        assert!((grade(&f) - 15.0088).abs() < 1e-4);
    }

    #[test]
    fn grade_clamps_results_and_health() {
        let stats = Stats {
            strength: 20,
            knockout_punch: 4,
            speed: 10,
            agility: 10,
            chin: 15,
            conditioning: 8,
        };
        let record = RecordLine {
            wins: 12,
            draws: 3,
            losses: 2,
            knockouts: 5,
            knocked_out: 1,
        };
        let mut f = graded(stats, CutResistance::Normal, record);
        f.rating = 14;
        f.status = 9;
        f.injury_points = 190;
        // Half health, ten-bout cap on results, wins below the experience cap.
        let expected =
            (21.0 + 20.0 * 12.0 / 15.001 + 6.5 + 12.0 * 12.0 / 20.0 + 1.5 + 0.4) / 2.0;
        assert!((grade(&f) - expected).abs() < 1e-9, "{}", grade(&f));

        f.injury_points = 1000;
        f.record.wins = 25;
        let expected =
            (0.0 + 20.0 * 25.0 / 28.001 + 6.5 + 12.0 + 1.5 + 0.4) / 2.0;
        assert!((grade(&f) - expected).abs() < 1e-9, "{}", grade(&f));
    }

    #[test]
    fn division_index_is_monotonic() {
        let mut last = 0;
        for w in 80..400 {
            let idx = division_index(w);
            assert!(idx >= last);
            last = idx;
        }
    }
}
