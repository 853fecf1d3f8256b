use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use tracing::{info, warn};

use crate::archetype::{ARCHETYPES, Archetype};
use crate::metrics::compute_weight;
use crate::names::NameGenerator;

/// Attribute points a new fighter is created with, height included.
const CREATION_POINTS: i32 = 69;
const NEW_CONDITIONING: i32 = 6;
const LIGHTEST_CUT: i32 = 106;
const LIGHT_BUILD_PROBE: i32 = -3;

static TEAM_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"team_id=(\d+)").expect("team id pattern compiles"));

/// Fighter ids on a roster page, in page order, without repeats.
pub fn parse_roster(html: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for cap in TEAM_ID.captures_iter(html) {
        let id = &cap[1];
        if !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFighter {
    pub name: String,
    pub height: i32,
    pub strength: i32,
    pub knockout_punch: i32,
    pub speed: i32,
    pub agility: i32,
    pub chin: i32,
    pub conditioning: i32,
    pub build: i32,
}

/// Classified fighters per archetype and height.
#[derive(Debug, Clone, Default)]
pub struct Census {
    counts: Vec<BTreeMap<i32, usize>>,
}

impl Census {
    pub fn new() -> Self {
        Self {
            counts: vec![BTreeMap::new(); ARCHETYPES.len()],
        }
    }

    pub fn record(&mut self, archetype: usize, height: i32) {
        if let Some(heights) = self.counts.get_mut(archetype) {
            *heights.entry(height).or_insert(0) += 1;
        }
    }

    pub fn count(&self, archetype: usize, height: i32) -> usize {
        self.counts
            .get(archetype)
            .and_then(|h| h.get(&height))
            .copied()
            .unwrap_or(0)
    }

    /// `(archetype, height, missing)` for every slot below its desired count.
    /// Archetypes with no fighters at all are checked at their baseline height.
    pub fn shortfalls(&self, table: &[Archetype]) -> Vec<(usize, i32, usize)> {
        let mut out = Vec::new();
        for (idx, arch) in table.iter().enumerate() {
            let heights: Vec<i32> = match self.counts.get(idx) {
                Some(h) if !h.is_empty() => h.keys().copied().collect(),
                _ => vec![arch.height],
            };
            for height in heights {
                let have = self.count(idx, height);
                if have < arch.desired {
                    out.push((idx, height, arch.desired - have));
                }
            }
        }
        out
    }
}

/// Spreads a new fighter's points by archetype shares. `build_roll` is only
/// used when the fighter is not already at the lightest possible cut.
pub fn allocate(height: i32, arch: &Archetype, chin: i32, build_roll: i32) -> NewFighter {
    let conditioning = NEW_CONDITIONING;
    let free = (CREATION_POINTS - height - chin - conditioning) as f64;

    let mut strength = (free * (1.0 - arch.speed - arch.agility)).round() as i32;
    strength -= strength.div_euclid(9);
    let knockout_punch = strength.div_euclid(3);
    let agility = ((free - knockout_punch as f64) * arch.agility).max(1.0).round() as i32;
    let speed =
        CREATION_POINTS - height - strength - knockout_punch - agility - chin - conditioning;

    let lightest = compute_weight(
        height,
        strength as f64,
        agility as f64,
        conditioning as f64,
        LIGHT_BUILD_PROBE,
    );
    let build = if lightest.cut < LIGHTEST_CUT {
        3
    } else {
        build_roll
    };

    NewFighter {
        name: String::new(),
        height,
        strength,
        knockout_punch,
        speed,
        agility,
        chin,
        conditioning,
        build,
    }
}

/// Fighters to create so every archetype reaches its desired count.
pub fn plan_replenishment<R: Rng>(
    census: &Census,
    names: &mut dyn NameGenerator,
    rng: &mut R,
) -> Vec<NewFighter> {
    let mut planned = Vec::new();
    for (idx, height, missing) in census.shortfalls(&ARCHETYPES) {
        let arch = &ARCHETYPES[idx];
        for _ in 0..missing {
            let name = names.generate();
            if name.is_empty() {
                warn!(archetype = idx, height, "no name available, skipping creation");
                continue;
            }
            let chin = rng.gen_range(12..=14);
            let build_roll = rng.gen_range(0..=3);
            let fighter = NewFighter {
                name,
                ..allocate(height, arch, chin, build_roll)
            };
            info!(archetype = idx, height, name = %fighter.name, "planning new fighter");
            planned.push(fighter);
        }
    }
    planned
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Scripted(Vec<&'static str>);

    impl NameGenerator for Scripted {
        fn generate(&mut self) -> String {
            if self.0.is_empty() {
                String::new()
            } else {
                self.0.remove(0).to_string()
            }
        }
    }

    #[test]
    fn roster_ids_keep_first_occurrence_order() {
        let html = r#"<a href="x?team_id=5&a=1">a</a><a href="x?team_id=3">b</a>
            <a href="x?team_id=5">again</a>"#;
        assert_eq!(parse_roster(html), vec!["5".to_string(), "3".to_string()]);
        assert!(parse_roster("").is_empty());
    }

    #[test]
    fn allocation_spends_every_point() {
        let f = allocate(12, &ARCHETYPES[0], 13, 0);
        assert_eq!(f.strength, 16);
        assert_eq!(f.knockout_punch, 5);
        assert_eq!(f.agility, 7);
        assert_eq!(f.speed, 10);
        let total = f.height + f.strength + f.knockout_punch + f.speed + f.agility + f.chin
            + f.conditioning;
        assert_eq!(total, CREATION_POINTS);
    }

    #[test]
    fn short_fighters_get_heaviest_build() {
        let f = allocate(-10, &ARCHETYPES[1], 12, 0);
        assert_eq!(f.build, 3);
        let f = allocate(20, &ARCHETYPES[1], 12, 1);
        assert_eq!(f.build, 1);
    }

    #[test]
    fn shortfalls_use_baseline_height_for_empty_archetypes() {
        let mut census = Census::new();
        census.record(0, 12);
        census.record(0, 12);
        census.record(0, 15);
        census.record(0, 15);
        census.record(0, 15);
        census.record(1, 9);
        let gaps = census.shortfalls(&ARCHETYPES);
        assert_eq!(gaps, vec![(0, 12, 1), (2, ARCHETYPES[2].height, 2)]);
    }

    #[test]
    fn empty_names_skip_creation() {
        let mut census = Census::new();
        census.record(0, 12);
        census.record(0, 12);
        census.record(1, 9);
        census.record(2, 14);
        census.record(2, 14);
        let mut names = Scripted(vec!["Kel'smith"]);
        let mut rng = StdRng::seed_from_u64(3);
        let planned = plan_replenishment(&census, &mut names, &mut rng);
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].name, "Kel'smith");
        assert_eq!(planned[0].height, 12);
        assert!((12..=14).contains(&planned[0].chin));
    }
}
