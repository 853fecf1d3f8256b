use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

use crate::archetype::{ARCHETYPES, classify};
use crate::metrics::{compute_weight, division_for, grade, height_inches};
use crate::record::{
    BUCKETS, BucketSummary, CutResistance, DivisionPlacement, FighterRecord, OpponentInfo,
    RecordLine, Stat, Stats, TrainingState,
};

pub const BUILDS: [&str; 7] = [
    "very light",
    "light",
    "a little light",
    "normal",
    "a little heavy",
    "heavy",
    "very heavy",
];

const AP_LOSS_PENALTY: i32 = 500;
const OPPONENT_RECORD_WINDOW: usize = 240;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("page is empty")]
    EmptyPage,
    #[error("required field `{field}` not found")]
    Missing { field: &'static str },
    #[error("field `{field}` has unrecognised value `{value}`")]
    Malformed { field: &'static str, value: String },
}

/// Outcome of looking up one field on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted<T> {
    Found(T),
    Missing,
    Malformed(String),
}

impl<T> Extracted<T> {
    pub fn required(self, field: &'static str) -> Result<T, ExtractionError> {
        match self {
            Extracted::Found(v) => Ok(v),
            Extracted::Missing => Err(ExtractionError::Missing { field }),
            Extracted::Malformed(value) => Err(ExtractionError::Malformed { field, value }),
        }
    }

    pub fn optional(self) -> Option<T> {
        match self {
            Extracted::Found(v) => Some(v),
            Extracted::Missing | Extracted::Malformed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Strength,
    KnockoutPunch,
    Speed,
    Agility,
    Chin,
    Conditioning,
    Cut,
    Rating,
    Status,
    Height,
    Build,
    InjuryPoints,
    ApLoss,
    Record,
    Division,
    Opponent,
    Training,
    FightPlan,
}

struct FieldSpec {
    field: Field,
    name: &'static str,
    pattern: &'static str,
    required: bool,
}

// Label-anchored, first match wins, case-insensitive.
const FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec {
        field: Field::Name,
        name: "name",
        pattern: r"(?i)\w>([^<>\n]*?) fights in the",
        required: true,
    },
    FieldSpec {
        field: Field::Strength,
        name: "strength",
        pattern: r"(?i)\w>strength[^0-9]+(\d+)",
        required: true,
    },
    FieldSpec {
        field: Field::KnockoutPunch,
        name: "knockout punch",
        pattern: r"(?i)\w>knockout[^0-9]+(\d+)",
        required: true,
    },
    FieldSpec {
        field: Field::Speed,
        name: "speed",
        pattern: r"(?i)\w>speed[^0-9]+(\d+)",
        required: true,
    },
    FieldSpec {
        field: Field::Agility,
        name: "agility",
        pattern: r"(?i)\w>agility[^0-9]+(\d+)",
        required: true,
    },
    FieldSpec {
        field: Field::Chin,
        name: "chin",
        pattern: r"(?i)\w>chin[^0-9]+(\d+)",
        required: true,
    },
    FieldSpec {
        field: Field::Conditioning,
        name: "conditioning",
        pattern: r"(?i)\w>conditioning[^0-9]+(\d+)",
        required: true,
    },
    FieldSpec {
        field: Field::Cut,
        name: "cut resistance",
        pattern: r"(?i)\w>cut resista[^>]+>([a-z]{1,6})",
        required: true,
    },
    FieldSpec {
        field: Field::Rating,
        name: "rating",
        pattern: r"(?i)>rating[^0-9]+(\d+)",
        required: true,
    },
    FieldSpec {
        field: Field::Status,
        name: "status",
        pattern: r"(?i)>status[^0-9]+(\d+)",
        required: true,
    },
    FieldSpec {
        field: Field::Height,
        name: "height",
        pattern: r"(?i)\w>height[^>]+>([4-7]) feet ?([0-9]{0,2})",
        required: true,
    },
    FieldSpec {
        field: Field::Build,
        name: "build",
        pattern: r"(?i)\w>build[^>]+>([a-z ]+)",
        required: true,
    },
    FieldSpec {
        field: Field::InjuryPoints,
        name: "injury points",
        pattern: r"(?i)>injury points<[^0-9]+>(\d+)",
        required: true,
    },
    FieldSpec {
        field: Field::ApLoss,
        name: "ap loss",
        pattern: r"(?i)\w>ap loss[^0-9-]*>(-?\d+)",
        required: false,
    },
    FieldSpec {
        field: Field::Record,
        name: "record",
        pattern: r"\((\d+)-(\d+)-(\d+) (\d+)/(\d+)\)",
        required: true,
    },
    FieldSpec {
        field: Field::Division,
        name: "division",
        pattern: r#"(?i)eko_standings[\w&=+]*?division=([\w-]+)[\w&=+]*?region=([^&"'\s>]+)"#,
        required: true,
    },
    FieldSpec {
        field: Field::Opponent,
        name: "opponent",
        pattern: r#"(?i) ([0-9]) feet *([0-9]{0,2})[^>]*team_id=(\d+)&describe=\d+">([^<]*)<(?:img|/a>)"#,
        required: false,
    },
    FieldSpec {
        field: Field::Training,
        name: "training",
        pattern: r"(?i) training <b>([a-z ]+)</b>(?:[^<]{0,12}<b>([a-z ]+)</b>)?",
        required: false,
    },
    FieldSpec {
        field: Field::FightPlan,
        name: "fight plan",
        pattern: r"(?i)your <b>([^<]+)</b> plan\.",
        required: false,
    },
];

static COMPILED: Lazy<Vec<Regex>> = Lazy::new(|| {
    FIELD_SPECS
        .iter()
        .map(|spec| Regex::new(spec.pattern).expect("field pattern compiles"))
        .collect()
});

static OPPONENT_RECORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d+)-(\d+)-(\d+)").expect("record pattern compiles"));

fn spec(field: Field) -> (usize, &'static FieldSpec) {
    let idx = FIELD_SPECS
        .iter()
        .position(|s| s.field == field)
        .expect("every field has a descriptor");
    (idx, &FIELD_SPECS[idx])
}

fn captures<'h>(html: &'h str, field: Field) -> Option<Captures<'h>> {
    let (idx, _) = spec(field);
    COMPILED[idx].captures(html)
}

fn lookup<T>(html: &str, field: Field, convert: impl FnOnce(&Captures) -> Extracted<T>) -> Extracted<T> {
    match captures(html, field) {
        Some(caps) => convert(&caps),
        None => Extracted::Missing,
    }
}

fn group<'a>(caps: &'a Captures, idx: usize) -> &'a str {
    caps.get(idx).map(|m| m.as_str()).unwrap_or("")
}

fn parse_int(raw: &str) -> Extracted<i32> {
    match raw.trim().parse::<i32>() {
        Ok(v) => Extracted::Found(v),
        Err(_) => Extracted::Malformed(raw.to_string()),
    }
}

fn int_field(html: &str, field: Field) -> Extracted<i32> {
    lookup(html, field, |caps| parse_int(group(caps, 1)))
}

fn need<T>(value: Extracted<T>, field: Field) -> Result<T, ExtractionError> {
    let (_, spec) = spec(field);
    debug_assert!(spec.required);
    value.required(spec.name)
}

pub fn extract_name(html: &str) -> Extracted<String> {
    lookup(html, Field::Name, |caps| {
        let name = group(caps, 1).trim();
        if name.is_empty() {
            Extracted::Malformed(String::new())
        } else {
            Extracted::Found(name.to_string())
        }
    })
}

pub fn extract_stats(html: &str) -> Result<Stats, ExtractionError> {
    Ok(Stats {
        strength: need(int_field(html, Field::Strength), Field::Strength)?,
        knockout_punch: need(int_field(html, Field::KnockoutPunch), Field::KnockoutPunch)?,
        speed: need(int_field(html, Field::Speed), Field::Speed)?,
        agility: need(int_field(html, Field::Agility), Field::Agility)?,
        chin: need(int_field(html, Field::Chin), Field::Chin)?,
        conditioning: need(int_field(html, Field::Conditioning), Field::Conditioning)?,
    })
}

pub fn extract_cut(html: &str) -> Extracted<CutResistance> {
    lookup(html, Field::Cut, |caps| {
        let word = group(caps, 1);
        match CutResistance::from_word(word) {
            Some(cut) => Extracted::Found(cut),
            None => Extracted::Malformed(word.to_string()),
        }
    })
}

pub fn extract_height(html: &str) -> Extracted<i32> {
    lookup(html, Field::Height, |caps| {
        Extracted::Found(height_inches(group(caps, 1), group(caps, 2)))
    })
}

/// Build relative to "normal": very light is -3, very heavy is +3.
pub fn extract_build(html: &str) -> Extracted<i32> {
    lookup(html, Field::Build, |caps| {
        let raw = group(caps, 1).trim().to_ascii_lowercase();
        match BUILDS.iter().position(|b| *b == raw) {
            Some(idx) => Extracted::Found(idx as i32 - 3),
            None => Extracted::Malformed(raw),
        }
    })
}

/// Injury points with each point of AP loss counted as 500. A page without
/// an AP loss cell counts as zero loss.
pub fn extract_injury_points(html: &str) -> Extracted<i32> {
    let base = match int_field(html, Field::InjuryPoints) {
        Extracted::Found(v) => v,
        other => return other,
    };
    let ap_loss = int_field(html, Field::ApLoss).optional().unwrap_or(0);
    Extracted::Found(base.saturating_add(ap_loss.saturating_mul(AP_LOSS_PENALTY)))
}

pub fn extract_record(html: &str) -> Extracted<RecordLine> {
    lookup(html, Field::Record, |caps| {
        let n = |i| group(caps, i).parse::<i32>().unwrap_or(0);
        Extracted::Found(RecordLine {
            wins: n(1),
            draws: n(2),
            losses: n(3),
            knockouts: n(4),
            knocked_out: n(5),
        })
    })
}

/// `(division, region)`, both lowercased.
pub fn extract_division(html: &str) -> Extracted<(String, String)> {
    lookup(html, Field::Division, |caps| {
        Extracted::Found((
            group(caps, 1).to_ascii_lowercase(),
            group(caps, 2).to_ascii_lowercase(),
        ))
    })
}

/// Coarse opponent strength from its own win/loss line.
pub fn strength_signal(wins: i32, losses: i32) -> i32 {
    let total = wins as f64 + losses as f64;
    let spread = wins as f64 - losses as f64;
    (spread / (total + 1.0) / (8.0 - total).max(1.0) * 10.0).round() as i32
}

pub fn extract_opponent(html: &str) -> Option<OpponentInfo> {
    let caps = captures(html, Field::Opponent)?;
    let whole = caps.get(0)?;
    let name = group(&caps, 4).trim().to_string();
    let team_id = group(&caps, 3).to_string();

    let tail_end = (whole.end() + OPPONENT_RECORD_WINDOW).min(html.len());
    let tail = html
        .get(whole.end()..tail_end)
        .or_else(|| html.get(whole.end()..))
        .unwrap_or("");
    let strength = OPPONENT_RECORD
        .captures(tail)
        .map(|rec| {
            let wins = group(&rec, 1).parse().unwrap_or(0);
            let losses = group(&rec, 3).parse().unwrap_or(0);
            strength_signal(wins, losses)
        })
        .unwrap_or(0);

    Some(OpponentInfo {
        height: height_inches(group(&caps, 1), group(&caps, 2)),
        team_id,
        name,
        strength_signal: strength,
        tactics: [BucketSummary::EMPTY; BUCKETS],
    })
}

pub fn extract_training(html: &str) -> Option<TrainingState> {
    let caps = captures(html, Field::Training)?;
    let first = Stat::from_label(group(&caps, 1));
    let second = caps.get(2).and_then(|m| Stat::from_label(m.as_str()));
    Some(TrainingState {
        first,
        second,
        intensive: html.to_ascii_lowercase().contains("(intensive)"),
    })
}

pub fn extract_fight_plan(html: &str) -> Option<String> {
    let caps = captures(html, Field::FightPlan)?;
    let plan = group(&caps, 1).trim();
    (!plan.is_empty()).then(|| plan.to_string())
}

/// Parses a fighter control page and fills in the derived fields.
pub fn extract_fighter(id: &str, html: &str) -> Result<FighterRecord, ExtractionError> {
    if html.trim().is_empty() {
        return Err(ExtractionError::EmptyPage);
    }

    let name = need(extract_name(html), Field::Name)?;
    let stats = extract_stats(html)?;
    let cut = need(extract_cut(html), Field::Cut)?;
    let rating = need(int_field(html, Field::Rating), Field::Rating)?;
    let status = need(int_field(html, Field::Status), Field::Status)?;
    let height = need(extract_height(html), Field::Height)?;
    let build = need(extract_build(html), Field::Build)?;
    let injury_points = need(extract_injury_points(html), Field::InjuryPoints)?;
    let record = need(extract_record(html), Field::Record)?;
    let (current, region) = need(extract_division(html), Field::Division)?;

    let weight = compute_weight(
        height,
        stats.strength as f64,
        stats.agility as f64,
        stats.conditioning as f64,
        build,
    );

    let mut fighter = FighterRecord {
        id: id.to_string(),
        name,
        stats,
        cut,
        rating,
        status,
        height,
        build,
        weight,
        injury_points,
        record,
        division: DivisionPlacement {
            current,
            region,
            correct: division_for(weight.cut).to_string(),
        },
        training: extract_training(html),
        fight_plan: extract_fight_plan(html),
        opponent: extract_opponent(html),
        archetype: classify(&stats, &ARCHETYPES),
        grade: 0.0,
    };
    fighter.grade = grade(&fighter);
    Ok(fighter)
}
