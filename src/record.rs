use std::fmt;

use serde::{Deserialize, Serialize};

pub const BUCKETS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Strength,
    KnockoutPunch,
    Speed,
    Agility,
    Chin,
    Conditioning,
}

impl Stat {
    pub const ALL: [Stat; 6] = [
        Stat::Strength,
        Stat::KnockoutPunch,
        Stat::Speed,
        Stat::Agility,
        Stat::Chin,
        Stat::Conditioning,
    ];

    /// Lowercase name as it appears in the control page prose.
    pub fn label(self) -> &'static str {
        match self {
            Stat::Strength => "strength",
            Stat::KnockoutPunch => "knockout punch",
            Stat::Speed => "speed",
            Stat::Agility => "agility",
            Stat::Chin => "chin",
            Stat::Conditioning => "conditioning",
        }
    }

    pub fn from_label(raw: &str) -> Option<Stat> {
        let wanted = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|s| s.label() == wanted)
    }

    /// Value the training form expects for this stat.
    pub fn training_choice(self) -> &'static str {
        match self {
            Stat::Strength => "weights (STR)",
            Stat::KnockoutPunch => "heavy bag (KP)",
            Stat::Speed => "speed bag (SPD)",
            Stat::Agility => "jump rope (AGL)",
            Stat::Chin => "sparring (CHN)",
            Stat::Conditioning => "road work (CND)",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub strength: i32,
    pub knockout_punch: i32,
    pub speed: i32,
    pub agility: i32,
    pub chin: i32,
    pub conditioning: i32,
}

impl Stats {
    pub fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Strength => self.strength,
            Stat::KnockoutPunch => self.knockout_punch,
            Stat::Speed => self.speed,
            Stat::Agility => self.agility,
            Stat::Chin => self.chin,
            Stat::Conditioning => self.conditioning,
        }
    }

    /// Strength + speed + agility, the pool archetype shares are measured against.
    pub fn base_aps(&self) -> i32 {
        self.strength + self.speed + self.agility
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutResistance {
    Low,
    Normal,
    High,
}

impl CutResistance {
    pub fn from_word(raw: &str) -> Option<CutResistance> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(CutResistance::Low),
            "normal" => Some(CutResistance::Normal),
            "high" => Some(CutResistance::High),
            _ => None,
        }
    }

    /// 1 (low), 2 (normal) or 3 (high); never zero.
    pub fn rating(self) -> u8 {
        match self {
            CutResistance::Low => 1,
            CutResistance::Normal => 2,
            CutResistance::High => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Weight {
    pub fight: i32,
    pub cut: i32,
}

/// `wins-draws-losses knockouts/knocked_out` as printed next to a fighter name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordLine {
    pub wins: i32,
    pub draws: i32,
    pub losses: i32,
    pub knockouts: i32,
    pub knocked_out: i32,
}

impl RecordLine {
    pub fn sum(&self) -> i64 {
        [
            self.wins,
            self.draws,
            self.losses,
            self.knockouts,
            self.knocked_out,
        ]
        .iter()
        .map(|v| *v as i64)
        .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DivisionPlacement {
    pub current: String,
    pub region: String,
    pub correct: String,
}

impl DivisionPlacement {
    pub fn is_contender(&self) -> bool {
        self.region == "contenders"
    }
}

/// Training as currently configured on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrainingState {
    pub first: Option<Stat>,
    pub second: Option<Stat>,
    pub intensive: bool,
}

/// One round group's summary of an opponent's past behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketSummary {
    /// Style index 0..=8, or -1 when the bucket saw no rounds.
    pub top_style: i32,
    pub unique_styles: usize,
    pub flash: f64,
    pub weardown: f64,
    pub balanced: f64,
    pub slap: f64,
    pub defend: f64,
}

impl BucketSummary {
    pub const EMPTY: BucketSummary = BucketSummary {
        top_style: -1,
        unique_styles: 0,
        flash: 0.0,
        weardown: 0.0,
        balanced: 0.0,
        slap: 0.0,
        defend: 0.0,
    };

    pub fn has_history(&self) -> bool {
        self.top_style >= 0
    }
}

impl Default for BucketSummary {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentInfo {
    pub height: i32,
    pub team_id: String,
    pub name: String,
    pub strength_signal: i32,
    pub tactics: [BucketSummary; BUCKETS],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterRecord {
    pub id: String,
    pub name: String,
    pub stats: Stats,
    pub cut: CutResistance,
    pub rating: i32,
    pub status: i32,
    pub height: i32,
    pub build: i32,
    pub weight: Weight,
    pub injury_points: i32,
    pub record: RecordLine,
    pub division: DivisionPlacement,
    pub training: Option<TrainingState>,
    pub fight_plan: Option<String>,
    pub opponent: Option<OpponentInfo>,
    pub archetype: usize,
    pub grade: f64,
}

impl FighterRecord {
    /// Numeric form of the id, used to seed plan selection.
    pub fn numeric_id(&self) -> i64 {
        self.id.trim().parse().unwrap_or(0)
    }

    pub fn height_differential(&self) -> i32 {
        self.opponent
            .as_ref()
            .map(|o| o.height - self.height)
            .unwrap_or(0)
    }
}
