use serde::{Deserialize, Serialize};

/// Style tokens in match order; index 8 means no recognised style.
pub const STYLE_TOKENS: [&str; 8] = [
    "inside",
    "clinching",
    "feinting",
    "counter-punching",
    "using the ring",
    "ropes",
    "outside",
    "all out",
];
pub const STYLE_NONE: usize = 8;
pub const STYLE_COUNT: usize = 9;

pub const STYLE_INSIDE: usize = 0;
pub const STYLE_CLINCH: usize = 1;
pub const STYLE_FEINT: usize = 2;
pub const STYLE_COUNTER: usize = 3;
pub const STYLE_RING: usize = 4;
pub const STYLE_ROPES: usize = 5;
pub const STYLE_OUTSIDE: usize = 6;
pub const STYLE_ALLOUT: usize = 7;

/// Aim tokens in match order; index 3 means no target.
pub const AIM_TOKENS: [&str; 3] = ["to the body.", "for the cut.", "head hunting."];
pub const AIM_BODY: usize = 0;
pub const AIM_HEAD: usize = 2;
pub const AIM_NONE: usize = 3;

const PUNCH_EPSILON: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tactic {
    Flash,
    Weardown,
    Balanced,
    Slap,
    Defend,
    None,
}

impl Tactic {
    pub const ALL: [Tactic; 6] = [
        Tactic::Flash,
        Tactic::Weardown,
        Tactic::Balanced,
        Tactic::Slap,
        Tactic::Defend,
        Tactic::None,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PunchCount {
    pub landed: i32,
    pub thrown: i32,
    pub power_landed: i32,
}

impl PunchCount {
    pub fn ratio(&self) -> f64 {
        self.power_landed as f64 / (self.thrown as f64 + PUNCH_EPSILON)
    }
}

/// What one fighter did in one round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundObservation {
    pub style: usize,
    pub aim: usize,
    pub punches: PunchCount,
}

impl RoundObservation {
    pub fn from_line(line: &str, punches: PunchCount) -> Self {
        Self {
            style: style_of(line),
            aim: aim_of(line),
            punches,
        }
    }

    pub fn tactic(&self) -> Tactic {
        classify_round(self.style, self.aim, &self.punches)
    }
}

pub fn style_of(line: &str) -> usize {
    let line = line.to_ascii_lowercase();
    STYLE_TOKENS
        .iter()
        .position(|tok| line.contains(tok))
        .unwrap_or(STYLE_NONE)
}

pub fn aim_of(line: &str) -> usize {
    let line = line.to_ascii_lowercase();
    AIM_TOKENS
        .iter()
        .position(|tok| line.contains(tok))
        .unwrap_or(AIM_NONE)
}

/// First matching rule wins.
pub fn classify_round(style: usize, aim: usize, punches: &PunchCount) -> Tactic {
    let landed = punches.landed;
    let thrown = punches.thrown;
    let ratio = punches.ratio();

    let flash_style = style == STYLE_INSIDE
        || style == STYLE_ALLOUT
        || ((style == STYLE_CLINCH || style == STYLE_ROPES) && landed == 0);
    if aim == AIM_BODY && flash_style && (thrown <= 0 || landed > 34 || thrown > 5) {
        return Tactic::Flash;
    }

    let busy = thrown <= 0 || landed > 29 || thrown > 4;
    if aim == AIM_HEAD && style != STYLE_ALLOUT && busy && (landed == 0 || ratio < 2.0) {
        return Tactic::Weardown;
    }
    if aim == AIM_NONE && style != STYLE_ALLOUT && busy && (landed == 0 || ratio < 3.2) {
        return Tactic::Balanced;
    }

    let slap_style = matches!(style, STYLE_FEINT | STYLE_RING | STYLE_OUTSIDE | STYLE_ALLOUT);
    if (aim == AIM_NONE && slap_style) || (landed > 29 && ratio >= 3.2) {
        return Tactic::Slap;
    }

    if aim == AIM_BODY && (thrown <= 0 || landed > 4) {
        return Tactic::Defend;
    }

    Tactic::None
}
