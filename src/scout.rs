use std::cmp::Reverse;
use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::metrics::height_inches;
use crate::record::{BUCKETS, BucketSummary, OpponentInfo};
use crate::tactics::{PunchCount, RoundObservation, STYLE_COUNT, Tactic};
use crate::transport::{Transport, fields};

pub const MIN_BOUTS: usize = 3;

static SESSION_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"query_scout[^\s>]*?team_id=(\d+)&\+?session=(\d+)").expect("session pattern")
});
static EARLY_FINISH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bby \w+ in round (\d+)").expect("finish pattern"));
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("br pattern"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));
static ROUND_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*ROUND (\d+)\s*$").expect("round pattern"));
static INTRODUCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<b>([^<]+)</b>[^<\n]*?\b([4-7]) feet ?([0-9]{0,2})").expect("intro pattern")
});
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("number pattern"));

/// One past bout listed on an opponent's career page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoutRef {
    pub session: u64,
    pub managed: bool,
    pub ended_early: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Corner {
    pub name: String,
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub corners: [Corner; 2],
    /// Per round, in order: the opening style line and both corners' punches.
    pub rounds: Vec<RoundLines>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundLines {
    pub number: u32,
    pub opening: Vec<String>,
    pub punches: [PunchCount; 2],
}

/// Opponent history fetch depth: never fewer than three bouts.
pub fn bout_limit(strength_signal: i32) -> usize {
    let wanted = (strength_signal + 1).max(0) as usize;
    wanted.max(MIN_BOUTS)
}

pub fn parse_bout_index(html: &str) -> Vec<BoutRef> {
    let mut seen = HashSet::new();
    let mut bouts = Vec::new();
    for line in html.lines() {
        let Some(caps) = SESSION_LINK.captures(line) else {
            continue;
        };
        let Ok(session) = caps[2].parse::<u64>() else {
            continue;
        };
        if !seen.insert(session) {
            continue;
        }
        bouts.push(BoutRef {
            session,
            managed: line.contains("manager_to_view="),
            ended_early: EARLY_FINISH.is_match(line),
        });
    }
    bouts
}

/// Managed bouts first, then early finishes, then most recent.
pub fn select_bouts(mut bouts: Vec<BoutRef>, limit: usize) -> Vec<BoutRef> {
    bouts.sort_by_key(|b| (!b.managed, !b.ended_early, Reverse(b.session)));
    bouts.truncate(limit);
    bouts
}

fn plain_lines(segment: &str) -> Vec<String> {
    segment
        .lines()
        .map(|l| TAG.replace_all(l, "").trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

fn punch_line(lines: &[String]) -> [PunchCount; 2] {
    let Some(line) = lines
        .iter()
        .find(|l| l.to_ascii_lowercase().starts_with("commentators"))
    else {
        return [PunchCount::default(); 2];
    };
    let nums: Vec<i32> = NUMBER
        .find_iter(line)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    let corner = |offset: usize| PunchCount {
        landed: nums.get(offset).copied().unwrap_or(0),
        thrown: nums.get(offset + 1).copied().unwrap_or(0),
        power_landed: nums.get(offset + 2).copied().unwrap_or(0),
    };
    [corner(0), corner(3)]
}

/// Splits a bout transcript into its two introductions and its rounds.
/// Returns `None` when the preamble does not introduce exactly two fighters.
pub fn parse_transcript(html: &str) -> Option<Transcript> {
    let text = LINE_BREAK.replace_all(html, "\n");
    let headers: Vec<_> = ROUND_HEADER.captures_iter(&text).collect();
    let preamble_end = headers
        .first()
        .and_then(|c| c.get(0))
        .map(|m| m.start())
        .unwrap_or(text.len());

    let intros: Vec<Corner> = INTRODUCTION
        .captures_iter(&text[..preamble_end])
        .map(|c| Corner {
            name: c[1].trim().to_string(),
            height: height_inches(&c[2], c.get(3).map(|m| m.as_str()).unwrap_or("")),
        })
        .collect();
    let [first, second]: [Corner; 2] = intros.try_into().ok()?;

    let mut rounds = Vec::with_capacity(headers.len());
    for (idx, caps) in headers.iter().enumerate() {
        let Some(header) = caps.get(0) else {
            continue;
        };
        let end = headers
            .get(idx + 1)
            .and_then(|c| c.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());
        let lines = plain_lines(&text[header.end()..end]);
        let number = caps[1].parse().unwrap_or(idx as u32 + 1);
        rounds.push(RoundLines {
            number,
            opening: lines.iter().take(2).cloned().collect(),
            punches: punch_line(&lines),
        });
    }

    Some(Transcript {
        corners: [first, second],
        rounds,
    })
}

/// Which corner the opponent fought from: by name, then by height, then
/// as whichever corner is not the fighter we manage.
pub fn opponent_corner(corners: &[Corner; 2], opponent: &OpponentInfo, own_name: &str) -> Option<usize> {
    corners
        .iter()
        .position(|c| c.name == opponent.name)
        .or_else(|| corners.iter().position(|c| c.height == opponent.height))
        .or_else(|| {
            corners
                .iter()
                .position(|c| c.name == own_name)
                .map(|own| 1 - own)
        })
}

/// The opponent's observations, one per round that opened with narration.
/// Lines are matched by name; position is only trusted when neither opening
/// line names a corner.
pub fn observe(transcript: &Transcript, corner: usize) -> Vec<RoundObservation> {
    let name = transcript.corners[corner].name.as_str();
    let names_a_corner =
        |line: &String| transcript.corners.iter().any(|c| line.starts_with(c.name.as_str()));
    transcript
        .rounds
        .iter()
        .filter_map(|round| {
            let line = match round.opening.iter().find(|l| l.starts_with(name)) {
                Some(line) => line,
                None if !round.opening.iter().any(names_a_corner) => round.opening.get(corner)?,
                None => return None,
            };
            Some(RoundObservation::from_line(line, round.punches[corner]))
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
struct BucketTally {
    styles: Vec<usize>,
    tactics: [usize; Tactic::ALL.len()],
}

impl BucketTally {
    fn add(&mut self, obs: &RoundObservation) {
        self.styles.push(obs.style);
        self.tactics[obs.tactic().index()] += 1;
    }

    fn summary(&self) -> BucketSummary {
        let n = self.styles.len();
        if n == 0 {
            return BucketSummary::EMPTY;
        }
        let mut counts = [0usize; STYLE_COUNT];
        for s in &self.styles {
            counts[(*s).min(STYLE_COUNT - 1)] += 1;
        }
        let mut top = 0;
        for (idx, c) in counts.iter().enumerate() {
            if *c > counts[top] {
                top = idx;
            }
        }
        let freq = |t: Tactic| self.tactics[t.index()] as f64 / n as f64;
        BucketSummary {
            top_style: top as i32,
            unique_styles: counts.iter().filter(|c| **c > 0).count(),
            flash: freq(Tactic::Flash),
            weardown: freq(Tactic::Weardown),
            balanced: freq(Tactic::Balanced),
            slap: freq(Tactic::Slap),
            defend: freq(Tactic::Defend),
        }
    }
}

/// Round `idx` (zero based) lands in bucket `min(idx, 2)`; bouts against
/// managed fighters count only toward the last bucket.
pub fn bucket_for(round_idx: usize, managed: bool) -> usize {
    if managed {
        BUCKETS - 1
    } else {
        round_idx.min(BUCKETS - 1)
    }
}

/// Folds per-bout observations into early/mid/late summaries.
pub fn summarize(bouts: &[(bool, Vec<RoundObservation>)]) -> [BucketSummary; BUCKETS] {
    let mut tallies: [BucketTally; BUCKETS] = Default::default();
    for (managed, rounds) in bouts {
        for (idx, obs) in rounds.iter().enumerate() {
            tallies[bucket_for(idx, *managed)].add(obs);
        }
    }
    [tallies[0].summary(), tallies[1].summary(), tallies[2].summary()]
}

/// Fetches and reduces an opponent's recent bouts. Any fetch that comes back
/// empty is skipped; no history at all yields sentinel buckets.
pub fn scout_opponent(
    transport: &dyn Transport,
    opponent: &OpponentInfo,
    own_name: &str,
) -> [BucketSummary; BUCKETS] {
    let index = transport.send("eko_career_nodesc", &fields(&[("team_id", opponent.team_id.as_str())]));
    if index.is_empty() {
        warn!(opponent = %opponent.team_id, "bout index unavailable");
        return [BucketSummary::EMPTY; BUCKETS];
    }

    let limit = bout_limit(opponent.strength_signal);
    let bouts = select_bouts(parse_bout_index(&index), limit);
    let mut observed = Vec::with_capacity(bouts.len());
    for bout in bouts {
        let session = bout.session.to_string();
        let body = transport.send(
            "query_scout",
            &fields(&[
                ("team_id", opponent.team_id.as_str()),
                ("session", session.as_str()),
            ]),
        );
        if body.is_empty() {
            warn!(opponent = %opponent.team_id, session = bout.session, "transcript unavailable");
            continue;
        }
        let Some(transcript) = parse_transcript(&body) else {
            debug!(session = bout.session, "transcript preamble not recognised");
            continue;
        };
        let Some(corner) = opponent_corner(&transcript.corners, opponent, own_name) else {
            debug!(session = bout.session, "opponent not found in transcript");
            continue;
        };
        observed.push((bout.managed, observe(&transcript, corner)));
    }

    debug!(opponent = %opponent.team_id, bouts = observed.len(), "opponent scouted");
    summarize(&observed)
}
