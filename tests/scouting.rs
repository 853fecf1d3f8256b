use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

use eko_agent::extract::extract_fighter;
use eko_agent::fight_plan::decide_fight_plan;
use eko_agent::record::BucketSummary;
use eko_agent::scout::{
    bout_limit, observe, opponent_corner, parse_bout_index, parse_transcript, scout_opponent,
    select_bouts,
};
use eko_agent::tactics::{STYLE_CLINCH, STYLE_INSIDE, Tactic};
use eko_agent::transport::Transport;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn field<'a>(fields: &'a [(String, String)], key: &str) -> &'a str {
    fields
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .unwrap_or("")
}

/// Serves the career page and transcripts from fixtures.
#[derive(Default)]
struct Archive {
    requests: RefCell<Vec<String>>,
    missing_session: Option<&'static str>,
}

impl Transport for Archive {
    fn send(&self, command: &str, fields: &[(String, String)]) -> String {
        let session = field(fields, "session");
        let key = if session.is_empty() {
            field(fields, "team_id")
        } else {
            session
        };
        self.requests.borrow_mut().push(format!("{command}:{key}"));
        match command {
            "eko_career_nodesc" => read_fixture("career_sunny.html"),
            "query_scout" if Some(session) == self.missing_session => String::new(),
            "query_scout" => read_fixture(&format!("scout_{session}.html")),
            _ => String::new(),
        }
    }
}

#[test]
fn bout_index_dedupes_and_flags_rows() {
    let bouts = parse_bout_index(&read_fixture("career_sunny.html"));
    let sessions: Vec<u64> = bouts.iter().map(|b| b.session).collect();
    assert_eq!(sessions, vec![9001, 9002, 9003, 8000]);
    assert!(bouts[0].ended_early);
    assert!(!bouts[1].ended_early);
    assert!(bouts[2].managed);
    assert!(!bouts[3].managed);

    let picked: Vec<u64> = select_bouts(bouts, bout_limit(0))
        .iter()
        .map(|b| b.session)
        .collect();
    assert_eq!(picked, vec![9003, 9001, 9002]);
}

#[test]
fn transcript_corners_and_rounds() {
    let t = parse_transcript(&read_fixture("scout_9002.html")).expect("two introductions");
    assert_eq!(t.corners[0].name, "Byl'other");
    assert_eq!(t.corners[0].height, 8);
    assert_eq!(t.corners[1].name, "Sunny");
    assert_eq!(t.corners[1].height, 14);
    assert_eq!(t.rounds.len(), 3);
    assert_eq!(t.rounds[1].number, 2);
    assert_eq!(t.rounds[1].punches[1].power_landed, 40);

    let html = read_fixture("control_df.html");
    let df = extract_fighter("544246", &html).expect("control page");
    let opponent = df.opponent.as_ref().expect("opponent");
    let corner = opponent_corner(&t.corners, opponent, &df.name).expect("corner");
    assert_eq!(corner, 1);

    let tactics: Vec<Tactic> = observe(&t, corner).iter().map(|o| o.tactic()).collect();
    assert_eq!(tactics, vec![Tactic::Flash, Tactic::Slap, Tactic::Weardown]);
}

#[test]
fn opponent_history_reduces_to_buckets() {
    let html = read_fixture("control_df.html");
    let df = extract_fighter("544246", &html).expect("control page");
    let opponent = df.opponent.as_ref().expect("opponent");
    let archive = Archive::default();

    let buckets = scout_opponent(&archive, opponent, &df.name);

    assert_eq!(
        *archive.requests.borrow(),
        vec![
            "eko_career_nodesc:1695461",
            "query_scout:9003",
            "query_scout:9001",
            "query_scout:9002",
        ]
    );
    assert_eq!(buckets[0].top_style, STYLE_INSIDE as i32);
    assert_eq!(buckets[0].unique_styles, 2);
    assert_eq!(buckets[0].flash, 1.0);
    assert_eq!(buckets[1].flash, 0.5);
    assert_eq!(buckets[1].slap, 0.5);
    assert_eq!(buckets[2].top_style, STYLE_CLINCH as i32);
    assert_eq!(buckets[2].unique_styles, 1);
    assert_eq!(buckets[2].weardown, 1.0);
}

#[test]
fn history_counters_pick_the_plan() {
    let html = read_fixture("control_df.html");
    let mut df = extract_fighter("544246", &html).expect("control page");
    let archive = Archive::default();
    if let Some(opponent) = df.opponent.as_mut() {
        let tactics = scout_opponent(&archive, opponent, "df");
        opponent.tactics = tactics;
    }
    // Height disadvantage against an inside flasher: stay outside early.
    assert_eq!(decide_fight_plan(&df).label(), "5H105ringR1");
}

#[test]
fn unavailable_transcripts_are_skipped() {
    let html = read_fixture("control_df.html");
    let df = extract_fighter("544246", &html).expect("control page");
    let opponent = df.opponent.as_ref().expect("opponent");
    let archive = Archive {
        missing_session: Some("9002"),
        ..Archive::default()
    };

    let buckets = scout_opponent(&archive, opponent, &df.name);
    assert_eq!(buckets[0].top_style, STYLE_INSIDE as i32);
    assert_eq!(buckets[0].unique_styles, 1);
    assert_eq!(buckets[1].flash, 1.0);
}

#[test]
fn empty_index_means_no_history() {
    struct Down;
    impl Transport for Down {
        fn send(&self, _command: &str, _fields: &[(String, String)]) -> String {
            String::new()
        }
    }
    let html = read_fixture("control_df.html");
    let df = extract_fighter("544246", &html).expect("control page");
    let opponent = df.opponent.as_ref().expect("opponent");
    let buckets = scout_opponent(&Down, opponent, &df.name);
    assert_eq!(buckets, [BucketSummary::EMPTY; 3]);
}
