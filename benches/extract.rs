use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use eko_agent::decisions::{Baseline, decide};
use eko_agent::extract::extract_fighter;
use eko_agent::scout::{parse_bout_index, parse_transcript};

fn bench_control_page(c: &mut Criterion) {
    c.bench_function("control_page_extract", |b| {
        b.iter(|| {
            let record = extract_fighter("544246", black_box(CONTROL_HTML)).unwrap();
            black_box(record.grade);
        })
    });
}

fn bench_decide(c: &mut Criterion) {
    let record = extract_fighter("544246", CONTROL_HTML).unwrap();
    let baseline = Baseline::resolve(&record, None);
    c.bench_function("decide", |b| {
        b.iter(|| {
            let decision = decide(black_box(&record), &baseline, "77894");
            black_box(decision.commands.len());
        })
    });
}

fn bench_scouting_pages(c: &mut Criterion) {
    c.bench_function("bout_index_parse", |b| {
        b.iter(|| black_box(parse_bout_index(black_box(CAREER_HTML)).len()))
    });
    c.bench_function("transcript_parse", |b| {
        b.iter(|| {
            let t = parse_transcript(black_box(TRANSCRIPT_HTML)).unwrap();
            black_box(t.rounds.len());
        })
    });
}

criterion_group!(perf, bench_control_page, bench_decide, bench_scouting_pages);
criterion_main!(perf);

static CONTROL_HTML: &str = include_str!("../tests/fixtures/control_df.html");
static CAREER_HTML: &str = include_str!("../tests/fixtures/career_sunny.html");
static TRANSCRIPT_HTML: &str = include_str!("../tests/fixtures/scout_9002.html");
