use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use carteira_metrics::batch::{PlayerInput, process_batch};
use carteira_metrics::csv_goals::{parse_goal_csv, validate_new_metrics};
use carteira_metrics::factory::TeamProcessorFactory;
use carteira_metrics::metric::MetricKey;
use carteira_metrics::status::{
    ChallengeProgressEntry, PlayerStatusSnapshot, ReportRecord, parse_player_status_json,
};

fn sample_inputs(count: usize) -> Vec<PlayerInput> {
    let teams = ["E6F5k30", "E6F4sCh", "E6F4O1b", "E6F4Xf2", "E6F41Bb", "E500Cbu"];
    (0..count)
        .map(|i| {
            let player_id = format!("player-{i}");
            let mut progress: Vec<ChallengeProgressEntry> = (0..40)
                .map(|n| ChallengeProgressEntry::new(format!("NOISE{n:03}"), n as f64))
                .collect();
            progress.push(ChallengeProgressEntry::new("E6Gahd4", (i % 160) as f64));
            PlayerInput {
                status: PlayerStatusSnapshot {
                    player_id: player_id.clone(),
                    challenge_progress: progress,
                    teams: vec![teams[i % teams.len()].to_string()],
                    ..PlayerStatusSnapshot::default()
                },
                report: Some(
                    ReportRecord::new(player_id)
                        .with_cycle(10, 21)
                        .with_percentage(MetricKey::Faturamento, 80.0)
                        .with_percentage(MetricKey::Atividade, 105.0),
                ),
            }
        })
        .collect()
}

fn bench_status_parse(c: &mut Criterion) {
    c.bench_function("status_parse", |b| {
        b.iter(|| {
            let status = parse_player_status_json(black_box(STATUS_JSON)).unwrap();
            black_box(status.challenge_progress.len());
        })
    });
}

fn bench_process_single(c: &mut Criterion) {
    let factory = TeamProcessorFactory::global().unwrap();
    let status = parse_player_status_json(STATUS_JSON).unwrap();
    c.bench_function("process_single", |b| {
        b.iter(|| {
            let result = factory.process_player_data_auto(black_box(&status), None);
            black_box(result.metrics.is_some());
        })
    });
}

fn bench_process_batch(c: &mut Criterion) {
    let factory = TeamProcessorFactory::global().unwrap();
    let inputs = sample_inputs(600);
    c.bench_function("process_batch_600", |b| {
        b.iter(|| {
            let results = process_batch(factory, black_box(&inputs), 4);
            black_box(results.len());
        })
    });
}

fn bench_csv_parse(c: &mut Criterion) {
    c.bench_function("goal_csv_parse", |b| {
        b.iter(|| {
            let data = parse_goal_csv(black_box(GOALS_CSV)).unwrap();
            black_box(validate_new_metrics(&data).len());
        })
    });
}

criterion_group!(
    perf,
    bench_status_parse,
    bench_process_single,
    bench_process_batch,
    bench_csv_parse
);
criterion_main!(perf);

static STATUS_JSON: &str = include_str!("../tests/fixtures/status_carteira0.json");
static GOALS_CSV: &str = include_str!("../tests/fixtures/goals_full.csv");
