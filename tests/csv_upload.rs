use std::fs;
use std::path::PathBuf;

use carteira_metrics::csv_goals::{
    GoalTriple, parse_goal_csv, validate_csv_structure, validate_new_metrics,
};
use carteira_metrics::factory::TeamProcessorFactory;
use carteira_metrics::metrics::PercentageSource;
use carteira_metrics::status::PlayerStatusSnapshot;
use carteira_metrics::team::TeamType;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_core_upload() {
    let raw = read_fixture("goals_core.csv");
    assert!(validate_csv_structure(&raw));
    let data = parse_goal_csv(&raw).expect("fixture should parse");
    assert_eq!(data.player_id, "123456");
    assert_eq!(data.cycle_day, 12);
    assert_eq!(data.total_cycle_days, 21);
    assert_eq!(
        data.faturamento,
        GoalTriple {
            target: 400000.0,
            current: 200000.0,
            percentage: 50.0
        }
    );
    assert_eq!(data.reais_por_ativo.percentage, 25.0);
    assert_eq!(data.multimarcas_por_ativo.current, 1.3);
    assert!(data.conversoes.is_none());
    assert!(data.upa.is_none());
    assert!(validate_new_metrics(&data).is_empty());
}

#[test]
fn parses_quoted_reordered_upload_with_optional_groups() {
    let raw = read_fixture("goals_full.csv");
    assert!(validate_csv_structure(&raw));
    let data = parse_goal_csv(&raw).expect("fixture should parse");
    assert_eq!(data.player_id, "987654");
    assert_eq!(data.cycle_day, 5);
    assert_eq!(data.atividade.percentage, 48.8);
    assert_eq!(data.multimarcas_por_ativo.current, 2.2);
    assert_eq!(
        data.upa,
        Some(GoalTriple {
            target: 4.0,
            current: 5.0,
            percentage: 125.0
        })
    );
    assert_eq!(data.conversoes.map(|c| c.target), Some(10.0));

    let warnings = validate_new_metrics(&data);
    assert_eq!(warnings.len(), 2, "{warnings:?}");
    assert!(warnings.iter().any(|w| w.starts_with("UPA") && w.contains("outside 0-100")));
    assert!(warnings.iter().any(|w| w.starts_with("Conversões") && w.contains("does not match")));
}

#[test]
fn partial_optional_group_is_rejected() {
    let raw = read_fixture("goals_partial.csv");
    assert!(!validate_csv_structure(&raw));
    assert!(parse_goal_csv(&raw).is_none());
}

#[test]
fn upload_feeds_the_er_processor() {
    let data = parse_goal_csv(&read_fixture("goals_full.csv")).expect("fixture should parse");
    let report = data.to_report_record(Some(TeamType::Er));
    let status = PlayerStatusSnapshot {
        player_id: data.player_id.clone(),
        ..PlayerStatusSnapshot::default()
    };
    let result = TeamProcessorFactory::global()
        .expect("factory")
        .process_player_data_auto(&status, Some(&report));
    assert_eq!(result.team_type, Some(TeamType::Er));
    let metrics = result.metrics.expect("metrics");
    assert_eq!(metrics.primary_goal.percentage, 110.0);
    assert_eq!(metrics.secondary_goal1.percentage, 100.0);
    assert_eq!(metrics.secondary_goal2.percentage, 125.0);
    assert!(metrics.goals().iter().all(|g| g.source == PercentageSource::Report));
    assert_eq!(metrics.current_cycle_day, 5);
    assert_eq!(metrics.days_until_cycle_end, 16);
}
