use std::fs;
use std::path::PathBuf;

use carteira_metrics::batch::{PlayerInput, process_batch};
use carteira_metrics::factory::TeamProcessorFactory;
use carteira_metrics::metric::MetricKey;
use carteira_metrics::metrics::PercentageSource;
use carteira_metrics::processor::LOCAL_BOOST_WARNING;
use carteira_metrics::progress_bar::ProgressZone;
use carteira_metrics::status::{parse_player_status_json, parse_report_record_json};
use carteira_metrics::team::TeamType;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn factory() -> &'static TeamProcessorFactory {
    TeamProcessorFactory::global().expect("builtin mapping is valid")
}

#[test]
fn carteira0_reads_every_field_convention() {
    let status = parse_player_status_json(&read_fixture("status_carteira0.json"))
        .expect("fixture should parse");
    let result = factory().process_player_data_auto(&status, None);
    assert_eq!(result.team_type, Some(TeamType::Carteira0));
    let metrics = result.metrics.expect("metrics");

    assert_eq!(metrics.player_name, "Ana Silva");
    assert_eq!(metrics.points, 1840.0);
    assert!(!metrics.points_locked);

    assert_eq!(metrics.primary_goal.metric, MetricKey::Conversoes);
    assert_eq!(metrics.primary_goal.percentage, 75.0);
    assert_eq!(metrics.primary_goal.progress.zone, ProgressZone::Yellow);

    assert_eq!(metrics.secondary_goal1.metric, MetricKey::ReaisPorAtivo);
    assert_eq!(metrics.secondary_goal1.percentage, 112.5);
    assert_eq!(metrics.secondary_goal1.progress.zone, ProgressZone::Green);
    assert!(metrics.secondary_goal1.boost_active);

    assert_eq!(metrics.secondary_goal2.metric, MetricKey::Faturamento);
    assert_eq!(metrics.secondary_goal2.percentage, 40.0);
    assert_eq!(metrics.secondary_goal2.progress.zone, ProgressZone::Red);
    assert!(!metrics.secondary_goal2.boost_active);

    for goal in metrics.goals() {
        assert_eq!(goal.source, PercentageSource::Challenge);
    }
    assert_eq!(metrics.active_boosts(), 1);
}

#[test]
fn empty_player_is_all_zero_and_locked() {
    let status =
        parse_player_status_json(&read_fixture("status_empty.json")).expect("fixture should parse");
    let result = factory().process_player_data_auto(&status, None);
    assert_eq!(result.team_type, Some(TeamType::CarteiraIII));
    let metrics = result.metrics.expect("metrics");

    assert_eq!(metrics.player_name, "novo.vendedor");
    assert!(metrics.points_locked);
    assert_eq!(metrics.points, 0.0);
    for goal in metrics.goals() {
        assert_eq!(goal.percentage, 0.0);
        assert_eq!(goal.source, PercentageSource::Default);
        assert!(!goal.boost_active);
    }
    assert_eq!(metrics.current_cycle_day, 0);
    assert_eq!(metrics.total_cycle_days, 21);
    assert_eq!(metrics.days_until_cycle_end, 21);
}

#[test]
fn every_team_yields_three_goals() {
    let status = parse_player_status_json("null").expect("null is an empty snapshot");
    for team in carteira_metrics::team::ALL_TEAMS {
        let processor = factory().processor(team).expect("registered");
        let metrics = processor.process_player_data(&status, None);
        assert_eq!(metrics.team, team);
        let goals = metrics.goals();
        assert!(goals[0].details.is_main_goal);
        assert!(goals[1..].iter().all(|g| !g.details.is_main_goal));
        assert!(goals.iter().all(|g| !g.details.challenge_ids.is_empty()));
        assert!(goals.iter().all(|g| g.percentage.is_finite() && g.percentage >= 0.0));
    }
}

#[test]
fn carteira2_prefers_report_and_computes_points_locally() {
    let status = parse_player_status_json(&read_fixture("status_carteira2.json"))
        .expect("fixture should parse");
    let report = parse_report_record_json(&read_fixture("report_carteira2.json"))
        .expect("fixture should parse")
        .expect("report present");
    let result = factory().process_player_data_auto(&status, Some(&report));
    assert_eq!(result.team_type, Some(TeamType::CarteiraII));
    let metrics = result.metrics.expect("metrics");

    assert_eq!(metrics.primary_goal.percentage, 110.0);
    assert_eq!(metrics.primary_goal.source, PercentageSource::Report);
    assert_eq!(metrics.secondary_goal1.percentage, 120.0);
    assert!((metrics.secondary_goal2.percentage - 65.0).abs() < 1e-9);
    assert!(metrics.secondary_goal1.boost_active);
    assert!(!metrics.secondary_goal2.boost_active);

    assert!(!metrics.points_locked);
    assert_eq!(metrics.points, 1112.0);
    assert_eq!(metrics.current_cycle_day, 12);
    assert_eq!(metrics.days_until_cycle_end, 9);
    assert_eq!(metrics.warnings, vec![LOCAL_BOOST_WARNING.to_string()]);
}

#[test]
fn batch_fixture_keeps_order() {
    let inputs: Vec<PlayerInput> =
        serde_json::from_str(&read_fixture("batch.json")).expect("fixture should parse");
    let results = process_batch(factory(), &inputs, 2);
    assert_eq!(results.len(), 3);

    let ana = results[0].metrics.as_ref().expect("ana processed");
    assert_eq!(ana.team, TeamType::Carteira0);
    assert_eq!(ana.primary_goal.percentage, 64.0);

    let bruno = results[1].metrics.as_ref().expect("bruno processed");
    assert_eq!(bruno.team, TeamType::CarteiraII);
    assert_eq!(bruno.points, 1200.0);
    assert!(!bruno.points_locked);

    assert!(results[2].metrics.is_none());
    assert!(results[2].error.is_some());
}

#[test]
fn metrics_serialize_for_the_ui() {
    let status = parse_player_status_json(&read_fixture("status_carteira0.json"))
        .expect("fixture should parse");
    let metrics = factory()
        .processor(TeamType::Carteira0)
        .expect("registered")
        .process_player_data(&status, None);
    let value = serde_json::to_value(&metrics).expect("serializable");
    assert_eq!(value["team"], "CARTEIRA_0");
    assert_eq!(value["primary_goal"]["progress"]["zone"], "yellow");
    assert_eq!(value["primary_goal"]["source"], "challenge");
    assert!(value.get("warnings").is_none());
}
