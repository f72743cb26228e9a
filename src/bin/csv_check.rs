use std::process::ExitCode;

use anyhow::{Context, Result};

use carteira_metrics::config::EngineConfig;
use carteira_metrics::csv_fetch::read_csv_source;
use carteira_metrics::csv_goals::{
    CsvGoalData, GoalTriple, parse_goal_csv, validate_csv_structure, validate_new_metrics,
};
use carteira_metrics::metric::{ALL_METRICS, MetricKey};

fn main() -> Result<ExitCode> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let source = std::env::args()
        .nth(1)
        .filter(|arg| !arg.trim().is_empty())
        .context("usage: csv_check <file|url>")?;
    let config = EngineConfig::from_env();
    let content = read_csv_source(&source, &config)?;

    if !validate_csv_structure(&content) {
        println!("{source}: invalid header (run with RUST_LOG=warn for details)");
        return Ok(ExitCode::FAILURE);
    }
    let Some(data) = parse_goal_csv(&content) else {
        println!("{source}: header is valid but no usable data line");
        return Ok(ExitCode::FAILURE);
    };

    print_row(&data);
    let warnings = validate_new_metrics(&data);
    if warnings.is_empty() {
        println!("OK");
    } else {
        println!("Warnings: {}", warnings.len());
        for warning in &warnings {
            println!(" - {warning}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_row(data: &CsvGoalData) {
    println!("Player: {}", data.player_id);
    println!("Cycle: day {}/{}", data.cycle_day, data.total_cycle_days);
    for metric in ALL_METRICS {
        match data.triple(metric) {
            Some(triple) => print_triple(metric, &triple),
            None => println!("{:<22} -", metric.display_name()),
        }
    }
}

fn print_triple(metric: MetricKey, triple: &GoalTriple) {
    println!(
        "{:<22} target {:>12.2}  current {:>12.2}  {:>6.1}%",
        metric.display_name(),
        triple.target,
        triple.current,
        triple.percentage
    );
}
