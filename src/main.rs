use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use carteira_metrics::batch::{PlayerInput, process_batch};
use carteira_metrics::challenge_map::ChallengeMapping;
use carteira_metrics::config::EngineConfig;
use carteira_metrics::csv_fetch::read_csv_source;
use carteira_metrics::csv_goals::{parse_goal_csv, validate_new_metrics};
use carteira_metrics::factory::TeamProcessorFactory;
use carteira_metrics::metrics::{GoalMetric, PlayerMetrics};
use carteira_metrics::progress_bar::render_text_bar;
use carteira_metrics::status::{ReportRecord, parse_player_status_json, parse_report_record_json};
use carteira_metrics::team::TeamType;

const BAR_WIDTH: usize = 30;
const USAGE: &str = "usage: carteira_metrics --status <file> [--report <file> | --csv <file|url>] [--team <label>] [--json]
       carteira_metrics --batch <file> [--json]";

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    status: Option<PathBuf>,
    report: Option<PathBuf>,
    csv: Option<String>,
    team: Option<String>,
    batch: Option<PathBuf>,
    json: bool,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = parse_args(std::env::args().skip(1))?;
    let config = EngineConfig::from_env();
    let factory =
        TeamProcessorFactory::with_cycle_settings(ChallengeMapping::builtin(), config.cycle_settings())
            .context("failed to build team processors")?;

    if let Some(path) = args.batch.as_ref() {
        return run_batch(&factory, &config, path, args.json);
    }

    let status_path = args.status.as_ref().context(USAGE)?;
    let raw = fs::read_to_string(status_path)
        .with_context(|| format!("failed reading {}", status_path.display()))?;
    let status = parse_player_status_json(&raw)?;

    let declared_team = args
        .team
        .as_deref()
        .map(|label| {
            TeamType::from_label(label).with_context(|| format!("unknown team {label:?}"))
        })
        .transpose()?;
    let report = load_report(&args, &config, declared_team)?;

    let metrics = match declared_team {
        Some(team) => factory
            .get_processor(team.key())?
            .process_player_data(&status, report.as_ref()),
        None => {
            let available = TeamProcessorFactory::available_teams_for_user(&status);
            if available.len() > 1 {
                let labels: Vec<&str> = available.iter().map(|t| t.label()).collect();
                eprintln!("player belongs to several teams: {}", labels.join(", "));
            }
            let result = factory.process_player_data_auto(&status, report.as_ref());
            match (result.metrics, result.error) {
                (Some(metrics), _) => metrics,
                (None, Some(err)) => anyhow::bail!("{err} (pass --team to choose one)"),
                (None, None) => anyhow::bail!("no metrics produced"),
            }
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print_metrics(&metrics);
    }
    Ok(())
}

fn run_batch(
    factory: &TeamProcessorFactory,
    config: &EngineConfig,
    path: &Path,
    json: bool,
) -> Result<()> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed reading {}", path.display()))?;
    let inputs: Vec<PlayerInput> =
        serde_json::from_str(&raw).context("invalid batch json")?;
    let results = process_batch(factory, &inputs, config.batch_parallelism);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }
    for (input, result) in inputs.iter().zip(&results) {
        match (&result.metrics, &result.error) {
            (Some(metrics), _) => print_metrics(metrics),
            (None, err) => println!(
                "{}: {}\n",
                input.status.display_name(),
                err.as_deref().unwrap_or("no metrics")
            ),
        }
    }
    let failed = results.iter().filter(|r| r.error.is_some()).count();
    println!("Processed {} player(s), {failed} failed", results.len());
    Ok(())
}

fn load_report(
    args: &CliArgs,
    config: &EngineConfig,
    team: Option<TeamType>,
) -> Result<Option<ReportRecord>> {
    if args.report.is_some() && args.csv.is_some() {
        anyhow::bail!("--report and --csv are mutually exclusive");
    }
    if let Some(path) = args.report.as_ref() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        return parse_report_record_json(&raw);
    }
    let Some(source) = args.csv.as_deref() else {
        return Ok(None);
    };
    let content = read_csv_source(source, config)?;
    let data = parse_goal_csv(&content).with_context(|| format!("{source} is not a valid goal csv"))?;
    for warning in validate_new_metrics(&data) {
        eprintln!("warning: {warning}");
    }
    Ok(Some(data.to_report_record(team)))
}

fn print_metrics(metrics: &PlayerMetrics) {
    println!("{} ({})", metrics.player_name, metrics.team.label());
    let lock = if metrics.points_locked { "locked" } else { "unlocked" };
    println!("Points: {:.0} [{lock}]", metrics.points);
    println!(
        "Cycle: day {}/{} ({} left)",
        metrics.current_cycle_day, metrics.total_cycle_days, metrics.days_until_cycle_end
    );
    for goal in metrics.goals() {
        print_goal(goal);
    }
    for warning in &metrics.warnings {
        println!("! {warning}");
    }
    println!();
}

fn print_goal(goal: &GoalMetric) {
    let marker = if goal.details.is_main_goal {
        "*"
    } else if goal.boost_active {
        "+"
    } else {
        " "
    };
    println!(
        "{marker} {:<22} {} {:>7.1}% {:<6} ({:?})",
        goal.name,
        render_text_bar(&goal.progress, BAR_WIDTH),
        goal.percentage,
        goal.progress.zone.label(),
        goal.source
    );
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs> {
    let mut out = CliArgs::default();
    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        if flag == "--json" {
            out.json = true;
            continue;
        }
        if flag == "--help" || flag == "-h" {
            println!("{USAGE}");
            std::process::exit(0);
        }
        let value = match inline {
            Some(value) => value,
            None => args
                .next()
                .with_context(|| format!("{flag} needs a value\n{USAGE}"))?,
        };
        let value = value.trim().to_string();
        if value.is_empty() {
            anyhow::bail!("{flag} needs a non-empty value");
        }
        match flag.as_str() {
            "--status" => out.status = Some(PathBuf::from(value)),
            "--report" => out.report = Some(PathBuf::from(value)),
            "--csv" => out.csv = Some(value),
            "--team" => out.team = Some(value),
            "--batch" => out.batch = Some(PathBuf::from(value)),
            other => anyhow::bail!("unknown argument {other}\n{USAGE}"),
        }
    }
    Ok(out)
}
