use std::{error::Error, sync::Arc};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{
    DaypartingWindow, Engine, MoneyCents, SpendEntryFilter, SweepKind, SystemClock,
};
use migration::MigratorTrait;
use rand::Rng;
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "spendcap_admin")]
#[command(about = "Operator utilities for spendcap (brands, campaigns, spend, sweeps)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./spendcap.db?mode=rwc"
    )]
    database_url: String,

    /// IANA timezone used for dayparting and entry dates (host zone if unset).
    #[arg(long, env = "SPENDCAP_TIMEZONE")]
    timezone: Option<String>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Brand(Brand),
    Campaign(Campaign),
    Spend(Spend),
    /// Show aggregate counters.
    Status,
    Sweep(Sweep),
    /// Apply one random spend to every active campaign.
    Simulate(SimulateArgs),
}

#[derive(Args, Debug)]
struct Brand {
    #[command(subcommand)]
    command: BrandCommand,
}

#[derive(Subcommand, Debug)]
enum BrandCommand {
    Create(BrandCreateArgs),
    List,
    /// Delete a brand with all its campaigns and spend entries.
    Delete { id: Uuid },
}

#[derive(Args, Debug)]
struct BrandCreateArgs {
    #[arg(long)]
    name: String,
    /// Daily ceiling, e.g. `1000` or `1000.50`.
    #[arg(long)]
    daily: MoneyCents,
    #[arg(long)]
    monthly: MoneyCents,
}

#[derive(Args, Debug)]
struct Campaign {
    #[command(subcommand)]
    command: CampaignCommand,
}

#[derive(Subcommand, Debug)]
enum CampaignCommand {
    Create(CampaignCreateArgs),
    List,
    Delete { id: Uuid },
}

#[derive(Args, Debug)]
struct CampaignCreateArgs {
    #[arg(long)]
    brand: Uuid,
    #[arg(long)]
    name: String,
    /// Window start (`HH:MM`), defaults to 09:00.
    #[arg(long, requires = "end")]
    start: Option<String>,
    /// Window end (`HH:MM`), defaults to 17:00.
    #[arg(long, requires = "start")]
    end: Option<String>,
}

#[derive(Args, Debug)]
struct Spend {
    #[command(subcommand)]
    command: SpendCommand,
}

#[derive(Subcommand, Debug)]
enum SpendCommand {
    Add {
        #[arg(long)]
        campaign: Uuid,
        #[arg(long)]
        amount: MoneyCents,
    },
    List {
        #[arg(long)]
        campaign: Option<Uuid>,
        /// Calendar day, `YYYY-MM-DD`.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Args, Debug)]
struct Sweep {
    #[command(subcommand)]
    command: SweepCommand,
}

#[derive(Subcommand, Debug)]
enum SweepCommand {
    /// Run one sweep (`budget`, `dayparting`, `daily-reset`, `monthly-reset`) or `all`.
    Run { kind: String },
}

#[derive(Args, Debug)]
struct SimulateArgs {
    /// Smallest whole amount to spend.
    #[arg(long, default_value_t = 1)]
    min: i64,
    /// Largest whole amount to spend.
    #[arg(long, default_value_t = 100)]
    max: i64,
}

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

async fn connect_db(database_url: &str) -> CliResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn sweep_kinds(raw: &str) -> CliResult<Vec<SweepKind>> {
    if raw.eq_ignore_ascii_case("all") {
        return Ok(SweepKind::ALL.to_vec());
    }
    Ok(vec![raw.parse()?])
}

fn check_simulate_range(args: &SimulateArgs) -> CliResult<()> {
    if args.min < 1 || args.min > args.max {
        return Err("expected 1 <= --min <= --max".into());
    }
    if MoneyCents::checked_from_units(args.max).is_none() {
        return Err(format!("--max {} is too large", args.max).into());
    }
    Ok(())
}

async fn run(cli: Cli) -> CliResult<()> {
    let clock = match cli.timezone.as_deref() {
        Some(name) => SystemClock::with_timezone_name(name)?,
        None => SystemClock::default(),
    };
    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder()
        .database(db)
        .clock(Arc::new(clock))
        .build()
        .await?;

    match cli.command {
        Command::Brand(Brand { command }) => match command {
            BrandCommand::Create(args) => {
                let id = engine.new_brand(&args.name, args.daily, args.monthly).await?;
                println!("created brand: {} ({id})", args.name.trim());
            }
            BrandCommand::List => {
                let brands = engine.brands().await?;
                if cli.json {
                    return print_json(&brands);
                }
                for summary in brands {
                    let brand = summary.brand;
                    println!(
                        "{}  {}  daily {}  monthly {}  campaigns {}",
                        brand.id,
                        brand.name,
                        brand.daily_budget,
                        brand.monthly_budget,
                        summary.campaigns_count
                    );
                }
            }
            BrandCommand::Delete { id } => {
                engine.delete_brand(id).await?;
                println!("deleted brand: {id}");
            }
        },
        Command::Campaign(Campaign { command }) => match command {
            CampaignCommand::Create(args) => {
                let window = match (args.start.as_deref(), args.end.as_deref()) {
                    (Some(start), Some(end)) => Some(DaypartingWindow::parse(start, end)?),
                    _ => None,
                };
                let id = engine.new_campaign(args.brand, &args.name, window).await?;
                println!("created campaign: {} ({id})", args.name.trim());
            }
            CampaignCommand::List => {
                let campaigns = engine.campaigns().await?;
                if cli.json {
                    return print_json(&campaigns);
                }
                for view in campaigns {
                    println!(
                        "{}  {} / {}  {}  daily {}/{}  monthly {}/{}  window {}-{}",
                        view.id,
                        view.brand_name,
                        view.name,
                        if view.is_active { "active" } else { "paused" },
                        view.daily_spend,
                        view.daily_budget,
                        view.monthly_spend,
                        view.monthly_budget,
                        view.window.start().format("%H:%M"),
                        view.window.end().format("%H:%M"),
                    );
                }
            }
            CampaignCommand::Delete { id } => {
                engine.delete_campaign(id).await?;
                println!("deleted campaign: {id}");
            }
        },
        Command::Spend(Spend { command }) => match command {
            SpendCommand::Add { campaign, amount } => {
                let outcome = engine.apply_spend(campaign, amount).await?;
                if cli.json {
                    return print_json(&outcome);
                }
                println!(
                    "Added spend {} to {}: daily {} monthly {}{}",
                    outcome.amount,
                    outcome.campaign_name,
                    outcome.new_daily_spend,
                    outcome.new_monthly_spend,
                    if outcome.is_active { "" } else { " (now paused)" }
                );
            }
            SpendCommand::List { campaign, date } => {
                let entries = engine
                    .spend_entries(&SpendEntryFilter {
                        campaign_id: campaign,
                        date,
                    })
                    .await?;
                if cli.json {
                    return print_json(&entries);
                }
                for view in entries {
                    println!(
                        "{}  {}  {} / {}  {}",
                        view.entry.recorded_at.format("%Y-%m-%d %H:%M:%S"),
                        view.entry.amount,
                        view.brand_name,
                        view.campaign_name,
                        view.entry.id
                    );
                }
            }
        },
        Command::Status => {
            let status = engine.status().await?;
            if cli.json {
                return print_json(&status);
            }
            let rows = [
                ("brands", status.total_brands),
                ("campaigns", status.total_campaigns),
                ("active", status.active_campaigns),
                ("paused", status.paused_campaigns),
                ("over daily budget", status.over_daily_budget),
                ("over monthly budget", status.over_monthly_budget),
            ];
            println!("server time: {}", status.server_time.format("%Y-%m-%d %H:%M:%S"));
            for (label, value) in rows {
                println!("{label:<20} {value}");
            }
        }
        Command::Sweep(Sweep {
            command: SweepCommand::Run { kind },
        }) => {
            let mut reports = Vec::new();
            for kind in sweep_kinds(&kind)? {
                reports.push(engine.run_sweep(kind).await?);
            }
            if cli.json {
                return print_json(&reports);
            }
            for report in reports {
                println!(
                    "{}: examined {} updated {} failed {}",
                    report.kind, report.examined, report.updated, report.failed
                );
            }
        }
        Command::Simulate(args) => {
            check_simulate_range(&args)?;
            for view in engine.campaigns().await? {
                if !view.is_active {
                    continue;
                }
                let units = rand::thread_rng().gen_range(args.min..=args.max);
                let amount = MoneyCents::checked_from_units(units).ok_or("amount too large")?;
                match engine.apply_spend(view.id, amount).await {
                    Ok(outcome) => println!("Added spend {amount} to {}", outcome.campaign_name),
                    Err(err) => println!("Skipped {}: {err}", view.name),
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_money_and_ids() {
        let id = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "spendcap_admin",
            "spend",
            "add",
            "--campaign",
            &id.to_string(),
            "--amount",
            "12,50",
        ])
        .unwrap();
        match cli.command {
            Command::Spend(Spend {
                command: SpendCommand::Add { campaign, amount },
            }) => {
                assert_eq!(campaign, id);
                assert_eq!(amount, MoneyCents::new(1250));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn campaign_window_needs_both_ends() {
        let brand = Uuid::new_v4().to_string();
        let parsed = Cli::try_parse_from([
            "spendcap_admin",
            "campaign",
            "create",
            "--brand",
            &brand,
            "--name",
            "Launch",
            "--start",
            "10:00",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn simulate_range_is_bounded() {
        let range = |min, max| SimulateArgs { min, max };
        assert!(check_simulate_range(&range(1, 100)).is_ok());
        assert!(check_simulate_range(&range(0, 100)).is_err());
        assert!(check_simulate_range(&range(50, 10)).is_err());
        assert!(check_simulate_range(&range(1, i64::MAX)).is_err());
        assert!(check_simulate_range(&range(1, i64::MAX / 100)).is_ok());
    }

    #[test]
    fn sweep_kinds_accept_all() {
        assert_eq!(sweep_kinds("all").unwrap().len(), 4);
        assert_eq!(
            sweep_kinds("daily-reset").unwrap(),
            vec![SweepKind::DailyReset]
        );
        assert!(sweep_kinds("hourly").is_err());
    }
}
