//! CLI for the ranker candidate ranking engine.
//!
//! Loads a feature snapshot from CSV, ranks it for the requested risk,
//! horizon and profile, and prints the result as JSON.

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use ranker::{
    Effort, EngineConfig, FeatureSource, FrameSource, Horizon, RankRequest, Ranker, Result, Risk,
    UserProfile, parse_as_of,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ranker")]
#[command(about = "Multi-factor candidate ranking over a feature snapshot", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank the snapshot for one date
    Rank(RankArgs),
    /// Print the default configuration tables as JSON
    Config,
    /// Print the latest date available in a snapshot file
    Dates {
        /// Snapshot CSV file
        #[arg(long)]
        snapshot: PathBuf,
    },
}

#[derive(Args)]
struct RankArgs {
    /// Snapshot CSV file (date, code, name, feature columns)
    #[arg(long)]
    snapshot: PathBuf,
    /// As-of date, YYYYMMDD or YYYY-MM-DD (default: today)
    #[arg(long)]
    date: Option<String>,
    /// LOW, MID or HIGH
    #[arg(long, default_value = "MID")]
    risk: String,
    /// SHORT, MID or LONG
    #[arg(long, default_value = "MID")]
    horizon: String,
    /// SIMPLE or OPTIMIZE
    #[arg(long, default_value = "OPTIMIZE")]
    effort: String,
    /// Shortlist length
    #[arg(long, default_value_t = ranker::DEFAULT_TOP_N)]
    top: usize,
    /// Exclude the news signal
    #[arg(long)]
    no_news: bool,
    /// Fall back to the latest available date when the date has no data
    #[arg(long)]
    auto: bool,
    /// JSON file overriding the configuration tables
    #[arg(long)]
    config: Option<PathBuf>,
    /// Age in years
    #[arg(long)]
    age: Option<u32>,
    /// Free-text investment goal
    #[arg(long)]
    goal: Option<String>,
    /// Annual income, in ten-thousands
    #[arg(long)]
    income: Option<f64>,
    /// Savings, in ten-thousands
    #[arg(long)]
    savings: Option<f64>,
}

impl RankArgs {
    fn as_of(&self, today: NaiveDate) -> NaiveDate {
        self.date.as_deref().and_then(parse_as_of).unwrap_or(today)
    }

    fn profile(&self) -> Option<UserProfile> {
        let profile = UserProfile {
            age: self.age,
            investment_goal: self.goal.clone(),
            income: self.income,
            savings: self.savings,
        };
        (profile != UserProfile::default()).then_some(profile)
    }

    fn request(&self, today: NaiveDate) -> RankRequest {
        let request = RankRequest::new(self.as_of(today))
            .risk(Risk::parse_lenient(&self.risk))
            .horizon(Horizon::parse_lenient(&self.horizon))
            .effort(Effort::parse_lenient(&self.effort))
            .top_n(self.top)
            .include_news(!self.no_news);
        match self.profile() {
            Some(profile) => request.profile(profile),
            None => request,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Rank(args) => rank(&args),
        Commands::Config => show_config(),
        Commands::Dates { snapshot } => show_latest(&snapshot),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Install the log subscriber; `RUST_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Rank a snapshot file and print the result.
fn rank(args: &RankArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    let source = FrameSource::from_csv(&args.snapshot)?;
    tracing::info!(
        snapshot = %args.snapshot.display(),
        features = source.feature_columns().len(),
        "loaded snapshot"
    );

    let request = args.request(Local::now().date_naive());
    let ranker = Ranker::new(config);
    let result = if args.auto {
        ranker.rank_with_fallback(&source, &request)?
    } else {
        ranker.rank(&source, &request)?
    };

    tracing::info!(as_of = %result.as_of, count = result.count, "ranking complete");
    println!("{}", result.to_json_pretty()?);
    Ok(())
}

/// Print the default tables.
fn show_config() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&EngineConfig::default())?);
    Ok(())
}

/// Print the most recent as-of date in a snapshot file.
fn show_latest(snapshot: &Path) -> Result<()> {
    let source = FrameSource::from_csv(snapshot)?;
    match source.latest_as_of()? {
        Some(date) => println!("{date}"),
        None => println!("(no data)"),
    }
    Ok(())
}
