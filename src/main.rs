//! Pairs Exec - Main Entry Point
//!
//! Runs scheduled spread executions against the simulated market.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use pairs_exec::config::{Config, LoggingSettings};
use pairs_exec::schedule::{cumulative_target, ScheduleParams, StrategyMode};
use pairs_exec::sim::{ModeComparisonRunner, Simulation};
use pairs_exec::strategy::HedgeKind;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Pairs Exec CLI
#[derive(Parser)]
#[command(name = "pairs-exec")]
#[command(version, about = "Scheduled two-leg spread execution in a discrete-event simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one session and print its report
    Run {
        #[command(flatten)]
        session: SessionArgs,

        /// Output directory for the report and tick log
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Execute the same session under every strategy mode
    Compare {
        #[command(flatten)]
        session: SessionArgs,

        /// Number of parallel runs
        #[arg(short, long, default_value = "4")]
        parallelism: usize,

        /// Output directory for the comparison table
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print the cumulative fraction curve of a mode
    Curve {
        #[command(flatten)]
        session: SessionArgs,

        /// Number of evenly spaced points, both ends included
        #[arg(long, default_value = "13")]
        points: usize,
    },
}

/// Overrides applied on top of the loaded configuration.
#[derive(Args, Debug, Default)]
struct SessionArgs {
    /// Strategy mode (TWAP, VWAP, POV, IS)
    #[arg(short, long)]
    mode: Option<StrategyMode>,

    /// Instrument pair as "LEG_A,LEG_B"
    #[arg(long)]
    pair: Option<String>,

    /// Signed total notional; negative shorts the spread
    #[arg(short, long, allow_hyphen_values = true)]
    notional: Option<f64>,

    /// Hedge convention (dollar, beta)
    #[arg(long)]
    hedge: Option<HedgeKind>,

    /// Hedge ratio for beta hedging
    #[arg(long)]
    beta: Option<f64>,

    /// Session length in minutes
    #[arg(long)]
    minutes: Option<f64>,

    /// Seconds between decision ticks
    #[arg(long)]
    dt: Option<f64>,

    /// Shares per lot
    #[arg(long)]
    lot_size: Option<u32>,

    /// Session open (HH:MM:SS)
    #[arg(long)]
    open: Option<String>,

    /// Synthetic market volume in notional per second
    #[arg(long)]
    volume: Option<f64>,

    /// POV participation rate
    #[arg(long)]
    participation: Option<f64>,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,
}

impl SessionArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(mode) = self.mode {
            config.session.mode = mode;
        }
        if let Some(pair) = &self.pair {
            config.session.pair = pair.clone();
        }
        if let Some(notional) = self.notional {
            config.session.notional = notional;
        }
        if let Some(kind) = self.hedge {
            config.hedge.kind = kind;
        }
        if let Some(beta) = self.beta {
            config.hedge.beta = beta;
        }
        if let Some(minutes) = self.minutes {
            config.session.session_minutes = minutes;
        }
        if let Some(dt) = self.dt {
            config.session.decision_interval_secs = dt;
        }
        if let Some(lot_size) = self.lot_size {
            config.hedge.lot_size = lot_size;
        }
        if let Some(open) = &self.open {
            config.market.open = open.clone();
        }
        if let Some(volume) = self.volume {
            config.market.volume_per_sec = Some(volume);
        }
        if let Some(rate) = self.participation {
            config.session.participation_rate = rate;
        }
        if self.json_logs {
            config.logging.json = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let session = match &cli.command {
        Commands::Run { session, .. }
        | Commands::Compare { session, .. }
        | Commands::Curve { session, .. } => session,
    };

    let mut config = Config::load()?;
    session.apply(&mut config);

    init_logging(&config.logging)?;

    match cli.command {
        Commands::Run { output, .. } => run_session(&config, output.as_deref()),
        Commands::Compare {
            parallelism,
            output,
            ..
        } => run_compare(&config, parallelism, output.as_deref()).await,
        Commands::Curve { points, .. } => print_curve(&config, points),
    }
}

/// Initialize stdout plus hourly rolling file logging.
fn init_logging(settings: &LoggingSettings) -> Result<()> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    std::fs::create_dir_all(&settings.directory)?;

    let file_appender = tracing_appender::rolling::hourly(&settings.directory, "pairs-exec.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Leak the guard to keep it alive for the program duration
    Box::leak(Box::new(guard));

    let filter = EnvFilter::from_default_env()
        .add_directive("pairs_exec=debug".parse()?)
        .add_directive(Level::INFO.into());

    if settings.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stdout.and(file_writer))
            .with_target(true)
            .with_current_span(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stdout.and(file_writer))
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(true)
            .init();
    }

    Ok(())
}

/// Log configuration on startup.
fn log_config(config: &Config) {
    info!("📋 Configuration:");
    info!("   Mode: {}", config.session.mode);
    info!("   Pair: {}", config.session.pair);
    info!("   Notional: ${:.2}", config.session.notional);
    info!(
        "   Session: {} min from {}, tick every {}s",
        config.session.session_minutes, config.market.open, config.session.decision_interval_secs
    );
    info!(
        "   Hedge: {} (beta {}, lot {})",
        config.hedge.kind, config.hedge.beta, config.hedge.lot_size
    );
    match config.market.volume_per_sec {
        Some(rate) => info!("   Volume feed: ${:.2}/s", rate),
        None => info!("   Volume feed: none"),
    }
}

/// Execute one session.
fn run_session(config: &Config, output_dir: Option<&str>) -> Result<()> {
    info!("╔════════════════════════════════════════════════════════════╗");
    info!("║              EXECUTION SESSION                             ║");
    info!("╚════════════════════════════════════════════════════════════╝");
    log_config(config);

    let report = Simulation::from_config(config)?.run();

    println!("\n{}", report.summary());

    if !report.errors.is_empty() {
        warn!("⚠️  {} wake-up(s) failed:", report.errors.len());
        for error in &report.errors {
            warn!("   {}", error);
        }
    }

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)?;

        let report_path = format!("{}/report.json", dir);
        report.to_json(&report_path)?;
        info!("📁 Report saved to: {}", report_path);

        let ticks_path = format!("{}/ticks.csv", dir);
        report.ticks_to_csv(&ticks_path)?;
        info!("📁 Tick log saved to: {}", ticks_path);
    }

    Ok(())
}

/// Execute the session under every mode.
async fn run_compare(config: &Config, parallelism: usize, output_dir: Option<&str>) -> Result<()> {
    info!("╔════════════════════════════════════════════════════════════╗");
    info!("║              MODE COMPARISON                               ║");
    info!("╚════════════════════════════════════════════════════════════╝");
    log_config(config);

    let runner = ModeComparisonRunner::new(config.clone(), parallelism);
    let comparison = runner.run().await?;

    println!("\n{}", comparison.summary());

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)?;

        let csv_path = format!("{}/comparison.csv", dir);
        comparison.to_csv(&csv_path)?;
        info!("📁 Comparison saved to: {}", csv_path);

        for report in &comparison.reports {
            let path = format!("{}/{}_report.json", dir, report.mode.as_str().to_lowercase());
            report.to_json(&path)?;
        }
    }

    Ok(())
}

/// Print the fraction of the total executed at evenly spaced times.
fn print_curve(config: &Config, points: usize) -> Result<()> {
    let session = config.session_config()?;
    let params = ScheduleParams {
        total_notional: 1.0,
        ..session.schedule_params()
    };
    let mode = config.session.mode;
    let length = params.session_length_secs;
    let steps = points.max(2) - 1;

    println!("{} over {:.0} min", mode, length / 60.0);
    println!("{:>10} {:>10}", "ELAPSED", "FRACTION");
    for i in 0..=steps {
        let elapsed = length * i as f64 / steps as f64;
        let fraction = cumulative_target(mode, elapsed, &params)?;
        println!("{:>9.1}s {:>10.6}", elapsed, fraction);
    }

    Ok(())
}
