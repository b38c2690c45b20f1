//! Autoref CLI
//!
//! Replays a recorded JSON-lines log through the referee and prints every
//! decision followed by a summary.

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "autoref_cli")]
#[command(about = "Automatic referee tools", long_about = None)]
struct Cli {
    /// Emit newline-delimited JSON logs and output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines log of vision, geometry and referee records
    Replay {
        /// Input log file path
        #[arg(long)]
        log: PathBuf,

        /// YAML configuration; defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
fn init_tracing(json: bool) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}

#[cfg(feature = "cli")]
fn load_config(path: Option<&PathBuf>) -> Result<autoref_core::AutorefConfig> {
    match path {
        Some(path) => autoref_core::AutorefConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => {
            let mut config = autoref_core::AutorefConfig::default();
            config.apply_env_overrides().context("Invalid environment override")?;
            Ok(config)
        }
    }
}

#[cfg(feature = "cli")]
fn print_outcome(outcome: &autoref_core::FrameOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(outcome)?);
        return Ok(());
    }
    for fired in &outcome.fired {
        println!("[{:>9.3}] {:<22} {}", outcome.time, fired.kind.name(), fired.description);
        if let Some(foul) = &fired.foul {
            let by = match (foul.robot, foul.team) {
                (Some(robot), _) => robot.to_string(),
                (None, Some(team)) => team.to_string(),
                (None, None) => "-".to_string(),
            };
            println!(
                "            foul {:?} by {} (replay {:.2}s)",
                foul.kind,
                by,
                foul.replay.duration()
            );
        }
    }
    if let Some(point) = outcome.placement {
        println!("            place ball at ({:.0}, {:.0})", point.x, point.y);
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn print_summary(summary: &autoref_cli::ReplaySummary) {
    println!("\nReplay finished");
    println!("   Log checksum: {}", summary.log_checksum);
    println!("   Entries:      {} ({} vision frames)", summary.entries, summary.vision_frames);
    println!("   Worlds:       {}", summary.worlds);
    println!("   Firings:      {} ({} fouls)", summary.firings, summary.fouls);
    println!("   Faults:       {}", summary.faults);
    println!("   Rejected:     {}", summary.rejected);
    println!("   Final:        {:?} / {:?}", summary.state, summary.stage);
    println!("   Score:        Blue {} - {} Yellow", summary.score[0], summary.score[1]);
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    match cli.command {
        Commands::Replay { log, config } => {
            let config = load_config(config.as_ref())?;
            let json = cli.json;
            let mut print_error = None;
            let summary = autoref_cli::replay_file(&log, config, |outcome| {
                if print_error.is_none() {
                    print_error = print_outcome(outcome, json).err();
                }
            })?;
            if let Some(e) = print_error {
                return Err(e);
            }

            if json {
                println!("{}", serde_json::to_string(&summary)?);
            } else {
                print_summary(&summary);
            }
        }
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("autoref_cli is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
