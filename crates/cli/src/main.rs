mod batch;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use aircombat_shared::*;
use aircombat_sim::{run_match, PolicyKind};

#[derive(Parser)]
#[command(name = "aircombat", about = "Air-combat training engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Engagement settings shared by every subcommand. Flags override values
/// loaded from `--config`.
#[derive(Args, Clone)]
struct EngagementArgs {
    /// TOML file with an engagement configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Kinematics model (planar, energy)
    #[arg(long)]
    model: Option<ModelKind>,

    /// Starting posture (neutral, offense, defense, co_heading, random)
    #[arg(long)]
    scenario: Option<ScenarioMode>,

    /// Jitter red's starting posture
    #[arg(long)]
    randomize_red: bool,

    /// Jitter blue's starting posture
    #[arg(long)]
    randomize_blue: bool,

    /// Policy flying blue (hold, random, pursuit)
    #[arg(long, default_value = "pursuit")]
    blue: PolicyKind,

    /// Policy flying red (hold, random, pursuit)
    #[arg(long, default_value = "hold")]
    red: PolicyKind,
}

#[derive(Subcommand)]
enum Commands {
    /// Fly one episode between two scripted policies
    Run {
        #[command(flatten)]
        engagement: EngagementArgs,

        /// Random seed for the episode
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output path for replay JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Fly many seeded episodes in parallel and tally outcomes
    Batch {
        #[command(flatten)]
        engagement: EngagementArgs,

        /// Number of episodes
        #[arg(long, default_value_t = 100)]
        episodes: u32,

        /// Seed of the first episode; the rest follow consecutively
        #[arg(long, default_value_t = 0)]
        seed_start: u64,

        /// Write per-episode results as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            engagement,
            seed,
            output,
        } => cmd_run(&engagement, seed, output),

        Commands::Batch {
            engagement,
            episodes,
            seed_start,
            csv,
        } => batch::cmd_batch(&engagement, episodes, seed_start, csv.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: &Path) -> Result<EngagementConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    toml::from_str(&content).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
}

impl EngagementArgs {
    /// Build the validated engagement configuration for one seed.
    fn resolve(&self, seed: u64) -> Result<EngagementConfig, String> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => EngagementConfig::default(),
        };
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(mode) = self.scenario {
            config.scenario.mode = mode;
        }
        config.scenario.randomize_red |= self.randomize_red;
        config.scenario.randomize_blue |= self.randomize_blue;
        config.seed = seed;
        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }
}

fn cmd_run(args: &EngagementArgs, seed: u64, output: Option<PathBuf>) -> Result<(), String> {
    let config = args.resolve(seed)?;

    println!(
        "Running episode: {} (blue) vs {} (red), model={}, scenario={:?}, seed={}",
        args.blue, args.red, config.model, config.scenario.mode, seed
    );

    let replay = run_match(&config, args.blue, args.red).map_err(|e| e.to_string())?;
    let result = &replay.result;

    println!();
    println!("=== Episode Result ===");
    println!("Outcome:    {:?}", result.outcome);
    println!("Reason:     {:?}", result.reason);
    println!(
        "Steps:      {} ({:.1}s)",
        result.steps,
        result.steps as f64 * macro_step_seconds(&config)
    );
    println!("Advantage:  {}", result.final_advantage);
    println!();
    println!("--- Returns ---");
    println!("  {} (blue): {:+.4}", replay.blue_policy, result.return_blue);
    println!("  {} (red):  {:+.4}", replay.red_policy, result.return_red);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&replay)
            .map_err(|e| format!("failed to serialize replay: {}", e))?;
        std::fs::write(&path, json).map_err(|e| format!("failed to write replay: {}", e))?;
        println!("\nReplay written to {}", path.display());
    }
    Ok(())
}

/// Simulated seconds per macro step for the configured model.
fn macro_step_seconds(config: &EngagementConfig) -> f64 {
    match config.model {
        ModelKind::Planar => config.planar.macro_step,
        ModelKind::Energy => config.energy.micro_step * config.energy.micro_steps as f64,
    }
}
