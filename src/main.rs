use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use tabq::{
    config::{ConfigLoader, TabqConfig},
    reinforcement::{
        Corridor, EpisodeRunner, Move, QLearner, QTableSnapshot, RandomSource, SeededRandom,
        ThreadRandom,
    },
};

#[derive(Parser, Debug)]
#[command(name = "tabq", version, about = "Tabular Q-learning on a corridor environment")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a learner on the corridor and print the learned table
    Train(TrainArgs),
    /// Print a saved snapshot
    Show {
        /// Snapshot file written by `train --output`
        snapshot: PathBuf,
    },
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Step limit per episode
    #[arg(long)]
    max_steps: Option<usize>,

    /// Corridor length
    #[arg(long)]
    length: Option<usize>,

    /// Learning rate (α)
    #[arg(long)]
    alpha: Option<f64>,

    /// Discount factor (γ)
    #[arg(long)]
    gamma: Option<f64>,

    /// Exploration rate (ε)
    #[arg(long)]
    epsilon: Option<f64>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Write the learned table to this JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl TrainArgs {
    /// Layer command-line flags over the loaded configuration
    fn apply(&self, config: &mut TabqConfig) {
        if let Some(episodes) = self.episodes {
            config.training.episodes = episodes;
        }
        if let Some(max_steps) = self.max_steps {
            config.training.max_steps = max_steps;
        }
        if let Some(length) = self.length {
            config.training.corridor_length = length;
        }
        if let Some(alpha) = self.alpha {
            config.learner.learning_rate = alpha;
        }
        if let Some(gamma) = self.gamma {
            config.learner.discount_factor = gamma;
        }
        if let Some(epsilon) = self.epsilon {
            config.learner.exploration_rate = epsilon;
        }
        if self.seed.is_some() {
            config.training.seed = self.seed;
        }
    }
}

fn main() -> Result<()> {
    // Pick up TABQ_* overrides from a local .env file if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    tabq::logging::init_logging(cli.verbose, true);

    match cli.command {
        Command::Train(args) => train(args),
        Command::Show { snapshot } => show(snapshot),
    }
}

fn train(args: TrainArgs) -> Result<()> {
    let loader = match &args.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load().with_context(|| {
        format!(
            "Failed to load configuration from {}",
            loader.path().display()
        )
    })?;
    args.apply(&mut config);
    config.validate().context("Invalid training configuration")?;

    info!(
        "Training on a corridor of length {} for {} episodes",
        config.training.corridor_length, config.training.episodes
    );

    match config.training.seed {
        Some(seed) => run_training(&config, SeededRandom::new(seed), args.output),
        None => run_training(&config, ThreadRandom, args.output),
    }
}

fn run_training<R: RandomSource>(
    config: &TabqConfig,
    rng: R,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut learner = QLearner::with_random(Move::ALL.to_vec(), config.learner, rng)
        .context("Failed to create learner")?;
    let mut env = Corridor::new(config.training.corridor_length)?.with_step_penalty(-0.01);
    let runner = EpisodeRunner::new(config.training.max_steps)?;

    let report = runner
        .train(&mut learner, &mut env, config.training.episodes)
        .context("Training failed")?;

    println!(
        "episodes: {}  success rate: {:.1}%  mean reward (last 10): {:.3}",
        report.episodes.len(),
        report.success_rate() * 100.0,
        report.mean_reward(10).unwrap_or(0.0)
    );
    println!("{:>8} {:>10} {:>10}  greedy", "position", "left", "right");
    for position in 0..env.goal() {
        let greedy: Vec<String> = learner
            .greedy_actions(&position)
            .into_iter()
            .map(|m| format!("{:?}", m))
            .collect();
        println!(
            "{:>8} {:>10.4} {:>10.4}  {}",
            position,
            learner.get_value(&position, &Move::Left),
            learner.get_value(&position, &Move::Right),
            greedy.join("/")
        );
    }

    if let Some(path) = output {
        learner
            .snapshot()
            .save_json(&path)
            .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
        println!("saved snapshot to {}", path.display());
    }

    Ok(())
}

fn show(path: PathBuf) -> Result<()> {
    let snapshot: QTableSnapshot<usize, Move> = QTableSnapshot::load_json(&path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;

    if snapshot.entries.is_empty() {
        warn!("Snapshot {} holds no entries", path.display());
    }

    println!(
        "saved at {}  α={} γ={} ε={}  updates={}",
        snapshot.saved_at,
        snapshot.config.learning_rate,
        snapshot.config.discount_factor,
        snapshot.config.exploration_rate,
        snapshot.updates
    );

    let mut entries = snapshot.entries;
    entries.sort_by(|a, b| a.state.cmp(&b.state).then(a.action.cmp(&b.action)));
    for entry in entries {
        let action = format!("{:?}", entry.action);
        println!("{:>8} {:>6} {:>10.4}", entry.state, action, entry.value);
    }

    Ok(())
}
