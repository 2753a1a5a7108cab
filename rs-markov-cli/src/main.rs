use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rs_markov_core::io::{read_lines, sibling_path};
use rs_markov_core::model::corpus::train_lines;
use rs_markov_core::{GenerationInput, MarkovModel, Snapshot, Tokenization};

#[derive(Parser)]
#[command(name = "rs-markov")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train, sample and score order-k Markov chains over text")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a model from a corpus file (one sequence per line)
    Train {
        corpus: PathBuf,
        /// Number of preceding symbols the next one depends on
        #[arg(short, long, default_value_t = 2)]
        depth: usize,
        /// `chars` or `words`
        #[arg(short, long, default_value = "chars")]
        tokenization: Tokenization,
        /// Snapshot output, defaults to `<corpus stem>.bin`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate sequences from a snapshot
    Generate {
        snapshot: PathBuf,
        #[arg(long, default_value_t = 4)]
        min: usize,
        /// Defaults to `--min`
        #[arg(long)]
        max: Option<usize>,
        #[arg(short, long, default_value_t = 10)]
        count: usize,
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(short, long, default_value = "chars")]
        tokenization: Tokenization,
    },
    /// Score a text against a snapshot
    Score {
        snapshot: PathBuf,
        text: String,
        #[arg(short, long, default_value = "chars")]
        tokenization: Tokenization,
    },
    /// Print the size of a snapshot
    Inspect { snapshot: PathBuf },
}

fn load_model(path: &Path) -> Result<MarkovModel<String>, Box<dyn std::error::Error>> {
    Ok(MarkovModel::from_snapshot(Snapshot::load(path)?)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Train { corpus, depth, tokenization, output } => {
            let lines = read_lines(&corpus)?;
            let model = train_lines(lines, depth, tokenization)?;
            let output = match output {
                Some(path) => path,
                None => sibling_path(&corpus, "bin")?,
            };
            model.to_snapshot().save(&output)?;
            info!(
                "{} symbols, {} prefixes written to {}",
                model.symbol_count(),
                model.prefix_count(),
                output.display()
            );
        }
        Command::Generate { snapshot, min, max, count, seed, tokenization } => {
            let mut model = load_model(&snapshot)?;
            let input = GenerationInput::new(min, max.unwrap_or(min))?;

            // one RNG for the whole batch
            match seed {
                Some(seed) => {
                    let mut rng = StdRng::seed_from_u64(seed);
                    for _ in 0..count {
                        let generated = model.generate_with(&mut rng, input.min_length(), input.max_length())?;
                        println!("{}", tokenization.join(&generated));
                    }
                }
                None => {
                    for _ in 0..count {
                        println!("{}", tokenization.join(&model.generate_from(&input)));
                    }
                }
            }
        }
        Command::Score { snapshot, text, tokenization } => {
            let model = load_model(&snapshot)?;
            println!("{}", model.score(&tokenization.split(&text)));
        }
        Command::Inspect { snapshot } => {
            let model = load_model(&snapshot)?;
            println!("depth:    {}", model.depth());
            println!("symbols:  {}", model.symbol_count());
            println!("prefixes: {}", model.prefix_count());
        }
    }

    Ok(())
}
