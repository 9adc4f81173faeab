//! GeneScore CLI

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use genescore_eval::{
    config::Config,
    items::{load_items_from_file, QuestionType, Reference, ScoringItem},
    prompts::{render_prompt, QuestionRecord},
    runner::Evaluator,
};

#[derive(Parser)]
#[command(name = "genescore")]
#[command(about = "Score model answers to gene-biology questions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single prediction
    Score {
        /// Question type (single_choice, multiple_choice, designation, expression, go_annotation, summary)
        #[arg(short = 't', long = "type")]
        question_type: QuestionType,

        /// Gold answer as JSON
        #[arg(short, long)]
        reference: String,

        /// Raw model output
        #[arg(short, long)]
        prediction: String,
    },

    /// Score every item of a JSON Lines file
    ScoreFile {
        /// Input items (JSON Lines)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for per-item results (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of items scored concurrently (overrides config)
        #[arg(long)]
        parallel: Option<usize>,
    },

    /// Render instruction prompts for question records (JSON Lines)
    Prompt {
        /// Input question records
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Generate default configuration file
    InitConfig {
        /// Output path for config file
        #[arg(short, long, default_value = "config/genescore.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so results on stdout stay machine-readable
    let filter = if cli.verbose {
        EnvFilter::new("genescore=debug,genescore_eval=debug,info")
    } else {
        EnvFilter::new("genescore=info,genescore_eval=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Score {
            question_type,
            reference,
            prediction,
        } => {
            let config = load_config(cli.config)?;
            score_one(&config, question_type, &reference, prediction).await?;
        }

        Commands::ScoreFile {
            input,
            output,
            parallel,
        } => {
            let mut config = load_config(cli.config)?;
            if let Some(parallel) = parallel {
                config.runner.parallel_items = parallel;
            }
            score_file(&config, input, output).await?;
        }

        Commands::Prompt { input } => {
            render_prompts(input)?;
        }

        Commands::InitConfig { output } => {
            init_config(output)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => {
            let config = Config::from_file(&path)?;
            tracing::info!("Loaded configuration from {}", path.display());
            config
        }
        None => Config::load_or_default()?,
    };
    Ok(config)
}

async fn score_one(
    config: &Config,
    question_type: QuestionType,
    reference: &str,
    prediction: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let reference = Reference::from_answer_json(question_type, reference)?;
    let evaluator = Evaluator::from_config(config)?;

    let item = ScoringItem::new("cli", reference, prediction);
    let outcome = evaluator.score_item(&item).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if let Some(error) = outcome.error {
        eprintln!("Error: {}", error.message);
        std::process::exit(1);
    }
    Ok(())
}

async fn score_file(
    config: &Config,
    input: PathBuf,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let items = load_items_from_file(&input)?;
    if items.is_empty() {
        eprintln!("Error: No items in {}", input.display());
        std::process::exit(1);
    }

    let evaluator = Evaluator::from_config(config)?;
    let outcomes = evaluator.score_all(items).await;

    let mut writer: Box<dyn Write> = match &output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Box::new(BufWriter::new(File::create(path)?))
        }
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    for outcome in &outcomes {
        writeln!(writer, "{}", serde_json::to_string(outcome)?)?;
    }
    writer.flush()?;

    if let Some(path) = &output {
        tracing::info!("Results written to {}", path.display());
    }
    Ok(())
}

#[derive(Serialize)]
struct RenderedPrompt<'a> {
    question_type: &'a str,
    prompt: String,
}

fn render_prompts(input: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(&input)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: QuestionRecord = serde_json::from_str(line)
            .map_err(|e| format!("{} line {}: {}", input.display(), idx + 1, e))?;
        let rendered = RenderedPrompt {
            question_type: &record.question_type,
            prompt: render_prompt(&record),
        };
        writeln!(out, "{}", serde_json::to_string(&rendered)?)?;
    }
    Ok(())
}

fn init_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    config.save_toml(&output)?;
    println!("Configuration written to: {}", output.display());
    Ok(())
}
