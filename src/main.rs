//! hanbench CLI - run the three-task evaluation against a served model.

use anyhow::{Context, Result};
use clap::Parser;
use hanbench::client::{BackendRegistry, ChatBackend};
use hanbench::models::{Config, ScoreSummary};
use hanbench::pipeline::{run_task1, run_task2, run_task3, RunOptions};
use hanbench::store;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "hanbench")]
#[command(version)]
#[command(about = "Teacher/student evaluation harness for Chinese-language comprehension tasks")]
struct Cli {
    /// Model ID of the teacher, as known to the serving endpoint
    #[arg(long)]
    model: String,

    /// Display name for the teacher (defaults to the model ID's basename,
    /// lowercased)
    #[arg(long)]
    model_name: Option<String>,

    /// Directory containing datasets/task{1,2,3}.jsonl
    #[arg(long)]
    data_dir: PathBuf,

    /// Directory to write results under
    #[arg(long, default_value = "results")]
    save_dir: PathBuf,

    /// Path to the configuration file (built-in defaults if absent)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Maximum tokens to generate per response
    #[arg(long, default_value_t = 4096)]
    max_length: u32,

    /// Number of test iterations over each dataset
    #[arg(long, default_value_t = 1)]
    iterations: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

fn model_display_name(model_id: &str) -> String {
    model_id
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(model_id)
        .to_lowercase()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    let registry = BackendRegistry::from_config(&config)?;

    let model_name = cli
        .model_name
        .unwrap_or_else(|| model_display_name(&cli.model));

    let results_dir = cli.save_dir.join(format!(
        "{}_{}_{}",
        model_name, cli.iterations, cli.max_length
    ));
    std::fs::create_dir_all(&results_dir)
        .with_context(|| format!("Failed to create results dir {results_dir:?}"))?;

    info!(model = %model_name, "Initializing teacher backend");
    let mut teacher = registry.teacher_client(&model_name, &cli.model)?;

    let opts = RunOptions {
        iterations: cli.iterations,
        max_new_tokens: cli.max_length,
    };

    let task1 = run_task1(&teacher, &cli.data_dir, &results_dir, &opts)?;
    let task2 = run_task2(&teacher, &cli.data_dir, &results_dir, &opts)?;
    let task3 = run_task3(
        &mut teacher,
        &config.students,
        |spec| {
            registry
                .student_client(spec)
                .map(|client| Box::new(client) as Box<dyn ChatBackend>)
        },
        &cli.data_dir,
        &results_dir,
        &opts,
    )?;
    info!("Evaluation completed successfully");

    let summary = ScoreSummary {
        task1,
        task2,
        task3,
    };
    let scores_path = results_dir.join("score.json");
    store::save_json_pretty(&scores_path, &summary)?;
    info!(path = %scores_path.display(), "Accuracy scores saved");

    Ok(())
}
