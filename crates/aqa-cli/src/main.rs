//! aqa CLI.
//!
//! Thin command surface over the same crates the Control API wires up --
//! presentation (tables, colors, progress bars) is explicitly out of
//! scope, so every subcommand prints one JSON document to stdout and sets
//! the process exit code.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use aqa_core::Plan;
use aqa_generate::{Generator, GeneratorOptions};
use aqa_llm::{MockProvider, Provider};
use aqa_orchestrate::{run_plan, RunOptions};
use aqa_storage::{FileCacheStore, HistoryListFilter};
use aqa_validate::{ValidationMode, Validator};

#[derive(Parser)]
#[command(name = "aqa", about = "autonomous quality agent: plan generation, validation, execution")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a plan from a natural-language requirement.
    Generate {
        #[arg(short, long)]
        requirement: String,
        #[arg(short, long)]
        base_url: String,
        #[arg(long)]
        skip_cache: bool,
    },
    /// Validate a plan file.
    Validate {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(short, long, default_value = "default")]
        mode: String,
    },
    /// Execute a plan file via the external executor binary.
    Execute {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long)]
        runner: Option<String>,
    },
    /// Inspect the Execution History.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    List {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    Get {
        id: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Generate { requirement, base_url, skip_cache } => {
            run_generate(&requirement, &base_url, skip_cache).await
        }
        Commands::Validate { file, mode } => run_validate(&file, &mode),
        Commands::Execute { file, runner } => run_execute(&file, runner).await,
        Commands::History { action } => run_history(action),
    };

    process::exit(exit_code);
}

fn parse_mode(mode: &str) -> Result<ValidationMode, i32> {
    match mode {
        "strict" => Ok(ValidationMode::Strict),
        "default" => Ok(ValidationMode::Default),
        "lenient" => Ok(ValidationMode::Lenient),
        other => {
            eprintln!("unknown validation mode '{other}'");
            Err(2)
        }
    }
}

async fn run_generate(requirement: &str, base_url: &str, skip_cache: bool) -> i32 {
    let provider: Arc<dyn Provider> = if std::env::var("AQA_LLM_MODE").as_deref() == Ok("mock") {
        Arc::new(MockProvider::new("{}"))
    } else {
        eprintln!("no real provider configured for the CLI; set AQA_LLM_MODE=mock or use the server");
        return 2;
    };
    let cache = match FileCacheStore::new("./.aqa/storage/cache", true) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("could not open cache: {e}");
            return 3;
        }
    };
    let generator = Generator::new(provider, cache);
    let options = GeneratorOptions { skip_cache, ..Default::default() };

    match generator.generate(requirement, base_url, &options).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result.plan).unwrap());
            0
        }
        Err(e) => {
            eprintln!("generation failed: {e}");
            1
        }
    }
}

fn run_validate(file: &PathBuf, mode: &str) -> i32 {
    let mode = match parse_mode(mode) {
        Ok(m) => m,
        Err(code) => return code,
    };
    let text = match std::fs::read_to_string(file) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("could not read '{}': {e}", file.display());
            return 3;
        }
    };

    let validator = Validator::new(mode);
    let result = validator.validate_json(&text);
    println!(
        "{}",
        serde_json::json!({
            "valid": result.ok,
            "errors": result.errors,
            "warnings": result.warnings,
            "stats": result.stats,
        })
    );
    if result.ok {
        0
    } else {
        2
    }
}

async fn run_execute(file: &PathBuf, runner: Option<String>) -> i32 {
    let text = match std::fs::read_to_string(file) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("could not read '{}': {e}", file.display());
            return 3;
        }
    };
    let plan: Plan = match serde_json::from_str(&text) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("invalid plan: {e}");
            return 2;
        }
    };

    let options = RunOptions { executor_override: runner, ..Default::default() };
    match run_plan(&plan, &options).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result).unwrap());
            if result.success {
                0
            } else {
                1
            }
        }
        Err(e) => {
            eprintln!("execution failed: {e}");
            1
        }
    }
}

fn run_history(action: HistoryAction) -> i32 {
    let store = match aqa_storage::build_history_store(None) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("could not open history store: {e}");
            return 3;
        }
    };

    match action {
        HistoryAction::List { limit } => {
            let filter = HistoryListFilter { limit, ..Default::default() };
            match store.list(&filter) {
                Ok(records) => {
                    println!("{}", serde_json::to_string_pretty(&records).unwrap());
                    0
                }
                Err(e) => {
                    eprintln!("{e}");
                    1
                }
            }
        }
        HistoryAction::Get { id } => match store.get(&id) {
            Ok(record) => {
                println!("{}", serde_json::to_string_pretty(&record).unwrap());
                0
            }
            Err(e) => {
                eprintln!("{e}");
                1
            }
        },
    }
}
