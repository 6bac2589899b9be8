use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use serde::Serialize;

use spelling_engine::config::Config;
use spelling_engine::logging::init_tracing;
use spelling_engine::{PracticeEngine, SqliteStore};

const USAGE: &str = "usage:
  spelling-admin import <user-id> <file>
  spelling-admin preview <user-id> <list-id> [max-words]
  spelling-admin stats <user-id>";

enum Command {
    Import { user_id: String, file: PathBuf },
    Preview { user_id: String, list_id: String, max_words: Option<usize> },
    Stats { user_id: String },
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    match args {
        [cmd, user_id, file] if cmd == "import" => Ok(Command::Import {
            user_id: user_id.clone(),
            file: PathBuf::from(file),
        }),
        [cmd, user_id, list_id] if cmd == "preview" => Ok(Command::Preview {
            user_id: user_id.clone(),
            list_id: list_id.clone(),
            max_words: None,
        }),
        [cmd, user_id, list_id, max] if cmd == "preview" => {
            let max_words = max
                .parse::<usize>()
                .map_err(|_| format!("invalid max-words: {max}"))?;
            Ok(Command::Preview {
                user_id: user_id.clone(),
                list_id: list_id.clone(),
                max_words: Some(max_words),
            })
        }
        [cmd, user_id] if cmd == "stats" => Ok(Command::Stats {
            user_id: user_id.clone(),
        }),
        _ => Err(USAGE.to_string()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

async fn run(engine: &PracticeEngine, command: Command) -> Result<(), String> {
    match command {
        Command::Import { user_id, file } => {
            let content = tokio::fs::read_to_string(&file)
                .await
                .map_err(|e| format!("failed to read {}: {e}", file.display()))?;
            let lists = engine
                .import_word_lists(&user_id, &content)
                .await
                .map_err(|e| e.to_string())?;
            print_json(&lists)
        }
        Command::Preview { user_id, list_id, max_words } => {
            let max_words = max_words.unwrap_or(engine.config().default_max_words);
            let words = engine
                .build_session(&user_id, &list_id, max_words)
                .await
                .map_err(|e| e.to_string())?;
            print_json(&words)
        }
        Command::Stats { user_id } => {
            let stats = engine
                .user_statistics(&user_id)
                .await
                .map_err(|e| e.to_string())?;
            print_json(&stats)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.log_level);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    let store = match SqliteStore::open(&config.db_path).await {
        Ok(store) => Arc::new(store),
        Err(err) => {
            tracing::error!(path = %config.db_path.display(), error = %err, "failed to open database");
            return ExitCode::FAILURE;
        }
    };
    let engine = PracticeEngine::new(store.clone(), config.engine.clone());

    let result = run(&engine, command).await;
    store.close().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            tracing::error!(error = %message, "command failed");
            ExitCode::FAILURE
        }
    }
}
