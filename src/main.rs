//! Phrasebank console entry point
//!
//! `phrasebank` runs the interactive shell; `phrasebank register <email> <password>`
//! seeds an account and exits.

mod app;
mod components;
mod context;
mod store;
mod tree;

use std::sync::Arc;

use phrasebank_lib::config::AppConfig;
use phrasebank_lib::{commands, AppState};
use rolling_logger::LoggerConfig;
use tokio::io::{AsyncBufReadExt, BufReader};

use app::App;
use context::AppContext;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("phrasebank: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let config = AppConfig::load().map_err(|e| e.to_string())?;

    match rolling_logger::init(LoggerConfig::new(&config.log_dir)) {
        Ok(path) => log::info!("Logging to {}", path.display()),
        Err(e) => eprintln!("Logger unavailable: {}", e),
    }

    let state = AppState::open(config).await.map_err(|e| e.to_string())?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [command, identifier, secret] = args.as_slice() {
        if command == "register" {
            let user = commands::register_user(&state, identifier.clone(), secret.clone())
                .await
                .map_err(|e| e.to_string())?;
            println!("Registered {} (#{})", user.identifier, user.id);
            return Ok(());
        }
    }

    match commands::backfill_category_index(&state).await {
        Ok(0) => {}
        Ok(count) => log::info!("Backfilled category index for {} materials", count),
        Err(e) => log::warn!("Category index backfill failed: {}", e),
    }

    let mut app = App::new(AppContext::new(Arc::new(state)));
    println!("{}", app.handle_line("/").await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.map_err(|e| e.to_string())? {
        if matches!(line.trim(), "quit" | "exit") {
            break;
        }
        println!("{}\n", app.handle_line(&line).await);
    }
    log::info!("Shell closed");
    Ok(())
}
