//! Chat command handler.
//!
//! Line-oriented interactive loop for manually exercising the pipeline:
//! one query per line, "exit" or "quit" to leave, only the summary is
//! printed.

use clap::Args;
use propchat_core::{config::AppConfig, AppResult};
use propchat_listings::open_pipeline;
use std::io::{BufRead, Write};

/// Interactive query loop
#[derive(Args, Debug)]
pub struct ChatCommand {}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        config.validate()?;

        // The pipeline is built once; every query reuses it
        let pipeline = open_pipeline(config).await?;

        println!("Propchat — grounded summary + cards demo.");
        println!("Type 'exit' to quit.");

        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();

        loop {
            print!("\nEnter query: ");
            stdout.flush()?;

            let mut line = String::new();
            let read = stdin.lock().read_line(&mut line)?;
            if read == 0 {
                // EOF behaves like the exit sentinel
                break;
            }

            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
                break;
            }

            match pipeline.handle(query).await {
                Ok(payload) => {
                    println!("\n=== Summary ===");
                    println!("{}", payload.summary);
                }
                Err(e) => {
                    tracing::error!("Query failed: {}", e);
                    println!("Query failed: {}", e);
                }
            }
        }

        Ok(())
    }
}
