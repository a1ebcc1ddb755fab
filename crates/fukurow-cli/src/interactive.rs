//! Interactive CLI mode

use crate::commands::{Cli, CommandExecutor};
use anyhow::Result;
use clap::Parser;
use std::io::{self, Write};

/// Interactive CLI session
pub struct InteractiveSession {
    executor: CommandExecutor,
}

impl InteractiveSession {
    pub fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }

    /// Start interactive session
    pub async fn run(&mut self) -> Result<()> {
        println!("Welcome to Fukurow EL Interactive Mode");
        println!("Type 'help' for available commands, 'quit' to exit");
        println!("{}", "=".repeat(50));

        loop {
            print!("fukurow-el> ");
            io::stdout().flush()?;

            let mut input = String::new();
            if io::stdin().read_line(&mut input)? == 0 {
                break;
            }
            let input = input.trim();

            if input.is_empty() {
                continue;
            }

            match input {
                "quit" | "exit" | "q" => {
                    println!("Goodbye!");
                    break;
                }
                "help" | "h" => {
                    self.show_help();
                }
                "clear" => {
                    print!("\x1B[2J\x1B[1;1H");
                }
                _ => {
                    if let Err(e) = self.execute_command(input).await {
                        eprintln!("Error: {}", e);
                    }
                }
            }
        }

        Ok(())
    }

    async fn execute_command(&mut self, input: &str) -> Result<()> {
        let cli = match parse_line(input)? {
            Ok(cli) => cli,
            Err(e) => {
                eprintln!("Parse error: {}", e);
                return Ok(());
            }
        };

        self.executor.execute(cli).await?;
        Ok(())
    }

    fn show_help(&self) {
        println!("Available commands:");
        println!("  classify <ontology.json>                         Classify and print the taxonomy");
        println!("  consistency <ontology.json>                      Check consistency");
        println!("  explain <ontology.json> --sub IRI --sup IRI [-r] Explain a subsumption");
        println!("  equivalents <ontology.json> --query <json>       Equivalent named classes");
        println!("  info                                             Show system information");
        println!("  help                                             Show this help");
        println!("  clear                                            Clear screen");
        println!("  quit                                             Exit interactive mode");
        println!();
        println!("Global options: --config <file.json> --workers N --format text|json|json-pretty");
    }
}

/// Split a shell-style line and parse it as if it followed the program name
pub fn parse_line(input: &str) -> Result<Result<Cli, clap::Error>> {
    let mut args = vec!["fukurow-el".to_string()];
    args.extend(shell_words::split(input)?);
    Ok(Cli::try_parse_from(args))
}

/// Start interactive mode
pub async fn start_interactive(executor: CommandExecutor) -> Result<()> {
    let mut session = InteractiveSession::new(executor);
    session.run().await
}
