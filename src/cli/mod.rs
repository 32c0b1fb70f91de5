pub mod commands;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "globetrek")]
#[command(about = "GlobeTrek CLI - developer tools for the itinerary API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Issue a bearer token signed with the configured secret")]
    Token(commands::token::TokenArgs),

    #[command(about = "Show the field updates a patch body translates to")]
    Translate(commands::translate::TranslateArgs),

    #[command(about = "Parse saved generator output into itinerary days")]
    Days(commands::days::DaysArgs),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Token(args) => commands::token::handle(args, output_format),
        Commands::Translate(args) => commands::translate::handle(args, output_format),
        Commands::Days(args) => commands::days::handle(args, output_format).await,
    }
}
