use anyhow::Context;
use clap::Args;
use serde_json::json;
use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::services::{DayGenerator, GenerationRequest, ModelOutputGenerator};

#[derive(Args)]
pub struct DaysArgs {
    #[arg(help = "File holding raw generator output")]
    pub file: PathBuf,

    #[arg(long, default_value = "", help = "City the days were generated for")]
    pub city: String,

    #[arg(long, default_value = "", help = "Country the days were generated for")]
    pub country: String,
}

pub async fn handle(args: DaysArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;

    let request = GenerationRequest {
        prompt: String::new(),
        language: None,
        city: args.city,
        country: args.country,
    };
    let days = ModelOutputGenerator::new(raw).generate(&request).await?;

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "success": true, "days": days }))?);
        }
        OutputFormat::Text => {
            for (index, day) in days.iter().enumerate() {
                println!("{}. {}", index, day.day);
                for place in &day.description {
                    println!("   - {}: {}", place.place, place.description);
                }
            }
        }
    }
    Ok(())
}
