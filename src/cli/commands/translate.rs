use anyhow::Context;
use clap::Args;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::itinerary::ItineraryPatch;

#[derive(Args)]
pub struct TranslateArgs {
    #[arg(help = "Patch body, e.g. '{\"itinerary.0.description.1.checked\": \"true\"}'")]
    pub payload: String,
}

pub fn handle(args: TranslateArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let payload: Value = serde_json::from_str(&args.payload).context("payload is not valid JSON")?;
    let patch = ItineraryPatch::from_json(&payload)?;

    let mut rows = Vec::with_capacity(patch.instructions().len());
    for instruction in patch.instructions() {
        rows.push((instruction.path.to_string(), instruction.json_value()?));
    }

    match output_format {
        OutputFormat::Json => {
            let sets: Vec<Value> = rows
                .iter()
                .map(|(path, value)| json!({ "path": path, "value": value }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "success": true, "set": sets }))?);
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("✓ Empty patch, nothing to set");
            }
            for (path, value) in rows {
                println!("{} = {}", path, value);
            }
        }
    }
    Ok(())
}
