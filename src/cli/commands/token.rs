use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::auth::{generate_jwt, Claims, JwtKeys};
use crate::cli::OutputFormat;
use crate::config;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, help = "User id to put in the token subject")]
    pub sub: String,

    #[arg(long, help = "Hours until expiry (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
    pub hours: Option<u64>,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config::config().security;
    let keys = JwtKeys::from_config(security).context("JWT_SECRET/JWT_ALGORITHM are not usable")?;

    let hours = args.hours.unwrap_or(security.jwt_expiry_hours);
    let claims = Claims::new(&args.sub, hours);
    let token = generate_jwt(&claims, &keys)?;

    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "success": true,
                    "sub": claims.sub,
                    "expires_at": claims.exp,
                    "token": token
                }))?
            );
        }
        OutputFormat::Text => println!("{}", token),
    }
    Ok(())
}
