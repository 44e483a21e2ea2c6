//! FordPass demo CLI.
//!
//! Prints vehicle status or runs a remote command:
//!
//! ```text
//! fordpass <username> <password> <vin> [status|lock|unlock|start|stop]
//! ```
//!
//! Pass `-` as the password to be prompted interactively. A `.env` file is
//! loaded if present; set `RUST_LOG` to control log output.

use std::io;

use anyhow::{bail, Context, Result};
use fordpass_core::Vehicle;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "usage: fordpass <username> <password> <vin> [status|lock|unlock|start|stop]";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 || args.len() > 5 {
        bail!("{USAGE}");
    }

    let username = args[1].clone();
    let password = if args[2] == "-" {
        rpassword::prompt_password("Password: ").context("Failed to read password")?
    } else {
        args[2].clone()
    };
    let vin = args[3].clone();
    let command = args.get(4).map(String::as_str).unwrap_or("status");

    let mut vehicle = Vehicle::new(username, password, vin)?;

    match command {
        "status" => {
            let status = vehicle.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        "lock" | "unlock" | "start" | "stop" => {
            info!(command, "issuing remote command");
            let ok = match command {
                "lock" => vehicle.lock().await?,
                "unlock" => vehicle.unlock().await?,
                "start" => vehicle.start().await?,
                _ => vehicle.stop().await?,
            };
            if ok {
                println!("{command}: completed");
            } else {
                println!("{command}: failed");
                std::process::exit(1);
            }
        }
        other => bail!("unknown command '{other}'\n{USAGE}"),
    }

    Ok(())
}
