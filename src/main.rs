use anyhow::{Context, Result};
use dialogue2audio::services::setup::prompt_request;
use dialogue2audio::{Config, DialogueError, DialogueRequest, DialogueService};
use std::io::Read;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let body = match e.downcast_ref::<DialogueError>() {
                Some(err) => err.to_body(),
                None => DialogueError::Other(e).to_body(),
            };
            eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or(body.error));
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    // 1. Load config; credentials are checked before the request is read
    let config = Config::load().map_err(|e| DialogueError::Configuration(format!("{:#}", e)))?;
    let service = DialogueService::from_config(&config)?;

    // 2. Request from file / stdin, or interactively
    let request = match std::env::args().nth(1) {
        Some(source) => DialogueRequest::from_json(&read_source(&source)?)?,
        None => prompt_request(&config)?,
    };

    // 3. Generate
    let response = service.generate(&request).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .context("Failed to read request from stdin")?;
        Ok(body)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))
    }
}
