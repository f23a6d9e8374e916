pub mod config;
pub mod error;
pub mod gateway;
pub mod history;
pub mod logging;
pub mod providers;
pub mod repl;
pub mod session;

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{debug, info, warn};

use config::Settings;
use gateway::OllamaGateway;
use repl::run_repl;
use session::Session;

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;

    match &settings.langsmith {
        Some(langsmith) => {
            info!(project = %langsmith.project, "LangSmith trace export configured")
        }
        None => debug!("LANGSMITH_API_KEY not set, trace export disabled"),
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
        .context("Failed to initialize HTTP client")?;

    info!(model = %settings.model, base_url = %settings.base_url, "starting parley");

    // Not fatal: the server may come up after us, and a missing model is
    // reported again on the first turn.
    if let Err(err) = providers::ollama::check_model(&client, &settings).await {
        warn!(error = %err, "model availability check failed");
        eprintln!("warning: {err}");
    }

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        run_repl(&client, &settings).await
    } else {
        let gateway = OllamaGateway::new(&client, &settings);
        let mut session = Session::new(&gateway, "oneshot", settings.max_history_messages);
        let prompt = args.join(" ");
        let answer = session.run_turn(&prompt).await?;
        println!("{}", answer.trim());
        Ok(())
    }
}
