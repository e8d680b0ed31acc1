//! One-shot "say" command

use std::error::Error;

use crate::core::config::Config;
use crate::core::orchestrator::{QueryOptions, QueryOutcome};
use crate::core::services::AppServices;
use crate::ui::render::render_message;

pub async fn run_say(
    config: Config,
    prompt: Vec<String>,
    options: QueryOptions,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: nlweb-chat say <prompt>");
        std::process::exit(1);
    }

    let services = AppServices::from_config(config, None)?;
    let mut orchestrator = services.ephemeral_orchestrator();

    match orchestrator.submit(&prompt, &options).await {
        QueryOutcome::Completed(message) => {
            for line in render_message(&message) {
                println!("{line}");
            }
            Ok(())
        }
        QueryOutcome::Failed(message) => {
            eprintln!("❌ {}", message.content);
            std::process::exit(1);
        }
        QueryOutcome::Rejected => Ok(()),
    }
}
