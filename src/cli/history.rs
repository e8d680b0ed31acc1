use std::error::Error;

use crate::core::config::Config;
use crate::core::services::AppServices;
use crate::ui::render::render_message;

pub fn show_history(config: Config, conversation_id: Option<&str>) -> Result<(), Box<dyn Error>> {
    let mut services = AppServices::from_config(config, None)?;
    let orchestrator = services.orchestrator()?;
    let messages = orchestrator.store().history(conversation_id);

    if messages.is_empty() {
        println!("No messages yet.");
        return Ok(());
    }
    for message in &messages {
        println!("{}", message.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
        for line in render_message(message) {
            println!("{line}");
        }
        println!();
    }
    Ok(())
}

pub fn clear_history(config: Config) -> Result<(), Box<dyn Error>> {
    let mut services = AppServices::from_config(config, None)?;
    let mut orchestrator = services.orchestrator()?;
    orchestrator.clear_conversation();
    println!("✅ Conversation cleared");
    Ok(())
}
