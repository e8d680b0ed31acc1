use std::error::Error;
use std::time::Duration;

use crate::core::config::Config;
use crate::mcp::client::ProtocolClient;
use crate::mcp::types::Tool;

fn describe_tool(tool: &Tool) -> String {
    let description = tool.description.lines().next().unwrap_or_default().trim();
    if description.is_empty() {
        format!("  {}", tool.name)
    } else {
        format!("  {} - {description}", tool.name)
    }
}

pub async fn list_tools(config: Config, endpoint: Option<String>) -> Result<(), Box<dyn Error>> {
    let endpoint = endpoint.unwrap_or_else(|| config.default_endpoint());
    let client = ProtocolClient::new(config.tool_timeout_secs.map(Duration::from_secs))?;

    match client.initialize(&endpoint).await? {
        Some(init) => match &init.server_info {
            Some(server) => println!(
                "{} {} (protocol {})",
                server.name, server.version, init.protocol_version
            ),
            None => println!("{endpoint} (protocol {})", init.protocol_version),
        },
        None => println!("{endpoint}"),
    }

    let tools = client.list_tools(&endpoint).await?;
    if tools.is_empty() {
        println!("No tools available.");
        return Ok(());
    }
    println!("Available tools:");
    for tool in &tools {
        println!("{}", describe_tool(tool));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_lines_use_first_description_line() {
        let tool: Tool = serde_json::from_value(json!({
            "name": "ask",
            "description": "Answer a question\nusing the site index",
            "inputSchema": {"type": "object"}
        }))
        .expect("tool");
        assert_eq!(describe_tool(&tool), "  ask - Answer a question");

        let bare: Tool = serde_json::from_value(json!({"name": "list_sites"})).expect("tool");
        assert_eq!(describe_tool(&bare), "  list_sites");
    }
}
