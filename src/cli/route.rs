use std::error::Error;

use tokio::sync::mpsc;

use crate::core::config::Config;
use crate::core::routing::{RoutingResolver, RoutingResult};

pub fn describe_route(result: &RoutingResult) -> Vec<String> {
    let mut lines = vec![
        format!("Endpoint: {}", result.endpoint),
        format!("Name: {}", result.name),
    ];
    if let Some(kind) = result.kind {
        lines.push(format!("Type: {kind}"));
    }
    if let Some(confidence) = result.confidence {
        lines.push(format!("Confidence: {confidence:.2}"));
    }
    lines
}

pub async fn show_route(
    config: Config,
    query: Vec<String>,
    endpoint_override: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let query = query.join(" ");
    if query.trim().is_empty() {
        eprintln!("Usage: nlweb-chat route <query>");
        std::process::exit(1);
    }

    let (diagnostic_tx, mut diagnostics) = mpsc::unbounded_channel();
    let mut resolver = RoutingResolver::from_config(&config)?;
    resolver.set_diagnostic_sender(diagnostic_tx);

    let result = resolver
        .resolve(&query, endpoint_override.as_deref())
        .await;
    while let Ok(diagnostic) = diagnostics.try_recv() {
        eprintln!("⚠️  {}; using the default endpoint", diagnostic.reason);
    }
    for line in describe_route(&result) {
        println!("{line}");
    }
    Ok(())
}
