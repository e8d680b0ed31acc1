pub mod client;
pub mod types;

/// Tool every backend exposes for natural-language queries.
pub const ASK_TOOL: &str = "ask";
