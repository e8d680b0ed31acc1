//! nlweb-chat is a terminal client for natural-language search endpoints that
//! speak a JSON-RPC tool protocol.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`mcp`] performs JSON-RPC exchanges with tool-serving endpoints
//!   (handshake, tool listing, tool calls).
//! - [`core`] decides where each query goes, keeps the conversation and its
//!   widget state durable, and drives a query from input to reply.
//! - [`ui`] renders messages and widgets as plain text.
//! - [`cli`] parses arguments and runs the interactive and one-shot commands.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which composes the services in
//! [`core::services`] and hands queries to [`core::orchestrator`].

pub mod cli;
pub mod core;
pub mod mcp;
pub mod ui;
pub mod utils;
