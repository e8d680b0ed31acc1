pub mod config;
pub mod conversation;
pub mod message;
pub mod orchestrator;
pub mod params;
pub mod routing;
pub mod services;
pub mod storage;
