//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod history;
pub mod route;
pub mod say;
pub mod tools;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::chat::run_chat;
use crate::cli::history::{clear_history, show_history};
use crate::cli::route::show_route;
use crate::cli::say::run_say;
use crate::cli::tools::list_tools;
use crate::core::config::{Config, ConfigKey};
use crate::core::orchestrator::QueryOptions;
use crate::core::params::QueryParams;
use crate::utils::logging::init_tracing;

#[derive(Parser)]
#[command(name = "nlweb-chat")]
#[command(version)]
#[command(about = "Chat with NLWeb and tool-serving endpoints from the terminal")]
#[command(
    long_about = "nlweb-chat sends each query to a routing service that picks the endpoint \
best suited to answer it, then asks that endpoint over JSON-RPC. Replies are shown as text, \
with structured results rendered as lists.\n\n\
Environment Variables:\n\
  NLWEB_ROUTING_URL        Routing service URL (overrides config)\n\
  NLWEB_DEFAULT_ENDPOINT   Endpoint used when routing has no answer\n\
  NLWEB_DATA_DIR           Directory for stored conversations\n\
  RUST_LOG                 Log filter (defaults to nlweb_chat=warn)\n\n\
Chat commands:\n\
  /history          Show the current conversation\n\
  /clear            Delete the conversation and start over\n\
  /quit             Leave the session"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Send queries straight to this endpoint instead of routing them
    #[arg(short = 'e', long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Restrict results to a site (passed to the tool)
    #[arg(short = 's', long, global = true)]
    pub site: Option<String>,

    /// Number of results to ask for
    #[arg(short = 'n', long, global = true, value_name = "COUNT")]
    pub num_results: Option<i64>,

    /// Extra tool arguments as a query string, e.g. "site=a&mode=list"
    #[arg(long, global = true, value_name = "QUERY")]
    pub params: Option<String>,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Log debug output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start an interactive chat session (default)
    Chat,
    /// Ask a single question without touching the stored conversation
    Say {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Show the tools an endpoint exposes
    Tools,
    /// Show which endpoint a query would be routed to
    Route {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },
    /// Print the stored conversation
    History {
        /// Conversation id (defaults to the current conversation)
        #[arg(long)]
        id: Option<String>,
    },
    /// Delete the stored conversation
    Clear,
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

impl Args {
    /// `--params` first, then the dedicated flags, which win on conflict.
    pub fn query_params(&self) -> QueryParams {
        let mut params = self
            .params
            .as_deref()
            .map(QueryParams::from_query_string)
            .unwrap_or_default();
        if let Some(endpoint) = &self.endpoint {
            params.set("endpoint".to_string(), endpoint.clone());
        }
        if let Some(site) = &self.site {
            params.set("site".to_string(), site.clone());
        }
        if let Some(count) = self.num_results {
            params.num_results = Some(count);
        }
        params
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::from(&self.query_params())
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    if let Err(err) = init_tracing(args.log.as_deref(), args.verbose) {
        eprintln!("⚠️  {err}");
    }

    let options = args.query_options();
    let command = args.command.unwrap_or(Commands::Chat);

    match command {
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            let Some(key) = key else {
                config.print_all();
                return Ok(());
            };
            let key = match ConfigKey::parse(&key) {
                Ok(key) => key,
                Err(err) => {
                    eprintln!("❌ {err}");
                    std::process::exit(1);
                }
            };
            let value = value.join(" ");
            if value.trim().is_empty() {
                config.print_all();
                return Ok(());
            }
            if let Err(err) = config.set_value(key, &value) {
                eprintln!("❌ {err}");
                std::process::exit(1);
            }
            config.save()?;
            println!("✅ Set {} to: {}", key.as_str(), value.trim());
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            let key = match ConfigKey::parse(&key) {
                Ok(key) => key,
                Err(err) => {
                    eprintln!("❌ {err}");
                    std::process::exit(1);
                }
            };
            config.unset_value(key);
            config.save()?;
            println!("✅ Unset {}", key.as_str());
            Ok(())
        }
        command => {
            let config = Config::load()?.with_env_overrides();
            match command {
                Commands::Chat => run_chat(config, options).await,
                Commands::Say { prompt } => run_say(config, prompt, options).await,
                Commands::Tools => list_tools(config, options.endpoint_override).await,
                Commands::Route { query } => {
                    show_route(config, query, options.endpoint_override).await
                }
                Commands::History { id } => show_history(config, id.as_deref()),
                Commands::Clear => clear_history(config),
                Commands::Set { .. } | Commands::Unset { .. } => Ok(()),
            }
        }
    }
}
