//! Drives one query from raw input to an appended assistant message.
//!
//! ```text
//! Idle -> Routing -> Invoking -> Completed
//!                             -> Failed
//! ```
//!
//! Routing cannot fail. Tool invocation failures become an assistant message
//! describing the error; nothing escapes [`QueryOrchestrator::submit`].

mod queue;

pub use queue::{spawn_query_worker, QueryEvent, QueryQueue, QueueClosed, QueueCommand};

use crate::core::conversation::ConversationStore;
use crate::core::message::{Conversation, Message, NewMessage, WidgetInstance};
use crate::core::routing::{RoutingResolver, RoutingResult};
use crate::mcp::client::{McpClientError, ProtocolClient};
use crate::mcp::types::ToolCallResponse;
use crate::mcp::ASK_TOOL;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shown instead of a blank reply when the tool returned no text.
pub const EMPTY_RESPONSE_PLACEHOLDER: &str = "Response received";
pub const QUERY_ARG: &str = "query";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryState {
    #[default]
    Idle,
    Routing,
    Invoking,
    Completed,
    Failed,
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QueryState::Idle => "idle",
            QueryState::Routing => "routing",
            QueryState::Invoking => "invoking",
            QueryState::Completed => "completed",
            QueryState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Per-query overrides supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Skip routing and send the query here.
    pub endpoint_override: Option<String>,
    /// Extra tool arguments. A `query` entry here is always replaced by the
    /// submitted text.
    pub tool_args: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Empty or whitespace-only input; nothing happened.
    Rejected,
    Completed(Message),
    Failed(Message),
}

impl QueryOutcome {
    pub fn message(&self) -> Option<&Message> {
        match self {
            QueryOutcome::Rejected => None,
            QueryOutcome::Completed(message) | QueryOutcome::Failed(message) => Some(message),
        }
    }
}

pub struct QueryOrchestrator {
    resolver: Arc<RoutingResolver>,
    client: Arc<ProtocolClient>,
    store: ConversationStore,
    state: QueryState,
    awaiting_response: bool,
}

impl QueryOrchestrator {
    pub fn new(
        resolver: Arc<RoutingResolver>,
        client: Arc<ProtocolClient>,
        store: ConversationStore,
    ) -> Self {
        Self {
            resolver,
            client,
            store,
            state: QueryState::Idle,
            awaiting_response: false,
        }
    }

    pub fn state(&self) -> QueryState {
        self.state
    }

    /// True while a query is between submission and its assistant reply.
    pub fn awaiting_response(&self) -> bool {
        self.awaiting_response
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn conversation(&mut self) -> &Conversation {
        self.store.current_conversation()
    }

    pub fn history(&self) -> Vec<Message> {
        self.store.history(None)
    }

    pub fn clear_conversation(&mut self) {
        self.store.clear();
        self.state = QueryState::Idle;
    }

    pub async fn submit(&mut self, text: &str, options: &QueryOptions) -> QueryOutcome {
        if text.trim().is_empty() {
            return QueryOutcome::Rejected;
        }

        self.awaiting_response = true;
        self.store.add_message(NewMessage::user(text));

        self.state = QueryState::Routing;
        let route = self
            .resolver
            .resolve(text, options.endpoint_override.as_deref())
            .await;
        debug!(endpoint = %route.endpoint, name = %route.name, "Resolved route");

        self.state = QueryState::Invoking;
        let args = tool_arguments(text, &options.tool_args);
        let outcome = match self.client.call_tool(&route.endpoint, ASK_TOOL, &args).await {
            Ok(response) => {
                let message = self.store.add_message(assistant_reply(&route, &response));
                self.state = QueryState::Completed;
                QueryOutcome::Completed(message)
            }
            Err(err) => {
                let message = self.store.add_message(error_reply(&route, &err));
                self.state = QueryState::Failed;
                QueryOutcome::Failed(message)
            }
        };

        self.awaiting_response = false;
        outcome
    }
}

/// Caller arguments first, then `query`, so the submitted text always wins.
fn tool_arguments(text: &str, extra: &Map<String, Value>) -> Map<String, Value> {
    let mut args = extra.clone();
    args.insert(QUERY_ARG.to_string(), Value::String(text.to_string()));
    args
}

fn assistant_reply(route: &RoutingResult, response: &ToolCallResponse) -> NewMessage {
    if response.is_error() {
        warn!(endpoint = %route.endpoint, "Tool reported an error result");
    }

    let mut content = response.text();
    if content.is_empty() {
        content = EMPTY_RESPONSE_PLACEHOLDER.to_string();
    }

    let mut message =
        NewMessage::assistant(content).with_source(route.endpoint.clone(), route.name.clone());
    if let Some(template) = response.output_template() {
        message = message.with_widgets(vec![WidgetInstance::new(
            template,
            route.endpoint.clone(),
            response.widget_payload(),
        )]);
    }
    message
}

fn error_reply(route: &RoutingResult, err: &McpClientError) -> NewMessage {
    warn!(endpoint = %route.endpoint, error = %err, "Query failed");
    NewMessage::assistant(format!("Error: {err}"))
}
