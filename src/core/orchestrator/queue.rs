use super::{QueryOptions, QueryOrchestrator, QueryOutcome};
use crate::core::message::Message;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug)]
pub enum QueueCommand {
    Submit { text: String, options: QueryOptions },
    ClearConversation,
    History,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryEvent {
    Finished(QueryOutcome),
    Cleared,
    History(Vec<Message>),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("query worker has stopped")]
pub struct QueueClosed;

/// Handle for feeding the worker started by [`spawn_query_worker`].
#[derive(Clone)]
pub struct QueryQueue {
    commands: mpsc::UnboundedSender<QueueCommand>,
}

impl QueryQueue {
    pub fn submit(&self, text: impl Into<String>, options: QueryOptions) -> Result<(), QueueClosed> {
        self.send(QueueCommand::Submit {
            text: text.into(),
            options,
        })
    }

    pub fn clear(&self) -> Result<(), QueueClosed> {
        self.send(QueueCommand::ClearConversation)
    }

    pub fn request_history(&self) -> Result<(), QueueClosed> {
        self.send(QueueCommand::History)
    }

    pub fn send(&self, command: QueueCommand) -> Result<(), QueueClosed> {
        self.commands.send(command).map_err(|_| QueueClosed)
    }
}

/// Moves `orchestrator` into a task that handles commands strictly in the
/// order they were queued, one at a time. The task ends once every
/// [`QueryQueue`] is dropped and hands the orchestrator back.
pub fn spawn_query_worker(
    mut orchestrator: QueryOrchestrator,
) -> (
    QueryQueue,
    mpsc::UnboundedReceiver<QueryEvent>,
    JoinHandle<QueryOrchestrator>,
) {
    let (command_tx, mut command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            let event = match command {
                QueueCommand::Submit { text, options } => {
                    QueryEvent::Finished(orchestrator.submit(&text, &options).await)
                }
                QueueCommand::ClearConversation => {
                    orchestrator.clear_conversation();
                    QueryEvent::Cleared
                }
                QueueCommand::History => QueryEvent::History(orchestrator.history()),
            };
            if event_tx.send(event).is_err() {
                debug!("Query event receiver dropped");
            }
        }
        orchestrator
    });

    (
        QueryQueue {
            commands: command_tx,
        },
        event_rx,
        handle,
    )
}
