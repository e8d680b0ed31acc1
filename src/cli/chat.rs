//! Line-oriented interactive chat session.

use std::error::Error;
use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::core::config::Config;
use crate::core::message::Message;
use crate::core::orchestrator::{spawn_query_worker, QueryEvent, QueryOptions, QueryOutcome};
use crate::core::routing::RoutingDiagnostic;
use crate::core::services::AppServices;
use crate::ui::render::render_message;

const PROMPT: &str = "> ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput<'a> {
    Query(&'a str),
    Clear,
    History,
    Help,
    Quit,
    Unknown(&'a str),
    Blank,
}

impl<'a> ChatInput<'a> {
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return ChatInput::Blank;
        }
        match trimmed {
            "/quit" | "/exit" => ChatInput::Quit,
            "/clear" => ChatInput::Clear,
            "/history" => ChatInput::History,
            "/help" => ChatInput::Help,
            command if command.starts_with('/') => ChatInput::Unknown(command),
            _ => ChatInput::Query(line),
        }
    }
}

fn print_prompt() {
    print!("{PROMPT}");
    let _ = io::stdout().flush();
}

fn print_message(message: &Message) {
    for line in render_message(message) {
        println!("{line}");
    }
    println!();
}

fn print_event(event: QueryEvent) {
    match event {
        QueryEvent::Finished(QueryOutcome::Completed(message))
        | QueryEvent::Finished(QueryOutcome::Failed(message)) => print_message(&message),
        QueryEvent::Finished(QueryOutcome::Rejected) => {}
        QueryEvent::Cleared => println!("Conversation cleared.\n"),
        QueryEvent::History(messages) if messages.is_empty() => println!("No messages yet.\n"),
        QueryEvent::History(messages) => messages.iter().for_each(print_message),
    }
}

fn print_diagnostic(diagnostic: &RoutingDiagnostic) {
    eprintln!("⚠️  {}; using the default endpoint", diagnostic.reason);
}

fn print_help() {
    println!("Type a question and press Enter.");
    println!("  /history   show the current conversation");
    println!("  /clear     delete the conversation and start over");
    println!("  /quit      leave the session\n");
}

pub async fn run_chat(config: Config, options: QueryOptions) -> Result<(), Box<dyn Error>> {
    let (diagnostic_tx, mut diagnostics) = mpsc::unbounded_channel();
    let mut services = AppServices::from_config(config, Some(diagnostic_tx))?;
    let mut orchestrator = services.orchestrator()?;

    let history = orchestrator.history();
    if !history.is_empty() {
        println!("Resuming conversation ({} messages)\n", history.len());
        history.iter().for_each(print_message);
    }

    let (queue, mut events, worker) = spawn_query_worker(orchestrator);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = 0_usize;
    print_prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match ChatInput::parse(&line) {
                    ChatInput::Quit => break,
                    ChatInput::Blank => {}
                    ChatInput::Help => print_help(),
                    ChatInput::Unknown(command) => {
                        println!("Unknown command: {command} (try /help)\n");
                    }
                    ChatInput::Clear => {
                        queue.clear()?;
                        pending += 1;
                    }
                    ChatInput::History => {
                        queue.request_history()?;
                        pending += 1;
                    }
                    ChatInput::Query(text) => {
                        queue.submit(text, options.clone())?;
                        pending += 1;
                    }
                }
                if pending == 0 {
                    print_prompt();
                }
            }
            Some(event) = events.recv() => {
                print_event(event);
                pending = pending.saturating_sub(1);
                if pending == 0 {
                    print_prompt();
                }
            }
            Some(diagnostic) = diagnostics.recv() => print_diagnostic(&diagnostic),
        }
    }

    // Let queued queries finish before leaving.
    drop(queue);
    while let Some(event) = events.recv().await {
        print_event(event);
    }
    worker.await?;
    Ok(())
}
