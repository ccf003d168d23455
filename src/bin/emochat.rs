//! Interactive chat client for the emotional-inference service.
//!
//! # Usage
//!
//! ```bash
//! # Use $EMOCHAT_ENDPOINT or http://localhost:8000/api/ask
//! emochat
//!
//! # Point at a deployed service
//! emochat --endpoint https://example.onrender.com/api/ask
//!
//! # Read settings from a YAML file and show diagnostics
//! emochat --config emochat.yaml --log-level debug
//! ```
//!
//! Prompts are sent as soon as they are entered; the next prompt can be
//! typed while earlier ones are still waiting.  Replies are shown in the
//! order they arrive.

use std::sync::mpsc as std_mpsc;
use std::thread;

use arrrg::CommandLine;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, ExternalPrinter};
use tokio::sync::{mpsc, oneshot};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use emochat::chat::{
    ChatArgs, ChatClient, ChatCommand, ChatConfig, InFlight, PlainTextRenderer, Presenter,
    help_text, parse_command,
};
use emochat::ServiceStatus;

type Printer = Box<dyn ExternalPrinter + Send>;

/// Health checks started by `/status`, yielded as they finish.
type StatusChecks = FuturesUnordered<BoxFuture<'static, emochat::Result<ServiceStatus>>>;

/// What the line reader thread hands to the event loop.
enum Input {
    Line(String),
    Interrupted,
    Eof,
    Failed(String),
}

/// Main entry point for the emochat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("emochat [OPTIONS]");
    let config = ChatConfig::from_args(args)?;
    init_tracing(config.level()?);

    let mut chat = ChatClient::from_config(&config)?;
    let mut in_flight = InFlight::new();
    let mut status_checks = StatusChecks::new();

    // rustyline blocks, so it lives on its own thread.  It hands back an
    // external printer, then waits for a resume signal before each prompt.
    let (line_tx, mut line_rx) = mpsc::unbounded_channel();
    let (resume_tx, resume_rx) = std_mpsc::channel();
    let (printer_tx, printer_rx) = oneshot::channel();
    thread::spawn(move || read_lines(line_tx, resume_rx, printer_tx));

    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    if let Ok(Some(printer)) = printer_rx.await {
        renderer = renderer.with_external_printer(printer);
    }

    println!("Emotional Chat (endpoint: {})", chat.client().endpoint());
    println!("Type /help for commands, /quit to exit\n");
    chat.render_emotional_state(&mut renderer);
    let _ = resume_tx.send(());

    loop {
        tokio::select! {
            input = line_rx.recv() => {
                let keep_going = match input {
                    Some(Input::Line(line)) => handle_line(
                        &line,
                        &mut chat,
                        &mut in_flight,
                        &mut status_checks,
                        &mut renderer,
                    ),
                    Some(Input::Interrupted) => {
                        // Ctrl+C at prompt - soft interrupt
                        println!();
                        true
                    }
                    Some(Input::Eof) | None => {
                        println!("\nGoodbye!");
                        false
                    }
                    Some(Input::Failed(err)) => {
                        renderer.print_error(&format!("Input error: {}", err));
                        false
                    }
                };
                if !keep_going {
                    break;
                }
                let _ = resume_tx.send(());
            }
            Some(settlement) = in_flight.next(), if !in_flight.is_empty() => {
                chat.settle(settlement, &mut renderer);
            }
            Some(status) = status_checks.next(), if !status_checks.is_empty() => {
                report_status(status, &mut renderer);
            }
        }
    }

    if !in_flight.is_empty() {
        tracing::warn!(pending = in_flight.len(), "exiting with prompts still in flight");
    }
    Ok(())
}

/// Handle one line of input.  Returns false when the session should end.
fn handle_line(
    line: &str,
    chat: &mut ChatClient,
    in_flight: &mut InFlight,
    status_checks: &mut StatusChecks,
    renderer: &mut PlainTextRenderer,
) -> bool {
    if let Some(cmd) = parse_command(line) {
        match cmd {
            ChatCommand::Quit => {
                println!("Goodbye!");
                return false;
            }
            ChatCommand::Help => {
                for line in help_text().lines() {
                    println!("    {}", line);
                }
            }
            ChatCommand::Gauges => chat.render_emotional_state(renderer),
            ChatCommand::History => chat.render_transcript(renderer),
            ChatCommand::Pending => {
                renderer.print_info(&format!("{} prompt(s) awaiting a reply", in_flight.len()));
            }
            ChatCommand::Status => {
                renderer.print_info("Checking service status...");
                status_checks.push(chat.check_status().boxed());
            }
            ChatCommand::Endpoint => {
                renderer.print_info(&format!("Endpoint: {}", chat.client().endpoint()));
            }
            ChatCommand::Save(path) => match chat.save_transcript_to(&path) {
                Ok(()) => renderer.print_info(&format!("Transcript saved to {}", path)),
                Err(err) => renderer.print_error(&format!("Failed to save transcript: {}", err)),
            },
            ChatCommand::Invalid(message) => renderer.print_error(&message),
        }
        return true;
    }

    if let Some(pending) = chat.begin(line, renderer) {
        in_flight.push(chat.dispatch(pending));
    }
    true
}

fn report_status(status: emochat::Result<ServiceStatus>, renderer: &mut PlainTextRenderer) {
    match status {
        Ok(status) if status.message.is_empty() => {
            renderer.print_info(&format!("Service: {}", status.status))
        }
        Ok(status) => renderer.print_info(&format!(
            "Service: {} ({})",
            status.status, status.message
        )),
        Err(err) => renderer.print_error(&format!("Status check failed: {}", err)),
    }
}

fn read_lines(
    lines: mpsc::UnboundedSender<Input>,
    resume: std_mpsc::Receiver<()>,
    printer: oneshot::Sender<Option<Printer>>,
) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            let _ = printer.send(None);
            let _ = lines.send(Input::Failed(err.to_string()));
            return;
        }
    };
    let external = match rl.create_external_printer() {
        Ok(external) => Some(Box::new(external) as Printer),
        Err(err) => {
            tracing::debug!(error = %err, "no external printer; replies may overwrite the prompt");
            None
        }
    };
    if printer.send(external).is_err() || resume.recv().is_err() {
        return;
    }
    loop {
        let input = match rl.readline("You: ") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                Input::Line(line)
            }
            Err(ReadlineError::Interrupted) => Input::Interrupted,
            Err(ReadlineError::Eof) => Input::Eof,
            Err(err) => Input::Failed(err.to_string()),
        };
        let last = matches!(input, Input::Eof | Input::Failed(_));
        if lines.send(input).is_err() || last {
            return;
        }
        if resume.recv().is_err() {
            return;
        }
    }
}

fn init_tracing(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
