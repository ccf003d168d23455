//! Output rendering for the chat client.
//!
//! [`Presenter`] is the port the chat session writes through; it keeps the
//! session testable without a terminal.  [`PlainTextRenderer`] is the
//! terminal implementation.

use std::io::{self, Stdout, Write};

use rustyline::ExternalPrinter;

use crate::types::{ConversationEntry, EmotionalState, Sender};

/// ANSI escape code for dim text (used for gauges).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for user messages).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for service replies).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Gauge names in display order.
pub const GAUGE_NAMES: [&str; 5] = ["guilt", "pride", "fear", "joy", "lambda"];

/// Format a gauge value with exactly two decimals.
pub fn format_gauge(value: f64) -> String {
    format!("{value:.2}")
}

/// The five gauge displays, in [`GAUGE_NAMES`] order.
pub fn gauge_values(state: &EmotionalState, lambda: f64) -> [String; 5] {
    [
        format_gauge(state.guilt),
        format_gauge(state.pride),
        format_gauge(state.fear),
        format_gauge(state.joy),
        format_gauge(lambda),
    ]
}

/// Presentation port for the chat session.
///
/// Implementations own whatever displays the transcript and the gauges.
pub trait Presenter {
    /// Show a transcript entry after every entry shown so far.
    fn append_message(&mut self, entry: &ConversationEntry);

    /// Replace the displayed gauges.
    fn update_gauges(&mut self, state: &EmotionalState, lambda: f64);

    /// Clear the pending input.  Line editors that consume their input
    /// have nothing to do here.
    fn clear_input(&mut self) {}

    /// Print an informational message outside the transcript.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer that writes to stdout, with optional ANSI styling.
///
/// Replies arrive while the line editor owns the terminal.  Given an
/// external printer, every line goes through it so the prompt is redrawn
/// below the output instead of being overwritten.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    printer: Option<Box<dyn ExternalPrinter + Send>>,
}

impl PlainTextRenderer {
    /// Creates a new renderer with colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new renderer with the specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            printer: None,
        }
    }

    /// Route output through a line editor's external printer.
    pub fn with_external_printer(mut self, printer: Box<dyn ExternalPrinter + Send>) -> Self {
        self.printer = Some(printer);
        self
    }

    /// Whether ANSI styling is emitted.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print an error that is not part of the transcript.
    pub fn print_error(&mut self, error: &str) {
        let line = if self.use_color {
            format!("{ANSI_RED}Error:{ANSI_RESET} {error}")
        } else {
            format!("Error: {error}")
        };
        self.write_line(line, true);
    }

    /// Write one line, preferring the external printer.  A printer that
    /// fails is dropped and the terminal is written directly from then on.
    fn write_line(&mut self, line: String, is_error: bool) {
        if let Some(printer) = self.printer.as_mut() {
            match printer.print(format!("{line}\n")) {
                Ok(()) => return,
                Err(err) => {
                    tracing::debug!(error = %err, "external printer failed; writing directly");
                    self.printer = None;
                }
            }
        }
        if is_error {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
        self.flush();
    }

    /// Flushes stdout to ensure immediate display.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    /// The line shown for a transcript entry.
    pub fn format_entry(&self, entry: &ConversationEntry) -> String {
        let label = entry.sender.label();
        if self.use_color {
            let color = match entry.sender {
                Sender::User => ANSI_CYAN,
                Sender::Ai => ANSI_GREEN,
                Sender::Error => ANSI_RED,
            };
            format!("{color}{label}:{ANSI_RESET} {}", entry.text)
        } else {
            format!("{label}: {}", entry.text)
        }
    }

    /// The line shown for the gauges.
    pub fn format_gauges(&self, state: &EmotionalState, lambda: f64) -> String {
        let line = GAUGE_NAMES
            .iter()
            .zip(gauge_values(state, lambda))
            .map(|(name, value)| format!("{name} {value}"))
            .collect::<Vec<_>>()
            .join(" | ");
        if self.use_color {
            format!("{ANSI_DIM}[{line}]{ANSI_RESET}")
        } else {
            format!("[{line}]")
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for PlainTextRenderer {
    fn append_message(&mut self, entry: &ConversationEntry) {
        let line = self.format_entry(entry);
        self.write_line(line, entry.sender == Sender::Error);
    }

    fn update_gauges(&mut self, state: &EmotionalState, lambda: f64) {
        let line = self.format_gauges(state, lambda);
        self.write_line(line, false);
    }

    fn print_info(&mut self, info: &str) {
        self.write_line(info.to_string(), false);
    }
}
