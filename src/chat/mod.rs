//! Chat application module for conversations with the emotional-inference
//! service.
//!
//! This module provides a REPL chat interface built on top of the emochat
//! client library. It supports:
//!
//! - Overlapping prompts, applied in completion order
//! - A gauge line for guilt, pride, fear, joy and lambda
//! - Slash commands for session control
//! - Endpoint configuration from flags, a YAML file or the environment
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: The send/receive cycle and transcript ownership
//! - [`commands`]: Slash command parsing

mod commands;
mod config;
mod session;

pub use crate::render::{PlainTextRenderer, Presenter};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, DEFAULT_ENDPOINT, ENDPOINT_ENV_VAR, FileConfig};
pub use session::{ChatClient, InFlight, PendingPrompt, Settlement, SubmitOutcome};
