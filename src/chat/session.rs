//! Core chat session management.
//!
//! This module provides [`ChatClient`], which owns the transcript and the
//! gauges and runs the send/receive cycle against the endpoint, and
//! [`InFlight`], which lets several submissions overlap.

use std::fs::File;
use std::future::Future;
use std::io::BufWriter;
use std::path::Path;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::chat::config::ChatConfig;
use crate::client::EmotionClient;
use crate::error::{Error, Result};
use crate::observability::{SESSION_IGNORED_INPUTS, SESSION_SUBMISSIONS};
use crate::render::Presenter;
use crate::types::{ConversationEntry, Gauges, PromptResponse, ServiceStatus};

/// A submission whose user entry is shown but whose request is not sent yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPrompt {
    seq: u64,
    prompt: String,
}

impl PendingPrompt {
    /// Position of this submission in the session, starting at 1.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The trimmed prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// The completed exchange for one submission.
#[derive(Debug)]
pub struct Settlement {
    /// Sequence number of the submission this settles.
    pub seq: u64,
    /// What the endpoint produced.
    pub outcome: Result<PromptResponse>,
}

/// How a submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The input was blank; nothing was sent or shown.
    Ignored,
    /// The service replied and the gauges were replaced.
    Answered,
    /// The exchange failed; an error entry was shown.
    Failed,
}

/// A chat client that manages the transcript and gauges.
///
/// All state is owned here and changed only through `&mut self`, so
/// overlapping submissions never need a lock: their settlements are applied
/// one at a time, in whatever order they complete.
pub struct ChatClient {
    client: EmotionClient,
    transcript: Vec<ConversationEntry>,
    gauges: Gauges,
    next_seq: u64,
}

impl ChatClient {
    /// Creates a new chat client around an endpoint client.
    pub fn new(client: EmotionClient) -> Self {
        Self {
            client,
            transcript: Vec::new(),
            gauges: Gauges::default(),
            next_seq: 1,
        }
    }

    /// Creates a chat client for the configured endpoint.
    pub fn from_config(config: &ChatConfig) -> Result<Self> {
        let client = EmotionClient::with_options(&config.endpoint, config.timeout)?;
        Ok(Self::new(client))
    }

    /// The endpoint client.
    pub fn client(&self) -> &EmotionClient {
        &self.client
    }

    /// Every entry shown so far, oldest first.
    pub fn transcript(&self) -> &[ConversationEntry] {
        &self.transcript
    }

    /// The gauges currently displayed.
    pub fn gauges(&self) -> Gauges {
        self.gauges
    }

    /// Sends one prompt and waits for its reply.
    ///
    /// This method:
    /// 1. Shows the user entry and clears the input
    /// 2. Posts the prompt to the endpoint
    /// 3. Shows the reply and replaces the gauges, or shows an error entry
    ///
    /// Blank input is ignored entirely.
    pub async fn submit_prompt(
        &mut self,
        raw_input: &str,
        presenter: &mut dyn Presenter,
    ) -> SubmitOutcome {
        let Some(pending) = self.begin(raw_input, presenter) else {
            return SubmitOutcome::Ignored;
        };
        let settlement = self.dispatch(pending).await;
        self.settle(settlement, presenter)
    }

    /// Shows the user entry for `raw_input` and clears the input.
    ///
    /// Returns `None`, with no entry added, when the trimmed input is empty.
    pub fn begin(
        &mut self,
        raw_input: &str,
        presenter: &mut dyn Presenter,
    ) -> Option<PendingPrompt> {
        let prompt = raw_input.trim();
        if prompt.is_empty() {
            SESSION_IGNORED_INPUTS.click();
            return None;
        }
        SESSION_SUBMISSIONS.click();
        let seq = self.next_seq;
        self.next_seq += 1;

        self.push_entry(ConversationEntry::user(prompt), presenter);
        presenter.clear_input();

        Some(PendingPrompt {
            seq,
            prompt: prompt.to_string(),
        })
    }

    /// Returns the request for `pending`.
    ///
    /// The future owns everything it needs, so any number of them can be in
    /// flight while the client keeps accepting input.
    pub fn dispatch(
        &self,
        pending: PendingPrompt,
    ) -> impl Future<Output = Settlement> + Send + use<> {
        let client = self.client.clone();
        tracing::debug!(seq = pending.seq, endpoint = %client.endpoint(), "dispatching prompt");
        async move {
            let outcome = client.ask(&pending.prompt).await;
            Settlement {
                seq: pending.seq,
                outcome,
            }
        }
    }

    /// Returns a health check of the service.
    ///
    /// Like [`ChatClient::dispatch`], the future owns its client, so it can
    /// run alongside prompts without holding up input.
    pub fn check_status(&self) -> impl Future<Output = Result<ServiceStatus>> + Send + use<> {
        let client = self.client.clone();
        async move { client.status().await }
    }

    /// Applies a completed exchange.
    ///
    /// On success the reply is shown and the gauges are replaced wholesale.
    /// On failure an error entry is shown and the gauges keep their values.
    pub fn settle(
        &mut self,
        settlement: Settlement,
        presenter: &mut dyn Presenter,
    ) -> SubmitOutcome {
        let Settlement { seq, outcome } = settlement;
        match outcome {
            Ok(response) => {
                tracing::debug!(
                    seq,
                    lambda = response.lambda_value,
                    confidence = ?response.confidence_score,
                    "prompt answered"
                );
                self.gauges = response.gauges();
                self.push_entry(ConversationEntry::ai(response.response_text), presenter);
                self.render_emotional_state(presenter);
                SubmitOutcome::Answered
            }
            Err(err) => {
                tracing::error!(
                    seq,
                    status = ?err.status_code(),
                    transport = err.is_transport(),
                    error = %err,
                    "prompt submission failed"
                );
                let text = if err.is_service() {
                    format!("The service reported an error: {err}")
                } else {
                    format!("Could not reach the service: {err}")
                };
                self.push_entry(ConversationEntry::error(text), presenter);
                SubmitOutcome::Failed
            }
        }
    }

    /// Replays the whole transcript onto `presenter`, newest entry last.
    pub fn render_transcript(&self, presenter: &mut dyn Presenter) {
        for entry in &self.transcript {
            presenter.append_message(entry);
        }
    }

    /// Shows the current gauges on `presenter`.
    pub fn render_emotional_state(&self, presenter: &mut dyn Presenter) {
        presenter.update_gauges(&self.gauges.state, self.gauges.lambda);
    }

    /// Saves the transcript to the specified path.
    pub fn save_transcript_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let transcript = TranscriptFile::new(&self.transcript);
        let file = File::create(path.as_ref())
            .map_err(|err| Error::io("failed to create transcript file", err))?;
        let writer = BufWriter::new(file);
        to_writer_pretty(writer, &transcript).map_err(|err| {
            Error::serialization("failed to serialize transcript", Some(Box::new(err)))
        })
    }

    fn push_entry(&mut self, entry: ConversationEntry, presenter: &mut dyn Presenter) {
        presenter.append_message(&entry);
        self.transcript.push(entry);
    }
}

#[derive(Serialize)]
struct TranscriptFile<'a> {
    version: u8,
    messages: &'a [ConversationEntry],
}

impl<'a> TranscriptFile<'a> {
    fn new(messages: &'a [ConversationEntry]) -> Self {
        Self {
            version: 1,
            messages,
        }
    }
}

/// Dispatched submissions, yielded in completion order.
#[derive(Default)]
pub struct InFlight {
    requests: FuturesUnordered<BoxFuture<'static, Settlement>>,
}

impl InFlight {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a dispatched request.
    pub fn push(&mut self, request: impl Future<Output = Settlement> + Send + 'static) {
        self.requests.push(request.boxed());
    }

    /// Number of requests still waiting.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns true when nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Waits for the next request to complete.
    ///
    /// Returns `None` immediately when the set is empty.
    pub async fn next(&mut self) -> Option<Settlement> {
        self.requests.next().await
    }
}
