//! Wire and transcript types for the emotional-inference exchange.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who produced a transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Text the user submitted.
    User,
    /// Text returned by the remote service.
    Ai,
    /// A failed exchange surfaced to the user.
    Error,
}

impl Sender {
    /// The label shown in front of the message text.
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Ai => "Bot",
            Sender::Error => "Error",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sender::User => "user",
            Sender::Ai => "ai",
            Sender::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// One line of the visible transcript.
///
/// Entries are never mutated once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub sender: Sender,
    pub text: String,
}

impl ConversationEntry {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(Sender::Ai, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Sender::Error, text)
    }
}

/// The four affect values computed by the remote service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionalState {
    pub guilt: f64,
    pub pride: f64,
    pub fear: f64,
    pub joy: f64,
}

impl EmotionalState {
    pub fn new(guilt: f64, pride: f64, fear: f64, joy: f64) -> Self {
        Self {
            guilt,
            pride,
            fear,
            joy,
        }
    }

    /// Returns true when every component is a finite number.
    pub fn is_finite(&self) -> bool {
        [self.guilt, self.pride, self.fear, self.joy]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// The displayed gauge set: the latest emotional state plus lambda.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Gauges {
    pub state: EmotionalState,
    pub lambda: f64,
}

impl Gauges {
    pub fn new(state: EmotionalState, lambda: f64) -> Self {
        Self { state, lambda }
    }
}

/// Body of the prompt POST.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// Successful reply from the prompt endpoint.
///
/// Fields the service adds beyond these are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromptResponse {
    pub response_text: String,
    pub new_state: EmotionalState,
    pub lambda_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
}

impl PromptResponse {
    /// The gauges this response installs.
    pub fn gauges(&self) -> Gauges {
        Gauges::new(self.new_state, self.lambda_value)
    }
}

/// Reply from the service's root health probe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}
