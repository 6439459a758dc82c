use serde::{Deserialize, Serialize};

/// One spoken or typed turn within a call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Utterance {
    /// Conversation identifier, shared by all utterances of a call
    pub call_id: String,
    /// Seconds from the start of the call
    pub timestamp: u64,
    /// Upper-cased speaker label (AGENT, CUSTOMER, ...)
    pub speaker: String,
    /// Utterance content
    pub text: String,
}

impl Utterance {
    pub fn new(
        call_id: impl Into<String>,
        timestamp: u64,
        speaker: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            timestamp,
            speaker: speaker.into(),
            text: text.into(),
        }
    }
}

