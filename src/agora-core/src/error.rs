//! Error types for the debate system.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DebateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(#[from] async_openai::error::OpenAIError),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Illegal hand-off from {from} to {to}")]
    InvalidHandoff { from: String, to: String },

    #[error("Debate state error: {0}")]
    State(String),

    #[error("Participant '{speaker}' returned an empty response after {retries} retries")]
    EmptyResponse { speaker: String, retries: u32 },
}
