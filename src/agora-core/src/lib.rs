//! Agora Core Library
//!
//! Turn coordination and termination protocol for moderated AI debates:
//! shared state, turn tracking, status evaluation, the transcript event
//! bus, and the coordinator that decides who speaks next.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod llm;
pub mod participant;
pub mod recorder;
pub mod runner;
pub mod speech;
pub mod state;
pub mod status;
pub mod tools;

pub use config::{default_config, Config};
pub use coordinator::{Coordinator, DebatePhase, Handoff};
pub use error::DebateError;
pub use events::{DebateEvent, EventBus, Winner};
pub use llm::{AgentSession, LlmClient, ReasoningBackend};
pub use participant::{Participant, ParticipantRole};
pub use recorder::Recorder;
pub use runner::{DebateRunner, RunOptions};
pub use speech::{SpeechHandle, SpeechRenderer, SpeechRequest};
pub use state::{DebateState, SharedState, SpeechConfig, NO_SPEAKER};
pub use status::{check_debate_status, Directive};
pub use tools::DebateTools;
