//! Tool operations exposed to the mediator.
//!
//! These are the contract between the coordinator and the state
//! machinery: track a turn, check the debate status, log a note. Each
//! returns the confirmation text the reasoning backend sees.

use std::sync::Arc;

use crate::events::{DebateEvent, EventBus};
use crate::state::SharedState;
use crate::status::{check_debate_status, Directive};

/// The mediator's tool surface over the shared state and event bus.
#[derive(Clone)]
pub struct DebateTools {
    state: SharedState,
    bus: Arc<EventBus>,
}

impl DebateTools {
    pub fn new(state: SharedState, bus: Arc<EventBus>) -> Self {
        Self { state, bus }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Track a turn for `speaker` and return human-readable confirmation
    /// with the updated count. Always succeeds.
    pub async fn track_turn(&self, speaker: &str) -> String {
        let turn_count = self.state.track_turn(speaker).await;
        format!(
            "Tracked turn for {speaker}. They have had {turn_count} turns. \
             Current speaker is {speaker}."
        )
    }

    /// Evaluate whether the debate continues, escalates to the judge, or
    /// the state is inconsistent. Pure read; safe to call repeatedly.
    pub async fn check_debate_status(&self) -> Directive {
        let state = self.state.snapshot().await;
        check_debate_status(&state)
    }

    /// Emit a log event onto the transcript stream.
    pub fn log_message(&self, message: &str, level: &str) -> String {
        self.bus.emit(DebateEvent::Log {
            message: message.to_string(),
            level: level.to_string(),
        });
        format!("Message logged: '{message}' with level {level}. Proceed with your next action.")
    }
}
