//! Transcript events and the append-only event bus.
//!
//! Every utterance in a debate run becomes one immutable, typed event.
//! Events are appended to an in-memory transcript and simultaneously
//! forwarded to a single consumer over an unbounded channel; closing the
//! channel after the judgment is the terminal signal.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// The judge's declared winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Winner {
    /// One of the two debaters, by name.
    Debater(String),
    /// No winner declared.
    Draw,
}

impl Winner {
    /// Interpret the judge's free-text winner declaration against the
    /// two known debater names. Anything that names neither debater, or
    /// explicitly calls a tie, is a draw.
    pub fn parse(raw: &str, opponent_a: &str, opponent_b: &str) -> Winner {
        let lowered = raw.trim().to_lowercase();

        // A declaration that is just a debater's name wins outright,
        // even a name that happens to contain a draw keyword (e.g.
        // "Katie" contains "tie").
        let bare = lowered.trim_matches(|c: char| !c.is_alphanumeric());
        if !opponent_a.is_empty() && bare == opponent_a.to_lowercase() {
            return Winner::Debater(opponent_a.to_string());
        }
        if !opponent_b.is_empty() && bare == opponent_b.to_lowercase() {
            return Winner::Debater(opponent_b.to_string());
        }

        if lowered.is_empty()
            || lowered.contains("draw")
            || lowered.contains("tie")
            || lowered.contains("no winner")
        {
            return Winner::Draw;
        }
        if !opponent_a.is_empty() && lowered.contains(&opponent_a.to_lowercase()) {
            return Winner::Debater(opponent_a.to_string());
        }
        if !opponent_b.is_empty() && lowered.contains(&opponent_b.to_lowercase()) {
            return Winner::Debater(opponent_b.to_string());
        }
        Winner::Draw
    }
}

impl std::fmt::Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Winner::Debater(name) => write!(f, "{name}"),
            Winner::Draw => write!(f, "Draw"),
        }
    }
}

/// One record in the debate transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DebateEvent {
    Introduction {
        speaker: String,
        text: String,
    },
    Statement {
        speaker: String,
        text: String,
    },
    MediatorAnnouncement {
        speaker: String,
        text: String,
    },
    Judgment {
        speaker: String,
        text: String,
        winner: Winner,
    },
    Log {
        message: String,
        level: String,
    },
}

impl DebateEvent {
    /// Name of the participant that emitted this event, if any.
    pub fn speaker(&self) -> Option<&str> {
        match self {
            DebateEvent::Introduction { speaker, .. }
            | DebateEvent::Statement { speaker, .. }
            | DebateEvent::MediatorAnnouncement { speaker, .. }
            | DebateEvent::Judgment { speaker, .. } => Some(speaker),
            DebateEvent::Log { .. } => None,
        }
    }
}

/// Append-only transcript with a live forwarding channel.
///
/// Events are write-once: `emit` pushes a copy onto the stored
/// transcript and sends the event to the consumer. After `close`, no
/// further events reach the stream; the consumer observes end-of-stream
/// as the terminal signal.
pub struct EventBus {
    tx: Mutex<Option<UnboundedSender<DebateEvent>>>,
    transcript: Mutex<Vec<DebateEvent>>,
}

impl EventBus {
    /// Create a bus and the receiving half of its stream.
    pub fn channel() -> (Self, UnboundedReceiver<DebateEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let bus = Self {
            tx: Mutex::new(Some(tx)),
            transcript: Mutex::new(Vec::new()),
        };
        (bus, rx)
    }

    /// Append an event to the transcript and forward it to the stream.
    pub fn emit(&self, event: DebateEvent) {
        self.transcript
            .lock()
            .expect("transcript lock poisoned")
            .push(event.clone());

        if let Some(tx) = self.tx.lock().expect("sender lock poisoned").as_ref() {
            // A dropped receiver only means nobody is watching live; the
            // transcript itself is still complete.
            let _ = tx.send(event);
        }
    }

    /// Publish the terminal signal by closing the stream.
    pub fn close(&self) {
        self.tx.lock().expect("sender lock poisoned").take();
    }

    /// Whether the terminal signal has been published.
    pub fn is_closed(&self) -> bool {
        self.tx.lock().expect("sender lock poisoned").is_none()
    }

    /// Clone out the full ordered transcript.
    pub fn transcript(&self) -> Vec<DebateEvent> {
        self.transcript
            .lock()
            .expect("transcript lock poisoned")
            .clone()
    }
}
