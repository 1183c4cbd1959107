//! Participant definitions.
//!
//! A participant is one named actor in the debate: the introducer, one
//! of the two debaters, the mediator, or the judge. Names are unique
//! per run and double as hand-off targets and voice-map keys.

use serde::{Deserialize, Serialize};

/// Role of a participant in the debate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParticipantRole {
    /// Opens the debate and hands off to the mediator.
    Introducer,
    /// One of the two opposing debaters.
    Debater,
    /// Manages turns and decides hand-offs.
    Mediator,
    /// Declares the winner; terminal role.
    Judge,
}

impl ParticipantRole {
    pub fn display_name(&self) -> &str {
        match self {
            ParticipantRole::Introducer => "INTRODUCER",
            ParticipantRole::Debater => "DEBATER",
            ParticipantRole::Mediator => "MEDIATOR",
            ParticipantRole::Judge => "JUDGE",
        }
    }
}

/// A configured debate participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Unique display name; also the hand-off target and voice key.
    pub name: String,
    pub role: ParticipantRole,
    /// Fully rendered system prompt for the reasoning backend.
    pub system_prompt: String,
    /// Names this participant is allowed to hand control to.
    pub hand_off_targets: Vec<String>,
    /// Voice ID for speech rendering.
    pub voice: String,
}

impl Participant {
    pub fn new(
        name: impl Into<String>,
        role: ParticipantRole,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            role,
            system_prompt: system_prompt.into(),
            hand_off_targets: Vec::new(),
            voice: String::new(),
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn with_hand_off_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hand_off_targets = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this participant may transfer control to `target`.
    pub fn can_hand_off_to(&self, target: &str) -> bool {
        self.hand_off_targets.iter().any(|t| t == target)
    }

    pub fn display_name_with_role(&self) -> String {
        format!("{} ({})", self.name, self.role.display_name())
    }
}
