//! Shared debate state and turn tracking.
//!
//! A single mutable record holds everything the mediator needs to decide
//! who speaks next: per-debater turn counters, the designated speaker,
//! the round budget, and the immutable run parameters. All reads and
//! read-modify-write sequences go through [`SharedState`], which
//! serializes access behind one mutex.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

/// Sentinel value for `current_speaker` before any turn has been tracked.
pub const NO_SPEAKER: &str = "none";

/// Speech renderer configuration carried in the debate state.
///
/// The engine identifier and per-participant voice map are set once at
/// run start and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct SpeechConfig {
    /// Renderer engine identifier (e.g. "kokoro").
    pub engine: String,
    /// Participant name -> voice id.
    pub voices: HashMap<String, String>,
}

/// The full debate state record. Lifetime is one debate run.
#[derive(Debug, Clone, Serialize)]
pub struct DebateState {
    /// Turn counters, keyed by participant name. Only the two debaters
    /// are counted; both are pre-seeded to 0 at run start.
    pub turns: HashMap<String, u32>,
    /// The debater most recently selected for a turn, or [`NO_SPEAKER`].
    pub current_speaker: String,
    /// Number of statements each debater is entitled to make.
    pub total_rounds: u32,
    pub debate_theme: String,
    pub debate_rules: String,
    pub opponent_a_name: String,
    pub opponent_b_name: String,
    pub speech: SpeechConfig,
}

impl DebateState {
    /// Create the initial state with both debater counters zeroed and no
    /// designated speaker.
    pub fn new(
        theme: impl Into<String>,
        rules: impl Into<String>,
        opponent_a: impl Into<String>,
        opponent_b: impl Into<String>,
        total_rounds: u32,
        speech: SpeechConfig,
    ) -> Self {
        let opponent_a = opponent_a.into();
        let opponent_b = opponent_b.into();

        let mut turns = HashMap::new();
        turns.insert(opponent_a.clone(), 0);
        turns.insert(opponent_b.clone(), 0);

        Self {
            turns,
            current_speaker: NO_SPEAKER.to_string(),
            total_rounds,
            debate_theme: theme.into(),
            debate_rules: rules.into(),
            opponent_a_name: opponent_a,
            opponent_b_name: opponent_b,
            speech,
        }
    }

    /// Turn count for a participant, 0 if never tracked.
    pub fn turns_for(&self, name: &str) -> u32 {
        self.turns.get(name).copied().unwrap_or(0)
    }

    /// Increment a speaker's turn counter and mark them as current
    /// speaker. Returns the new count.
    ///
    /// A missing key is initialized to 0 first; the canonical path
    /// pre-seeds both debaters in [`DebateState::new`].
    pub(crate) fn track_turn(&mut self, speaker: &str) -> u32 {
        let count = self.turns.entry(speaker.to_string()).or_insert(0);
        *count += 1;
        self.current_speaker = speaker.to_string();
        *count
    }

    /// The other debater, given one of the two debater names.
    pub fn opponent_of(&self, name: &str) -> Option<&str> {
        if name == self.opponent_a_name {
            Some(&self.opponent_b_name)
        } else if name == self.opponent_b_name {
            Some(&self.opponent_a_name)
        } else {
            None
        }
    }
}

/// Handle to the mutable debate state, shared across components.
///
/// Every read-modify-write happens while the lock is held, so turn
/// updates cannot interleave even if tasks suspend between tool calls.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<Mutex<DebateState>>,
}

impl SharedState {
    pub fn new(state: DebateState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Clone out the current state.
    pub async fn snapshot(&self) -> DebateState {
        self.inner.lock().await.clone()
    }

    /// Atomically replace the whole state record.
    pub async fn replace(&self, state: DebateState) {
        *self.inner.lock().await = state;
    }

    /// Track a turn for `speaker` under a single lock guard and return
    /// the new count.
    pub async fn track_turn(&self, speaker: &str) -> u32 {
        self.inner.lock().await.track_turn(speaker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> DebateState {
        DebateState::new(
            "Test theme",
            "Be civil.",
            "Aria",
            "Brent",
            2,
            SpeechConfig {
                engine: "kokoro".to_string(),
                voices: HashMap::new(),
            },
        )
    }

    #[test]
    fn new_state_seeds_both_debaters_at_zero() {
        let state = test_state();
        assert_eq!(state.turns_for("Aria"), 0);
        assert_eq!(state.turns_for("Brent"), 0);
        assert_eq!(state.current_speaker, NO_SPEAKER);
    }

    #[test]
    fn track_turn_counts_per_speaker() {
        let mut state = test_state();
        assert_eq!(state.track_turn("Aria"), 1);
        assert_eq!(state.track_turn("Brent"), 1);
        assert_eq!(state.track_turn("Aria"), 2);
        assert_eq!(state.turns_for("Aria"), 2);
        assert_eq!(state.turns_for("Brent"), 1);
        assert_eq!(state.current_speaker, "Aria");
    }

    #[test]
    fn track_turn_initializes_missing_key() {
        let mut state = test_state();
        assert_eq!(state.track_turn("Stranger"), 1);
        assert_eq!(state.current_speaker, "Stranger");
    }

    #[test]
    fn opponent_of_maps_both_ways() {
        let state = test_state();
        assert_eq!(state.opponent_of("Aria"), Some("Brent"));
        assert_eq!(state.opponent_of("Brent"), Some("Aria"));
        assert_eq!(state.opponent_of("Nobody"), None);
    }

    #[tokio::test]
    async fn shared_state_serializes_turn_updates() {
        let shared = SharedState::new(test_state());

        let mut handles = Vec::new();
        for _ in 0..10 {
            let s = shared.clone();
            handles.push(tokio::spawn(async move { s.track_turn("Aria").await }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(shared.snapshot().await.turns_for("Aria"), 10);
    }
}
