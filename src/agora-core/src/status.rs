//! Debate status evaluation.
//!
//! Pure classification of the shared state into one of three directives,
//! consumed by the coordinator immediately after a turn is tracked.

use serde::Serialize;

use crate::state::{DebateState, NO_SPEAKER};

/// The status evaluator's verdict on how the debate should proceed.
///
/// The three variants are exhaustive and mutually exclusive for any
/// state. Evaluation is a pure read: calling it twice on the same state
/// yields the same directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Directive {
    /// The debate continues; hand control to the named speaker (the one
    /// whose turn was just tracked).
    Continue { speaker: String },
    /// A debater was selected beyond their round budget; hand control to
    /// the judge and never back to a debater.
    EscalateToJudge,
    /// Required identifying fields are missing or no turn was tracked
    /// before checking. Caller-side ordering error, signaled in-band.
    Inconsistent,
}

impl Directive {
    /// The fixed agent-facing line for this directive, shown to the
    /// mediator's reasoning backend.
    pub fn as_action_line(&self) -> String {
        match self {
            Directive::Continue { speaker } => {
                format!("ACTION: HANDOFF_TO_SPEAKER:{speaker}")
            }
            Directive::EscalateToJudge => "ACTION: HANDOFF_TO_JUDGE_AGENT".to_string(),
            Directive::Inconsistent => {
                "ACTION: ERROR_CRITICAL_STATE_MISSING_FOR_DEBATE_STATUS_CHECK".to_string()
            }
        }
    }
}

/// Decide whether the debate continues, escalates to the judge, or the
/// state is inconsistent.
///
/// Escalation triggers when either debater's count *strictly exceeds*
/// `total_rounds`: a count of `total_rounds + 1` means that debater was
/// selected for a turn beyond their budget, so their last legitimate
/// statement already happened in the previous cycle.
pub fn check_debate_status(state: &DebateState) -> Directive {
    let designated = state.current_speaker.as_str();

    if state.opponent_a_name.is_empty()
        || state.opponent_b_name.is_empty()
        || designated.is_empty()
        || designated == NO_SPEAKER
    {
        return Directive::Inconsistent;
    }

    let a_turns = state.turns_for(&state.opponent_a_name);
    let b_turns = state.turns_for(&state.opponent_b_name);

    if a_turns > state.total_rounds || b_turns > state.total_rounds {
        return Directive::EscalateToJudge;
    }

    Directive::Continue {
        speaker: designated.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SpeechConfig;
    use std::collections::HashMap;

    fn state_with_rounds(total_rounds: u32) -> DebateState {
        DebateState::new(
            "Test theme",
            "Be civil.",
            "Aria",
            "Brent",
            total_rounds,
            SpeechConfig {
                engine: "kokoro".to_string(),
                voices: HashMap::new(),
            },
        )
    }

    #[test]
    fn no_tracked_turn_is_inconsistent() {
        // Scenario C: status check before any track_turn call.
        let state = state_with_rounds(2);
        assert_eq!(check_debate_status(&state), Directive::Inconsistent);
    }

    #[test]
    fn empty_opponent_name_is_inconsistent() {
        let mut state = state_with_rounds(2);
        state.track_turn("Aria");
        state.opponent_b_name = String::new();
        assert_eq!(check_debate_status(&state), Directive::Inconsistent);
    }

    #[test]
    fn first_turn_continues_with_speaker() {
        // Scenario B: one turn with total_rounds = 1 does not escalate.
        let mut state = state_with_rounds(1);
        state.track_turn("Aria");
        assert_eq!(
            check_debate_status(&state),
            Directive::Continue {
                speaker: "Aria".to_string()
            }
        );
    }

    #[test]
    fn exceeding_budget_escalates() {
        // Scenario A: with total_rounds = 2, the 3rd selection of the
        // same debater escalates.
        let mut state = state_with_rounds(2);
        for speaker in ["Aria", "Brent", "Aria", "Brent", "Aria"] {
            state.track_turn(speaker);
        }
        assert_eq!(state.turns_for("Aria"), 3);
        assert_eq!(check_debate_status(&state), Directive::EscalateToJudge);
    }

    #[test]
    fn budget_boundary_is_exclusive() {
        // A count equal to total_rounds continues; only strictly greater
        // escalates.
        let mut state = state_with_rounds(2);
        for speaker in ["Aria", "Brent", "Aria", "Brent"] {
            state.track_turn(speaker);
        }
        assert_eq!(
            check_debate_status(&state),
            Directive::Continue {
                speaker: "Brent".to_string()
            }
        );
    }

    #[test]
    fn status_check_is_idempotent() {
        let mut state = state_with_rounds(2);
        state.track_turn("Brent");
        let first = check_debate_status(&state);
        let second = check_debate_status(&state);
        assert_eq!(first, second);
    }

    #[test]
    fn escalation_wins_over_continuation() {
        // Even with a valid designated speaker, an exhausted budget
        // must escalate.
        let mut state = state_with_rounds(0);
        state.track_turn("Aria");
        assert_eq!(check_debate_status(&state), Directive::EscalateToJudge);
    }

    #[test]
    fn action_lines_are_stable() {
        assert_eq!(
            Directive::Continue {
                speaker: "Aria".to_string()
            }
            .as_action_line(),
            "ACTION: HANDOFF_TO_SPEAKER:Aria"
        );
        assert_eq!(
            Directive::EscalateToJudge.as_action_line(),
            "ACTION: HANDOFF_TO_JUDGE_AGENT"
        );
        assert_eq!(
            Directive::Inconsistent.as_action_line(),
            "ACTION: ERROR_CRITICAL_STATE_MISSING_FOR_DEBATE_STATUS_CHECK"
        );
    }
}
