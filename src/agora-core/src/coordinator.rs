//! Coordinator decision logic (the mediator role).
//!
//! State machine over the debate phases: introduction, alternating
//! debate turns, escalation, judgment, terminated. After each selection
//! the coordinator tracks the candidate's turn and consults the status
//! evaluator, then maps the directive to an explicit hand-off. Strict
//! alternation between the two debaters is enforced here rather than
//! left to agent reasoning.

use tracing::debug;

use crate::error::DebateError;
use crate::participant::Participant;
use crate::state::NO_SPEAKER;
use crate::status::Directive;
use crate::tools::DebateTools;

/// Phase of one debate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebatePhase {
    /// The introducer has the floor.
    Introduction,
    /// Debaters alternate under the round budget.
    Debate,
    /// The budget is exhausted; only the judge may receive control.
    Escalation,
    /// The judge has the floor.
    Judgment,
    /// The judgment was delivered; no further transfers are legal.
    Terminated,
}

/// A named, explicit control transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handoff {
    ToDebater(String),
    ToJudge,
}

pub struct Coordinator {
    tools: DebateTools,
    phase: DebatePhase,
}

impl Coordinator {
    pub fn new(tools: DebateTools) -> Self {
        Self {
            tools,
            phase: DebatePhase::Introduction,
        }
    }

    pub fn phase(&self) -> DebatePhase {
        self.phase
    }

    /// Mark the introduction as delivered and open the debate.
    pub fn introduction_complete(&mut self) -> Result<(), DebateError> {
        if self.phase != DebatePhase::Introduction {
            return Err(DebateError::State(
                "introduction already completed".to_string(),
            ));
        }
        self.phase = DebatePhase::Debate;
        Ok(())
    }

    /// Decide who receives control next.
    ///
    /// In the debate phase this tracks a turn for the alternation
    /// candidate (opponent A first, then strictly alternating) and maps
    /// the resulting directive. Once escalated, the answer is always
    /// the judge and no further turns are tracked.
    pub async fn select_next(&mut self) -> Result<Handoff, DebateError> {
        match self.phase {
            DebatePhase::Introduction => Err(DebateError::State(
                "cannot select a speaker before the introduction".to_string(),
            )),
            DebatePhase::Judgment | DebatePhase::Terminated => Err(DebateError::State(
                "no control transfers after the judge takes the floor".to_string(),
            )),
            DebatePhase::Escalation => Ok(Handoff::ToJudge),
            DebatePhase::Debate => {
                let candidate = self.next_candidate().await;
                let confirmation = self.tools.track_turn(&candidate).await;
                debug!("{confirmation}");

                let directive = self.tools.check_debate_status().await;
                debug!("status evaluator: {}", directive.as_action_line());

                match directive {
                    Directive::Continue { speaker } => Ok(Handoff::ToDebater(speaker)),
                    Directive::EscalateToJudge => {
                        self.phase = DebatePhase::Escalation;
                        Ok(Handoff::ToJudge)
                    }
                    Directive::Inconsistent => Err(DebateError::State(
                        "status check found missing identifying fields".to_string(),
                    )),
                }
            }
        }
    }

    /// The debater due to speak next: opponent A if nobody has spoken
    /// yet, otherwise whoever did not just speak.
    async fn next_candidate(&self) -> String {
        let state = self.tools.state().snapshot().await;
        if state.current_speaker == NO_SPEAKER {
            state.opponent_a_name.clone()
        } else {
            state
                .opponent_of(&state.current_speaker)
                .unwrap_or(&state.opponent_a_name)
                .to_string()
        }
    }

    /// The judge receives control; only legal after escalation.
    pub fn judge_takes_floor(&mut self) -> Result<(), DebateError> {
        if self.phase != DebatePhase::Escalation {
            return Err(DebateError::State(format!(
                "judge cannot take the floor during {:?}",
                self.phase
            )));
        }
        self.phase = DebatePhase::Judgment;
        Ok(())
    }

    /// The judgment was recorded; the run is over.
    pub fn judgment_delivered(&mut self) -> Result<(), DebateError> {
        if self.phase != DebatePhase::Judgment {
            return Err(DebateError::State(format!(
                "judgment delivered during {:?}",
                self.phase
            )));
        }
        self.phase = DebatePhase::Terminated;
        Ok(())
    }

    /// Check a transfer against the sender's allowed target list.
    pub fn validate_hand_off(from: &Participant, target: &str) -> Result<(), DebateError> {
        if from.can_hand_off_to(target) {
            Ok(())
        } else {
            Err(DebateError::InvalidHandoff {
                from: from.name.clone(),
                to: target.to_string(),
            })
        }
    }
}
