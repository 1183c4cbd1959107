//! Orchestration wiring for one debate run.
//!
//! Builds the five participants from resolved configuration, seeds the
//! shared state, and drives the interaction: introduction, alternating
//! debate turns under the coordinator, escalation, judgment. Consumers
//! watch the event stream handed out at construction; the runner
//! returns the final state snapshot once the judgment has been
//! recorded.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use crate::config::Config;
use crate::coordinator::{Coordinator, Handoff};
use crate::error::DebateError;
use crate::events::{DebateEvent, EventBus, Winner};
use crate::llm::{AgentSession, ReasoningBackend};
use crate::participant::{Participant, ParticipantRole};
use crate::recorder::Recorder;
use crate::speech::SpeechHandle;
use crate::state::{DebateState, SharedState, SpeechConfig};
use crate::tools::DebateTools;

const INTRODUCTION_MAX_TOKENS: u32 = 300;
const STATEMENT_MAX_TOKENS: u32 = 400;
const ANNOUNCEMENT_MAX_TOKENS: u32 = 120;
const JUDGMENT_MAX_TOKENS: u32 = 500;

/// Tunable run behavior beyond the debate parameters themselves.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// When false the mediator does only bookkeeping and produces no
    /// user-visible announcements.
    pub mediator_speech: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mediator_speech: true,
        }
    }
}

struct Roster {
    introducer: Participant,
    opponent_a: Participant,
    opponent_b: Participant,
    mediator: Participant,
    judge: Participant,
}

struct Sessions {
    introducer: AgentSession,
    opponent_a: AgentSession,
    opponent_b: AgentSession,
    mediator: AgentSession,
    judge: AgentSession,
}

impl Sessions {
    fn debater_mut(&mut self, name: &str) -> Option<&mut AgentSession> {
        if self.opponent_a.name() == name {
            Some(&mut self.opponent_a)
        } else if self.opponent_b.name() == name {
            Some(&mut self.opponent_b)
        } else {
            None
        }
    }
}

/// Runs a full debate from configuration to judgment.
pub struct DebateRunner {
    state: SharedState,
    recorder: Recorder,
    coordinator: Coordinator,
    roster: Roster,
    sessions: Sessions,
    options: RunOptions,
    total_rounds: u32,
}

impl DebateRunner {
    /// Wire up participants, seed the initial state, and hand back the
    /// event stream the driver should consume.
    pub fn new(
        config: &Config,
        backend: Arc<dyn ReasoningBackend>,
        speech: Option<SpeechHandle>,
        options: RunOptions,
    ) -> Result<(Self, UnboundedReceiver<DebateEvent>), DebateError> {
        if config.debate.total_rounds == 0 {
            return Err(DebateError::Config(
                "total_rounds must be at least 1".to_string(),
            ));
        }

        let agents = &config.agents;
        let names = [
            agents.introducer.default_name.as_str(),
            agents.opponent_a.default_name.as_str(),
            agents.opponent_b.default_name.as_str(),
            agents.mediator.default_name.as_str(),
            agents.judge.default_name.as_str(),
        ];
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(DebateError::Config(
                    "participant names must not be empty".to_string(),
                ));
            }
            if names[..i].contains(name) {
                return Err(DebateError::Config(format!(
                    "participant names must be unique; '{name}' appears twice"
                )));
            }
        }
        let [intro_name, a_name, b_name, mediator_name, judge_name] = names.map(str::to_string);

        let roster = Roster {
            introducer: Participant::new(
                &intro_name,
                ParticipantRole::Introducer,
                config.introducer_prompt(&intro_name),
            )
            .with_voice(&agents.introducer.tts_voice)
            .with_hand_off_targets([mediator_name.clone()]),
            opponent_a: Participant::new(
                &a_name,
                ParticipantRole::Debater,
                config.opponent_prompt(&agents.opponent_a, &a_name, &config.debate.opponent_a_stance),
            )
            .with_voice(&agents.opponent_a.tts_voice)
            .with_hand_off_targets([mediator_name.clone()]),
            opponent_b: Participant::new(
                &b_name,
                ParticipantRole::Debater,
                config.opponent_prompt(&agents.opponent_b, &b_name, &config.debate.opponent_b_stance),
            )
            .with_voice(&agents.opponent_b.tts_voice)
            .with_hand_off_targets([mediator_name.clone()]),
            mediator: Participant::new(
                &mediator_name,
                ParticipantRole::Mediator,
                config.mediator_prompt(&mediator_name, &a_name, &b_name, &judge_name),
            )
            .with_voice(&agents.mediator.tts_voice)
            .with_hand_off_targets([a_name.clone(), b_name.clone(), judge_name.clone()]),
            judge: Participant::new(
                &judge_name,
                ParticipantRole::Judge,
                config.judge_prompt(&judge_name, &a_name, &b_name),
            )
            .with_voice(&agents.judge.tts_voice),
        };

        let voices = [
            &roster.introducer,
            &roster.opponent_a,
            &roster.opponent_b,
            &roster.mediator,
            &roster.judge,
        ]
        .iter()
        .map(|p| (p.name.clone(), p.voice.clone()))
        .collect();

        let state = SharedState::new(DebateState::new(
            &config.debate.theme,
            &config.debate.rules,
            &a_name,
            &b_name,
            config.debate.total_rounds,
            SpeechConfig {
                engine: config.debate.speech_engine.clone(),
                voices,
            },
        ));

        let (bus, rx) = EventBus::channel();
        let bus = Arc::new(bus);
        let recorder = Recorder::new(bus.clone(), state.clone(), speech);
        let coordinator = Coordinator::new(DebateTools::new(state.clone(), bus));

        let sessions = Sessions {
            introducer: AgentSession::new(
                &intro_name,
                &roster.introducer.system_prompt,
                backend.clone(),
            ),
            opponent_a: AgentSession::new(
                &a_name,
                &roster.opponent_a.system_prompt,
                backend.clone(),
            ),
            opponent_b: AgentSession::new(
                &b_name,
                &roster.opponent_b.system_prompt,
                backend.clone(),
            ),
            mediator: AgentSession::new(
                &mediator_name,
                &roster.mediator.system_prompt,
                backend.clone(),
            ),
            judge: AgentSession::new(&judge_name, &roster.judge.system_prompt, backend),
        };

        Ok((
            Self {
                state,
                recorder,
                coordinator,
                roster,
                sessions,
                options,
                total_rounds: config.debate.total_rounds,
            },
            rx,
        ))
    }

    /// Run the debate to completion and return the final state.
    pub async fn run(mut self) -> Result<DebateState, DebateError> {
        info!("starting debate");

        let introduction = self
            .sessions
            .introducer
            .speak(
                "Please open the debate: welcome the audience, present the theme and the rules.",
                INTRODUCTION_MAX_TOKENS,
            )
            .await?;
        Coordinator::validate_hand_off(&self.roster.introducer, &self.roster.mediator.name)?;
        self.recorder
            .record_introduction(&self.roster.introducer.name, &introduction)
            .await;
        let heard = format!(
            "[{} opened the debate]: {introduction}",
            self.roster.introducer.name
        );
        self.sessions.opponent_a.observe(heard.clone());
        self.sessions.opponent_b.observe(heard.clone());
        self.sessions.judge.observe(heard.clone());
        self.sessions.mediator.observe(heard);
        self.coordinator.introduction_complete()?;

        loop {
            match self.coordinator.select_next().await? {
                Handoff::ToDebater(name) => {
                    Coordinator::validate_hand_off(&self.roster.mediator, &name)?;
                    self.take_statement(&name).await?;
                }
                Handoff::ToJudge => {
                    Coordinator::validate_hand_off(&self.roster.mediator, &self.roster.judge.name)?;
                    self.deliver_judgment().await?;
                    break;
                }
            }
        }

        Ok(self.state.snapshot().await)
    }

    async fn take_statement(&mut self, name: &str) -> Result<(), DebateError> {
        if self.options.mediator_speech {
            let cue = format!(
                "Briefly announce that {name} now has the floor for their next statement."
            );
            let announcement = self
                .sessions
                .mediator
                .speak(&cue, ANNOUNCEMENT_MAX_TOKENS)
                .await?;
            self.recorder
                .record_mediator_announcement(&self.roster.mediator.name, &announcement)
                .await;
        }

        let round = self.state.snapshot().await.turns_for(name);
        let cue = format!(
            "[Statement {round} of {}] {name}, you have the floor. Make your case and \
             respond to your opponent's last points.",
            self.total_rounds
        );
        let session = self
            .sessions
            .debater_mut(name)
            .ok_or_else(|| DebateError::State(format!("no session for debater '{name}'")))?;
        let statement = session.speak(&cue, STATEMENT_MAX_TOKENS).await?;

        let debater = if self.roster.opponent_a.name == name {
            &self.roster.opponent_a
        } else {
            &self.roster.opponent_b
        };
        Coordinator::validate_hand_off(debater, &self.roster.mediator.name)?;
        self.recorder.record_statement(name, &statement).await;

        // Everyone else hears the statement.
        let heard = format!("[{name} said]: {statement}");
        let snapshot = self.state.snapshot().await;
        if let Some(other) = snapshot.opponent_of(name) {
            if let Some(session) = self.sessions.debater_mut(other) {
                session.observe(heard.clone());
            }
        }
        self.sessions.judge.observe(heard.clone());
        self.sessions.mediator.observe(heard);
        Ok(())
    }

    async fn deliver_judgment(&mut self) -> Result<(), DebateError> {
        self.coordinator.judge_takes_floor()?;

        if self.options.mediator_speech {
            let announcement = self
                .sessions
                .mediator
                .speak(
                    "All rounds are complete. Briefly hand the floor to the judge for the verdict.",
                    ANNOUNCEMENT_MAX_TOKENS,
                )
                .await?;
            self.recorder
                .record_mediator_announcement(&self.roster.mediator.name, &announcement)
                .await;
        }

        let raw = self
            .sessions
            .judge
            .speak(
                "The debate has concluded. Deliver your verdict now, ending with the WINNER line.",
                JUDGMENT_MAX_TOKENS,
            )
            .await?;

        let state = self.state.snapshot().await;
        let (text, winner) = split_verdict(&raw, &state.opponent_a_name, &state.opponent_b_name);
        self.recorder
            .record_judgment(&self.roster.judge.name, &text, winner)
            .await;
        self.coordinator.judgment_delivered()
    }
}

/// Separate the judge's reasoning from the declared winner.
///
/// The judge is asked to finish with a `WINNER:` marker; without one the
/// whole reply stands as the judgment text and no winner is declared.
fn split_verdict(raw: &str, opponent_a: &str, opponent_b: &str) -> (String, Winner) {
    let marker = regex::Regex::new(r"(?i)\bWINNER\s*:\s*").expect("static regex");
    match marker.find_iter(raw).last() {
        Some(m) => {
            let text = raw[..m.start()].trim().to_string();
            let winner = Winner::parse(&raw[m.end()..], opponent_a, opponent_b);
            (text, winner)
        }
        None => (raw.trim().to_string(), Winner::Draw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use crate::llm::testing::ScriptedBackend;

    fn small_config(total_rounds: u32) -> Config {
        let mut config = default_config();
        config.debate.total_rounds = total_rounds;
        config.agents.opponent_a.default_name = "Aria".to_string();
        config.agents.opponent_b.default_name = "Brent".to_string();
        config
    }

    #[test]
    fn split_verdict_extracts_winner_line() {
        let (text, winner) = split_verdict(
            "Both argued well, but one case was stronger. WINNER: Aria",
            "Aria",
            "Brent",
        );
        assert_eq!(text, "Both argued well, but one case was stronger.");
        assert_eq!(winner, Winner::Debater("Aria".to_string()));
    }

    #[test]
    fn split_verdict_without_marker_is_a_draw() {
        let (text, winner) = split_verdict("I cannot decide.", "Aria", "Brent");
        assert_eq!(text, "I cannot decide.");
        assert_eq!(winner, Winner::Draw);
    }

    #[test]
    fn split_verdict_declared_draw() {
        let (_, winner) = split_verdict("Evenly matched. WINNER: DRAW", "Aria", "Brent");
        assert_eq!(winner, Winner::Draw);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut config = small_config(1);
        config.agents.opponent_b.default_name = "Aria".to_string();

        let backend = ScriptedBackend::new(Vec::<String>::new());
        let result = DebateRunner::new(&config, backend, None, RunOptions::default());
        assert!(matches!(result, Err(DebateError::Config(_))));
    }

    #[test]
    fn zero_rounds_are_rejected() {
        let config = small_config(0);

        let backend = ScriptedBackend::new(Vec::<String>::new());
        let result = DebateRunner::new(&config, backend, None, RunOptions::default());
        assert!(matches!(result, Err(DebateError::Config(_))));
    }

    #[tokio::test]
    async fn full_run_produces_ordered_transcript() {
        let config = small_config(1);
        let backend = ScriptedBackend::new([
            "Welcome to tonight's debate on regulation.",
            "Regulation protects the public from real harms.",
            "Regulation stifles the innovation that helps people.",
            "A strong showing by the first speaker. WINNER: Aria",
        ]);

        let (runner, mut rx) = DebateRunner::new(
            &config,
            backend,
            None,
            RunOptions {
                mediator_speech: false,
            },
        )
        .unwrap();

        let final_state = runner.run().await.unwrap();

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], DebateEvent::Introduction { .. }));
        assert!(
            matches!(&events[1], DebateEvent::Statement { speaker, .. } if speaker == "Aria")
        );
        assert!(
            matches!(&events[2], DebateEvent::Statement { speaker, .. } if speaker == "Brent")
        );
        assert!(matches!(
            &events[3],
            DebateEvent::Judgment { winner: Winner::Debater(w), .. } if w == "Aria"
        ));

        // With a budget of 1, Aria's second selection triggered the
        // escalation, so her counter sits at total_rounds + 1.
        assert_eq!(final_state.turns_for("Aria"), 2);
        assert_eq!(final_state.turns_for("Brent"), 1);
        assert_eq!(final_state.current_speaker, "Aria");
    }

    #[tokio::test]
    async fn mediator_speech_adds_announcements() {
        let config = small_config(1);
        let backend = ScriptedBackend::new([
            "Welcome, everyone, to this debate.",
            "Aria will now deliver her opening statement.",
            "Regulation protects people from concentrated power.",
            "Brent now has the floor for his response.",
            "Innovation needs room to breathe, not more rules.",
            "With all rounds complete, the judge will now rule.",
            "Carefully reasoned on both sides. WINNER: Brent",
        ]);

        let (runner, mut rx) = DebateRunner::new(
            &config,
            backend,
            None,
            RunOptions {
                mediator_speech: true,
            },
        )
        .unwrap();
        runner.run().await.unwrap();

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        let announcements = events
            .iter()
            .filter(|e| matches!(e, DebateEvent::MediatorAnnouncement { .. }))
            .count();
        assert_eq!(announcements, 3);
        assert!(matches!(events.last(), Some(DebateEvent::Judgment { .. })));
    }
}
