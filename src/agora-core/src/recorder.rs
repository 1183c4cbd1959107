//! Recording operations for the four speech-producing roles.
//!
//! Each operation builds the typed event, appends it to the transcript,
//! and forwards the text to the speech queue under the speaker's
//! configured voice. Speech is fire-and-forget: a missing or broken
//! renderer never touches the transcript. Recording a judgment also
//! publishes the terminal signal.

use std::sync::Arc;

use crate::events::{DebateEvent, EventBus, Winner};
use crate::speech::{SpeechHandle, SpeechRequest};
use crate::state::SharedState;

/// Voice used when a participant has no configured voice.
const FALLBACK_VOICE: &str = "af_sky";

pub struct Recorder {
    bus: Arc<EventBus>,
    state: SharedState,
    speech: Option<SpeechHandle>,
}

impl Recorder {
    /// `speech` is `None` when the renderer is unavailable; all
    /// recording operations still work, silently.
    pub fn new(bus: Arc<EventBus>, state: SharedState, speech: Option<SpeechHandle>) -> Self {
        Self { bus, state, speech }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Record the introducer's opening message.
    pub async fn record_introduction(&self, speaker: &str, text: &str) -> String {
        self.bus.emit(DebateEvent::Introduction {
            speaker: speaker.to_string(),
            text: text.to_string(),
        });
        self.speak(speaker, text).await;
        format!("Introduction from {speaker} recorded successfully and spoken.")
    }

    /// Record a debater's official statement.
    pub async fn record_statement(&self, speaker: &str, text: &str) -> String {
        self.bus.emit(DebateEvent::Statement {
            speaker: speaker.to_string(),
            text: text.to_string(),
        });
        self.speak(speaker, text).await;
        format!("Statement from {speaker} recorded successfully and spoken.")
    }

    /// Record a mediator announcement (transition narration).
    pub async fn record_mediator_announcement(&self, speaker: &str, text: &str) -> String {
        self.bus.emit(DebateEvent::MediatorAnnouncement {
            speaker: speaker.to_string(),
            text: text.to_string(),
        });
        self.speak(speaker, text).await;
        format!("Announcement from {speaker} recorded successfully and spoken: '{text}'")
    }

    /// Record the judge's verdict and terminate the run.
    ///
    /// Exactly one judgment ends a debate; after the event is emitted
    /// the stream is closed, so the judgment is the last item any
    /// consumer observes.
    pub async fn record_judgment(&self, speaker: &str, text: &str, winner: Winner) -> String {
        let spoken = format!(
            "The judgment is as follows: {text}. The declared winner is: {winner}."
        );
        self.bus.emit(DebateEvent::Judgment {
            speaker: speaker.to_string(),
            text: text.to_string(),
            winner,
        });
        self.speak(speaker, &spoken).await;
        self.bus.close();
        "Debate is over!".to_string()
    }

    async fn speak(&self, speaker: &str, text: &str) {
        let Some(handle) = &self.speech else {
            return;
        };
        let state = self.state.snapshot().await;
        let voice = state
            .speech
            .voices
            .get(speaker)
            .cloned()
            .unwrap_or_else(|| FALLBACK_VOICE.to_string());

        handle.speak(SpeechRequest {
            speaker: speaker.to_string(),
            voice,
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{DebateState, SpeechConfig};
    use std::collections::HashMap;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn recorder_without_speech() -> (Recorder, UnboundedReceiver<DebateEvent>) {
        let state = SharedState::new(DebateState::new(
            "Theme",
            "Rules",
            "Aria",
            "Brent",
            2,
            SpeechConfig {
                engine: "kokoro".to_string(),
                voices: HashMap::new(),
            },
        ));
        let (bus, rx) = EventBus::channel();
        (Recorder::new(Arc::new(bus), state, None), rx)
    }

    #[tokio::test]
    async fn all_operations_record_without_speech() {
        // Scenario E: renderer unavailable, the transcript is unaffected.
        let (recorder, _rx) = recorder_without_speech();

        recorder.record_introduction("Intro", "Welcome.").await;
        recorder.record_statement("Aria", "My case.").await;
        recorder
            .record_mediator_announcement("Mediator", "Next up: Brent.")
            .await;
        recorder
            .record_judgment("Judge", "Aria argued better.", Winner::Debater("Aria".into()))
            .await;

        let transcript = recorder.bus().transcript();
        assert_eq!(transcript.len(), 4);
        assert!(matches!(transcript[0], DebateEvent::Introduction { .. }));
        assert!(matches!(transcript[3], DebateEvent::Judgment { .. }));
    }

    #[tokio::test]
    async fn judgment_is_terminal() {
        // Scenario D: one judgment event, then end of stream.
        let (recorder, mut rx) = recorder_without_speech();

        recorder.record_statement("Aria", "My case.").await;
        let confirmation = recorder
            .record_judgment("Judge", "Close call.", Winner::Draw)
            .await;
        assert_eq!(confirmation, "Debate is over!");
        assert!(recorder.bus().is_closed());

        assert!(matches!(rx.try_recv(), Ok(DebateEvent::Statement { .. })));
        assert!(matches!(rx.try_recv(), Ok(DebateEvent::Judgment { .. })));
        assert!(rx.try_recv().is_err());

        let judgments = recorder
            .bus()
            .transcript()
            .iter()
            .filter(|e| matches!(e, DebateEvent::Judgment { .. }))
            .count();
        assert_eq!(judgments, 1);
    }

    #[tokio::test]
    async fn confirmation_texts_name_the_speaker() {
        let (recorder, _rx) = recorder_without_speech();
        let text = recorder.record_statement("Brent", "Rebuttal.").await;
        assert_eq!(text, "Statement from Brent recorded successfully and spoken.");
    }
}
