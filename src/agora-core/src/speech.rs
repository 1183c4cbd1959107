//! Text-to-speech rendering with ordered playback.
//!
//! Speech is a peripheral collaborator: recording operations hand a
//! request to the playback queue and move on. The queue worker
//! synthesizes with kokoro-tiny, writes a temporary WAV, plays it with
//! `ffplay`, and removes the artifact on every path. Nothing in here
//! can fail the transcript or the turn machinery; errors degrade to
//! silent operation with a warning.

use std::process::Stdio;

use kokoro_tiny::TtsEngine;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, warn};

use crate::error::DebateError;

/// kokoro-tiny output sample rate.
const SAMPLE_RATE: u32 = 24_000;
/// Safe per-chunk text length for the synthesis engine.
const MAX_CHUNK_CHARS: usize = 200;
/// Inter-chunk pause, 0.3s at 24kHz, prevents clipped word endings.
const CHUNK_GAP_SAMPLES: usize = 7_200;
/// Trailing pause, 0.5s, prevents cutoff of the final word.
const TRAILING_GAP_SAMPLES: usize = 12_000;

/// One utterance queued for audible playback.
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub speaker: String,
    pub voice: String,
    pub text: String,
}

/// Fire-and-forget handle to the playback queue.
///
/// Cloned into the recorder; sending never blocks and never fails the
/// caller, even after the worker has shut down.
#[derive(Clone)]
pub struct SpeechHandle {
    tx: UnboundedSender<SpeechRequest>,
}

impl SpeechHandle {
    pub fn speak(&self, request: SpeechRequest) {
        if self.tx.send(request).is_err() {
            warn!("speech queue is gone; continuing silently");
        }
    }
}

/// The speech renderer: engine plus voice inventory.
pub struct SpeechRenderer {
    engine: TtsEngine,
    available_voices: Vec<String>,
}

impl SpeechRenderer {
    /// Initialize the synthesis engine (downloads the model on first
    /// run). Failure here disables speech for the run; callers treat it
    /// as a soft condition.
    pub async fn new() -> Result<Self, DebateError> {
        let engine = TtsEngine::new()
            .await
            .map_err(|e| DebateError::Speech(format!("Failed to initialize TTS engine: {e}")))?;
        let available_voices = engine.voices();

        Ok(Self {
            engine,
            available_voices,
        })
    }

    pub fn available_voices(&self) -> &[String] {
        &self.available_voices
    }

    /// Check that a voice id exists in the engine's inventory.
    pub fn validate_voice(&self, voice_id: &str) -> Result<(), DebateError> {
        if voice_id.is_empty() {
            return Err(DebateError::Speech("Voice ID cannot be empty".to_string()));
        }
        if !self.available_voices.contains(&voice_id.to_string()) {
            return Err(DebateError::Speech(format!(
                "Unknown voice '{voice_id}'"
            )));
        }
        Ok(())
    }

    /// Synthesize text in engine-safe chunks, with silence padding
    /// between chunks and at the end.
    pub fn synthesize(&mut self, text: &str, voice_id: &str) -> Result<Vec<f32>, DebateError> {
        self.validate_voice(voice_id)?;

        let mut all_samples = Vec::new();
        for chunk in split_into_chunks(text, MAX_CHUNK_CHARS) {
            if chunk.trim().is_empty() {
                continue;
            }
            let samples = self
                .engine
                .synthesize(&chunk, Some(voice_id))
                .map_err(|e| DebateError::Speech(format!("Synthesis failed: {e}")))?;
            all_samples.extend(samples);
            all_samples.extend(std::iter::repeat(0.0).take(CHUNK_GAP_SAMPLES));
        }
        all_samples.extend(std::iter::repeat(0.0).take(TRAILING_GAP_SAMPLES));

        Ok(all_samples)
    }

    /// Consume the renderer and start the playback worker.
    ///
    /// Requests are drained strictly in arrival order so utterances are
    /// heard in emission order, never overlapping.
    pub fn spawn(mut self) -> SpeechHandle {
        let (tx, mut rx) = mpsc::unbounded_channel::<SpeechRequest>();

        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                if request.text.trim().is_empty() {
                    continue;
                }
                if let Err(e) = self.render_one(&request).await {
                    warn!(speaker = %request.speaker, "speech rendering failed: {e}");
                }
            }
            debug!("speech queue drained, worker exiting");
        });

        SpeechHandle { tx }
    }

    async fn render_one(&mut self, request: &SpeechRequest) -> Result<(), DebateError> {
        let samples = self.synthesize(&request.text, &request.voice)?;

        // NamedTempFile removes the artifact on drop, including the
        // error and cancellation paths.
        let wav = tempfile::Builder::new()
            .prefix("agora-")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| DebateError::Speech(format!("Failed to create temp file: {e}")))?;

        write_wav(wav.path(), &samples)?;
        play_wav(wav.path()).await;
        Ok(())
    }
}

/// Write mono f32 samples as a WAV file.
fn write_wav(path: &std::path::Path, samples: &[f32]) -> Result<(), DebateError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| DebateError::Speech(format!("Failed to create WAV: {e}")))?;
    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| DebateError::Speech(format!("Failed to write WAV: {e}")))?;
    }
    writer
        .finalize()
        .map_err(|e| DebateError::Speech(format!("Failed to finalize WAV: {e}")))
}

/// Play a WAV file with ffplay, if installed. Playback problems are
/// logged and swallowed.
async fn play_wav(path: &std::path::Path) {
    let result = tokio::process::Command::new("ffplay")
        .args(["-autoexit", "-nodisp", "-loglevel", "quiet"])
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match result {
        Ok(status) if !status.success() => {
            warn!("ffplay exited with {status}");
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("ffplay not found in PATH; audio playback skipped");
        }
        Err(e) => {
            warn!("could not launch ffplay: {e}");
        }
    }
}

/// Split text into chunks that are safe for the synthesis engine.
fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current_chunk = String::new();

    // Split by sentence-ending punctuation first.
    for sentence in text.split_inclusive(&['.', '!', '?', ';'][..]) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }

        if current_chunk.len() + sentence.len() > max_chars {
            if !current_chunk.is_empty() {
                chunks.push(current_chunk.trim().to_string());
                current_chunk = String::new();
            }

            // A single overlong sentence falls back to comma splits.
            if sentence.len() > max_chars {
                for part in sentence.split_inclusive(',') {
                    if current_chunk.len() + part.len() > max_chars
                        && !current_chunk.is_empty()
                    {
                        chunks.push(current_chunk.trim().to_string());
                        current_chunk = String::new();
                    }
                    current_chunk.push_str(part);
                    current_chunk.push(' ');
                }
            } else {
                current_chunk.push_str(sentence);
                current_chunk.push(' ');
            }
        } else {
            current_chunk.push_str(sentence);
            current_chunk.push(' ');
        }
    }

    if !current_chunk.trim().is_empty() {
        chunks.push(current_chunk.trim().to_string());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_into_chunks_respects_limit() {
        let text = "Hello world. This is a test. Another sentence here.";
        let chunks = split_into_chunks(text, 30);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.len() <= 35); // Allow some flexibility
        }
    }

    #[test]
    fn split_into_chunks_handles_long_sentence() {
        let text = "one, two, three, four, five, six, seven, eight, nine, ten";
        let chunks = split_into_chunks(text, 20);
        assert!(chunks.len() > 1);
    }

    #[test]
    fn split_into_chunks_drops_empty_input() {
        assert!(split_into_chunks("   ", 50).is_empty());
    }

    #[test]
    fn wav_round_trip() {
        let samples = vec![0.0f32, 0.5, -0.5, 0.25];
        let file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();

        write_wav(file.path(), &samples).unwrap();

        let mut reader = hound::WavReader::open(file.path()).unwrap();
        let read: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
    }
}
