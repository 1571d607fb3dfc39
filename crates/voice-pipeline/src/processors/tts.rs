//! TTS processor stage.
//!
//! For each `TextFrame` from the LLM processor: builds SSML from the call's
//! `VoiceConfig` and language, synthesizes via `TtsPort`, and -- the §4.9 gate
//! -- checks `FSM.can_speak()` immediately before handing audio to the
//! `AudioManager`, dropping it if a barge-in raced the synthesis. This is the
//! mechanism behind testable property 4 ("no ghost output").

use std::sync::Arc;

use voice_core::domain::{AudioFormat, VoiceConfig};
use voice_core::{Codec, ConversationFsm, ConversationState, TtsPort};

use crate::audio_manager::AudioManager;

pub struct TtsProcessor {
    tts: Arc<dyn TtsPort>,
    fsm: Arc<ConversationFsm>,
    audio: Arc<AudioManager>,
    voice: VoiceConfig,
    language: String,
    target_format: AudioFormat,
    pacing_ms: u64,
}

impl TtsProcessor {
    pub fn new(
        tts: Arc<dyn TtsPort>,
        fsm: Arc<ConversationFsm>,
        audio: Arc<AudioManager>,
        voice: VoiceConfig,
        language: String,
        target_format: AudioFormat,
        pacing_ms: u64,
    ) -> Self {
        Self { tts, fsm, audio, voice, language, target_format, pacing_ms }
    }

    fn build_ssml(&self, text: &str) -> String {
        let params = self.voice.to_ssml_params();
        let prosody_attrs: String = params
            .iter()
            .filter(|(k, _)| matches!(*k, "rate" | "pitch" | "volume"))
            .map(|(k, v)| format!(r#"{k}="{v}""#))
            .collect::<Vec<_>>()
            .join(" ");
        let style = params.iter().find(|(k, _)| *k == "style").map(|(_, v)| v.clone());

        let body = if let Some(style) = style {
            let degree = params.iter().find(|(k, _)| *k == "styledegree").map(|(_, v)| v.clone()).unwrap_or_default();
            format!(r#"<mstts:express-as style="{style}" styledegree="{degree}"><prosody {prosody_attrs}>{text}</prosody></mstts:express-as>"#)
        } else {
            format!(r#"<prosody {prosody_attrs}>{text}</prosody>"#)
        };

        format!(
            r#"<speak version="1.0" xmlns:mstts="https://www.w3.org/2001/mstts" xml:lang="{lang}"><voice name="{name}">{body}</voice></speak>"#,
            lang = self.language,
            name = self.voice.name,
        )
    }

    /// Synthesizes and forwards `text`, respecting the can-speak gate.
    pub async fn speak(&self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        let ssml = self.build_ssml(text);
        let audio = match self.tts.synthesize(&ssml, &self.voice, self.target_format).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::error!(%err, "tts synthesis failed");
                return;
            }
        };

        if !self.fsm.can_speak().await {
            tracing::debug!("dropping synthesized audio, barge-in raced synthesis");
            return;
        }
        self.fsm.transition(ConversationState::Speaking, "tts output").await;

        if self.pacing_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.pacing_ms)).await;
        }

        let samples = decode_to_linear16(&audio, self.target_format.encoding);
        self.audio.send_chunked(samples).await;
    }
}

fn decode_to_linear16(bytes: &[u8], encoding: voice_core::domain::AudioEncoding) -> Vec<i16> {
    use voice_core::domain::AudioEncoding;
    match encoding {
        AudioEncoding::Linear16 => bytes.chunks_exact(2).map(|c| i16::from_le_bytes([c[0], c[1]])).collect(),
        AudioEncoding::Mulaw => Codec::ulaw_to_linear16(bytes),
        AudioEncoding::Alaw => Codec::alaw_to_linear16(bytes),
    }
}
