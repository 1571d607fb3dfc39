//! Outbound audio pacing.
//!
//! Method shapes (`send_chunked`, `clear_queue`, `is_bot_speaking`,
//! `set_background`) are grounded in
//! `app/core/managers/audio_manager.py::AudioManager`. The stream-loop
//! *contract* -- single 20ms-cadence iteration mixing TTS and background audio
//! together every tick, rather than the original's "queue OR background,
//! never both" two-path polling -- follows the tighter design the system
//! specification calls out explicitly (its own prose takes precedence over
//! the original's simpler implementation here).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use voice_core::domain::{AudioEncoding, AudioFormat};
use voice_core::{AudioTransport, Codec, ConversationFsm, ConversationState};

const FRAME_INTERVAL: Duration = Duration::from_millis(20);
const TELEPHONY_FRAME_BYTES: usize = 160;
const BACKGROUND_GAIN: f32 = 0.15;

struct BackgroundLoop {
    samples: Vec<i16>,
    index: usize,
}

impl BackgroundLoop {
    fn next_chunk(&mut self, len: usize) -> Vec<i16> {
        let mut out = Vec::with_capacity(len);
        if self.samples.is_empty() {
            return vec![0; len];
        }
        for _ in 0..len {
            out.push(self.samples[self.index]);
            self.index = (self.index + 1) % self.samples.len();
        }
        out
    }
}

pub struct AudioManager {
    transport: Arc<dyn AudioTransport>,
    format: AudioFormat,
    fsm: Arc<ConversationFsm>,
    tts_tx: mpsc::Sender<Vec<i16>>,
    tts_rx: Mutex<mpsc::Receiver<Vec<i16>>>,
    // Leftover samples from the last dequeue that didn't fill a whole frame.
    // Shared with `clear_queue` so a barge-in can't leave up to one chunk's
    // worth of already-dequeued audio stranded past the channel drain.
    carry: Mutex<Vec<i16>>,
    background: Mutex<Option<BackgroundLoop>>,
    is_bot_speaking: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AudioManager {
    pub fn new(transport: Arc<dyn AudioTransport>, format: AudioFormat, fsm: Arc<ConversationFsm>) -> Arc<Self> {
        let (tts_tx, tts_rx) = mpsc::channel(64);
        Arc::new(Self {
            transport,
            format,
            fsm,
            tts_tx,
            tts_rx: Mutex::new(tts_rx),
            carry: Mutex::new(Vec::new()),
            background: Mutex::new(None),
            is_bot_speaking: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        })
    }

    pub fn is_bot_speaking(&self) -> bool {
        self.is_bot_speaking.load(Ordering::SeqCst)
    }

    /// Enqueues linear16 PCM for paced transmission.
    pub async fn send_chunked(&self, samples: Vec<i16>) {
        self.is_bot_speaking.store(true, Ordering::SeqCst);
        let _ = self.tts_tx.send(samples).await;
    }

    /// Loads a loop buffer (already decoded to linear16 PCM) played softly
    /// under silence to keep the carrier's jitter buffer primed.
    pub async fn set_background(&self, samples: Vec<i16>) {
        *self.background.lock().await = Some(BackgroundLoop { samples, index: 0 });
    }

    /// Drops all pending TTS audio -- used on barge-in. Must clear both the
    /// channel and `carry`: the stream loop can pull an entire `send_chunked`
    /// call into `carry` on a single tick, and a drain that only empties the
    /// channel would leave that audio to keep playing out for seconds.
    pub async fn clear_queue(&self) {
        let mut rx = self.tts_rx.lock().await;
        let mut dropped = 0;
        while rx.try_recv().is_ok() {
            dropped += 1;
        }
        let mut carry = self.carry.lock().await;
        if !carry.is_empty() {
            dropped += 1;
            carry.clear();
        }
        if dropped > 0 {
            tracing::debug!(dropped, "cleared pending audio frames");
        }
        self.is_bot_speaking.store(false, Ordering::SeqCst);
    }

    pub async fn start(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.run().await });
        *self.task.lock().await = Some(handle);
    }

    pub async fn stop(&self) {
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
        }
    }

    fn frame_samples(&self) -> usize {
        match self.format.encoding {
            AudioEncoding::Linear16 => (self.format.sample_rate as usize) / 50,
            AudioEncoding::Mulaw | AudioEncoding::Alaw => TELEPHONY_FRAME_BYTES,
        }
    }

    async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(FRAME_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let frame_len = self.frame_samples();

        loop {
            ticker.tick().await;

            let mut tts_chunk = {
                let mut carry = self.carry.lock().await;

                // pull enough TTS samples for one frame, carrying leftovers forward
                while carry.len() < frame_len {
                    let next = { self.tts_rx.lock().await.try_recv().ok() };
                    match next {
                        Some(mut chunk) => carry.append(&mut chunk),
                        None => break,
                    }
                }
                let tts_chunk: Vec<i16> = if carry.len() >= frame_len {
                    carry.drain(..frame_len).collect()
                } else {
                    std::mem::take(&mut *carry)
                };

                if tts_chunk.is_empty() && carry.is_empty() {
                    self.is_bot_speaking.store(false, Ordering::SeqCst);
                }
                tts_chunk
            };

            // Property 4 ("no ghost output"): once the FSM has left Speaking
            // for Listening/Interrupted/Ending, nothing queued may reach the
            // transport even if it was already dequeued this tick.
            let blocked = matches!(
                self.fsm.state().await,
                ConversationState::Listening | ConversationState::Interrupted | ConversationState::Ending
            );
            if blocked && !tts_chunk.is_empty() {
                tts_chunk.clear();
            }

            let bg_chunk = {
                let mut bg = self.background.lock().await;
                match bg.as_mut() {
                    Some(loop_buf) => Codec::scale(&loop_buf.next_chunk(frame_len), BACKGROUND_GAIN),
                    None => vec![0i16; frame_len],
                }
            };

            let mixed = if tts_chunk.is_empty() {
                bg_chunk
            } else {
                Codec::add_saturating(&tts_chunk, &bg_chunk)
            };

            let encoded = match self.format.encoding {
                AudioEncoding::Linear16 => mixed.iter().flat_map(|s| s.to_le_bytes()).collect(),
                AudioEncoding::Mulaw => Codec::linear16_to_ulaw(&mixed),
                AudioEncoding::Alaw => Codec::linear16_to_alaw(&mixed),
            };

            if self.transport.send_audio(&encoded).await.is_err() {
                tracing::info!("transport closed, stopping audio stream loop");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::AtomicUsize;
    use voice_core::error::CoreError;

    struct CountingTransport {
        sent: AtomicUsize,
        last_frame: Mutex<Vec<u8>>,
    }

    #[async_trait]
    impl AudioTransport for CountingTransport {
        async fn send_audio(&self, audio: &[u8]) -> Result<(), CoreError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            *self.last_frame.lock().await = audio.to_vec();
            Ok(())
        }
        async fn send_json(&self, _value: Value) -> Result<(), CoreError> {
            Ok(())
        }
        async fn set_stream_id(&self, _stream_id: String) {}
        async fn close(&self) -> Result<(), CoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn clear_queue_resets_speaking_flag() {
        let transport = Arc::new(CountingTransport { sent: AtomicUsize::new(0), last_frame: Mutex::new(Vec::new()) });
        let mgr = AudioManager::new(transport, AudioFormat::for_carrier("twilio"), Arc::new(ConversationFsm::new()));
        mgr.send_chunked(vec![100; 160]).await;
        assert!(mgr.is_bot_speaking());
        mgr.clear_queue().await;
        assert!(!mgr.is_bot_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn stream_loop_emits_frames_on_cadence() {
        let transport = Arc::new(CountingTransport { sent: AtomicUsize::new(0), last_frame: Mutex::new(Vec::new()) });
        let mgr = AudioManager::new(
            Arc::clone(&transport) as Arc<dyn AudioTransport>,
            AudioFormat::for_carrier("twilio"),
            Arc::new(ConversationFsm::new()),
        );
        mgr.start().await;
        tokio::time::advance(Duration::from_millis(100)).await;
        tokio::task::yield_now().await;
        mgr.stop().await;
        assert!(transport.sent.load(Ordering::SeqCst) >= 3);
    }

    /// A single enqueue larger than one frame gets pulled entirely into
    /// `carry` on the first tick; `clear_queue` must still be able to drop it.
    #[tokio::test]
    async fn clear_queue_drops_samples_already_pulled_into_carry() {
        let transport = Arc::new(CountingTransport { sent: AtomicUsize::new(0), last_frame: Mutex::new(Vec::new()) });
        let mgr = AudioManager::new(transport, AudioFormat::for_carrier("twilio"), Arc::new(ConversationFsm::new()));
        mgr.send_chunked(vec![100; 10 * TELEPHONY_FRAME_BYTES]).await;
        // simulate the stream loop's first tick pulling the whole chunk into carry
        {
            let mut carry = mgr.carry.lock().await;
            while carry.len() < TELEPHONY_FRAME_BYTES {
                if let Some(mut chunk) = mgr.tts_rx.lock().await.try_recv().ok() {
                    carry.append(&mut chunk);
                } else {
                    break;
                }
            }
        }
        assert!(!mgr.carry.lock().await.is_empty());
        mgr.clear_queue().await;
        assert!(mgr.carry.lock().await.is_empty());
        assert!(!mgr.is_bot_speaking());
    }

    /// Once the FSM has moved past Speaking into Listening, any audio still
    /// sitting in carry must not reach the transport: the emitted frame
    /// should be silence, not the carried samples.
    #[tokio::test(start_paused = true)]
    async fn blocked_state_suppresses_carried_audio_on_emit() {
        let transport = Arc::new(CountingTransport { sent: AtomicUsize::new(0), last_frame: Mutex::new(Vec::new()) });
        let fsm = Arc::new(ConversationFsm::new());
        let format = AudioFormat::for_carrier("twilio");
        let mgr = AudioManager::new(Arc::clone(&transport) as Arc<dyn AudioTransport>, format, Arc::clone(&fsm));
        *mgr.carry.lock().await = vec![12345i16; TELEPHONY_FRAME_BYTES];
        fsm.transition(ConversationState::Listening, "test barge-in").await;

        mgr.start().await;
        tokio::time::advance(FRAME_INTERVAL).await;
        tokio::task::yield_now().await;
        mgr.stop().await;

        let silence_frame = Codec::linear16_to_ulaw(&vec![0i16; TELEPHONY_FRAME_BYTES]);
        assert_eq!(*transport.last_frame.lock().await, silence_frame);
    }
}
