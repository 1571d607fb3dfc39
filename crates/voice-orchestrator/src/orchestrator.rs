//! Per-call coordinator (§4.11): wires ports into a pipeline, owns the FSM
//! and control loop, and runs the idle monitor and max-duration guard.
//!
//! Grounded in `app/core/orchestrator.py::VoiceOrchestrator`'s ordered
//! `start`/`stop` lifecycle and control loop, built from named fields instead
//! of the Python's ad hoc `self.*` assignments.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use voice_core::domain::{
    AgentConfig, AudioEncoding, AudioFormat, AudioFrame, CallSession, CarrierKind, Role, TextFrame,
};
use voice_core::{
    CallRepositoryPort, Codec, ConfigRepositoryPort, ConversationFsm, ConversationState, ControlChannel,
    ControlSignal, CrmPort, LlmPort, SttPort, ToolRegistry, TtsPort,
};
use voice_pipeline::{AudioManager, LlmProcessor, SttProcessor, TtsProcessor, VadProcessor};

use crate::error::OrchestratorError;
use crate::idle_monitor::{self, IdleAction, IdleThresholds};
use crate::rms_tracker::RmsTracker;
use crate::telnyx_client::TelnyxClient;

const IDLE_TICK: Duration = Duration::from_secs(1);
const FSM_WATCH_TICK: Duration = Duration::from_millis(100);
const HOLD_AUDIO_TICK: Duration = Duration::from_secs(2);
const HANGUP_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

fn carrier_str(carrier: CarrierKind) -> &'static str {
    match carrier {
        CarrierKind::Browser => "browser",
        CarrierKind::Twilio => "twilio",
        CarrierKind::Telnyx => "telnyx",
    }
}

/// Ports and optional best-effort repositories an Orchestrator is built from.
pub struct OrchestratorDeps {
    pub stt: Arc<dyn SttPort>,
    pub llm: Arc<dyn LlmPort>,
    pub tts: Arc<dyn TtsPort>,
    pub tools: Arc<ToolRegistry>,
    pub config_repo: Arc<dyn ConfigRepositoryPort>,
    pub call_repo: Option<Arc<dyn CallRepositoryPort>>,
    pub crm: Option<Arc<dyn CrmPort>>,
    pub telnyx: Option<Arc<TelnyxClient>>,
}

pub struct Orchestrator {
    call_id: String,
    config: AgentConfig,
    carrier: CarrierKind,
    session: Mutex<CallSession>,
    fsm: Arc<ConversationFsm>,
    control: Arc<ControlChannel>,
    audio: Arc<AudioManager>,
    transport: Arc<dyn voice_core::AudioTransport>,
    stt_port: Arc<dyn SttPort>,
    stt_processor: Arc<SttProcessor>,
    llm_processor: Arc<LlmProcessor>,
    tts_processor: Arc<TtsProcessor>,
    rms: Arc<RmsTracker>,
    call_repo: Option<Arc<dyn CallRepositoryPort>>,
    crm: Option<Arc<dyn CrmPort>>,
    telnyx: Option<Arc<TelnyxClient>>,
    call_db_id: Mutex<Option<String>>,
    call_control_id: Mutex<Option<String>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    stopped: AtomicBool,
    /// Cancels the LLM-generation phase of whichever turn is currently in
    /// flight. Set at the start of `run_user_turn`, fired by the control loop
    /// on barge-in/cancel/emergency-stop -- the only consumer of the shared
    /// `ControlChannel`, so there's no race over who gets to act on a signal.
    current_turn_cancel: Mutex<Option<CancellationToken>>,
}

impl Orchestrator {
    /// Runs the ordered `start()` sequence (§4.11 steps 1-9) and returns the
    /// live handle. Steps 2-3 (CRM lookup, call-record creation) are
    /// best-effort: their failure is logged and never aborts call setup.
    #[allow(clippy::too_many_arguments)]
    pub async fn start(
        call_id: String,
        agent_id: String,
        carrier: CarrierKind,
        transport: Arc<dyn voice_core::AudioTransport>,
        caller_phone: Option<String>,
        deps: OrchestratorDeps,
    ) -> Result<Arc<Self>, OrchestratorError> {
        // 1. load config + carrier overlay
        let base_config = deps
            .config_repo
            .get_config(&agent_id)
            .await
            .map_err(|e| OrchestratorError::ConfigLoad(e.to_string()))?;
        let mut config = base_config.for_carrier(carrier);

        // 2. CRM context, best-effort
        if let (Some(crm), Some(phone)) = (&deps.crm, &caller_phone) {
            match crm.lookup(phone).await {
                Ok(ctx) => {
                    if let Some(notes) = ctx.notes {
                        config.system_prompt = format!("{}\n\nCaller context: {notes}", config.system_prompt);
                    }
                }
                Err(err) => tracing::warn!(%err, call_id, "crm lookup failed, continuing without context"),
            }
        }

        // 3. create call record, best-effort
        let call_db_id = if let Some(repo) = &deps.call_repo {
            match repo.create_call(&call_id, carrier_str(carrier)).await {
                Ok(record) => Some(record.id),
                Err(err) => {
                    tracing::warn!(%err, call_id, "failed to persist call record, continuing");
                    None
                }
            }
        } else {
            None
        };

        // 4. build pipeline
        let fsm = Arc::new(ConversationFsm::new());
        let control = Arc::new(ControlChannel::new());
        let format = AudioFormat::for_carrier(carrier_str(carrier));
        let audio = AudioManager::new(Arc::clone(&transport), format, Arc::clone(&fsm));
        let vad = Arc::new(VadProcessor::new(config.min_confidence_chars, config.hallucination_blacklist.clone()));
        let rms = Arc::new(RmsTracker::new());
        let last_activity_ms = Arc::new(AtomicI64::new(chrono::Utc::now().timestamp_millis()));

        let stt_processor = Arc::new(SttProcessor::new(
            Arc::clone(&deps.stt),
            vad,
            Arc::clone(&fsm),
            Arc::clone(&control),
            config.interruption_threshold_chars,
            default_stop_words(),
            Arc::clone(&last_activity_ms),
        ));
        let llm_processor = Arc::new(LlmProcessor::new(
            Arc::clone(&deps.llm),
            Arc::clone(&deps.tools),
            Arc::clone(&fsm),
            config.clone(),
        ));
        let tts_processor = Arc::new(TtsProcessor::new(
            Arc::clone(&deps.tts),
            Arc::clone(&fsm),
            Arc::clone(&audio),
            config.voice.clone(),
            config.voice_language.clone(),
            format,
            config.voice_pacing_ms,
        ));

        let orchestrator = Arc::new(Self {
            call_id: call_id.clone(),
            config,
            carrier,
            session: Mutex::new(CallSession::new(carrier)),
            fsm,
            control,
            audio,
            transport,
            stt_port: deps.stt,
            stt_processor,
            llm_processor,
            tts_processor,
            rms,
            call_repo: deps.call_repo,
            crm: deps.crm,
            telnyx: deps.telnyx,
            call_db_id: Mutex::new(call_db_id),
            call_control_id: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
            stopped: AtomicBool::new(false),
            current_turn_cancel: Mutex::new(None),
        });

        orchestrator
            .stt_port
            .start(&orchestrator.config.stt_language)
            .await
            .map_err(|e| OrchestratorError::PortStart(e.to_string()))?;

        // 5. start pipeline tasks
        {
            let mut tasks = orchestrator.tasks.lock().await;
            tasks.push(orchestrator.clone().spawn_stt_loop());
            tasks.push(orchestrator.clone().spawn_fsm_watcher());
            tasks.push(orchestrator.clone().spawn_hold_audio_loop());
        }

        // 6. start AudioManager
        orchestrator.audio.start().await;

        // 7. greeting
        if let Some(greeting) = orchestrator.config.first_message.clone() {
            orchestrator.llm_processor.push_assistant(greeting.clone()).await;
            orchestrator.tts_processor.speak(&greeting).await;
        }

        // 8 & 9. control loop + idle monitor
        {
            let mut tasks = orchestrator.tasks.lock().await;
            tasks.push(orchestrator.clone().spawn_control_loop());
            tasks.push(orchestrator.clone().spawn_idle_monitor());
        }

        Ok(orchestrator)
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub async fn set_call_control_id(&self, call_control_id: String) {
        *self.call_control_id.lock().await = Some(call_control_id);
    }

    /// Feeds one inbound audio frame: decodes it for RMS measurement, updates
    /// the call's activity timestamp, and forwards it to the STT port.
    pub async fn handle_inbound_audio(&self, frame: AudioFrame) {
        {
            let mut session = self.session.lock().await;
            session.touch();
        }
        let samples = decode_linear16(&frame.data, frame.format.encoding);
        self.rms.observe(Codec::rms(&samples));
        if let Err(err) = self.stt_port.push_audio(frame).await {
            tracing::warn!(%err, call_id = %self.call_id, "failed to push inbound audio to stt port");
        }
    }

    /// `stop()` ordered steps: tasks are all independent, so cancellation is
    /// simply aborting every spawned task, then the managers beneath them,
    /// followed by the best-effort persistence updates and transport close.
    pub async fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!(call_id = %self.call_id, "stopping orchestrator");

        for task in self.tasks.lock().await.drain(..) {
            task.abort();
        }
        let _ = self.stt_port.stop().await;
        self.audio.stop().await;

        if let Some(repo) = &self.call_repo {
            if let Some(call_id) = self.call_db_id.lock().await.as_ref() {
                if let Err(err) = repo.end_call(call_id, "completed").await {
                    tracing::warn!(%err, "failed to mark call record ended");
                }
            }
        }
        if let Some(crm) = &self.crm {
            let _ = crm.record_outcome(&self.call_id, "call ended").await;
        }
        let _ = self.transport.close().await;
    }

    fn spawn_stt_loop(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let (tx, mut rx) = tokio::sync::mpsc::channel::<TextFrame>(16);
            let stt = Arc::clone(&self.stt_processor);
            let rms = Arc::clone(&self.rms);
            let reader = tokio::spawn(async move {
                stt.run(move || rms.take(), tx).await;
            });

            while let Some(frame) = rx.recv().await {
                if self.fsm.state().await != ConversationState::ToolExecuting {
                    self.fsm.transition(ConversationState::Listening, "final recognition").await;
                }
                self.run_user_turn(frame.text).await;
            }
            reader.abort();
        })
    }

    async fn run_user_turn(self: &Arc<Self>, text: String) {
        let (tts_tx, mut tts_rx) = tokio::sync::mpsc::channel::<TextFrame>(16);
        let tts_processor = Arc::clone(&self.tts_processor);
        let speaker = tokio::spawn(async move {
            while let Some(frame) = tts_rx.recv().await {
                if matches!(frame.role, Role::Assistant) {
                    tts_processor.speak(&frame.text).await;
                }
            }
        });

        let cancel = CancellationToken::new();
        *self.current_turn_cancel.lock().await = Some(cancel.clone());

        let outcome = self.llm_processor.run_turn(text, tts_tx, cancel).await;
        speaker.await.ok();
        *self.current_turn_cancel.lock().await = None;

        if let Some(digits) = outcome.dtmf_digits {
            self.send_dtmf(&digits).await;
        }
        if outcome.should_transfer {
            self.transfer_call().await;
        }
        if outcome.should_hangup {
            self.schedule_hangup();
        }
    }

    async fn send_dtmf(self: &Arc<Self>, digits: &str) {
        let (Some(telnyx), Some(call_control_id)) = (&self.telnyx, self.call_control_id.lock().await.clone()) else {
            tracing::warn!("dtmf requested but no telnyx client/call_control_id available");
            return;
        };
        if let Err(err) = telnyx.send_dtmf(&call_control_id, digits).await {
            tracing::error!(%err, "telnyx send_dtmf failed");
        }
    }

    async fn transfer_call(self: &Arc<Self>) {
        let Some(to) = self.config.transfer_to.clone() else {
            tracing::warn!("transfer requested but no transfer_to configured");
            return;
        };
        let (Some(telnyx), Some(call_control_id)) = (&self.telnyx, self.call_control_id.lock().await.clone()) else {
            tracing::warn!("transfer requested but no telnyx client/call_control_id available");
            return;
        };
        if let Err(err) = telnyx.transfer(&call_control_id, &to).await {
            tracing::error!(%err, "telnyx transfer failed");
        }
    }

    /// Stops the call once `AudioManager` drains, or after a grace period on
    /// telephony -- whichever comes first (§8, scenario S: the `[END_CALL]`
    /// tag).
    fn schedule_hangup(self: &Arc<Self>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let deadline = tokio::time::Instant::now() + HANGUP_DRAIN_TIMEOUT;
            let mut ticker = tokio::time::interval(Duration::from_millis(100));
            while tokio::time::Instant::now() < deadline {
                ticker.tick().await;
                if !this.audio.is_bot_speaking() {
                    break;
                }
            }
            this.stop().await;
        });
    }

    /// Polls the FSM back to `Idle` once TTS playback has fully drained --
    /// there's no explicit "playback complete" event from `AudioManager`, so
    /// this watcher is the mechanism that keeps the FSM from being stuck in
    /// `Speaking` forever.
    fn spawn_fsm_watcher(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(FSM_WATCH_TICK);
            loop {
                ticker.tick().await;
                if self.fsm.state().await == ConversationState::Speaking && !self.audio.is_bot_speaking() {
                    self.fsm.transition(ConversationState::Idle, "tts playback drained").await;
                }
            }
        })
    }

    /// Comfort-pulse keep-alive during tool execution (§4.7): a run of
    /// silence samples every ~2s so the carrier's jitter buffer and the
    /// caller's ear both stay primed while a tool call is in flight.
    fn spawn_hold_audio_loop(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(HOLD_AUDIO_TICK);
            loop {
                ticker.tick().await;
                if self.fsm.state().await == ConversationState::ToolExecuting {
                    self.audio.send_chunked(vec![0i16; 160]).await;
                }
            }
        })
    }

    fn spawn_control_loop(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let Some(message) = self.control.wait(Some(Duration::from_secs(1))).await else {
                    continue;
                };
                match message.signal {
                    ControlSignal::Interrupt { .. } => {
                        if self.fsm.can_interrupt().await {
                            self.fsm.transition(ConversationState::Interrupted, "barge-in").await;
                            self.audio.clear_queue().await;
                            self.cancel_current_turn().await;
                            self.fsm.transition(ConversationState::Listening, "resuming after barge-in").await;
                        }
                    }
                    ControlSignal::Cancel { .. } | ControlSignal::Clear => {
                        self.audio.clear_queue().await;
                        self.cancel_current_turn().await;
                    }
                    ControlSignal::EmergencyStop { reason } => {
                        tracing::warn!(?reason, call_id = %self.call_id, "emergency stop requested");
                        self.cancel_current_turn().await;
                        self.fsm.force_idle("emergency stop").await;
                        self.stop().await;
                        return;
                    }
                    ControlSignal::Pause | ControlSignal::Resume => {}
                }
            }
        })
    }

    /// Fires the in-flight turn's `CancellationToken`, if any. A no-op
    /// between turns, when there's nothing for the control signal to cut off.
    async fn cancel_current_turn(&self) {
        if let Some(cancel) = self.current_turn_cancel.lock().await.as_ref() {
            cancel.cancel();
        }
    }

    fn spawn_idle_monitor(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let thresholds = IdleThresholds {
                idle_timeout_secs: self.config.idle_timeout_secs,
                max_duration_secs: self.config.max_duration_secs,
                inactivity_max_retries: self.config.inactivity_max_retries,
            };
            let mut ticker = tokio::time::interval(IDLE_TICK);
            loop {
                ticker.tick().await;
                let (start_time, last_interaction_time, retries) = {
                    let session = self.session.lock().await;
                    (session.start_time, session.last_interaction_time, session.inactivity_retries)
                };
                let action = idle_monitor::evaluate(
                    &thresholds,
                    start_time,
                    last_interaction_time,
                    self.audio.is_bot_speaking(),
                    retries,
                    chrono::Utc::now(),
                );
                match action {
                    IdleAction::None => {}
                    IdleAction::PromptIdle => {
                        self.session.lock().await.inactivity_retries += 1;
                        self.tts_processor.speak("¿Sigues ahi?").await;
                    }
                    IdleAction::StopMaxDuration | IdleAction::StopIdleRetriesExhausted => {
                        self.stop().await;
                        return;
                    }
                }
            }
        })
    }
}

fn decode_linear16(bytes: &[u8], encoding: AudioEncoding) -> Vec<i16> {
    match encoding {
        AudioEncoding::Linear16 => bytes.chunks_exact(2).map(|c| i16::from_le_bytes([c[0], c[1]])).collect(),
        AudioEncoding::Mulaw => Codec::ulaw_to_linear16(bytes),
        AudioEncoding::Alaw => Codec::alaw_to_linear16(bytes),
    }
}

fn default_stop_words() -> Vec<String> {
    vec!["espera".into(), "para".into(), "stop".into(), "alto".into()]
}
