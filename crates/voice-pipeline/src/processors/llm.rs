//! LLM processor: prompt assembly, streaming generation, the function-calling
//! loop, and sentence-segmented forwarding to TTS.
//!
//! Grounded in `app/core/orchestrator.py`'s turn-handling logic combined with
//! `app/domain/models/llm_models.py`'s `LLMChunk`/`LLMFunctionCall` streaming
//! contract. The tag-stripping vocabulary (`[END_CALL]`/`[TRANSFER]`/
//! `[DTMF:…]`) and the "hold the buffer on an unclosed tag prefix" flush rule
//! are this crate's own tag set, built the same way a sentence-bounded flush
//! loop for TTS input normally works: accumulate until a safe boundary,
//! then hand the chunk off.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use voice_core::domain::{AgentConfig, Message, Role, TextFrame, ToolRequest};
use voice_core::{ConversationFsm, ConversationState, LlmPort, ToolRegistry};

use crate::text_utils::{ends_with_sentence_boundary, has_unclosed_tag_prefix, strip_control_tags, ControlTags};

const MAX_TOOL_CALL_DEPTH: u32 = 4;

#[derive(Debug, Clone, Default)]
pub struct TurnOutcome {
    pub should_hangup: bool,
    pub should_transfer: bool,
    pub dtmf_digits: Option<String>,
    pub was_interrupted: bool,
}

pub struct LlmProcessor {
    llm: Arc<dyn LlmPort>,
    tools: Arc<ToolRegistry>,
    fsm: Arc<ConversationFsm>,
    config: AgentConfig,
    history: Mutex<Vec<Message>>,
}

impl LlmProcessor {
    pub fn new(llm: Arc<dyn LlmPort>, tools: Arc<ToolRegistry>, fsm: Arc<ConversationFsm>, config: AgentConfig) -> Self {
        let mut history = Vec::new();
        history.push(Message::system(config.system_prompt.clone()));
        Self { llm, tools, fsm, config, history: Mutex::new(history) }
    }

    pub async fn history_snapshot(&self) -> Vec<Message> {
        self.history.lock().await.clone()
    }

    /// Seeds the history with an assistant turn that didn't come from the
    /// LLM itself (the configured greeting) so later turns see it as context.
    pub async fn push_assistant(&self, text: impl Into<String>) {
        self.history.lock().await.push(Message::assistant(text));
    }

    fn prompt_slice(&self, history: &[Message]) -> Vec<Message> {
        let system = history.first().cloned();
        let rest = &history[1.min(history.len())..];
        let start = rest.len().saturating_sub(self.config.context_window);
        let mut slice: Vec<Message> = system.into_iter().collect();
        slice.extend_from_slice(&rest[start..]);
        slice
    }

    /// Runs one full user turn: appends the user's text, drives the LLM
    /// (looping through any function calls), forwards sentence-bounded text
    /// to `out_tx`, and returns once the turn is complete or interrupted.
    /// `cancel` is a per-turn token the orchestrator fires on barge-in or
    /// cancel, independent of the shared control channel -- that channel has
    /// only one consumer (the orchestrator's control loop) to avoid racing
    /// two readers over its single-slot latest-wins message.
    pub async fn run_turn(&self, user_text: String, out_tx: mpsc::Sender<TextFrame>, cancel: CancellationToken) -> TurnOutcome {
        {
            let mut history = self.history.lock().await;
            history.push(Message::user(user_text));
        }
        self.fsm.transition(ConversationState::Processing, "user turn").await;

        for _depth in 0..MAX_TOOL_CALL_DEPTH {
            let messages = {
                let history = self.history.lock().await;
                self.prompt_slice(&history)
            };
            let tool_defs = self.tools.definitions().await;

            let mut stream = match self.llm.generate(&messages, &tool_defs, self.config.temperature, self.config.max_tokens).await {
                Ok(s) => s,
                Err(err) => {
                    tracing::error!(%err, "llm generation failed to start");
                    return TurnOutcome::default();
                }
            };

            let mut buffer = String::new();
            let mut full_text = String::new();
            let mut outcome = TurnOutcome::default();
            let mut called_tool = false;

            loop {
                tokio::select! {
                    chunk = stream.next_chunk() => {
                        let Some(chunk) = chunk else { break };

                        if let Some(call) = chunk.function_call {
                            self.history.lock().await.push(Message::assistant(format!("[TOOL_CALL: {}]", call.name)));
                            self.fsm.transition(ConversationState::ToolExecuting, "function call").await;

                            let request = ToolRequest {
                                tool: call.name.clone(),
                                args: call.arguments,
                                trace_id: call.call_id.clone().unwrap_or_default(),
                                timeout_ms: self.config.tool_timeout_ms_default,
                            };
                            let response = self.tools.call(request).await;

                            self.fsm.transition(ConversationState::Processing, "tool finished").await;
                            self.history.lock().await.push(Message::tool(
                                response.to_tool_message_content(),
                                call.call_id.unwrap_or_default(),
                            ));
                            called_tool = true;
                            break;
                        }

                        if let Some(text) = chunk.text {
                            if !text.is_empty() {
                                buffer.push_str(&text);
                                full_text.push_str(&text);
                                if ends_with_sentence_boundary(&buffer) && !has_unclosed_tag_prefix(&buffer) {
                                    self.flush(&mut buffer, &mut outcome, &out_tx).await;
                                }
                            }
                        }

                        if chunk.finish_reason.is_some() {
                            break;
                        }
                    }
                    () = cancel.cancelled() => {
                        stream.cancel().await;
                        outcome.was_interrupted = true;
                        break;
                    }
                }
                if outcome.was_interrupted {
                    break;
                }
            }

            if outcome.was_interrupted {
                self.flush(&mut buffer, &mut outcome, &out_tx).await;
                if !full_text.is_empty() {
                    self.history.lock().await.push(Message::assistant(format!("[INTERRUPTED] {full_text}")));
                }
                return outcome;
            }

            if called_tool {
                continue;
            }

            self.flush(&mut buffer, &mut outcome, &out_tx).await;
            if !full_text.is_empty() {
                self.history.lock().await.push(Message::assistant(full_text));
            }
            return outcome;
        }

        tracing::warn!("exceeded max tool-call depth, aborting turn");
        self.history.lock().await.push(Message::assistant("Lo siento, hubo un problema procesando tu solicitud."));
        TurnOutcome::default()
    }

    async fn flush(&self, buffer: &mut String, outcome: &mut TurnOutcome, out_tx: &mpsc::Sender<TextFrame>) {
        if buffer.is_empty() {
            return;
        }
        let (clean, tags) = strip_control_tags(buffer);
        apply_tags(tags, outcome);
        buffer.clear();
        if !clean.trim().is_empty() {
            let _ = out_tx.send(TextFrame::new(clean, Role::Assistant)).await;
        }
    }
}

fn apply_tags(tags: ControlTags, outcome: &mut TurnOutcome) {
    if tags.should_hangup {
        outcome.should_hangup = true;
    }
    if tags.should_transfer {
        outcome.should_transfer = true;
    }
    if tags.dtmf_digits.is_some() {
        outcome.dtmf_digits = tags.dtmf_digits;
    }
}
