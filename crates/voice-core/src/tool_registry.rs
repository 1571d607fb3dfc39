//! In-process tool registry.
//!
//! An `Arc<RwLock<HashMap<_, _>>>` keyed registry with a `call` entry point
//! that looks up, then delegates, then records elapsed time -- the same
//! shape as an out-of-process server manager, trimmed of everything
//! specific to spawning and talking to a child process: tools here are
//! in-process `ToolPort` implementations.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use crate::domain::{ToolDefinition, ToolRequest, ToolResponse};
use crate::error::CoreError;
use crate::ports::tool::ToolPort;

pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn ToolPort>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: RwLock::new(HashMap::new()) }
    }

    pub async fn register(&self, tool: Arc<dyn ToolPort>) {
        let name = tool.name().to_string();
        tracing::info!(tool = %name, "registered tool");
        self.tools.write().await.insert(name, tool);
    }

    pub async fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.read().await.values().map(|t| t.definition()).collect()
    }

    /// Executes `request.tool`, bounding it at `request.timeout_ms`.
    pub async fn call(&self, request: ToolRequest) -> ToolResponse {
        let started = Instant::now();
        let tool_name = request.tool.clone();
        let trace_id = request.trace_id.clone();
        let timeout_ms = request.timeout_ms;

        let tool = { self.tools.read().await.get(&tool_name).cloned() };
        let Some(tool) = tool else {
            return ToolResponse::failure(
                tool_name,
                format!("tool not registered: {}", request.tool),
                started.elapsed().as_secs_f64() * 1000.0,
                trace_id,
            );
        };

        let execution = tool.execute(request);
        match tokio::time::timeout(std::time::Duration::from_millis(timeout_ms), execution).await {
            Ok(Ok(response)) => response,
            Ok(Err(CoreError::ToolFailed { message, .. })) => ToolResponse::failure(
                tool_name,
                message,
                started.elapsed().as_secs_f64() * 1000.0,
                trace_id,
            ),
            Ok(Err(err)) => ToolResponse::failure(
                tool_name,
                err.to_string(),
                started.elapsed().as_secs_f64() * 1000.0,
                trace_id,
            ),
            Err(_) => ToolResponse::failure(
                tool_name,
                format!("timed out after {timeout_ms}ms"),
                started.elapsed().as_secs_f64() * 1000.0,
                trace_id,
            ),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;

    struct EchoTool;

    #[async_trait]
    impl ToolPort for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "echo".into(),
                description: "echoes its input".into(),
                json_schema: json!({}),
                required: vec![],
            }
        }

        async fn execute(&self, request: ToolRequest) -> Result<ToolResponse, CoreError> {
            Ok(ToolResponse::success("echo", request.args, 0.0, request.trace_id))
        }
    }

    struct SlowTool;

    #[async_trait]
    impl ToolPort for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition { name: "slow".into(), description: String::new(), json_schema: json!({}), required: vec![] }
        }

        async fn execute(&self, _request: ToolRequest) -> Result<ToolResponse, CoreError> {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            unreachable!("timeout should fire first")
        }
    }

    #[tokio::test]
    async fn unregistered_tool_fails_gracefully() {
        let registry = ToolRegistry::new();
        let resp = registry
            .call(ToolRequest { tool: "missing".into(), args: json!({}), trace_id: "t1".into(), timeout_ms: 10 })
            .await;
        assert!(!resp.ok);
    }

    #[tokio::test]
    async fn registered_tool_executes() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).await;
        let resp = registry
            .call(ToolRequest { tool: "echo".into(), args: json!({"x": 1}), trace_id: "t1".into(), timeout_ms: 1000 })
            .await;
        assert!(resp.ok);
        assert_eq!(resp.result.unwrap(), json!({"x": 1}));
    }

    #[tokio::test]
    async fn slow_tool_times_out() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(SlowTool)).await;
        let resp = registry
            .call(ToolRequest { tool: "slow".into(), args: json!({}), trace_id: "t1".into(), timeout_ms: 20 })
            .await;
        assert!(!resp.ok);
        assert!(resp.error.unwrap().contains("timed out"));
    }
}
