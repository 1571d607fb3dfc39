use thiserror::Error;
use voice_pipeline::PipelineError;
use voice_transport::TransportError;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("failed to load agent config: {0}")]
    ConfigLoad(String),
    #[error("failed to start port: {0}")]
    PortStart(String),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
