//! Vision-language inference capability.
//!
//! The variant is chosen once when the process starts and is carried in
//! [`crate::state::AppState`]; nothing here reads the environment.

pub mod gemini;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::GeminiConfig;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("vision backend is not configured")]
    Unavailable,

    #[error("vision backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("vision backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("vision backend returned no text")]
    EmptyReply,
}

/// Something that can answer a prompt about one image with raw text.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<String, InferenceError>;
}

#[derive(Clone)]
pub enum InferenceClient {
    Live(Arc<dyn VisionBackend>),
    Unavailable,
}

impl InferenceClient {
    pub fn from_config(cfg: &GeminiConfig) -> anyhow::Result<Self> {
        match &cfg.api_key {
            Some(key) => {
                let client = gemini::GeminiClient::new(key.clone(), &cfg.model, &cfg.base_url)?;
                info!(model = %cfg.model, "vision backend configured");
                Ok(Self::Live(Arc::new(client)))
            }
            None => {
                warn!("no valid GEMINI_API_KEY found; analysis requests will fail until one is configured");
                Ok(Self::Unavailable)
            }
        }
    }

    /// Single attempt, no retry.
    pub async fn generate(
        &self,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<String, InferenceError> {
        match self {
            Self::Live(backend) => backend.generate(prompt, image, mime_type).await,
            Self::Unavailable => Err(InferenceError::Unavailable),
        }
    }
}
