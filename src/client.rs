use anyhow::Context;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::analysis::dto::AnalysisContext;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach the analysis service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to analyze image. Make sure the backend limit is not exceeded and the API key is valid.")]
    Rejected { status: u16 },
}

/// A picked or dropped image file on the calling side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// Calling side of `POST /api/analyze`.
#[derive(Debug, Clone)]
pub struct AnalyzeClient {
    http: reqwest::Client,
    endpoint: String,
}

impl AnalyzeClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("build http client")?;
        Ok(Self::with_http(http, base_url))
    }

    pub fn with_http(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            endpoint: format!("{}/api/analyze", base_url.trim_end_matches('/')),
        }
    }

    pub async fn submit(&self, file: &ImageFile, context: &AnalysisContext) -> Result<Value, ClientError> {
        let image = Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)?;
        let form = Form::new()
            .part("image", image)
            .text("mealType", context.meal_type.clone())
            .text("dietGoal", context.diet_goal.clone());

        let response = self.http.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        debug!(%status, file = %file.name, "analysis response");
        if !status.is_success() {
            return Err(ClientError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(response.json::<Value>().await?)
    }
}
