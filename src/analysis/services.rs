use anyhow::Context;
use serde_json::Value;
use tracing::{error, info};

use super::{
    dto::{AnalysisContext, IngestedUpload},
    error::AnalyzeError,
    lease::ImageLease,
    parser::parse_reply,
    prompt::build_prompt,
};
use crate::{inference::InferenceClient, state::AppState};

/// Stage the upload, ask the backend, parse its reply. The staged image is
/// released on every path.
pub async fn analyze_upload(state: &AppState, upload: IngestedUpload) -> Result<Value, AnalyzeError> {
    let IngestedUpload { image, context } = upload;

    let mut lease = ImageLease::acquire(state.store.clone(), image)
        .await
        .map_err(|e| {
            let cause = format!("{:#}", e);
            error!(error = %cause, "could not stage upload");
            AnalyzeError::Internal(e)
        })?;

    match run_pipeline(&state.inference, &mut lease, &context).await {
        Ok(reply) => {
            info!(key = %lease.key(), meal_type = %context.meal_type, diet_goal = %context.diet_goal, "image analyzed");
            Ok(reply)
        }
        Err(e) => {
            let cause = format!("{:#}", e);
            error!(key = %lease.key(), error = %cause, "image analysis failed");
            lease.release_after_failure().await;
            Err(AnalyzeError::Internal(e))
        }
    }
}

async fn run_pipeline(
    inference: &InferenceClient,
    lease: &mut ImageLease,
    context: &AnalysisContext,
) -> anyhow::Result<Value> {
    let image = lease.read().await?;
    let prompt = build_prompt(context);

    let raw = inference
        .generate(&prompt, &image, lease.content_type())
        .await
        .context("vision inference")?;

    lease.release().await?;

    let reply = parse_reply(&raw)?;
    Ok(reply)
}
