use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::Value;
use tracing::{error, instrument, warn};

use super::{
    dto::{AnalysisContext, IngestedUpload, UploadedImage},
    error::{AnalyzeError, ValidationError},
    services::analyze_upload,
};
use crate::state::AppState;

pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/analyze", post(analyze_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// POST /api/analyze (multipart)
/// Fields: image (file, required), mealType, dietGoal (text, optional)
#[instrument(skip(state, mp))]
pub async fn analyze_image(
    State(state): State<AppState>,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AnalyzeError> {
    let upload = match mp {
        Ok(mp) => ingest(mp).await?,
        Err(rejection) => {
            warn!(error = %rejection, "request is not multipart");
            return Err(ValidationError::NoImage.into());
        }
    };

    // own task: a dropped connection must not skip releasing the upload
    let reply = tokio::spawn(async move { analyze_upload(&state, upload).await })
        .await
        .map_err(|e| {
            error!(error = %e, "analysis task did not complete");
            AnalyzeError::Internal(e.into())
        })??;

    Ok(Json(reply))
}

/// Reads every field before anything is stored, so a rejected request
/// never creates a transient object.
pub async fn ingest(mut mp: Multipart) -> Result<IngestedUpload, ValidationError> {
    let mut image: Option<UploadedImage> = None;
    let mut meal_type: Option<String> = None;
    let mut diet_goal: Option<String> = None;

    loop {
        let field = match mp.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_failure(e)),
        };

        let name = field.name().unwrap_or_default().to_string();
        let is_file = field.file_name().is_some();
        match name.as_str() {
            // a plain text part named `image` is a form field, not an upload
            "image" if !is_file => warn!("ignoring non-file image part"),
            "image" => {
                if image.is_some() {
                    warn!("more than one image part");
                    return Err(ValidationError::MultipleImages);
                }
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                let bytes = field.bytes().await.map_err(multipart_failure)?;
                image = Some(UploadedImage { bytes, content_type });
            }
            "mealType" => meal_type = Some(field.text().await.map_err(multipart_failure)?),
            "dietGoal" => diet_goal = Some(field.text().await.map_err(multipart_failure)?),
            _ => {}
        }
    }

    let image = image.ok_or_else(|| {
        warn!("no image part in upload");
        ValidationError::NoImage
    })?;

    Ok(IngestedUpload {
        image,
        context: AnalysisContext::from_fields(meal_type, diet_goal),
    })
}

fn multipart_failure(e: axum::extract::multipart::MultipartError) -> ValidationError {
    warn!(error = %e, "unreadable multipart body");
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ValidationError::TooLarge
    } else {
        ValidationError::MalformedUpload
    }
}
