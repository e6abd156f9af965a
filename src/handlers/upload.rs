// handlers/upload.rs - multipart image upload to the external store
use axum::{
    extract::{Multipart, State},
    Json,
};
use base64::Engine as _;
use futures::future::try_join_all;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::AppState;

/// POST /upload - push listing photos to the image store (owner only)
///
/// Every file in the `images` field is re-encoded as a data URI and
/// forwarded. Uploads run concurrently; one failure fails the whole batch
/// with no partial-success reporting.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut data_uris: Vec<String> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed upload body: {e}")))?
    {
        if field.name() != Some("images") {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Malformed upload body: {e}")))?;
        if bytes.is_empty() {
            continue;
        }

        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        data_uris.push(format!("data:{content_type};base64,{encoded}"));
    }

    if data_uris.is_empty() {
        return Err(ApiError::validation("No files uploaded"));
    }

    let uploads = data_uris.iter().map(|uri| state.images.upload(uri));
    let image_urls = try_join_all(uploads).await.map_err(|e| {
        tracing::error!(error = %e, "image upload batch failed");
        ApiError::upstream("Image upload failed")
    })?;

    Ok(Json(json!({
        "message": "Images uploaded successfully",
        "imageUrls": image_urls,
    })))
}
