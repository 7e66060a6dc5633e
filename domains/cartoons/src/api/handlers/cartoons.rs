//! Cartoon generation and gallery handlers

use axum::{extract::State, Json};
use cartoonist_common::extractors::trimmed;
use cartoonist_common::{Pagination, Result, ValidatedJson, ValidatedQuery};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::middleware::CartoonsState;
use crate::domain::entities::GenerationRequest;
use crate::pipeline::GalleryItem;

/// Request body for `POST /generate`
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDebug {
    pub image_prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// Public URL of the stored image
    pub data: String,
    pub debug: GenerateDebug,
}

#[derive(Debug, Serialize)]
pub struct ListImagesResponse {
    pub data: Vec<GalleryItem>,
    pub total: i64,
}

/// Run the generation pipeline for one topic
pub async fn generate(
    State(state): State<CartoonsState>,
    ValidatedJson(req): ValidatedJson<GenerateRequest>,
) -> Result<Json<GenerateResponse>> {
    let request = GenerationRequest::new(&req.prompt)?;
    let outcome = state.pipeline.run(&request).await?;

    tracing::info!(id = outcome.record.id, key = %outcome.record.key, "Cartoon generated");

    Ok(Json(GenerateResponse {
        data: outcome.public_url,
        debug: GenerateDebug {
            image_prompt: outcome.image_prompt,
        },
    }))
}

/// List stored cartoons, newest first
pub async fn list_images(
    State(state): State<CartoonsState>,
    ValidatedQuery(page): ValidatedQuery<Pagination>,
) -> Result<Json<ListImagesResponse>> {
    let page = state.gallery.list_recent(page).await?;
    Ok(Json(ListImagesResponse {
        data: page.items,
        total: page.total,
    }))
}
