use crate::api::collections::get::CollectionResponse;
use crate::api::ErrorResponse;
use crate::get_conn;
use crate::images::{self, ImageEntry};
use crate::models::{Collection, NewCollection};
use crate::schema::collections;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCollectionRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Ids of member recipes; not validated against the recipes table
    #[serde(default)]
    pub recipe_ids: Vec<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Inline uploads and/or already-stored filenames
    #[serde(default)]
    pub images: Vec<ImageEntry>,
}

#[utoipa::path(
    post,
    path = "/api/collections",
    tag = "collections",
    request_body = CreateCollectionRequest,
    responses(
        (status = 201, description = "Collection created successfully", body = CollectionResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
pub async fn create_collection(
    State(state): State<AppState>,
    Json(request): Json<CreateCollectionRequest>,
) -> impl IntoResponse {
    if request.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Name cannot be empty".to_string(),
            }),
        )
            .into_response();
    }

    let resolved = images::resolve_images(
        &state.config.upload_dir,
        Vec::new(),
        request.images,
        &[],
        "collection",
    );

    let mut conn = get_conn!(state);

    let new_collection = NewCollection {
        name: &request.name,
        description: request.description.as_deref(),
        recipe_ids: serde_json::Value::from(request.recipe_ids),
        tags: serde_json::Value::from(request.tags),
        images: serde_json::Value::from(resolved.filenames),
    };

    match diesel::insert_into(collections::table)
        .values(&new_collection)
        .returning(Collection::as_returning())
        .get_result(&mut conn)
    {
        Ok(row) => (
            StatusCode::CREATED,
            Json(CollectionResponse::with_skipped(row, resolved.skipped)),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to create collection");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create collection".to_string(),
                }),
            )
                .into_response()
        }
    }
}
