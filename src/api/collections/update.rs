use crate::api::collections::get::CollectionResponse;
use crate::api::ErrorResponse;
use crate::get_conn;
use crate::images::{self, ImageEntry};
use crate::json_field;
use crate::models::Collection;
use crate::schema::collections;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use utoipa::ToSchema;

/// Full replacement of the collection's fields.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCollectionRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub recipe_ids: Vec<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// New uploads plus the stored filenames to keep
    #[serde(default)]
    pub images: Vec<ImageEntry>,
    /// Stored filenames to drop; their files are deleted best-effort
    #[serde(default)]
    pub removed_images: Vec<String>,
}

#[utoipa::path(
    put,
    path = "/api/collections/{id}",
    tag = "collections",
    params(
        ("id" = i32, Path, description = "Collection ID")
    ),
    request_body = UpdateCollectionRequest,
    responses(
        (status = 200, description = "Collection updated successfully", body = CollectionResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Collection not found", body = ErrorResponse)
    )
)]
pub async fn update_collection(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateCollectionRequest>,
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

    let mut conn = get_conn!(state);

    // Fetch the current row first; its image list seeds the merge below.
    let existing: Collection = match collections::table
        .find(id)
        .select(Collection::as_select())
        .first(&mut conn)
    {
        Ok(row) => row,
        Err(diesel::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Collection not found".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch collection");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch collection".to_string(),
                }),
            )
                .into_response();
        }
    };

    let resolved = images::resolve_images(
        &state.config.upload_dir,
        json_field::string_list(existing.images),
        request.images,
        &request.removed_images,
        "collection",
    );

    match diesel::update(collections::table.find(id))
        .set((
            collections::name.eq(&request.name),
            collections::description.eq(request.description.as_deref()),
            collections::recipe_ids.eq(serde_json::Value::from(request.recipe_ids)),
            collections::tags.eq(serde_json::Value::from(request.tags)),
            collections::images.eq(serde_json::Value::from(resolved.filenames)),
        ))
        .returning(Collection::as_returning())
        .get_result(&mut conn)
    {
        Ok(row) => (
            StatusCode::OK,
            Json(CollectionResponse::with_skipped(row, resolved.skipped)),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to update collection");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update collection".to_string(),
                }),
            )
                .into_response()
        }
    }
}
