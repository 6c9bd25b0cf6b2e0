use crate::api::{ErrorResponse, MessageResponse};
use crate::get_conn;
use crate::images;
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

#[utoipa::path(
    delete,
    path = "/api/collections/{id}",
    tag = "collections",
    params(
        ("id" = i32, Path, description = "Collection ID")
    ),
    responses(
        (status = 200, description = "Collection deleted successfully", body = MessageResponse),
        (status = 404, description = "Collection not found", body = ErrorResponse)
    )
)]
pub async fn delete_collection(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let mut conn = get_conn!(state);

    // Fetch first so the row's image files can be cleaned up after.
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

    if let Err(e) = diesel::delete(collections::table.find(id)).execute(&mut conn) {
        tracing::error!(error = %e, "failed to delete collection");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to delete collection".to_string(),
            }),
        )
            .into_response();
    }

    // Deleting a collection never touches its member recipes.
    for filename in json_field::string_list(existing.images) {
        if let Err(e) = images::remove(&state.config.upload_dir, &filename) {
            tracing::warn!(file = %filename, error = %e, "failed to delete image file");
        }
    }

    (
        StatusCode::OK,
        Json(MessageResponse {
            message: "Collection deleted successfully".to_string(),
        }),
    )
        .into_response()
}
