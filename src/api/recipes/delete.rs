use crate::api::{ErrorResponse, MessageResponse};
use crate::get_conn;
use crate::images;
use crate::json_field;
use crate::models::Recipe;
use crate::schema::recipes;
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
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe deleted successfully", body = MessageResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let mut conn = get_conn!(state);

    // Fetch first so the row's image files can be cleaned up after.
    let existing: Recipe = match recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(&mut conn)
    {
        Ok(row) => row,
        Err(diesel::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Recipe not found".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch recipe");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    if let Err(e) = diesel::delete(recipes::table.find(id)).execute(&mut conn) {
        tracing::error!(error = %e, "failed to delete recipe");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to delete recipe".to_string(),
            }),
        )
            .into_response();
    }

    // Collections keep the dead id in their lists; it just resolves to
    // nothing on read. Only the image files need best-effort cleanup.
    for filename in json_field::string_list(existing.images) {
        if let Err(e) = images::remove(&state.config.upload_dir, &filename) {
            tracing::warn!(file = %filename, error = %e, "failed to delete image file");
        }
    }

    (
        StatusCode::OK,
        Json(MessageResponse {
            message: "Recipe deleted successfully".to_string(),
        }),
    )
        .into_response()
}
