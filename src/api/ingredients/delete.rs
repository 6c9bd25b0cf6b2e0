use crate::api::{ErrorResponse, MessageResponse};
use crate::get_conn;
use crate::images;
use crate::json_field;
use crate::models::Ingredient;
use crate::schema::ingredients;
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
    path = "/api/ingredients/{id}",
    tag = "ingredients",
    params(
        ("id" = i32, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 200, description = "Ingredient deleted successfully", body = MessageResponse),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    )
)]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let mut conn = get_conn!(state);

    // Fetch first so the row's image files can be cleaned up after.
    let existing: Ingredient = match ingredients::table
        .find(id)
        .select(Ingredient::as_select())
        .first(&mut conn)
    {
        Ok(row) => row,
        Err(diesel::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Ingredient not found".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch ingredient");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch ingredient".to_string(),
                }),
            )
                .into_response();
        }
    };

    if let Err(e) = diesel::delete(ingredients::table.find(id)).execute(&mut conn) {
        tracing::error!(error = %e, "failed to delete ingredient");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to delete ingredient".to_string(),
            }),
        )
            .into_response();
    }

    // Recipes reference ingredients by name, not id, so there is nothing to
    // cascade; only the image files need best-effort cleanup.
    for filename in json_field::string_list(existing.images) {
        if let Err(e) = images::remove(&state.config.upload_dir, &filename) {
            tracing::warn!(file = %filename, error = %e, "failed to delete image file");
        }
    }

    (
        StatusCode::OK,
        Json(MessageResponse {
            message: "Ingredient deleted successfully".to_string(),
        }),
    )
        .into_response()
}
