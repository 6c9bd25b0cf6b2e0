use crate::api::ingredients::get::IngredientResponse;
use crate::api::ErrorResponse;
use crate::get_conn;
use crate::images::{self, ImageEntry};
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
use serde::Deserialize;
use utoipa::ToSchema;

/// Full replacement of the ingredient's fields. The bar-shelf flag is
/// deliberately absent; it has its own PATCH endpoint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateIngredientRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
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
    path = "/api/ingredients/{id}",
    tag = "ingredients",
    params(
        ("id" = i32, Path, description = "Ingredient ID")
    ),
    request_body = UpdateIngredientRequest,
    responses(
        (status = 200, description = "Ingredient updated successfully", body = IngredientResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    )
)]
pub async fn update_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateIngredientRequest>,
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

    let resolved = images::resolve_images(
        &state.config.upload_dir,
        json_field::string_list(existing.images),
        request.images,
        &request.removed_images,
        "ingredient",
    );

    match diesel::update(ingredients::table.find(id))
        .set((
            ingredients::name.eq(&request.name),
            ingredients::description.eq(request.description.as_deref()),
            ingredients::category.eq(request.category.as_deref()),
            ingredients::tags.eq(serde_json::Value::from(request.tags)),
            ingredients::images.eq(serde_json::Value::from(resolved.filenames)),
        ))
        .returning(Ingredient::as_returning())
        .get_result(&mut conn)
    {
        Ok(row) => (
            StatusCode::OK,
            Json(IngredientResponse::with_skipped(row, resolved.skipped)),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to update ingredient");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update ingredient".to_string(),
                }),
            )
                .into_response()
        }
    }
}
