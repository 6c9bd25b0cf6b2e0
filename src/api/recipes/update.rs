use crate::api::recipes::get::RecipeResponse;
use crate::api::ErrorResponse;
use crate::get_conn;
use crate::images::{self, ImageEntry};
use crate::json_field;
use crate::models::{Recipe, RecipeIngredient};
use crate::schema::recipes;
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

/// Full replacement of the recipe's fields.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRecipeRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default)]
    pub instructions: Option<String>,
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
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated successfully", body = RecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateRecipeRequest>,
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

    let ingredients = match serde_json::to_value(&request.ingredients) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize ingredient list");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Invalid ingredient list".to_string(),
                }),
            )
                .into_response();
        }
    };

    let mut conn = get_conn!(state);

    // Fetch the current row first; its image list seeds the merge below.
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

    let resolved = images::resolve_images(
        &state.config.upload_dir,
        json_field::string_list(existing.images),
        request.images,
        &request.removed_images,
        "recipe",
    );

    match diesel::update(recipes::table.find(id))
        .set((
            recipes::name.eq(&request.name),
            recipes::description.eq(request.description.as_deref()),
            recipes::ingredients.eq(ingredients),
            recipes::instructions.eq(request.instructions.as_deref()),
            recipes::tags.eq(serde_json::Value::from(request.tags)),
            recipes::images.eq(serde_json::Value::from(resolved.filenames)),
        ))
        .returning(Recipe::as_returning())
        .get_result(&mut conn)
    {
        Ok(row) => (
            StatusCode::OK,
            Json(RecipeResponse::with_skipped(row, resolved.skipped)),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to update recipe");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}
