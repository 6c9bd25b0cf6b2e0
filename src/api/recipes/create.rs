use crate::api::recipes::get::RecipeResponse;
use crate::api::ErrorResponse;
use crate::get_conn;
use crate::images::{self, ImageEntry};
use crate::models::{NewRecipe, Recipe, RecipeIngredient};
use crate::schema::recipes;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Ingredient lines; each references an ingredient by name
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Inline uploads and/or already-stored filenames
    #[serde(default)]
    pub images: Vec<ImageEntry>,
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created successfully", body = RecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
pub async fn create_recipe(
    State(state): State<AppState>,
    Json(request): Json<CreateRecipeRequest>,
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

    // Ingest images before touching the row; failed uploads are dropped,
    // not fatal.
    let resolved = images::resolve_images(
        &state.config.upload_dir,
        Vec::new(),
        request.images,
        &[],
        "recipe",
    );

    let mut conn = get_conn!(state);

    let new_recipe = NewRecipe {
        name: &request.name,
        description: request.description.as_deref(),
        ingredients,
        instructions: request.instructions.as_deref(),
        tags: serde_json::Value::from(request.tags),
        images: serde_json::Value::from(resolved.filenames),
    };

    match diesel::insert_into(recipes::table)
        .values(&new_recipe)
        .returning(Recipe::as_returning())
        .get_result(&mut conn)
    {
        Ok(row) => (
            StatusCode::CREATED,
            Json(RecipeResponse::with_skipped(row, resolved.skipped)),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to create recipe");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}
