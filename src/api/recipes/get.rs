use crate::api::ErrorResponse;
use crate::get_conn;
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
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub ingredients: Vec<RecipeIngredient>,
    pub instructions: Option<String>,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present when some inline image uploads were dropped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_images: Option<usize>,
}

impl RecipeResponse {
    pub fn from_row(row: Recipe) -> Self {
        RecipeResponse {
            id: row.id,
            name: row.name,
            description: row.description,
            ingredients: json_field::ingredient_list(row.ingredients),
            instructions: row.instructions,
            tags: json_field::string_list(row.tags),
            images: json_field::string_list(row.images),
            created_at: row.created_at,
            updated_at: row.updated_at,
            skipped_images: None,
        }
    }

    pub fn with_skipped(row: Recipe, skipped: usize) -> Self {
        RecipeResponse {
            skipped_images: (skipped > 0).then_some(skipped),
            ..Self::from_row(row)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_recipe(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    let mut conn = get_conn!(state);

    match recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(&mut conn)
    {
        Ok(row) => (StatusCode::OK, Json(RecipeResponse::from_row(row))).into_response(),
        Err(diesel::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Recipe not found".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch recipe");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}
