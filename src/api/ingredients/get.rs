use crate::api::ErrorResponse;
use crate::get_conn;
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
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngredientResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    /// 'Y' when the ingredient is physically on the bar shelf
    pub bar_shelf_availability: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present when some inline image uploads were dropped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_images: Option<usize>,
}

impl IngredientResponse {
    pub fn from_row(row: Ingredient) -> Self {
        IngredientResponse {
            id: row.id,
            name: row.name,
            description: row.description,
            category: row.category,
            tags: json_field::string_list(row.tags),
            images: json_field::string_list(row.images),
            bar_shelf_availability: row.bar_shelf_availability,
            created_at: row.created_at,
            updated_at: row.updated_at,
            skipped_images: None,
        }
    }

    pub fn with_skipped(row: Ingredient, skipped: usize) -> Self {
        IngredientResponse {
            skipped_images: (skipped > 0).then_some(skipped),
            ..Self::from_row(row)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{id}",
    tag = "ingredients",
    params(
        ("id" = i32, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 200, description = "Ingredient details", body = IngredientResponse),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    )
)]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let mut conn = get_conn!(state);

    match ingredients::table
        .find(id)
        .select(Ingredient::as_select())
        .first(&mut conn)
    {
        Ok(row) => (StatusCode::OK, Json(IngredientResponse::from_row(row))).into_response(),
        Err(diesel::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Ingredient not found".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch ingredient");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch ingredient".to_string(),
                }),
            )
                .into_response()
        }
    }
}
