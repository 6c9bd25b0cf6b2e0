use crate::api::ingredients::get::IngredientResponse;
use crate::api::ingredients::is_valid_flag;
use crate::api::ErrorResponse;
use crate::get_conn;
use crate::images::{self, ImageEntry};
use crate::models::{Ingredient, NewIngredient};
use crate::schema::ingredients;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateIngredientRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Inline uploads and/or already-stored filenames
    #[serde(default)]
    pub images: Vec<ImageEntry>,
    /// Defaults to 'N' when omitted
    #[serde(default)]
    pub bar_shelf_availability: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/ingredients",
    tag = "ingredients",
    request_body = CreateIngredientRequest,
    responses(
        (status = 201, description = "Ingredient created successfully", body = IngredientResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
pub async fn create_ingredient(
    State(state): State<AppState>,
    Json(request): Json<CreateIngredientRequest>,
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

    let flag = request
        .bar_shelf_availability
        .unwrap_or_else(|| "N".to_string());
    if !is_valid_flag(&flag) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "bar_shelf_availability must be 'Y' or 'N'".to_string(),
            }),
        )
            .into_response();
    }

    // Ingest images before touching the row; failed uploads are dropped,
    // not fatal. A saved file whose row insert then fails is an accepted
    // orphan.
    let resolved = images::resolve_images(
        &state.config.upload_dir,
        Vec::new(),
        request.images,
        &[],
        "ingredient",
    );

    let mut conn = get_conn!(state);

    let new_ingredient = NewIngredient {
        name: &request.name,
        description: request.description.as_deref(),
        category: request.category.as_deref(),
        tags: serde_json::Value::from(request.tags),
        images: serde_json::Value::from(resolved.filenames),
        bar_shelf_availability: &flag,
    };

    match diesel::insert_into(ingredients::table)
        .values(&new_ingredient)
        .returning(Ingredient::as_returning())
        .get_result(&mut conn)
    {
        Ok(row) => (
            StatusCode::CREATED,
            Json(IngredientResponse::with_skipped(row, resolved.skipped)),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to create ingredient");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create ingredient".to_string(),
                }),
            )
                .into_response()
        }
    }
}
