use crate::api::ingredients::get::IngredientResponse;
use crate::api::ingredients::is_valid_flag;
use crate::api::ErrorResponse;
use crate::get_conn;
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

#[derive(Debug, Deserialize, ToSchema)]
pub struct BarShelfRequest {
    /// Exactly 'Y' or 'N'
    pub bar_shelf_availability: String,
}

#[utoipa::path(
    patch,
    path = "/api/ingredients/{id}/bar_shelf",
    tag = "ingredients",
    params(
        ("id" = i32, Path, description = "Ingredient ID")
    ),
    request_body = BarShelfRequest,
    responses(
        (status = 200, description = "Availability updated", body = IngredientResponse),
        (status = 400, description = "Invalid availability flag", body = ErrorResponse),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    )
)]
pub async fn set_bar_shelf(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<BarShelfRequest>,
) -> impl IntoResponse {
    if !is_valid_flag(&request.bar_shelf_availability) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "bar_shelf_availability must be 'Y' or 'N'".to_string(),
            }),
        )
            .into_response();
    }

    let mut conn = get_conn!(state);

    match diesel::update(ingredients::table.find(id))
        .set(ingredients::bar_shelf_availability.eq(&request.bar_shelf_availability))
        .returning(Ingredient::as_returning())
        .get_result(&mut conn)
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
            tracing::error!(error = %e, "failed to update availability");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update availability".to_string(),
                }),
            )
                .into_response()
        }
    }
}
