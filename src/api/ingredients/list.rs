use crate::api::ingredients::get::IngredientResponse;
use crate::api::ErrorResponse;
use crate::get_conn;
use crate::models::Ingredient;
use crate::raw_sql::{like_pattern, parse_tags_param};
use crate::schema::ingredients;
use crate::{tags_overlap, AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListIngredientsParams {
    /// Case-insensitive substring match on name or description
    pub search: Option<String>,
    /// Comma-separated tags; matches ingredients carrying ANY of them
    pub tags: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    tag = "ingredients",
    params(ListIngredientsParams),
    responses(
        (status = 200, description = "List of matching ingredients", body = Vec<IngredientResponse>)
    )
)]
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(params): Query<ListIngredientsParams>,
) -> impl IntoResponse {
    let search_pattern = params
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(like_pattern);
    let tag_list = parse_tags_param(params.tags.as_deref());

    let mut conn = get_conn!(state);

    let mut query = ingredients::table.into_boxed();

    if let Some(ref pattern) = search_pattern {
        query = query.filter(
            ingredients::name
                .ilike(pattern)
                .or(ingredients::description.ilike(pattern)),
        );
    }

    if !tag_list.is_empty() {
        query = query.filter(tags_overlap!(tag_list));
    }

    let rows: Vec<Ingredient> = match query
        .select(Ingredient::as_select())
        .order(ingredients::name.asc())
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "failed to list ingredients");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch ingredients".to_string(),
                }),
            )
                .into_response();
        }
    };

    let ingredients: Vec<IngredientResponse> =
        rows.into_iter().map(IngredientResponse::from_row).collect();

    (StatusCode::OK, Json(ingredients)).into_response()
}
