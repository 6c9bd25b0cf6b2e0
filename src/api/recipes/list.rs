use crate::api::recipes::get::RecipeResponse;
use crate::api::ErrorResponse;
use crate::availability;
use crate::get_conn;
use crate::models::Recipe;
use crate::raw_sql::{like_pattern, parse_tags_param};
use crate::schema::recipes;
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
pub struct ListRecipesParams {
    /// Case-insensitive substring match on name or description
    pub search: Option<String>,
    /// Comma-separated tags; matches recipes carrying ANY of them
    pub tags: Option<String>,
    /// 'Y' (case-insensitive) keeps only recipes fully makeable from
    /// on-shelf ingredients; any other value disables the filter
    pub bar_shelf_mode: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    params(ListRecipesParams),
    responses(
        (status = 200, description = "List of matching recipes", body = Vec<RecipeResponse>)
    )
)]
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(params): Query<ListRecipesParams>,
) -> impl IntoResponse {
    let search_pattern = params
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(like_pattern);
    let tag_list = parse_tags_param(params.tags.as_deref());

    let mut conn = get_conn!(state);

    let mut query = recipes::table.into_boxed();

    if let Some(ref pattern) = search_pattern {
        query = query.filter(
            recipes::name
                .ilike(pattern)
                .or(recipes::description.ilike(pattern)),
        );
    }

    if !tag_list.is_empty() {
        query = query.filter(tags_overlap!(tag_list));
    }

    let rows: Vec<Recipe> = match query
        .select(Recipe::as_select())
        .order(recipes::name.asc())
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "failed to list recipes");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipes".to_string(),
                }),
            )
                .into_response();
        }
    };

    let mut recipes: Vec<RecipeResponse> = rows.into_iter().map(RecipeResponse::from_row).collect();

    // Post-process with the shelf filter: one batched name lookup across
    // the whole candidate set, then a single pass over the recipes.
    if availability::shelf_mode_enabled(params.bar_shelf_mode.as_deref()) {
        let names = availability::referenced_names(recipes.iter().map(|r| r.ingredients.as_slice()));
        let shelf = match availability::lookup(&mut conn, &names) {
            Ok(shelf) => shelf,
            Err(e) => {
                // A resolution failure is a server error, never "nothing
                // is available".
                tracing::error!(error = %e, "failed to resolve shelf availability");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Failed to resolve shelf availability".to_string(),
                    }),
                )
                    .into_response();
            }
        };
        recipes.retain(|recipe| availability::is_makeable(&recipe.ingredients, &shelf));
    }

    (StatusCode::OK, Json(recipes)).into_response()
}
