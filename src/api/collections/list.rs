use crate::api::collections::get::CollectionResponse;
use crate::api::ErrorResponse;
use crate::get_conn;
use crate::models::Collection;
use crate::raw_sql::{like_pattern, parse_tags_param};
use crate::schema::collections;
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
pub struct ListCollectionsParams {
    /// Case-insensitive substring match on name or description
    pub search: Option<String>,
    /// Comma-separated tags; matches collections carrying ANY of them
    pub tags: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/collections",
    tag = "collections",
    params(ListCollectionsParams),
    responses(
        (status = 200, description = "List of matching collections", body = Vec<CollectionResponse>)
    )
)]
pub async fn list_collections(
    State(state): State<AppState>,
    Query(params): Query<ListCollectionsParams>,
) -> impl IntoResponse {
    let search_pattern = params
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(like_pattern);
    let tag_list = parse_tags_param(params.tags.as_deref());

    let mut conn = get_conn!(state);

    let mut query = collections::table.into_boxed();

    if let Some(ref pattern) = search_pattern {
        query = query.filter(
            collections::name
                .ilike(pattern)
                .or(collections::description.ilike(pattern)),
        );
    }

    if !tag_list.is_empty() {
        query = query.filter(tags_overlap!(tag_list));
    }

    match query
        .select(Collection::as_select())
        .order(collections::name.asc())
        .load::<Collection>(&mut conn)
    {
        Ok(rows) => {
            let collections: Vec<CollectionResponse> =
                rows.into_iter().map(CollectionResponse::from_row).collect();
            (StatusCode::OK, Json(collections)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to list collections");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch collections".to_string(),
                }),
            )
                .into_response()
        }
    }
}
