use crate::api::ErrorResponse;
use crate::get_conn;
use crate::json_field;
use crate::models::Collection;
use crate::schema::collections;
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
pub struct CollectionResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    /// Ids of member recipes; dangling ids are kept as-is
    pub recipe_ids: Vec<i32>,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present when some inline image uploads were dropped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_images: Option<usize>,
}

impl CollectionResponse {
    pub fn from_row(row: Collection) -> Self {
        CollectionResponse {
            id: row.id,
            name: row.name,
            description: row.description,
            recipe_ids: json_field::id_list(row.recipe_ids),
            tags: json_field::string_list(row.tags),
            images: json_field::string_list(row.images),
            created_at: row.created_at,
            updated_at: row.updated_at,
            skipped_images: None,
        }
    }

    pub fn with_skipped(row: Collection, skipped: usize) -> Self {
        CollectionResponse {
            skipped_images: (skipped > 0).then_some(skipped),
            ..Self::from_row(row)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/collections/{id}",
    tag = "collections",
    params(
        ("id" = i32, Path, description = "Collection ID")
    ),
    responses(
        (status = 200, description = "Collection details", body = CollectionResponse),
        (status = 404, description = "Collection not found", body = ErrorResponse)
    )
)]
pub async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let mut conn = get_conn!(state);

    match collections::table
        .find(id)
        .select(Collection::as_select())
        .first(&mut conn)
    {
        Ok(row) => (StatusCode::OK, Json(CollectionResponse::from_row(row))).into_response(),
        Err(diesel::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Collection not found".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch collection");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch collection".to_string(),
                }),
            )
                .into_response()
        }
    }
}
