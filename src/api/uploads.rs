use crate::api::ErrorResponse;
use crate::images;
use crate::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use utoipa::OpenApi;

/// Returns the router for /api/uploads endpoints (mounted at /api/uploads)
pub fn router() -> Router<AppState> {
    Router::new().route("/{filename}", get(get_upload))
}

fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit_once('.').map(|(_, ext)| ext) {
        Some(ext) if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") => {
            "image/jpeg"
        }
        Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
        Some(ext) if ext.eq_ignore_ascii_case("gif") => "image/gif",
        Some(ext) if ext.eq_ignore_ascii_case("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Image not found".to_string(),
        }),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/uploads/{filename}",
    tag = "uploads",
    params(
        ("filename" = String, Path, description = "Stored image filename")
    ),
    responses(
        (status = 200, description = "Stored image bytes", content_type = "image/*"),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
pub async fn get_upload(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> impl IntoResponse {
    // Stored names are already sanitized; anything that sanitization would
    // alter is not a name we ever wrote.
    let safe = match images::sanitize_filename(&filename) {
        Some(safe) if safe == filename => safe,
        _ => return not_found(),
    };

    match tokio::fs::read(state.config.upload_dir.join(&safe)).await {
        Ok(bytes) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type_for(&safe))
            .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
            .body(Body::from(bytes))
            .unwrap(),
        Err(_) => not_found(),
    }
}

#[derive(OpenApi)]
#[openapi(paths(get_upload))]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(content_type_for("a.jpg"), "image/jpeg");
        assert_eq!(content_type_for("a.JPEG"), "image/jpeg");
        assert_eq!(content_type_for("a.png"), "image/png");
        assert_eq!(content_type_for("a.gif"), "image/gif");
        assert_eq!(content_type_for("a.webp"), "image/webp");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
