pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/collections endpoints (mounted at /api/collections)
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list::list_collections).post(create::create_collection),
        )
        .route(
            "/{id}",
            get(get::get_collection)
                .put(update::update_collection)
                .delete(delete::delete_collection),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::create_collection,
        list::list_collections,
        get::get_collection,
        update::update_collection,
        delete::delete_collection,
    ),
    components(schemas(
        create::CreateCollectionRequest,
        get::CollectionResponse,
        update::UpdateCollectionRequest,
    ))
)]
pub struct ApiDoc;
