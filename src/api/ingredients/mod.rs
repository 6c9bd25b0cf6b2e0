pub mod bar_shelf;
pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use crate::AppState;
use axum::routing::{get, patch};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/ingredients endpoints (mounted at /api/ingredients)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_ingredients).post(create::create_ingredient))
        .route(
            "/{id}",
            get(get::get_ingredient)
                .put(update::update_ingredient)
                .delete(delete::delete_ingredient),
        )
        .route("/{id}/bar_shelf", patch(bar_shelf::set_bar_shelf))
}

/// The availability flag accepts exactly 'Y' or 'N'; anything else is a
/// client error at the mutation boundary.
pub(crate) fn is_valid_flag(flag: &str) -> bool {
    flag == "Y" || flag == "N"
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::create_ingredient,
        list::list_ingredients,
        get::get_ingredient,
        update::update_ingredient,
        delete::delete_ingredient,
        bar_shelf::set_bar_shelf,
    ),
    components(schemas(
        create::CreateIngredientRequest,
        get::IngredientResponse,
        update::UpdateIngredientRequest,
        bar_shelf::BarShelfRequest,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_validation_is_exact() {
        assert!(is_valid_flag("Y"));
        assert!(is_valid_flag("N"));
        assert!(!is_valid_flag("y"));
        assert!(!is_valid_flag("n"));
        assert!(!is_valid_flag(""));
        assert!(!is_valid_flag("YES"));
    }
}
