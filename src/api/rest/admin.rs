use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::package::Package;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/admin/packages/", get(list_all_packages))
}

async fn list_all_packages(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Package>>, AppError> {
    if !user.is_staff {
        return Err(AppError::Forbidden("staff access required".to_string()));
    }

    Ok(Json(state.packages_matching(|_| true)))
}
