use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::get;
use serde_json::Value;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::package::{NewPackage, PACKAGE_FIELDS, Package};
use crate::schema::{json_schema, validate};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/outgoing-packages/",
            get(list_outgoing_packages).post(create_outgoing_package),
        )
        .route("/outgoing-packages/jsonschema", get(outgoing_package_schema))
}

async fn list_outgoing_packages(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Json<Vec<Package>> {
    Json(state.packages_matching(|package| package.sender == user.id))
}

async fn create_outgoing_package(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Package>), AppError> {
    if !user.is_sender() {
        return Err(AppError::Forbidden(
            "only senders can register packages".to_string(),
        ));
    }

    let Json(payload) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    validate(PACKAGE_FIELDS, &payload).map_err(AppError::Validation)?;
    let new: NewPackage = serde_json::from_value(payload)
        .map_err(|err| AppError::BadRequest(format!("invalid package: {err}")))?;
    new.check_windows().map_err(AppError::Validation)?;

    let package = new.into_package(user.id);
    state.packages.insert(package.id, package.clone());
    state.metrics.packages_registered_total.inc();

    info!(
        package_id = %package.id,
        sender_id = %user.id,
        "package registered"
    );

    Ok((StatusCode::CREATED, Json(package)))
}

async fn outgoing_package_schema(AuthUser(_user): AuthUser) -> Json<Value> {
    Json(json_schema(PACKAGE_FIELDS))
}
