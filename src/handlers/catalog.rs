use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::errors::AppError;
use crate::handlers::auth::AuthUser;
use crate::models::Service;
use crate::services::catalog::{self, CreateServiceRequest, UpdateServiceRequest};
use crate::state::AppState;

// GET /api/services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Service>>, AppError> {
    let conn = state.conn()?;
    Ok(Json(catalog::list_active(&conn)?))
}

// GET /api/services/:id
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Service>, AppError> {
    let conn = state.conn()?;
    Ok(Json(catalog::get(&conn, &id)?))
}

// POST /api/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    body: Result<Json<CreateServiceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    let Json(req) = body?;

    let conn = state.conn()?;
    let service = catalog::create(&conn, &auth.actor(), &req)?;
    Ok((StatusCode::CREATED, Json(service)))
}

// PUT /api/services/:id
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    body: Result<Json<UpdateServiceRequest>, JsonRejection>,
) -> Result<Json<Service>, AppError> {
    let Json(req) = body?;

    let conn = state.conn()?;
    Ok(Json(catalog::update(&conn, &auth.actor(), &id, &req)?))
}

// DELETE /api/services/:id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let conn = state.conn()?;
    catalog::deactivate(&conn, &auth.actor(), &id)?;
    Ok(Json(serde_json::json!({ "message": "service deleted successfully" })))
}
