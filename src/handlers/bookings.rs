use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::auth::AuthUser;
use crate::models::BookingView;
use crate::services::availability::{self, AvailableSlots};
use crate::services::bookings::{self, BookingPage, CreateBooking, ListQuery};
use crate::state::AppState;

// GET /api/bookings/available-slots
#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
    #[serde(rename = "serviceId")]
    pub service_id: Option<String>,
}

pub async fn available_slots(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> Result<Json<AvailableSlots>, AppError> {
    let Query(query) = query?;

    let (Some(date), Some(service_id)) = (
        query.date.filter(|d| !d.trim().is_empty()),
        query.service_id.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(AppError::InvalidInput(
            "date and serviceId are required".to_string(),
        ));
    };

    let conn = state.conn()?;
    let slots = availability::available_slots(
        &conn,
        &state.config.salon_hours,
        state.config.overlap_policy,
        &date,
        &service_id,
    )?;
    Ok(Json(slots))
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    body: Result<Json<CreateBooking>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingView>), AppError> {
    let Json(req) = body?;

    let mut conn = state.conn()?;
    let view = bookings::create_booking(
        &mut conn,
        &state.config.salon_hours,
        state.config.overlap_policy,
        &auth.actor(),
        &req,
    )?;
    Ok((StatusCode::CREATED, Json(view)))
}

// GET /api/bookings/my-bookings
pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<BookingView>>, AppError> {
    let conn = state.conn()?;
    Ok(Json(bookings::list_mine(&conn, &auth.actor())?))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<BookingView>, AppError> {
    let conn = state.conn()?;
    Ok(Json(bookings::get_booking(&conn, &auth.actor(), &id)?))
}

// PUT /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut conn = state.conn()?;
    let view = bookings::cancel_booking(&mut conn, &auth.actor(), &id)?;
    Ok(Json(serde_json::json!({
        "message": "booking cancelled successfully",
        "booking": view,
    })))
}

// PUT /api/bookings/:id/status
#[derive(Deserialize)]
pub struct StatusBody {
    pub status: String,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    body: Result<Json<StatusBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(body) = body?;

    let conn = state.conn()?;
    let view = bookings::update_status(&conn, &auth.actor(), &id, &body.status)?;
    Ok(Json(serde_json::json!({
        "message": "booking status updated successfully",
        "booking": view,
    })))
}

// GET /api/bookings/admin/all
pub async fn list_all(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<BookingPage>, AppError> {
    let Query(query) = query?;

    let conn = state.conn()?;
    Ok(Json(bookings::list_all(&conn, &auth.actor(), &query)?))
}
