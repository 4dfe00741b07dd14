use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::config::{OverlapPolicy, SalonHours};
use crate::db::queries::{self, BookingFilter};
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, BookingView, SlotTime};
use crate::services::access::{self, Actor};
use crate::services::availability::{is_blocked, parse_date, service_duration};
use crate::services::slots::is_grid_slot;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    pub service_id: String,
    pub date: String,
    pub time_slot: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPage {
    pub bookings: Vec<BookingView>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total: i64,
}

fn not_found() -> AppError {
    AppError::NotFound("booking not found".to_string())
}

fn slot_unavailable() -> AppError {
    AppError::Conflict("time slot is no longer available".to_string())
}

fn load_view(conn: &Connection, id: &str) -> Result<BookingView, AppError> {
    queries::get_booking_view(conn, id)?.ok_or_else(not_found)
}

/// Reserves a slot for `actor`. The availability re-check and the insert run
/// in one IMMEDIATE transaction, so no other writer can claim the slot in
/// between; the partial unique index on active (date, time_slot) backs it up.
pub fn create_booking(
    conn: &mut Connection,
    hours: &SalonHours,
    policy: OverlapPolicy,
    actor: &Actor,
    req: &CreateBooking,
) -> Result<BookingView, AppError> {
    let date = parse_date(&req.date)?;
    let slot = SlotTime::parse(&req.time_slot)
        .ok_or_else(|| AppError::InvalidInput(format!("invalid time slot: {}", req.time_slot)))?;
    if !is_grid_slot(hours, slot) {
        return Err(AppError::InvalidInput(format!(
            "{slot} is not a bookable time slot"
        )));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let service = queries::get_service(&tx, &req.service_id)?
        .ok_or_else(|| AppError::NotFound("service not found".to_string()))?;
    if !service.is_active {
        return Err(AppError::InvalidInput(
            "service is no longer offered".to_string(),
        ));
    }

    if queries::active_slot_taken(&tx, &date, slot)? {
        return Err(slot_unavailable());
    }

    // Start-collision only guards the exact slot; the full policy also
    // refuses any overlap with the day's active bookings.
    if policy == OverlapPolicy::FullDuration {
        let occupied = queries::occupied_intervals(&tx, &date)?;
        if is_blocked(hours, &occupied, slot, service_duration(&service)?, policy) {
            return Err(slot_unavailable());
        }
    }

    let now = queries::now();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: actor.id.clone(),
        service_id: service.id.clone(),
        date,
        time_slot: slot,
        status: BookingStatus::Pending,
        notes: req.notes.as_deref().unwrap_or("").trim().to_string(),
        total_price: service.price,
        created_at: now,
        updated_at: now,
    };

    match queries::insert_booking(&tx, &booking) {
        Ok(()) => {}
        Err(e) if queries::is_constraint_violation(&e) => return Err(slot_unavailable()),
        Err(e) => return Err(e.into()),
    }

    let view = load_view(&tx, &booking.id)?;
    tx.commit()?;

    tracing::info!(
        booking_id = %booking.id,
        user_id = %booking.user_id,
        service_id = %booking.service_id,
        date = %booking.date,
        time_slot = %booking.time_slot,
        "booking created"
    );

    Ok(view)
}

pub fn get_booking(conn: &Connection, actor: &Actor, id: &str) -> Result<BookingView, AppError> {
    let view = load_view(conn, id)?;
    access::ensure(
        access::can_read_booking(actor, &view.booking),
        "access denied",
    )?;
    Ok(view)
}

pub fn cancel_booking(conn: &mut Connection, actor: &Actor, id: &str) -> Result<BookingView, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let booking = queries::get_booking(&tx, id)?.ok_or_else(not_found)?;
    access::ensure(
        access::can_cancel_booking(actor, &booking),
        "access denied",
    )?;

    match booking.status {
        BookingStatus::Cancelled => {
            return Err(AppError::Conflict("booking is already cancelled".to_string()))
        }
        BookingStatus::Completed => {
            return Err(AppError::Conflict("cannot cancel a completed booking".to_string()))
        }
        BookingStatus::Pending | BookingStatus::Confirmed => {}
    }

    queries::update_booking_status(&tx, id, BookingStatus::Cancelled)?;
    let view = load_view(&tx, id)?;
    tx.commit()?;

    tracing::info!(booking_id = %id, actor_id = %actor.id, "booking cancelled");
    Ok(view)
}

/// Sets any status on any booking. There is no transition graph; the only
/// refusal is reactivating a booking whose slot has since been taken.
pub fn update_status(
    conn: &Connection,
    actor: &Actor,
    id: &str,
    status: &str,
) -> Result<BookingView, AppError> {
    access::ensure(access::can_manage_bookings(actor), "admin access required")?;

    let status = BookingStatus::parse(status)
        .ok_or_else(|| AppError::InvalidInput(format!("invalid status: {status}")))?;

    match queries::update_booking_status(conn, id, status) {
        Ok(true) => {}
        Ok(false) => return Err(not_found()),
        Err(e) if queries::is_constraint_violation(&e) => return Err(slot_unavailable()),
        Err(e) => return Err(e.into()),
    }

    tracing::info!(booking_id = %id, status = status.as_str(), "booking status updated");
    load_view(conn, id)
}

pub fn list_mine(conn: &Connection, actor: &Actor) -> Result<Vec<BookingView>, AppError> {
    Ok(queries::list_bookings_for_user(conn, &actor.id)?)
}

pub fn list_all(conn: &Connection, actor: &Actor, query: &ListQuery) -> Result<BookingPage, AppError> {
    access::ensure(access::can_manage_bookings(actor), "admin access required")?;

    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            BookingStatus::parse(raw)
                .ok_or_else(|| AppError::InvalidInput(format!("invalid status: {raw}")))?,
        ),
    };
    let date = match query.date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_date(raw)?),
    };
    let filter = BookingFilter { status, date };

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| AppError::InvalidInput(format!("page {page} is out of range")))?;

    let total = queries::count_bookings(conn, &filter)?;
    let bookings = queries::list_bookings(conn, &filter, limit, offset)?;

    Ok(BookingPage {
        bookings,
        total_pages: (total + limit - 1) / limit,
        current_page: page,
        total,
    })
}
