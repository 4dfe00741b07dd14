use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, Timelike, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::models::{
    Booking, BookingStatus, BookingView, Category, OccupiedInterval, Role, Service,
    ServiceSummary, SlotTime, User, UserSummary,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn now() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    // Stored timestamps carry whole seconds only.
    now.with_nanosecond(0).unwrap_or(now)
}

fn fmt_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn fmt_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_timestamp(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .with_context(|| format!("invalid stored timestamp: {s}"))
}

fn parse_decimal(s: &str) -> anyhow::Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("invalid stored decimal: {s}"))
}

/// True when the error is SQLite rejecting a row for a UNIQUE or CHECK constraint.
pub fn is_constraint_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ── Services ──

const SERVICE_COLUMNS: &str =
    "id, name, description, price, duration_minutes, category, image, is_active, created_at, updated_at";

pub fn insert_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, name, description, price, duration_minutes, category, image, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            service.id,
            service.name,
            service.description,
            service.price.to_string(),
            service.duration_minutes,
            service.category.as_str(),
            service.image,
            service.is_active,
            fmt_timestamp(&service.created_at),
            fmt_timestamp(&service.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let sql = format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1");
    let result = conn
        .query_row(&sql, params![id], |row| Ok(parse_service_row(row)))
        .optional()?;

    result.transpose()
}

pub fn list_active_services(conn: &Connection) -> anyhow::Result<Vec<Service>> {
    let sql = format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE is_active = 1 ORDER BY category ASC, name ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok(parse_service_row(row)))?;

    let mut services = vec![];
    for row in rows {
        services.push(row??);
    }
    Ok(services)
}

pub fn update_service(conn: &Connection, service: &Service) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET name = ?1, description = ?2, price = ?3, duration_minutes = ?4,
            category = ?5, image = ?6, is_active = ?7, updated_at = ?8
         WHERE id = ?9",
        params![
            service.name,
            service.description,
            service.price.to_string(),
            service.duration_minutes,
            service.category.as_str(),
            service.image,
            service.is_active,
            fmt_timestamp(&service.updated_at),
            service.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn set_service_active(conn: &Connection, id: &str, active: bool) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
        params![active, fmt_timestamp(&now()), id],
    )?;
    Ok(count > 0)
}

pub fn count_services(conn: &Connection) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM services", [], |row| row.get(0))?;
    Ok(count)
}

fn parse_service_row(row: &rusqlite::Row) -> anyhow::Result<Service> {
    let price: String = row.get(3)?;
    let category: String = row.get(5)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;

    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: parse_decimal(&price)?,
        duration_minutes: row.get(4)?,
        category: Category::parse(&category)
            .with_context(|| format!("invalid stored category: {category}"))?,
        image: row.get(6)?,
        is_active: row.get(7)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

// ── Users ──

const USER_COLUMNS: &str = "id, name, email, password_hash, phone, role, created_at, updated_at";

pub fn insert_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, phone, role, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user.id,
            user.name,
            user.email,
            user.password_hash,
            user.phone,
            user.role.as_str(),
            fmt_timestamp(&user.created_at),
            fmt_timestamp(&user.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &str) -> anyhow::Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    let result = conn
        .query_row(&sql, params![id], |row| Ok(parse_user_row(row)))
        .optional()?;

    result.transpose()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> anyhow::Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
    let result = conn
        .query_row(&sql, params![email], |row| Ok(parse_user_row(row)))
        .optional()?;

    result.transpose()
}

pub fn update_user_profile(
    conn: &Connection,
    id: &str,
    name: &str,
    phone: &str,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE users SET name = ?1, phone = ?2, updated_at = ?3 WHERE id = ?4",
        params![name, phone, fmt_timestamp(&now()), id],
    )?;
    Ok(count > 0)
}

pub fn set_user_role(conn: &Connection, id: &str, role: Role) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE users SET role = ?1, updated_at = ?2 WHERE id = ?3",
        params![role.as_str(), fmt_timestamp(&now()), id],
    )?;
    Ok(count > 0)
}

fn parse_user_row(row: &rusqlite::Row) -> anyhow::Result<User> {
    let role: String = row.get(5)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;

    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        phone: row.get(4)?,
        role: Role::parse(&role).with_context(|| format!("invalid stored role: {role}"))?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

// ── Bookings ──

const BOOKING_VIEW_SELECT: &str =
    "SELECT b.id, b.user_id, b.service_id, b.date, b.time_slot, b.status, b.notes, b.total_price,
            b.created_at, b.updated_at,
            s.name, s.price, s.duration_minutes, s.category,
            u.name, u.email, u.phone
     FROM bookings b
     JOIN services s ON s.id = b.service_id
     JOIN users u ON u.id = b.user_id";

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, user_id, service_id, date, time_slot, status, notes, total_price, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            booking.id,
            booking.user_id,
            booking.service_id,
            fmt_date(&booking.date),
            booking.time_slot.to_string(),
            booking.status.as_str(),
            booking.notes,
            booking.total_price.to_string(),
            fmt_timestamp(&booking.created_at),
            fmt_timestamp(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn
        .query_row(
            "SELECT id, user_id, service_id, date, time_slot, status, notes, total_price, created_at, updated_at
             FROM bookings WHERE id = ?1",
            params![id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;

    result.transpose()
}

pub fn get_booking_view(conn: &Connection, id: &str) -> anyhow::Result<Option<BookingView>> {
    let sql = format!("{BOOKING_VIEW_SELECT} WHERE b.id = ?1");
    let result = conn
        .query_row(&sql, params![id], |row| Ok(parse_booking_view_row(row, true)))
        .optional()?;

    result.transpose()
}

/// Whether an active booking already starts at exactly this slot on this day.
pub fn active_slot_taken(conn: &Connection, date: &NaiveDate, slot: SlotTime) -> anyhow::Result<bool> {
    let taken: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM bookings
         WHERE date = ?1 AND time_slot = ?2 AND status IN ('pending', 'confirmed')",
        params![fmt_date(date), slot.to_string()],
        |row| row.get(0),
    )?;
    Ok(taken)
}

/// Occupied minute ranges of the day's active bookings, each sized by the
/// booked service's own duration.
pub fn occupied_intervals(conn: &Connection, date: &NaiveDate) -> anyhow::Result<Vec<OccupiedInterval>> {
    let mut stmt = conn.prepare(
        "SELECT b.time_slot, s.duration_minutes
         FROM bookings b JOIN services s ON s.id = b.service_id
         WHERE b.date = ?1 AND b.status IN ('pending', 'confirmed')
         ORDER BY b.time_slot ASC",
    )?;

    let rows = stmt.query_map(params![fmt_date(date)], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut intervals = vec![];
    for row in rows {
        let (time_slot, duration) = row?;
        let start = SlotTime::parse(&time_slot)
            .with_context(|| format!("invalid stored time slot: {time_slot}"))?;
        let duration = u32::try_from(duration)
            .with_context(|| format!("invalid stored duration: {duration}"))?;
        intervals.push(OccupiedInterval::new(start, duration));
    }
    Ok(intervals)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), fmt_timestamp(&now()), id],
    )?;
    Ok(count > 0)
}

pub fn list_bookings_for_user(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<BookingView>> {
    let sql = format!(
        "{BOOKING_VIEW_SELECT} WHERE b.user_id = ?1 ORDER BY b.date DESC, b.time_slot DESC, b.created_at DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], |row| Ok(parse_booking_view_row(row, false)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Optional narrowing for the admin booking list.
#[derive(Debug, Default, Clone)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub date: Option<NaiveDate>,
}

impl BookingFilter {
    fn where_clause(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut clauses = vec![];
        let mut params_vec: Vec<Box<dyn ToSql>> = vec![];

        if let Some(status) = self.status {
            params_vec.push(Box::new(status.as_str()));
            clauses.push(format!("b.status = ?{}", params_vec.len()));
        }
        if let Some(date) = &self.date {
            params_vec.push(Box::new(fmt_date(date)));
            clauses.push(format!("b.date = ?{}", params_vec.len()));
        }

        if clauses.is_empty() {
            (String::new(), params_vec)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), params_vec)
        }
    }
}

pub fn list_bookings(
    conn: &Connection,
    filter: &BookingFilter,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<BookingView>> {
    let (where_sql, mut params_vec) = filter.where_clause();
    params_vec.push(Box::new(limit));
    let limit_idx = params_vec.len();
    params_vec.push(Box::new(offset));
    let offset_idx = params_vec.len();

    let sql = format!(
        "{BOOKING_VIEW_SELECT}{where_sql} ORDER BY b.date DESC, b.time_slot DESC, b.created_at DESC
         LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
    );

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_view_row(row, true)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn count_bookings(conn: &Connection, filter: &BookingFilter) -> anyhow::Result<i64> {
    let (where_sql, params_vec) = filter.where_clause();
    let sql = format!("SELECT COUNT(*) FROM bookings b{where_sql}");
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let count: i64 = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
    Ok(count)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let date: String = row.get(3)?;
    let time_slot: String = row.get(4)?;
    let status: String = row.get(5)?;
    let total_price: String = row.get(7)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;

    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        service_id: row.get(2)?,
        date: NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .with_context(|| format!("invalid stored date: {date}"))?,
        time_slot: SlotTime::parse(&time_slot)
            .with_context(|| format!("invalid stored time slot: {time_slot}"))?,
        status: BookingStatus::parse(&status)
            .with_context(|| format!("invalid stored status: {status}"))?,
        notes: row.get(6)?,
        total_price: parse_decimal(&total_price)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn parse_booking_view_row(row: &rusqlite::Row, with_user: bool) -> anyhow::Result<BookingView> {
    let booking = parse_booking_row(row)?;
    let service_price: String = row.get(11)?;
    let category: String = row.get(13)?;

    let service = ServiceSummary {
        id: booking.service_id.clone(),
        name: row.get(10)?,
        price: parse_decimal(&service_price)?,
        duration_minutes: row.get(12)?,
        category: Category::parse(&category)
            .with_context(|| format!("invalid stored category: {category}"))?,
    };

    let user = if with_user {
        Some(UserSummary {
            id: booking.user_id.clone(),
            name: row.get(14)?,
            email: row.get(15)?,
            phone: row.get(16)?,
        })
    } else {
        None
    };

    Ok(BookingView {
        booking,
        service,
        user,
    })
}
