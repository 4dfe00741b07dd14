use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::config::{OverlapPolicy, SalonHours};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{parse_booking_date, OccupiedInterval, Service, SlotTime};
use crate::services::slots::generate_slots;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlots {
    pub available_slots: Vec<SlotTime>,
    pub service_duration: i64,
}

/// Whether a booking of `duration` minutes may not start at `slot`.
pub fn is_blocked(
    hours: &SalonHours,
    occupied: &[OccupiedInterval],
    slot: SlotTime,
    duration: u32,
    policy: OverlapPolicy,
) -> bool {
    let start = slot.minutes();
    match policy {
        OverlapPolicy::StartCollision => occupied.iter().any(|i| i.contains(start)),
        OverlapPolicy::FullDuration => {
            let end = start.saturating_add(duration);
            end > hours.close_minutes() || occupied.iter().any(|i| i.overlaps(start, end))
        }
    }
}

/// Grid slots left over once the occupied intervals are overlaid, in grid order.
pub fn free_slots(
    hours: &SalonHours,
    occupied: &[OccupiedInterval],
    duration: u32,
    policy: OverlapPolicy,
) -> Vec<SlotTime> {
    generate_slots(hours)
        .into_iter()
        .filter(|slot| !is_blocked(hours, occupied, *slot, duration, policy))
        .collect()
}

pub fn service_duration(service: &Service) -> Result<u32, AppError> {
    u32::try_from(service.duration_minutes).map_err(|_| {
        AppError::Internal(anyhow::anyhow!(
            "service {} has invalid duration {}",
            service.id,
            service.duration_minutes
        ))
    })
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    parse_booking_date(raw).ok_or_else(|| AppError::InvalidInput(format!("invalid date: {raw}")))
}

/// Free start times on `date` for the given service. Inactive services still
/// resolve so their duration can be used.
pub fn available_slots(
    conn: &Connection,
    hours: &SalonHours,
    policy: OverlapPolicy,
    date: &str,
    service_id: &str,
) -> Result<AvailableSlots, AppError> {
    let date = parse_date(date)?;

    let service = queries::get_service(conn, service_id)?
        .ok_or_else(|| AppError::NotFound("service not found".to_string()))?;
    let duration = service_duration(&service)?;

    let occupied = queries::occupied_intervals(conn, &date)?;
    let available = free_slots(hours, &occupied, duration, policy);

    tracing::debug!(
        %date,
        service_id,
        occupied = occupied.len(),
        free = available.len(),
        "computed availability"
    );

    Ok(AvailableSlots {
        available_slots: available,
        service_duration: service.duration_minutes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Booking, BookingStatus, Category, Role, User};
    use rust_decimal::Decimal;

    const START: OverlapPolicy = OverlapPolicy::StartCollision;
    const FULL: OverlapPolicy = OverlapPolicy::FullDuration;

    fn slot(s: &str) -> SlotTime {
        SlotTime::parse(s).unwrap()
    }

    fn render(slots: &[SlotTime]) -> Vec<String> {
        slots.iter().map(|s| s.to_string()).collect()
    }

    fn setup_db() -> Connection {
        let conn = db::init_db(":memory:").unwrap();
        let now = queries::now();
        queries::insert_user(
            &conn,
            &User {
                id: "u-1".to_string(),
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "x".to_string(),
                phone: String::new(),
                role: Role::Customer,
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
        for (id, duration) in [("cut", 60), ("brows", 30), ("color", 90)] {
            queries::insert_service(
                &conn,
                &Service {
                    id: id.to_string(),
                    name: id.to_string(),
                    description: "a salon service".to_string(),
                    price: Decimal::new(4500, 2),
                    duration_minutes: duration,
                    category: Category::Hair,
                    image: String::new(),
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                },
            )
            .unwrap();
        }
        conn
    }

    fn book(conn: &Connection, id: &str, service: &str, date: &str, time: &str, status: BookingStatus) {
        let now = queries::now();
        queries::insert_booking(
            conn,
            &Booking {
                id: id.to_string(),
                user_id: "u-1".to_string(),
                service_id: service.to_string(),
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                time_slot: slot(time),
                status,
                notes: String::new(),
                total_price: Decimal::new(4500, 2),
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
    }

    #[test]
    fn test_no_bookings_returns_full_grid() {
        let hours = SalonHours::default();
        let free = free_slots(&hours, &[], 60, START);
        assert_eq!(free, generate_slots(&hours));
    }

    #[test]
    fn test_start_collision_marks_only_covered_starts() {
        let hours = SalonHours::default();
        let occupied = [OccupiedInterval::new(slot("10:00"), 60)];
        let free = render(&free_slots(&hours, &occupied, 60, START));

        assert!(!free.contains(&"10:00".to_string()));
        assert!(!free.contains(&"10:30".to_string()));
        assert!(free.contains(&"09:30".to_string()));
        assert!(free.contains(&"11:00".to_string()));
        assert_eq!(free.len(), 16);
    }

    #[test]
    fn test_full_duration_rejects_overlap_and_overrun() {
        let hours = SalonHours::default();
        let occupied = [OccupiedInterval::new(slot("10:00"), 60)];
        let free = render(&free_slots(&hours, &occupied, 60, FULL));

        assert!(!free.contains(&"09:30".to_string()));
        assert!(free.contains(&"09:00".to_string()));
        assert!(free.contains(&"11:00".to_string()));
        assert!(free.contains(&"17:00".to_string()));
        assert!(!free.contains(&"17:30".to_string()));
    }

    #[test]
    fn test_off_grid_interval_is_respected() {
        let hours = SalonHours::default();
        // 45 minutes from 09:00 still covers the 09:30 start.
        let occupied = [OccupiedInterval::new(slot("09:00"), 45)];
        let free = render(&free_slots(&hours, &occupied, 30, START));
        assert_eq!(free[0], "10:00");
    }

    #[test]
    fn test_huge_duration_blocks_rest_of_day() {
        let hours = SalonHours::default();
        let occupied = [OccupiedInterval::new(slot("10:00"), u32::MAX - 100)];

        let free = render(&free_slots(&hours, &occupied, 30, START));
        assert_eq!(free, vec!["09:00", "09:30"]);

        assert!(is_blocked(&hours, &[], slot("09:00"), u32::MAX, FULL));
    }

    #[test]
    fn test_availability_uses_each_bookings_own_duration() {
        let conn = setup_db();
        book(&conn, "b-1", "color", "2025-06-16", "10:00", BookingStatus::Confirmed);

        // Querying with a 30-minute service still blocks the 90 minutes of color.
        let result = available_slots(&conn, &SalonHours::default(), START, "2025-06-16", "brows").unwrap();
        let free = render(&result.available_slots);
        assert_eq!(result.service_duration, 30);
        for taken in ["10:00", "10:30", "11:00"] {
            assert!(!free.contains(&taken.to_string()), "{taken} should be occupied");
        }
        assert!(free.contains(&"11:30".to_string()));
    }

    #[test]
    fn test_sixty_minute_booking_scenario() {
        let conn = setup_db();
        book(&conn, "b-1", "cut", "2025-06-16", "10:00", BookingStatus::Confirmed);

        let result = available_slots(&conn, &SalonHours::default(), START, "2025-06-16", "cut").unwrap();
        let free = render(&result.available_slots);
        assert!(!free.contains(&"10:00".to_string()));
        assert!(!free.contains(&"10:30".to_string()));
        assert!(free.contains(&"09:30".to_string()));
        assert!(free.contains(&"11:00".to_string()));
    }

    #[test]
    fn test_cancelled_and_completed_bookings_free_their_slots() {
        let conn = setup_db();
        book(&conn, "b-1", "cut", "2025-06-16", "10:00", BookingStatus::Cancelled);
        book(&conn, "b-2", "cut", "2025-06-16", "13:00", BookingStatus::Completed);

        let result = available_slots(&conn, &SalonHours::default(), START, "2025-06-16", "cut").unwrap();
        assert_eq!(result.available_slots.len(), 18);
    }

    #[test]
    fn test_other_days_do_not_interfere() {
        let conn = setup_db();
        book(&conn, "b-1", "cut", "2025-06-17", "10:00", BookingStatus::Pending);

        let result = available_slots(&conn, &SalonHours::default(), START, "2025-06-16T08:00:00Z", "cut").unwrap();
        assert_eq!(result.available_slots.len(), 18);
    }

    #[test]
    fn test_inactive_service_still_resolves() {
        let conn = setup_db();
        queries::set_service_active(&conn, "cut", false).unwrap();
        let result = available_slots(&conn, &SalonHours::default(), START, "2025-06-16", "cut").unwrap();
        assert_eq!(result.service_duration, 60);
    }

    #[test]
    fn test_unknown_service_is_not_found() {
        let conn = setup_db();
        let err = available_slots(&conn, &SalonHours::default(), START, "2025-06-16", "nope").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_bad_date_is_invalid_input() {
        let conn = setup_db();
        let err = available_slots(&conn, &SalonHours::default(), START, "16/06/2025", "cut").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
