use crate::config::SalonHours;
use crate::models::SlotTime;

/// Candidate start times for one salon day, from opening (inclusive) to
/// closing (exclusive) at the configured granularity. Every calendar day
/// gets the same grid.
pub fn generate_slots(hours: &SalonHours) -> Vec<SlotTime> {
    let step = hours.slot_granularity_minutes.max(1) as usize;
    (hours.open_minutes()..hours.close_minutes())
        .step_by(step)
        .map(SlotTime::from_minutes)
        .collect()
}

/// Whether `slot` is one of the grid's start times.
pub fn is_grid_slot(hours: &SalonHours, slot: SlotTime) -> bool {
    let minutes = slot.minutes();
    minutes >= hours.open_minutes()
        && minutes < hours.close_minutes()
        && (minutes - hours.open_minutes()) % hours.slot_granularity_minutes.max(1) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(slots: &[SlotTime]) -> Vec<String> {
        slots.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_grid() {
        let slots = generate_slots(&SalonHours::default());
        assert_eq!(slots.len(), 18);
        assert_eq!(slots.first().unwrap().to_string(), "09:00");
        assert_eq!(slots.last().unwrap().to_string(), "17:30");
        assert!(slots.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_grid_excludes_closing_time() {
        let slots = render(&generate_slots(&SalonHours::default()));
        assert!(!slots.contains(&"18:00".to_string()));
        assert!(slots.contains(&"12:30".to_string()));
    }

    #[test]
    fn test_custom_hours() {
        let hours = SalonHours::new(10, 12, 45).unwrap();
        assert_eq!(render(&generate_slots(&hours)), vec!["10:00", "10:45", "11:30"]);
    }

    #[test]
    fn test_hourly_grid_until_midnight() {
        let hours = SalonHours::new(20, 24, 60).unwrap();
        assert_eq!(
            render(&generate_slots(&hours)),
            vec!["20:00", "21:00", "22:00", "23:00"]
        );
    }

    #[test]
    fn test_is_grid_slot() {
        let hours = SalonHours::default();
        assert!(is_grid_slot(&hours, SlotTime::parse("09:00").unwrap()));
        assert!(is_grid_slot(&hours, SlotTime::parse("17:30").unwrap()));
        assert!(!is_grid_slot(&hours, SlotTime::parse("18:00").unwrap()));
        assert!(!is_grid_slot(&hours, SlotTime::parse("08:30").unwrap()));
        assert!(!is_grid_slot(&hours, SlotTime::parse("10:15").unwrap()));
    }
}
