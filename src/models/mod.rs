pub mod booking;
pub mod service;
pub mod slot;
pub mod user;

pub use booking::{Booking, BookingStatus, BookingView};
pub use service::{Category, Service, ServiceSummary};
pub use slot::{parse_booking_date, OccupiedInterval, SlotTime};
pub use user::{Role, User, UserSummary};
