pub mod access;
pub mod accounts;
pub mod availability;
pub mod bookings;
pub mod catalog;
pub mod slots;
