//! Authorization predicates shared by every handler.
//!
//! A booking belongs to exactly one user. Admins can see and change any
//! booking and own the service catalog; customers can only see and cancel
//! their own bookings.

use crate::errors::AppError;
use crate::models::{Booking, Role, User};

/// The caller an operation runs on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            role: user.role,
        }
    }
}

fn owns(actor: &Actor, booking: &Booking) -> bool {
    booking.user_id == actor.id
}

pub fn can_read_booking(actor: &Actor, booking: &Booking) -> bool {
    owns(actor, booking) || actor.is_admin()
}

/// Status guards (already cancelled, completed) are applied separately.
pub fn can_cancel_booking(actor: &Actor, booking: &Booking) -> bool {
    owns(actor, booking) || actor.is_admin()
}

pub fn can_manage_catalog(actor: &Actor) -> bool {
    actor.is_admin()
}

/// Listing every user's bookings and setting arbitrary statuses.
pub fn can_manage_bookings(actor: &Actor) -> bool {
    actor.is_admin()
}

pub fn ensure(allowed: bool, message: &str) -> Result<(), AppError> {
    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden(message.to_string()))
    }
}
