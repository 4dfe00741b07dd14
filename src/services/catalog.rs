use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Category, Service};
use crate::services::access::{self, Actor};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateServiceRequest {
    #[validate(length(min = 2, message = "service name must be at least 2 characters"))]
    pub name: String,
    #[validate(length(min = 10, message = "description must be at least 10 characters"))]
    pub description: String,
    pub price: Decimal,
    #[validate(range(min = 15, max = 1440, message = "duration must be between 15 and 1440 minutes"))]
    pub duration: i64,
    pub category: Category,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    #[validate(length(min = 2, message = "service name must be at least 2 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 10, message = "description must be at least 10 characters"))]
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[validate(range(min = 15, max = 1440, message = "duration must be between 15 and 1440 minutes"))]
    pub duration: Option<i64>,
    pub category: Option<Category>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

fn not_found() -> AppError {
    AppError::NotFound("service not found".to_string())
}

fn ensure_positive_price(price: Decimal) -> Result<(), AppError> {
    if price <= Decimal::ZERO {
        return Err(AppError::InvalidInput("price must be a positive number".to_string()));
    }
    Ok(())
}

pub fn list_active(conn: &Connection) -> Result<Vec<Service>, AppError> {
    Ok(queries::list_active_services(conn)?)
}

pub fn get(conn: &Connection, id: &str) -> Result<Service, AppError> {
    queries::get_service(conn, id)?.ok_or_else(not_found)
}

pub fn create(conn: &Connection, actor: &Actor, req: &CreateServiceRequest) -> Result<Service, AppError> {
    access::ensure(access::can_manage_catalog(actor), "admin access required")?;
    req.validate()?;
    ensure_positive_price(req.price)?;

    let now = queries::now();
    let service = Service {
        id: uuid::Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        description: req.description.trim().to_string(),
        price: req.price,
        duration_minutes: req.duration,
        category: req.category,
        image: req.image.trim().to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    queries::insert_service(conn, &service)?;

    tracing::info!(service_id = %service.id, name = %service.name, "service created");
    Ok(service)
}

pub fn update(
    conn: &Connection,
    actor: &Actor,
    id: &str,
    req: &UpdateServiceRequest,
) -> Result<Service, AppError> {
    access::ensure(access::can_manage_catalog(actor), "admin access required")?;
    req.validate()?;
    if let Some(price) = req.price {
        ensure_positive_price(price)?;
    }

    let mut service = get(conn, id)?;
    if let Some(name) = &req.name {
        service.name = name.trim().to_string();
    }
    if let Some(description) = &req.description {
        service.description = description.trim().to_string();
    }
    if let Some(price) = req.price {
        service.price = price;
    }
    if let Some(duration) = req.duration {
        service.duration_minutes = duration;
    }
    if let Some(category) = req.category {
        service.category = category;
    }
    if let Some(image) = &req.image {
        service.image = image.trim().to_string();
    }
    if let Some(active) = req.is_active {
        service.is_active = active;
    }
    service.updated_at = queries::now();

    queries::update_service(conn, &service)?;
    tracing::info!(service_id = %service.id, "service updated");
    Ok(service)
}

/// Soft delete: the row stays so existing bookings keep a valid reference.
pub fn deactivate(conn: &Connection, actor: &Actor, id: &str) -> Result<(), AppError> {
    access::ensure(access::can_manage_catalog(actor), "admin access required")?;

    if !queries::set_service_active(conn, id, false)? {
        return Err(not_found());
    }

    tracing::info!(service_id = %id, "service deactivated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::Role;
    use std::str::FromStr;

    fn admin() -> Actor {
        Actor {
            id: "admin".to_string(),
            role: Role::Admin,
        }
    }

    fn customer() -> Actor {
        Actor {
            id: "alice".to_string(),
            role: Role::Customer,
        }
    }

    fn manicure() -> CreateServiceRequest {
        CreateServiceRequest {
            name: "Manicure".to_string(),
            description: "Shaping, cuticle care and polish".to_string(),
            price: Decimal::from_str("35").unwrap(),
            duration: 45,
            category: Category::Nails,
            image: String::new(),
        }
    }

    #[test]
    fn test_create_requires_admin() {
        let conn = db::init_db(":memory:").unwrap();
        assert!(matches!(
            create(&conn, &customer(), &manicure()),
            Err(AppError::Forbidden(_))
        ));
        let service = create(&conn, &admin(), &manicure()).unwrap();
        assert!(service.is_active);
        assert_eq!(get(&conn, &service.id).unwrap().name, "Manicure");
    }

    #[test]
    fn test_create_validation() {
        let conn = db::init_db(":memory:").unwrap();

        let mut req = manicure();
        req.duration = 10;
        assert!(matches!(create(&conn, &admin(), &req), Err(AppError::InvalidInput(_))));

        let mut req = manicure();
        req.description = "short".to_string();
        assert!(matches!(create(&conn, &admin(), &req), Err(AppError::InvalidInput(_))));

        let mut req = manicure();
        req.price = Decimal::ZERO;
        assert!(matches!(create(&conn, &admin(), &req), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_duration_longer_than_a_day_is_rejected() {
        let conn = db::init_db(":memory:").unwrap();

        let mut req = manicure();
        req.duration = 4_294_967_000;
        assert!(matches!(create(&conn, &admin(), &req), Err(AppError::InvalidInput(_))));
        assert!(list_active(&conn).unwrap().is_empty());

        let service = create(&conn, &admin(), &manicure()).unwrap();
        let err = update(
            &conn,
            &admin(),
            &service.id,
            &UpdateServiceRequest {
                duration: Some(i64::MAX),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(get(&conn, &service.id).unwrap().duration_minutes, 45);
    }

    #[test]
    fn test_partial_update() {
        let conn = db::init_db(":memory:").unwrap();
        let service = create(&conn, &admin(), &manicure()).unwrap();

        let updated = update(
            &conn,
            &admin(),
            &service.id,
            &UpdateServiceRequest {
                price: Some(Decimal::from_str("40.50").unwrap()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.price, Decimal::from_str("40.50").unwrap());
        assert_eq!(updated.name, "Manicure");
        assert_eq!(updated.duration_minutes, 45);

        assert!(matches!(
            update(&conn, &admin(), "missing", &UpdateServiceRequest::default()),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_deactivate_hides_from_listing_but_keeps_record() {
        let conn = db::init_db(":memory:").unwrap();
        let service = create(&conn, &admin(), &manicure()).unwrap();

        assert!(matches!(
            deactivate(&conn, &customer(), &service.id),
            Err(AppError::Forbidden(_))
        ));
        deactivate(&conn, &admin(), &service.id).unwrap();

        assert!(list_active(&conn).unwrap().is_empty());
        assert!(!get(&conn, &service.id).unwrap().is_active);
        assert!(matches!(deactivate(&conn, &admin(), "missing"), Err(AppError::NotFound(_))));
    }
}
