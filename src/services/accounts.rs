use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Role, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, message = "name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[serde(default)]
    pub phone: String,
}

impl RegisterRequest {
    /// Trims free-text fields and lower-cases the email.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            password: self.password,
            phone: self.phone.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, message = "name must be at least 2 characters"))]
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    bcrypt::hash(password, cost)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    bcrypt::verify(password, hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to verify password: {e}")))
}

pub fn issue_token(user: &User, secret: &str, expiration_hours: i64) -> Result<String, AppError> {
    let iat = Utc::now();
    let claims = Claims {
        sub: user.id.clone(),
        role: user.role,
        iat: iat.timestamp(),
        exp: (iat + Duration::hours(expiration_hours)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to sign token: {e}")))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "token rejected");
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::Unauthorized("token expired".to_string())
            }
            _ => AppError::Unauthorized("invalid token".to_string()),
        }
    })?;

    Ok(data.claims)
}

/// Stores a new customer. `req` must already be normalized and validated.
pub fn register(conn: &Connection, req: &RegisterRequest, password_hash: String) -> Result<User, AppError> {
    if queries::get_user_by_email(conn, &req.email)?.is_some() {
        return Err(AppError::Conflict("email is already registered".to_string()));
    }

    let now = queries::now();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name: req.name.clone(),
        email: req.email.clone(),
        password_hash,
        phone: req.phone.clone(),
        role: Role::Customer,
        created_at: now,
        updated_at: now,
    };

    match queries::insert_user(conn, &user) {
        Ok(()) => {}
        Err(e) if queries::is_constraint_violation(&e) => {
            return Err(AppError::Conflict("email is already registered".to_string()))
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(user_id = %user.id, "user registered");
    Ok(user)
}

pub fn update_profile(conn: &Connection, user: &User, req: &UpdateProfileRequest) -> Result<User, AppError> {
    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .unwrap_or(&user.name)
        .to_string();
    let phone = req
        .phone
        .as_deref()
        .map(str::trim)
        .unwrap_or(&user.phone)
        .to_string();

    if !queries::update_user_profile(conn, &user.id, &name, &phone)? {
        return Err(AppError::NotFound("user not found".to_string()));
    }

    queries::get_user(conn, &user.id)?.ok_or_else(|| AppError::NotFound("user not found".to_string()))
}

/// Makes sure an admin account exists for `email`, creating it or promoting
/// an existing account.
pub fn ensure_admin(conn: &Connection, email: &str, password: &str, cost: u32) -> Result<User, AppError> {
    let email = email.trim().to_lowercase();

    if let Some(existing) = queries::get_user_by_email(conn, &email)? {
        if existing.role != Role::Admin {
            queries::set_user_role(conn, &existing.id, Role::Admin)?;
            tracing::info!(user_id = %existing.id, "promoted existing account to admin");
        }
        return queries::get_user(conn, &existing.id)?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()));
    }

    let now = queries::now();
    let admin = User {
        id: uuid::Uuid::new_v4().to_string(),
        name: "Admin User".to_string(),
        email,
        password_hash: hash_password(password, cost)?,
        phone: String::new(),
        role: Role::Admin,
        created_at: now,
        updated_at: now,
    };
    queries::insert_user(conn, &admin)?;

    tracing::info!(user_id = %admin.id, "created admin account");
    Ok(admin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    const COST: u32 = 4;
    const SECRET: &str = "test-secret";

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: " Alice ".to_string(),
            email: email.to_string(),
            password: "hunter22".to_string(),
            phone: "+1-555-0100".to_string(),
        }
        .normalized()
    }

    #[test]
    fn test_register_validation() {
        let mut req = register_request("alice@example.com");
        assert!(req.validate().is_ok());

        req.email = "not-an-email".to_string();
        req.password = "123".to_string();
        let err: AppError = req.validate().unwrap_err().into();
        let AppError::InvalidInput(msg) = err else {
            panic!("expected invalid input");
        };
        assert!(msg.contains("valid email"));
        assert!(msg.contains("password"));
    }

    #[test]
    fn test_register_normalizes_and_rejects_duplicates() {
        let conn = db::init_db(":memory:").unwrap();
        let hash = hash_password("hunter22", COST).unwrap();

        let user = register(&conn, &register_request(" Alice@Example.com "), hash.clone()).unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.name, "Alice");
        assert_eq!(user.role, Role::Customer);

        let err = register(&conn, &register_request("alice@example.com"), hash).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("hunter22", COST).unwrap();
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("hunter23", &hash).unwrap());
    }

    #[test]
    fn test_token_round_trip() {
        let conn = db::init_db(":memory:").unwrap();
        let user = register(&conn, &register_request("alice@example.com"), "x".to_string()).unwrap();

        let token = issue_token(&user, SECRET, 1).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Customer);

        assert!(matches!(
            verify_token(&token, "other-secret"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let conn = db::init_db(":memory:").unwrap();
        let user = register(&conn, &register_request("alice@example.com"), "x".to_string()).unwrap();
        let token = issue_token(&user, SECRET, -2).unwrap();
        assert!(matches!(
            verify_token(&token, SECRET),
            Err(AppError::Unauthorized(msg)) if msg == "token expired"
        ));
    }

    #[test]
    fn test_update_profile_keeps_unset_fields() {
        let conn = db::init_db(":memory:").unwrap();
        let user = register(&conn, &register_request("alice@example.com"), "x".to_string()).unwrap();

        let updated = update_profile(
            &conn,
            &user,
            &UpdateProfileRequest {
                name: None,
                phone: Some(" +1-555-0199 ".to_string()),
            },
        )
        .unwrap();
        assert_eq!(updated.name, "Alice");
        assert_eq!(updated.phone, "+1-555-0199");
    }

    #[test]
    fn test_ensure_admin_creates_then_promotes() {
        let conn = db::init_db(":memory:").unwrap();
        let admin = ensure_admin(&conn, "admin@salon.test", "admin123", COST).unwrap();
        assert_eq!(admin.role, Role::Admin);
        let again = ensure_admin(&conn, "ADMIN@salon.test", "admin123", COST).unwrap();
        assert_eq!(again.id, admin.id);

        let customer = register(&conn, &register_request("owner@salon.test"), "x".to_string()).unwrap();
        let promoted = ensure_admin(&conn, "owner@salon.test", "ignored", COST).unwrap();
        assert_eq!(promoted.id, customer.id);
        assert_eq!(promoted.role, Role::Admin);
    }
}
