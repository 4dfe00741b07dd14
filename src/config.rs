use std::env;

use anyhow::Context;

/// How the availability overlay decides that a candidate slot is taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// A slot is taken only when its start falls inside an occupied interval.
    StartCollision,
    /// A slot is taken when the candidate's whole duration touches an occupied
    /// interval or runs past closing time.
    FullDuration,
}

impl OverlapPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "start" => Some(OverlapPolicy::StartCollision),
            "full" => Some(OverlapPolicy::FullDuration),
            _ => None,
        }
    }
}

/// Opening window and grid step of the salon day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SalonHours {
    pub open_hour: u32,
    pub close_hour: u32,
    pub slot_granularity_minutes: u32,
}

impl Default for SalonHours {
    fn default() -> Self {
        Self {
            open_hour: 9,
            close_hour: 18,
            slot_granularity_minutes: 30,
        }
    }
}

impl SalonHours {
    pub fn new(open_hour: u32, close_hour: u32, slot_granularity_minutes: u32) -> anyhow::Result<Self> {
        anyhow::ensure!(close_hour <= 24, "CLOSE_HOUR must be at most 24, got {close_hour}");
        anyhow::ensure!(
            open_hour < close_hour,
            "OPEN_HOUR ({open_hour}) must be before CLOSE_HOUR ({close_hour})"
        );
        anyhow::ensure!(
            slot_granularity_minutes > 0,
            "SLOT_GRANULARITY_MINUTES must be positive"
        );
        Ok(Self {
            open_hour,
            close_hour,
            slot_granularity_minutes,
        })
    }

    pub fn open_minutes(&self) -> u32 {
        self.open_hour * 60
    }

    pub fn close_minutes(&self) -> u32 {
        self.close_hour * 60
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
    pub salon_hours: SalonHours,
    pub overlap_policy: OverlapPolicy,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub seed_services: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_default();
        anyhow::ensure!(!jwt_secret.is_empty(), "JWT_SECRET must be set");

        let salon_hours = SalonHours::new(
            parse_var("OPEN_HOUR", 9)?,
            parse_var("CLOSE_HOUR", 18)?,
            parse_var("SLOT_GRANULARITY_MINUTES", 30)?,
        )?;

        let policy_raw = env::var("SLOT_OVERLAP_POLICY").unwrap_or_else(|_| "start".to_string());
        let overlap_policy = OverlapPolicy::parse(&policy_raw).with_context(|| {
            format!("SLOT_OVERLAP_POLICY must be \"start\" or \"full\", got {policy_raw:?}")
        })?;

        let bcrypt_cost = parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        anyhow::ensure!(
            (4..=31).contains(&bcrypt_cost),
            "BCRYPT_COST must be between 4 and 31"
        );

        Ok(Self {
            port: parse_var("PORT", 3000)?,
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "salon.db".to_string()),
            jwt_secret,
            jwt_expiration_hours: parse_var("JWT_EXPIRATION_HOURS", 168)?,
            bcrypt_cost,
            salon_hours,
            overlap_policy,
            admin_email: env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
            seed_services: parse_var("SEED_SERVICES", false)?,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid value for {name} ({raw:?}): {e}")),
        _ => Ok(default),
    }
}
