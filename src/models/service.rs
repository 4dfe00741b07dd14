use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub duration_minutes: i64,
    pub category: Category,
    pub image: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Category {
    Hair,
    Nails,
    Skincare,
    Massage,
    Makeup,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Hair,
        Category::Nails,
        Category::Skincare,
        Category::Massage,
        Category::Makeup,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hair => "Hair",
            Category::Nails => "Nails",
            Category::Skincare => "Skincare",
            Category::Massage => "Massage",
            Category::Makeup => "Makeup",
            Category::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Category::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// The subset of a service shown alongside a booking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub duration_minutes: i64,
    pub category: Category,
}

impl From<&Service> for ServiceSummary {
    fn from(service: &Service) -> Self {
        Self {
            id: service.id.clone(),
            name: service.name.clone(),
            price: service.price,
            duration_minutes: service.duration_minutes,
            category: service.category,
        }
    }
}
