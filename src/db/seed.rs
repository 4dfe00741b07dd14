use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::db::queries;
use crate::models::{Category, Service};

/// (name, description, price in whole units, minutes, category)
const DEFAULT_CATALOG: &[(&str, &str, i64, i64, Category)] = &[
    ("Hair Cut & Style", "Professional haircut and styling suited to your face shape and lifestyle.", 45, 60, Category::Hair),
    ("Hair Coloring", "Full hair coloring with premium products and techniques.", 80, 90, Category::Hair),
    ("Highlights & Lowlights", "Dimension and depth through highlighting and lowlighting.", 95, 120, Category::Hair),
    ("Hair Treatment", "Deep conditioning and repair treatment for damaged hair.", 60, 45, Category::Hair),
    ("Manicure", "Nail shaping, cuticle care and polish application.", 35, 45, Category::Nails),
    ("Pedicure", "Relaxing foot care with nail shaping, cuticle care and polish.", 45, 60, Category::Nails),
    ("Gel Manicure", "Long-lasting gel manicure that stays perfect for weeks.", 50, 60, Category::Nails),
    ("Facial Treatment", "Deep cleansing facial to rejuvenate and refresh the skin.", 70, 75, Category::Skincare),
    ("Anti-Aging Facial", "Facial treatment that reduces fine lines and improves skin texture.", 90, 90, Category::Skincare),
    ("Deep Tissue Massage", "Therapeutic massage focused on the deeper muscle layers.", 85, 60, Category::Massage),
    ("Swedish Massage", "Relaxing full-body massage with long strokes and kneading.", 75, 60, Category::Massage),
    ("Hot Stone Massage", "Heated stone massage to relax muscles and improve circulation.", 100, 75, Category::Massage),
    ("Bridal Makeup", "Professional makeup for your wedding day, trial session included.", 120, 90, Category::Makeup),
    ("Evening Makeup", "Glamorous makeup for special events and evenings out.", 65, 60, Category::Makeup),
    ("Eyebrow Shaping", "Eyebrow shaping and styling to frame the face.", 25, 30, Category::Other),
    ("Eyelash Extensions", "Eyelash extensions for fuller, longer lashes.", 110, 120, Category::Other),
];

/// Inserts the default catalog when no services exist yet. Returns how many
/// services were added.
pub fn seed_services(conn: &Connection) -> anyhow::Result<usize> {
    if queries::count_services(conn)? > 0 {
        return Ok(0);
    }

    let now = queries::now();
    for (name, description, price, duration, category) in DEFAULT_CATALOG {
        let service = Service {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            price: Decimal::from(*price),
            duration_minutes: *duration,
            category: *category,
            image: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        queries::insert_service(conn, &service)?;
    }

    tracing::info!(count = DEFAULT_CATALOG.len(), "seeded service catalog");
    Ok(DEFAULT_CATALOG.len())
}
