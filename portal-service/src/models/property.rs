//! Property model - the read-mostly catalog behind the cached views.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Property entity.
#[derive(Debug, Clone, FromRow)]
pub struct Property {
    pub property_id: Uuid,
    pub title: String,
    pub location: String,
    pub price_cents: i64,
    pub available: bool,
    pub created_utc: DateTime<Utc>,
}

impl Property {
    pub fn new(title: String, location: String, price_cents: i64) -> Self {
        Self {
            property_id: Uuid::new_v4(),
            title,
            location,
            price_cents,
            available: true,
            created_utc: Utc::now(),
        }
    }
}

/// Property response for API.
#[derive(Debug, Clone, Serialize, serde::Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyResponse {
    pub property_id: Uuid,
    pub title: String,
    pub location: String,
    pub price_cents: i64,
    pub available: bool,
}

impl From<Property> for PropertyResponse {
    fn from(p: Property) -> Self {
        Self {
            property_id: p.property_id,
            title: p.title,
            location: p.location,
            price_cents: p.price_cents,
            available: p.available,
        }
    }
}
