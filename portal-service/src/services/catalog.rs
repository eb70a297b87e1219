//! Property catalog: read-mostly views served through the cache.

use std::sync::Arc;

use crate::{
    models::{Property, PropertyResponse},
    services::{
        cache::{keys, ViewCache},
        Database, ServiceError,
    },
};

#[derive(Clone)]
pub struct CatalogService {
    db: Database,
    cache: Arc<dyn ViewCache>,
    properties_ttl_secs: u64,
}

impl CatalogService {
    pub fn new(db: Database, cache: Arc<dyn ViewCache>, properties_ttl_secs: u64) -> Self {
        Self {
            db,
            cache,
            properties_ttl_secs,
        }
    }

    /// List available properties, read through the cache. A miss recomputes
    /// from the store and repopulates; the cache is never authoritative.
    pub async fn available_properties(&self) -> Result<Vec<PropertyResponse>, ServiceError> {
        if let Some(cached) = self.cache.get(keys::AVAILABLE_PROPERTIES).await {
            if let Ok(properties) = serde_json::from_value::<Vec<PropertyResponse>>(cached) {
                return Ok(properties);
            }
        }

        let properties: Vec<PropertyResponse> = self
            .db
            .list_available_properties()
            .await?
            .into_iter()
            .map(PropertyResponse::from)
            .collect();

        let value = serde_json::to_value(&properties).map_err(|e| {
            ServiceError::Internal(anyhow::anyhow!("Failed to serialize properties: {}", e))
        })?;
        self.cache
            .set(keys::AVAILABLE_PROPERTIES, &value, self.properties_ttl_secs)
            .await;

        Ok(properties)
    }

    /// Create a property and drop every view its presence can change,
    /// before the caller sees success.
    pub async fn create_property(
        &self,
        title: String,
        location: String,
        price_cents: i64,
    ) -> Result<PropertyResponse, ServiceError> {
        if price_cents <= 0 {
            return Err(ServiceError::Validation(
                "Price must be positive".to_string(),
            ));
        }

        let property = Property::new(title, location, price_cents);
        self.db.insert_property(&property).await?;

        self.cache
            .invalidate(&[keys::AVAILABLE_PROPERTIES, keys::ADMIN_OVERVIEW])
            .await;

        tracing::info!(property_id = %property.property_id, "Property created");

        Ok(PropertyResponse::from(property))
    }
}
