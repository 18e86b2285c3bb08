//! # Delivery Location
//!
//! Remembers the delivery area the customer last picked, so home-delivery
//! orders taken at the counter start from it.
//!
//! ```text
//! select("560034")
//!     │ validate_pincode ── bad format ──► Validation error
//!     ▼
//! PincodeGateway ── unknown / inactive ──► NotServiceable
//!     │
//!     ▼
//! KeyValueStore["selected_location"] = DeliveryLocation
//! ```

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use storefront_core::validation::validate_pincode;
use storefront_core::DeliveryLocation;

use crate::error::{PosError, PosResult};
use crate::gateway::PincodeGateway;
use crate::storage::{read_json, write_json, KeyValueStore};

pub const SELECTED_LOCATION_KEY: &str = "selected_location";

pub struct DeliveryLocationStore<P> {
    gateway: P,
    store: Arc<dyn KeyValueStore>,
}

impl<P: PincodeGateway> DeliveryLocationStore<P> {
    pub fn new(gateway: P, store: Arc<dyn KeyValueStore>) -> Self {
        DeliveryLocationStore { gateway, store }
    }

    /// Checks the pincode is served and makes it the current location.
    ///
    /// On failure the previously selected location is kept.
    pub async fn select(&self, pincode: &str) -> PosResult<DeliveryLocation> {
        let pincode = pincode.trim();
        validate_pincode(pincode)?;

        let area = self
            .gateway
            .serviceable_pincode(pincode)
            .await?
            .filter(|area| area.is_active)
            .ok_or_else(|| PosError::NotServiceable(pincode.to_string()))?;

        let location = DeliveryLocation {
            pincode: area.pincode,
            city: area.city,
            state: area.state,
            delivery_days: area.delivery_days,
            selected_at: Utc::now(),
        };

        write_json(self.store.as_ref(), SELECTED_LOCATION_KEY, &location)?;
        info!(pincode = %location.pincode, city = %location.city, "Delivery location selected");

        Ok(location)
    }

    pub fn current(&self) -> PosResult<Option<DeliveryLocation>> {
        read_json(self.store.as_ref(), SELECTED_LOCATION_KEY)
    }

    pub fn clear(&self) -> PosResult<()> {
        self.store.remove(SELECTED_LOCATION_KEY)?;
        debug!("Delivery location cleared");
        Ok(())
    }
}
