use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::GeoError;
use crate::models::Coordinates;

/// Device position provider. Every failure is non-fatal to callers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> Result<Coordinates, GeoError>;
}

/// Position configured up front (e.g. a fixed kiosk terminal).
#[derive(Debug, Clone, Copy)]
pub struct FixedLocator {
    position: Coordinates,
}

impl FixedLocator {
    pub fn new(position: Coordinates) -> Self {
        Self { position }
    }
}

#[async_trait]
impl Geolocator for FixedLocator {
    async fn locate(&self) -> Result<Coordinates, GeoError> {
        Ok(self.position)
    }
}

/// The device has no way to report a position.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLocator;

#[async_trait]
impl Geolocator for NoLocator {
    async fn locate(&self) -> Result<Coordinates, GeoError> {
        Err(GeoError::Unavailable)
    }
}

pub fn locator_for(position: Option<Coordinates>) -> Box<dyn Geolocator> {
    match position {
        Some(position) => Box::new(FixedLocator::new(position)),
        None => Box::new(NoLocator),
    }
}

// Bounded wait, degrades to None on denial, timeout, or missing capability
pub async fn locate_best_effort(locator: &dyn Geolocator, limit: Duration) -> Option<Coordinates> {
    let outcome = match timeout(limit, locator.locate()).await {
        Ok(result) => result,
        Err(_) => Err(GeoError::Timeout),
    };

    match outcome {
        Ok(position) => {
            debug!("Position {:.5},{:.5}", position.lat, position.lng);
            Some(position)
        }
        Err(GeoError::Unavailable) => {
            debug!("No geolocation capability, sending null coordinates");
            None
        }
        Err(e) => {
            warn!("Geolocation skipped: {}", e);
            None
        }
    }
}
