//! Zone presence checks

use crate::zone::{GatewayError, ZoneGateway};

/// Asks the controller whether a zone identifier is currently defined
pub struct ExistenceChecker<'a> {
    gateway: &'a dyn ZoneGateway,
}

impl<'a> ExistenceChecker<'a> {
    pub fn new(gateway: &'a dyn ZoneGateway) -> Self {
        Self { gateway }
    }

    pub async fn exists(&self, zone: &str) -> Result<bool, GatewayError> {
        let exists = self.gateway.zone_exists(zone).await?;
        log::debug!("SDN zone {} exists: {}", zone, exists);
        Ok(exists)
    }
}
