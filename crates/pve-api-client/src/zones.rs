//! SDN zone gateway over the cluster API
//!
//! - `GET    /cluster/sdn/zones`         presence, by listing
//! - `GET    /cluster/sdn/zones/{zone}`  raw record
//! - `POST   /cluster/sdn/zones`         create
//! - `PUT    /cluster/sdn/zones/{zone}`  update, removing cleared
//!   properties through `delete`
//! - `DELETE /cluster/sdn/zones/{zone}`  delete

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value};

use pve_sdn_core::{DeleteOutcome, GatewayError, ZoneConfig, ZoneGateway};

use crate::client::{ApiError, ApiRequest, HttpApiClient, PveApiClient};
use crate::config::ClientConfig;

const ZONES_PATH: &str = "/cluster/sdn/zones";

impl From<ApiError> for GatewayError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Http(err) => GatewayError::Http(err.to_string()),
            ApiError::InvalidUrl(url) => GatewayError::InvalidUrl(url),
            ApiError::Authentication => GatewayError::Authentication,
            ApiError::Api { status, message } => GatewayError::Api { status, message },
            ApiError::ParseError(message) => GatewayError::Decode(message),
        }
    }
}

/// [`ZoneGateway`] backed by the Proxmox VE API
pub struct PveZoneGateway {
    client: Arc<dyn PveApiClient>,
}

impl PveZoneGateway {
    pub fn new(client: Arc<dyn PveApiClient>) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = HttpApiClient::new(&config.api_url, config.http_timeout(), config.verify_tls)?
            .with_api_token(&config.token_id, &config.token_secret);
        Ok(Self::new(Arc::new(client)))
    }

    fn zone_path(zone: &str) -> String {
        format!("{}/{}", ZONES_PATH, urlencoding::encode(zone))
    }

    fn encode(config: &ZoneConfig) -> Result<Value, GatewayError> {
        config
            .to_json()
            .map_err(|err| GatewayError::Decode(err.to_string()))
    }
}

/// The controller reports deleting an unknown zone either as 404 or as an
/// error naming the missing object
fn is_missing_zone(err: &ApiError) -> bool {
    match err {
        ApiError::Api { status: 404, .. } => true,
        ApiError::Api { message, .. } => message.contains("does not exist"),
        _ => false,
    }
}

/// Optional properties set on the controller but absent from the update body
fn cleared_properties(current: &Value, body: &Map<String, Value>) -> Vec<&'static str> {
    ZoneConfig::OPTIONAL_PROPERTIES
        .iter()
        .copied()
        .filter(|key| !body.contains_key(*key) && current.get(*key).is_some_and(|v| !v.is_null()))
        .collect()
}

#[async_trait]
impl ZoneGateway for PveZoneGateway {
    async fn zone_exists(&self, zone: &str) -> Result<bool, GatewayError> {
        let response = self
            .client
            .call(&ApiRequest::new(Method::GET, ZONES_PATH))
            .await?;

        let zones = response.data().as_array().ok_or_else(|| {
            GatewayError::Decode("zone listing is not an array".to_string())
        })?;

        Ok(zones
            .iter()
            .any(|entry| entry.get("zone").and_then(Value::as_str) == Some(zone)))
    }

    async fn fetch_zone(&self, zone: &str) -> Result<Value, GatewayError> {
        let response = self
            .client
            .call(&ApiRequest::new(Method::GET, Self::zone_path(zone)))
            .await?;

        match response.data() {
            Value::Object(_) => Ok(response.data().clone()),
            other => Err(GatewayError::Decode(format!(
                "unexpected zone record for {}: {}",
                zone, other
            ))),
        }
    }

    async fn create_zone(&self, zone: &str, config: &ZoneConfig) -> Result<(), GatewayError> {
        let mut body = Self::encode(config)?;
        body["zone"] = Value::String(zone.to_string());

        self.client
            .call(&ApiRequest::new(Method::POST, ZONES_PATH).with_body(body))
            .await?;
        Ok(())
    }

    async fn update_zone(&self, zone: &str, config: &ZoneConfig) -> Result<(), GatewayError> {
        // Properties left out of a PUT keep their value; removing one takes
        // an explicit `delete`, which is only valid for properties the zone
        // currently carries.
        let current = self.fetch_zone(zone).await?;

        let mut body = Self::encode(config)?;
        let object = body
            .as_object_mut()
            .ok_or_else(|| GatewayError::Decode("zone record is not an object".to_string()))?;
        // Identity travels in the path; the type of a zone is fixed at creation
        object.remove("zone");
        object.remove("type");

        let cleared = cleared_properties(&current, object);
        if !cleared.is_empty() {
            log::debug!("Clearing {} on SDN zone {}", cleared.join(","), zone);
            object.insert("delete".to_string(), Value::String(cleared.join(",")));
        }

        self.client
            .call(&ApiRequest::new(Method::PUT, Self::zone_path(zone)).with_body(body))
            .await?;
        Ok(())
    }

    async fn delete_zone(&self, zone: &str) -> Result<DeleteOutcome, GatewayError> {
        let request = ApiRequest::new(Method::DELETE, Self::zone_path(zone));
        match self.client.call(&request).await {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(err) if is_missing_zone(&err) => {
                log::debug!("SDN zone {} not present on delete: {}", zone, err);
                Ok(DeleteOutcome::AlreadyAbsent)
            }
            Err(err) => Err(err.into()),
        }
    }
}
