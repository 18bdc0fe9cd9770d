//! Zone lifecycle operations
//!
//! Every operation runs its whole body under the provider's SDN lock and
//! within its configured time limit. Create and update release the lock
//! and then refresh the store with a regular read, so the store always ends
//! up holding what the controller reports rather than what was submitted.

use std::future::Future;
use std::sync::Arc;

use crate::attributes::{AttributeStore, AttributeValue};
use crate::context::{Operation, ProviderContext};
use crate::error::{Result, ZoneError};
use crate::existence::ExistenceChecker;
use crate::mapper::FieldMapper;
use crate::schema::ZONE_ATTRIBUTE;
use crate::zone::{DeleteOutcome, GatewayError, ZoneConfig};

/// Outcome of a read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneState {
    /// The store mirrors the controller
    Present,
    /// The zone is gone; the store's identifier has been cleared and the
    /// host should forget the resource
    Absent,
}

/// Entry points invoked by the host for one zone resource at a time
#[derive(Clone)]
pub struct ZoneReconciler {
    context: Arc<ProviderContext>,
}

impl ZoneReconciler {
    pub fn new(context: Arc<ProviderContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ProviderContext {
        &self.context
    }

    /// Create the zone from the declared attributes. No existence check is
    /// made; the controller rejects duplicates.
    pub async fn create(&self, store: &mut AttributeStore) -> Result<()> {
        let zone = declared_zone(store)?;

        self.bounded(Operation::Create, &zone, async {
            {
                let _lock = self.context.lock().begin(Operation::Create, &zone).await;

                let config = FieldMapper::to_config(store)?;
                store.set_id(zone.as_str());

                log::info!("Creating SDN zone {} (type {})", zone, config.zone_type);
                self.context
                    .gateway()
                    .create_zone(&zone, &config)
                    .await
                    .map_err(|err| ZoneError::transport(Operation::Create, &zone, err))?;
            }

            self.refresh(Operation::Create, &zone, store).await
        })
        .await
    }

    /// Refresh the store from the controller
    pub async fn read(&self, store: &mut AttributeStore) -> Result<ZoneState> {
        let zone = resource_zone(store)?;
        self.bounded(Operation::Read, &zone, self.read_locked(Operation::Read, &zone, store))
            .await
    }

    /// Converge an existing zone to the declared attributes
    pub async fn update(&self, store: &mut AttributeStore) -> Result<()> {
        let zone = resource_zone(store)?;

        self.bounded(Operation::Update, &zone, async {
            {
                let _lock = self.context.lock().begin(Operation::Update, &zone).await;

                let declared = FieldMapper::to_config(store)?;
                if declared.zone != zone {
                    return Err(ZoneError::validation(
                        ZONE_ATTRIBUTE,
                        format!(
                            "zone identifier cannot change from '{}' to '{}'",
                            zone, declared.zone
                        ),
                    ));
                }

                let exists = ExistenceChecker::new(self.context.gateway())
                    .exists(&zone)
                    .await
                    .map_err(|err| ZoneError::transport(Operation::Update, &zone, err))?;
                if !exists {
                    log::warn!("SDN zone {} vanished before update", zone);
                    return Err(ZoneError::NotFound { zone: zone.clone() });
                }

                // The fetched record is the baseline the controller expects
                // (digest); its values are all replaced.
                let mut config = self.fetch_config(Operation::Update, &zone).await?;
                FieldMapper::overwrite(&declared, &mut config);

                log::info!("Updating SDN zone {}", zone);
                self.context
                    .gateway()
                    .update_zone(&zone, &config)
                    .await
                    .map_err(|err| ZoneError::transport(Operation::Update, &zone, err))?;
            }

            self.refresh(Operation::Update, &zone, store).await
        })
        .await
    }

    /// Remove the zone. A zone that is already gone counts as deleted.
    pub async fn delete(&self, store: &mut AttributeStore) -> Result<()> {
        let zone = resource_zone(store)?;

        self.bounded(Operation::Delete, &zone, async {
            let _lock = self.context.lock().begin(Operation::Delete, &zone).await;

            let outcome = self
                .context
                .gateway()
                .delete_zone(&zone)
                .await
                .map_err(|err| ZoneError::transport(Operation::Delete, &zone, err))?;

            match outcome {
                DeleteOutcome::Deleted => log::info!("Deleted SDN zone {}", zone),
                DeleteOutcome::AlreadyAbsent => {
                    log::info!("SDN zone {} was already absent", zone)
                }
            }

            store.clear_id();
            Ok::<(), ZoneError>(())
        })
        .await
    }

    /// Adopt an existing zone by bare identifier
    pub async fn import(&self, zone: &str, store: &mut AttributeStore) -> Result<()> {
        if zone.is_empty() {
            return Err(ZoneError::MissingIdentifier);
        }

        store.set_id(zone);
        store.set(ZONE_ATTRIBUTE, zone);

        let state = self
            .bounded(
                Operation::Import,
                zone,
                self.read_locked(Operation::Import, zone, store),
            )
            .await?;

        match state {
            ZoneState::Present => Ok(()),
            ZoneState::Absent => Err(ZoneError::NotFound {
                zone: zone.to_string(),
            }),
        }
    }

    async fn read_locked(
        &self,
        operation: Operation,
        zone: &str,
        store: &mut AttributeStore,
    ) -> Result<ZoneState> {
        let _lock = self.context.lock().begin(operation, zone).await;

        let exists = ExistenceChecker::new(self.context.gateway())
            .exists(zone)
            .await
            .map_err(|err| ZoneError::transport(operation, zone, err))?;
        if !exists {
            log::warn!("SDN zone {} not found, removing it from state", zone);
            store.clear_id();
            return Ok(ZoneState::Absent);
        }

        let config = self.fetch_config(operation, zone).await?;
        FieldMapper::from_config(&config, store);
        store.set_id(zone);

        log::debug!("Read SDN zone {}", zone);
        Ok(ZoneState::Present)
    }

    /// Read after a create or update; the zone must be there
    async fn refresh(
        &self,
        operation: Operation,
        zone: &str,
        store: &mut AttributeStore,
    ) -> Result<()> {
        match self.read_locked(operation, zone, store).await? {
            ZoneState::Present => Ok(()),
            ZoneState::Absent => Err(ZoneError::NotFound {
                zone: zone.to_string(),
            }),
        }
    }

    async fn fetch_config(&self, operation: Operation, zone: &str) -> Result<ZoneConfig> {
        let raw = self
            .context
            .gateway()
            .fetch_zone(zone)
            .await
            .map_err(|err| ZoneError::transport(operation, zone, err))?;

        ZoneConfig::from_json(raw).map_err(|err| {
            ZoneError::transport(operation, zone, GatewayError::Decode(err.to_string()))
        })
    }

    /// Run `body` within the operation's time limit. Cancellation drops the
    /// body and with it any lock guard it holds.
    async fn bounded<T, F>(&self, operation: Operation, zone: &str, body: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let after = self.context.timeouts().for_operation(operation);
        match tokio::time::timeout(after, body).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("SDN zone {} {} timed out after {:?}", zone, operation, after);
                Err(ZoneError::Timeout {
                    operation,
                    zone: zone.to_string(),
                    after,
                })
            }
        }
    }
}

/// Identifier from the declared `zone` attribute
fn declared_zone(store: &AttributeStore) -> Result<String> {
    match store.get(ZONE_ATTRIBUTE) {
        Some(AttributeValue::Str(zone)) if !zone.is_empty() => Ok(zone.clone()),
        Some(AttributeValue::Str(_)) | None => Err(ZoneError::MissingIdentifier),
        Some(other) => Err(ZoneError::validation(
            ZONE_ATTRIBUTE,
            format!("expected a string, got {other}"),
        )),
    }
}

/// Identifier of a tracked resource, falling back to the declared one
fn resource_zone(store: &AttributeStore) -> Result<String> {
    match store.id() {
        Some(id) => Ok(id.to_string()),
        None => declared_zone(store),
    }
}
