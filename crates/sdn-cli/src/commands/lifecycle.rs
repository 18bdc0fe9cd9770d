//! Zone lifecycle commands
//!
//! Each command loads the state file, runs one reconciler operation and
//! persists whatever the reconciler left in the store, including on error.

use anyhow::{bail, Context, Result};
use pve_sdn_core::{AttributeStore, ZoneReconciler, ZoneState};

use crate::state::{Declaration, StateFile};

pub struct ZoneCommand {
    reconciler: ZoneReconciler,
}

impl ZoneCommand {
    pub fn new(reconciler: ZoneReconciler) -> Self {
        Self { reconciler }
    }

    pub async fn create(&self, state: &StateFile, declaration: &Declaration) -> Result<()> {
        let mut store = state.load()?;
        if let Some(id) = store.id() {
            bail!(
                "Zone {} is already tracked in {}; use update instead",
                id,
                state.path().display()
            );
        }
        declaration.apply(&mut store)?;

        let result = self.reconciler.create(&mut store).await;
        state.save(&store)?;
        result.context("Failed to create SDN zone")?;

        print_store(&store)
    }

    pub async fn read(&self, state: &StateFile) -> Result<()> {
        let mut store = state.load()?;

        let result = self.reconciler.read(&mut store).await;
        match result.context("Failed to read SDN zone")? {
            ZoneState::Present => {
                state.save(&store)?;
                print_store(&store)
            }
            ZoneState::Absent => {
                state.save(&store)?;
                println!("Zone no longer exists; it is no longer tracked");
                Ok(())
            }
        }
    }

    pub async fn update(&self, state: &StateFile, declaration: &Declaration) -> Result<()> {
        let mut store = state.load()?;
        if store.id().is_none() {
            bail!(
                "No tracked zone in {}; use create or import first",
                state.path().display()
            );
        }
        declaration.apply(&mut store)?;

        let result = self.reconciler.update(&mut store).await;
        state.save(&store)?;
        result.context("Failed to update SDN zone")?;

        print_store(&store)
    }

    pub async fn delete(&self, state: &StateFile) -> Result<()> {
        let mut store = state.load()?;

        self.reconciler
            .delete(&mut store)
            .await
            .context("Failed to delete SDN zone")?;

        state.remove()?;
        println!("Zone deleted");
        Ok(())
    }

    pub async fn import(&self, zone: &str, state: &StateFile) -> Result<()> {
        let mut store = AttributeStore::new();

        self.reconciler
            .import(zone, &mut store)
            .await
            .with_context(|| format!("Failed to import SDN zone {}", zone))?;

        state.save(&store)?;
        print_store(&store)
    }
}

fn print_store(store: &AttributeStore) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(store)?);
    Ok(())
}
