//! Resource state files and attribute declarations
//!
//! A state file holds the [`AttributeStore`] of one zone as JSON, the way a
//! host would persist it between invocations.

use anyhow::{bail, Context, Result};
use clap::Args;
use pve_sdn_core::schema::{self, ZoneField};
use pve_sdn_core::{AttributeKind, AttributeStore, AttributeValue};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted attribute store of one zone
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the store; a missing file is an untracked resource
    pub fn load(&self) -> Result<AttributeStore> {
        if !self.path.exists() {
            log::debug!("State file {} not found, starting empty", self.path.display());
            return Ok(AttributeStore::new());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file {}", self.path.display()))
    }

    /// Write the store through a temporary sibling so a crash never leaves
    /// a truncated state file behind
    pub fn save(&self, store: &AttributeStore) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(store)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace state file {}", self.path.display()))?;

        log::debug!("Saved state to {}", self.path.display());
        Ok(())
    }

    pub fn remove(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove state file {}", self.path.display()))?;
        }
        Ok(())
    }
}

/// Declared attributes given on the command line
#[derive(Debug, Clone, Default, Args)]
pub struct Declaration {
    /// Attribute assignment `name=value`, repeatable
    #[arg(short, long = "attr", value_name = "NAME=VALUE")]
    pub attrs: Vec<String>,

    /// JSON object of attributes, applied before `--attr`
    #[arg(short = 'f', long = "attributes-file", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Reset an attribute to its zero value, repeatable
    #[arg(long = "unset", value_name = "NAME")]
    pub unset: Vec<String>,
}

impl Declaration {
    /// Merge the declaration into `store` and check required attributes
    pub fn apply(&self, store: &mut AttributeStore) -> Result<()> {
        if let Some(ref path) = self.file {
            for (name, value) in load_attributes_file(path)? {
                store.set(name, value);
            }
        }

        for raw in &self.attrs {
            let (name, value) = parse_assignment(raw)?;
            store.set(name, value);
        }

        for name in &self.unset {
            let field = lookup(name)?;
            if field.required {
                bail!("Attribute '{}' is required and cannot be unset", name);
            }
            store.set(field.name, field.kind().zero());
        }

        check_required(store)
    }
}

fn lookup(name: &str) -> Result<&'static ZoneField> {
    schema::field(name).with_context(|| format!("Unknown zone attribute '{}'", name))
}

/// Parse `name=value` against the schema
pub fn parse_assignment(raw: &str) -> Result<(String, AttributeValue)> {
    let (name, value) = raw
        .split_once('=')
        .with_context(|| format!("Expected NAME=VALUE, got '{}'", raw))?;
    let field = lookup(name.trim())?;
    Ok((field.name.to_string(), parse_value(field, value)?))
}

fn parse_value(field: &ZoneField, raw: &str) -> Result<AttributeValue> {
    match field.kind() {
        AttributeKind::String => Ok(AttributeValue::Str(raw.to_string())),
        AttributeKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(AttributeValue::Int)
            .with_context(|| format!("Attribute '{}' expects an integer, got '{}'", field.name, raw)),
        AttributeKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(AttributeValue::Bool(true)),
            "0" | "false" | "no" | "off" => Ok(AttributeValue::Bool(false)),
            _ => bail!("Attribute '{}' expects a boolean, got '{}'", field.name, raw),
        },
    }
}

/// Read a JSON object of declared attributes
pub fn load_attributes_file(path: &Path) -> Result<Vec<(String, AttributeValue)>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read attributes file {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse attributes file {}", path.display()))?;

    let object = match value {
        Value::Object(object) => object,
        _ => bail!("Attributes file {} must hold a JSON object", path.display()),
    };

    let mut attributes = Vec::with_capacity(object.len());
    for (name, value) in object {
        let field = lookup(&name)?;
        let value: AttributeValue = serde_json::from_value(value)
            .with_context(|| format!("Attribute '{}' must be a string, number or boolean", name))?;
        attributes.push((field.name.to_string(), value));
    }
    Ok(attributes)
}

/// Every required attribute must be declared and non-empty
pub fn check_required(store: &AttributeStore) -> Result<()> {
    let missing: Vec<&str> = schema::required_fields()
        .filter(|field| match store.get(field.name) {
            None => true,
            Some(value) => value.as_str().is_some_and(str::is_empty),
        })
        .map(|field| field.name)
        .collect();

    if !missing.is_empty() {
        bail!("Missing required attributes: {}", missing.join(", "));
    }
    Ok(())
}
