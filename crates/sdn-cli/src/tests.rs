//! CLI command tests

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pve_api_client::{ApiError, ApiRequest, ApiResponse, PveApiClient, PveZoneGateway};
use pve_sdn_core::{AttributeStore, AttributeValue, ProviderContext, ZoneReconciler};
use serde_json::{json, Map, Value};
use tempfile::TempDir;

use crate::commands::{SchemaCommand, ZoneCommand};
use crate::state::{check_required, parse_assignment, Declaration, StateFile};

const ZONES_PATH: &str = "/cluster/sdn/zones";

/// Controller stand-in serving the zone endpoints from memory
///
/// PUT merges the submitted properties into the stored record and removes
/// the ones listed in `delete`, like the cluster API does.
#[derive(Default)]
struct MemoryController {
    zones: Mutex<HashMap<String, Map<String, Value>>>,
    revision: Mutex<u32>,
}

impl MemoryController {
    fn insert(&self, zone: &str, record: Value) {
        if let Value::Object(record) = record {
            self.zones.lock().unwrap().insert(zone.to_string(), record);
        }
    }

    fn record(&self, zone: &str) -> Option<Map<String, Value>> {
        self.zones.lock().unwrap().get(zone).cloned()
    }

    fn next_digest(&self) -> String {
        let mut revision = self.revision.lock().unwrap();
        *revision += 1;
        format!("d{}", *revision)
    }

    fn missing(zone: &str) -> ApiError {
        ApiError::Api {
            status: 500,
            message: format!("sdn zone object ID '{}' does not exist", zone),
        }
    }

    fn body(request: &ApiRequest) -> Map<String, Value> {
        match &request.body {
            Some(Value::Object(body)) => body.clone(),
            _ => Map::new(),
        }
    }

    fn put(&self, zone: &str, mut body: Map<String, Value>) -> Result<Value, ApiError> {
        let digest = self.next_digest();
        let mut zones = self.zones.lock().unwrap();
        let record = zones.get_mut(zone).ok_or_else(|| Self::missing(zone))?;

        if let Some(expected) = body.remove("digest") {
            if record.get("digest") != Some(&expected) {
                return Err(ApiError::Api {
                    status: 500,
                    message: "detected modified configuration - file changed by other user?"
                        .to_string(),
                });
            }
        }

        if let Some(Value::String(delete)) = body.remove("delete") {
            for key in delete.split(',') {
                if body.contains_key(key) {
                    return Err(ApiError::Api {
                        status: 400,
                        message: format!("cannot set and delete property '{}' at the same time", key),
                    });
                }
                if record.remove(key).is_none() {
                    return Err(ApiError::Api {
                        status: 400,
                        message: format!("no such option '{}'", key),
                    });
                }
            }
        }

        record.extend(body);
        record.insert("digest".to_string(), json!(digest));
        Ok(Value::Null)
    }
}

#[async_trait]
impl PveApiClient for MemoryController {
    async fn call(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let zone = request
            .path
            .strip_prefix(ZONES_PATH)
            .and_then(|rest| rest.strip_prefix('/'));

        let data = match (request.method.as_str(), zone) {
            ("GET", None) => {
                let zones = self.zones.lock().unwrap();
                Value::Array(
                    zones
                        .values()
                        .map(|record| json!({ "zone": record["zone"], "type": record["type"] }))
                        .collect(),
                )
            }
            ("GET", Some(zone)) => Value::Object(self.record(zone).ok_or_else(|| Self::missing(zone))?),
            ("POST", None) => {
                let mut record = Self::body(request);
                let zone = record["zone"].as_str().unwrap_or_default().to_string();
                if self.record(&zone).is_some() {
                    return Err(ApiError::Api {
                        status: 500,
                        message: format!("sdn zone object ID '{}' already defined", zone),
                    });
                }
                record.insert("digest".to_string(), json!(self.next_digest()));
                self.zones.lock().unwrap().insert(zone, record);
                Value::Null
            }
            ("PUT", Some(zone)) => self.put(zone, Self::body(request))?,
            ("DELETE", Some(zone)) => {
                self.zones
                    .lock()
                    .unwrap()
                    .remove(zone)
                    .ok_or_else(|| Self::missing(zone))?;
                Value::Null
            }
            (method, _) => {
                return Err(ApiError::Api {
                    status: 501,
                    message: format!("Method '{} {}' not implemented", method, request.path),
                })
            }
        };

        Ok(ApiResponse {
            status: 200,
            body: json!({ "data": data }),
        })
    }
}

fn command_with(controller: Arc<MemoryController>) -> ZoneCommand {
    let context = ProviderContext::new(Arc::new(PveZoneGateway::new(controller)));
    ZoneCommand::new(ZoneReconciler::new(Arc::new(context)))
}

fn declaration(attrs: &[&str]) -> Declaration {
    Declaration {
        attrs: attrs.iter().map(|attr| attr.to_string()).collect(),
        ..Default::default()
    }
}

#[test]
fn test_state_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let state = StateFile::new(dir.path().join("nested").join("z1.json"));

    assert!(state.load().unwrap().is_empty());

    let mut store = AttributeStore::from_pairs([("zone", "z1"), ("type", "vxlan")]);
    store.set("mtu", 1500);
    store.set_id("z1");
    state.save(&store).unwrap();

    assert_eq!(state.load().unwrap(), store);
    assert!(!state.path().with_extension("tmp").exists());

    state.remove().unwrap();
    assert!(!state.path().exists());
}

#[test]
fn test_corrupt_state_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("z1.json");
    fs::write(&path, "{ not json").unwrap();

    let err = StateFile::new(&path).load().unwrap_err();
    assert!(err.to_string().contains("Failed to parse state file"));
}

#[test]
fn test_parse_assignment_uses_schema_kinds() {
    assert_eq!(
        parse_assignment("mtu=1500").unwrap(),
        ("mtu".to_string(), AttributeValue::Int(1500))
    );
    assert_eq!(
        parse_assignment("advertise_subnets=yes").unwrap(),
        ("advertise_subnets".to_string(), AttributeValue::Bool(true))
    );
    assert_eq!(
        parse_assignment("peers=10.0.0.1,10.0.0.2").unwrap(),
        ("peers".to_string(), AttributeValue::Str("10.0.0.1,10.0.0.2".to_string()))
    );

    assert!(parse_assignment("mtu").is_err());
    assert!(parse_assignment("mtu=large").is_err());
    assert!(parse_assignment("advertise_subnets=maybe").is_err());
    assert!(parse_assignment("colour=blue").is_err());
}

#[test]
fn test_declaration_merges_file_then_assignments() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("zone.json");
    fs::write(
        &file,
        r#"{ "type": "vxlan", "zone": "z1", "mtu": 1450, "peers": "10.0.0.1" }"#,
    )
    .unwrap();

    let declaration = Declaration {
        attrs: vec!["mtu=1500".to_string()],
        file: Some(file),
        unset: vec!["peers".to_string()],
    };

    let mut store = AttributeStore::new();
    declaration.apply(&mut store).unwrap();

    assert_eq!(store.get("mtu"), Some(&AttributeValue::Int(1500)));
    assert_eq!(store.get("peers"), Some(&AttributeValue::Str(String::new())));
    assert_eq!(store.get("zone"), Some(&AttributeValue::Str("z1".to_string())));
}

#[test]
fn test_required_attributes() {
    let store = AttributeStore::from_pairs([("zone", "z1")]);
    let err = check_required(&store).unwrap_err();
    assert_eq!(err.to_string(), "Missing required attributes: type");

    let store = AttributeStore::from_pairs([("zone", ""), ("type", "simple")]);
    assert!(check_required(&store).is_err());

    let declaration = Declaration {
        unset: vec!["zone".to_string()],
        ..declaration(&["type=simple", "zone=z1"])
    };
    assert!(declaration.apply(&mut AttributeStore::new()).is_err());
}

#[test]
fn test_schema_render() {
    let text = SchemaCommand::render("text").unwrap();
    assert!(text.lines().any(|line| line.starts_with("zone") && line.ends_with("yes")));

    let json: Value = serde_json::from_str(&SchemaCommand::render("json").unwrap()).unwrap();
    let fields = json.as_array().unwrap();
    assert_eq!(fields.len(), 23);
    assert!(fields.contains(&json!({ "name": "mtu", "kind": "integer", "required": false })));

    assert!(SchemaCommand::render("yaml").is_err());
}

#[tokio::test]
async fn test_lifecycle_through_state_file() {
    let dir = TempDir::new().unwrap();
    let state = StateFile::new(dir.path().join("z1.json"));
    let controller = Arc::new(MemoryController::default());
    let command = command_with(controller.clone());

    command
        .create(&state, &declaration(&["type=vxlan", "zone=z1", "mtu=1500", "tag=10"]))
        .await
        .unwrap();

    let store = state.load().unwrap();
    assert_eq!(store.id(), Some("z1"));
    assert_eq!(store.get("tag"), Some(&AttributeValue::Int(10)));

    // A second create against a tracked state is refused
    assert!(command
        .create(&state, &declaration(&["type=vxlan", "zone=z1"]))
        .await
        .is_err());

    command
        .update(&state, &declaration(&["mtu=1400"]))
        .await
        .unwrap();
    assert_eq!(state.load().unwrap().get("mtu"), Some(&AttributeValue::Int(1400)));
    assert_eq!(controller.record("z1").unwrap()["mtu"], json!("1400"));

    command.delete(&state).await.unwrap();
    assert!(!state.path().exists());
    assert!(controller.record("z1").is_none());
}

#[tokio::test]
async fn test_read_of_vanished_zone_untracks_it() {
    let dir = TempDir::new().unwrap();
    let state = StateFile::new(dir.path().join("z1.json"));
    let controller = Arc::new(MemoryController::default());
    let command = command_with(controller.clone());

    command
        .create(&state, &declaration(&["type=simple", "zone=z1"]))
        .await
        .unwrap();
    controller.zones.lock().unwrap().clear();

    command.read(&state).await.unwrap();
    let store = state.load().unwrap();
    assert_eq!(store.id(), None);
    assert_eq!(store.get("zone"), Some(&AttributeValue::Str("z1".to_string())));

    // Update needs a tracked zone
    assert!(command.update(&state, &declaration(&[])).await.is_err());
}

#[tokio::test]
async fn test_import_writes_state() {
    let dir = TempDir::new().unwrap();
    let state = StateFile::new(dir.path().join("imported.json"));
    let controller = Arc::new(MemoryController::default());
    controller.insert(
        "evpn1",
        json!({ "zone": "evpn1", "type": "evpn", "controller": "ctl1", "vrf-vxlan": 4000 }),
    );
    let command = command_with(controller);

    command.import("evpn1", &state).await.unwrap();
    let store = state.load().unwrap();
    assert_eq!(store.id(), Some("evpn1"));
    assert_eq!(store.get("vrf_vxlan"), Some(&AttributeValue::Str("4000".to_string())));

    let missing = StateFile::new(dir.path().join("missing.json"));
    assert!(command.import("nope", &missing).await.is_err());
    assert!(!missing.path().exists());
}

#[tokio::test]
async fn test_update_clears_unset_properties_on_controller() {
    let dir = TempDir::new().unwrap();
    let state = StateFile::new(dir.path().join("z1.json"));
    let controller = Arc::new(MemoryController::default());
    let command = command_with(controller.clone());

    command
        .create(
            &state,
            &declaration(&[
                "type=vlan",
                "zone=z1",
                "bridge=vmbr0",
                "advertise_subnets=true",
                "mtu=1500",
            ]),
        )
        .await
        .unwrap();
    assert_eq!(controller.record("z1").unwrap()["bridge"], json!("vmbr0"));

    let update = Declaration {
        unset: vec!["bridge".to_string()],
        ..declaration(&["advertise_subnets=false"])
    };
    command.update(&state, &update).await.unwrap();

    let record = controller.record("z1").unwrap();
    assert!(!record.contains_key("bridge"));
    assert!(!record.contains_key("advertise-subnets"));
    assert_eq!(record["mtu"], json!("1500"));

    let store = state.load().unwrap();
    assert_eq!(store.get("bridge"), Some(&AttributeValue::Str(String::new())));
    assert_eq!(store.get("advertise_subnets"), Some(&AttributeValue::Bool(false)));
    assert_eq!(store.get("mtu"), Some(&AttributeValue::Int(1500)));

    // A fresh read agrees with what the update wrote back
    command.read(&state).await.unwrap();
    assert_eq!(state.load().unwrap(), store);
}
