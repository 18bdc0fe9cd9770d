//! Translation between declared attributes and [`ZoneConfig`]

use crate::attributes::{AttributeStore, AttributeValue};
use crate::error::{Result, ZoneError};
use crate::schema::{FieldAccess, ZoneField, ZONE_FIELDS};
use crate::zone::ZoneConfig;

/// Table driven mapper over [`ZONE_FIELDS`]
pub struct FieldMapper;

impl FieldMapper {
    /// Decode declared attributes into a zone record.
    ///
    /// Absent attributes become the zero value of their kind. A value that
    /// cannot be coerced to its declared kind fails with the field name.
    pub fn to_config(attributes: &AttributeStore) -> Result<ZoneConfig> {
        let mut config = ZoneConfig::default();
        for field in ZONE_FIELDS {
            let value = attributes.get(field.name);
            match field.access {
                FieldAccess::Str(_, set) => *set(&mut config) = coerce_str(value),
                FieldAccess::Bool(_, set) => *set(&mut config) = coerce_bool(field, value)?,
                FieldAccess::Int(_, set) => *set(&mut config) = coerce_int(field, value)?,
            }
        }
        Ok(config)
    }

    /// Write every mapped member of `config` into the store
    pub fn from_config(config: &ZoneConfig, attributes: &mut AttributeStore) {
        for field in ZONE_FIELDS {
            let value = match field.access {
                FieldAccess::Str(get, _) => AttributeValue::Str(get(config).clone()),
                FieldAccess::Bool(get, _) => AttributeValue::Bool(*get(config)),
                FieldAccess::Int(get, _) => AttributeValue::Int(*get(config)),
            };
            attributes.set(field.name, value);
        }
    }

    /// Replace every mapped member of `target` with the one from `declared`.
    /// Members outside the schema (the digest) are left untouched.
    pub fn overwrite(declared: &ZoneConfig, target: &mut ZoneConfig) {
        for field in ZONE_FIELDS {
            match field.access {
                FieldAccess::Str(get, set) => *set(target) = get(declared).clone(),
                FieldAccess::Bool(get, set) => *set(target) = *get(declared),
                FieldAccess::Int(get, set) => *set(target) = *get(declared),
            }
        }
    }
}

fn coerce_str(value: Option<&AttributeValue>) -> String {
    match value {
        None => String::new(),
        Some(AttributeValue::Str(value)) => value.clone(),
        Some(other) => other.to_string(),
    }
}

fn coerce_bool(field: &ZoneField, value: Option<&AttributeValue>) -> Result<bool> {
    match value {
        None => Ok(false),
        Some(AttributeValue::Bool(value)) => Ok(*value),
        Some(AttributeValue::Int(0)) => Ok(false),
        Some(AttributeValue::Int(1)) => Ok(true),
        Some(AttributeValue::Int(other)) => Err(ZoneError::validation(
            field.name,
            format!("expected a boolean, got {other}"),
        )),
        Some(AttributeValue::Str(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "" | "0" | "false" | "no" | "off" => Ok(false),
            "1" | "true" | "yes" | "on" => Ok(true),
            _ => Err(ZoneError::validation(
                field.name,
                format!("expected a boolean, got '{text}'"),
            )),
        },
    }
}

fn coerce_int(field: &ZoneField, value: Option<&AttributeValue>) -> Result<i64> {
    match value {
        None => Ok(0),
        Some(AttributeValue::Int(value)) => Ok(*value),
        Some(AttributeValue::Str(text)) if text.trim().is_empty() => Ok(0),
        Some(AttributeValue::Str(text)) => text.trim().parse::<i64>().map_err(|err| {
            ZoneError::validation(field.name, format!("expected an integer, got '{text}': {err}"))
        }),
        Some(AttributeValue::Bool(value)) => Err(ZoneError::validation(
            field.name,
            format!("expected an integer, got {value}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_attributes() -> AttributeStore {
        AttributeStore::from_pairs([
            ("type", AttributeValue::from("evpn")),
            ("zone", "evpn1".into()),
            ("advertise_subnets", true.into()),
            ("bridge", "vmbr0".into()),
            ("bridge_disable_mac_learning", true.into()),
            ("controller", "ctl1".into()),
            ("disable_arp_nd_suppression", false.into()),
            ("dns", "powerdns".into()),
            ("dnszone", "example.com".into()),
            ("dp_id", 42.into()),
            ("exitnodes", "node1,node2".into()),
            ("exitnodes_local_routing", true.into()),
            ("exitnodes_primary", "node1".into()),
            ("ipam", "pve".into()),
            ("mac", "32:F4:05:FE:6C:0A".into()),
            ("mtu", 1450.into()),
            ("nodes", "node1,node2,node3".into()),
            ("peers", "10.0.0.1,10.0.0.2".into()),
            ("reversedns", "powerdns".into()),
            ("rt_import", "65000:100".into()),
            ("tag", 100.into()),
            ("vlan_protocol", "802.1ad".into()),
            ("vrf_vxlan", "10000".into()),
        ])
    }

    #[test]
    fn test_round_trip_reproduces_attributes() {
        let attributes = full_attributes();

        let config = FieldMapper::to_config(&attributes).unwrap();
        let mut restored = AttributeStore::new();
        FieldMapper::from_config(&config, &mut restored);

        assert_eq!(restored, attributes);
    }

    #[test]
    fn test_to_config_populates_members() {
        let config = FieldMapper::to_config(&full_attributes()).unwrap();

        assert_eq!(config.zone_type, "evpn");
        assert_eq!(config.zone, "evpn1");
        assert_eq!(config.dns_zone, "example.com");
        assert_eq!(config.reverse_dns, "powerdns");
        assert_eq!(config.exit_nodes, "node1,node2");
        assert!(config.exit_nodes_local_routing);
        assert_eq!(config.dp_id, 42);
        assert_eq!(config.mtu, 1450);
        assert_eq!(config.tag, 100);
        assert_eq!(config.digest, None);
    }

    #[test]
    fn test_absent_attributes_map_to_zero_values() {
        let attributes = AttributeStore::from_pairs([("type", "simple"), ("zone", "s1")]);

        let config = FieldMapper::to_config(&attributes).unwrap();
        assert_eq!(config, ZoneConfig::new("simple", "s1"));

        let mut restored = AttributeStore::new();
        FieldMapper::from_config(&config, &mut restored);
        assert_eq!(restored.len(), ZONE_FIELDS.len());
        assert_eq!(restored.get("mtu"), Some(&AttributeValue::Int(0)));
        assert_eq!(restored.get("bridge"), Some(&AttributeValue::Str(String::new())));
        assert_eq!(
            restored.get("advertise_subnets"),
            Some(&AttributeValue::Bool(false))
        );
    }

    #[test]
    fn test_string_values_are_coerced() {
        let attributes = AttributeStore::from_pairs([
            ("type", "vxlan"),
            ("zone", "z1"),
            ("mtu", " 1500 "),
            ("tag", ""),
            ("advertise_subnets", "yes"),
            ("exitnodes_local_routing", "0"),
        ]);

        let config = FieldMapper::to_config(&attributes).unwrap();
        assert_eq!(config.mtu, 1500);
        assert_eq!(config.tag, 0);
        assert!(config.advertise_subnets);
        assert!(!config.exit_nodes_local_routing);
    }

    #[test]
    fn test_non_numeric_integer_is_rejected() {
        let attributes = AttributeStore::from_pairs([("zone", "z1"), ("mtu", "jumbo")]);

        match FieldMapper::to_config(&attributes) {
            Err(ZoneError::Validation { field, .. }) => assert_eq!(field, "mtu"),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_integer_is_rejected() {
        let attributes =
            AttributeStore::from_pairs([("zone", "z1"), ("mtu", "99999999999999999999")]);
        assert!(matches!(
            FieldMapper::to_config(&attributes),
            Err(ZoneError::Validation { .. })
        ));
    }

    #[test]
    fn test_invalid_boolean_is_rejected() {
        let mut attributes = AttributeStore::from_pairs([("zone", "z1")]);
        attributes.set("advertise_subnets", 7);
        assert!(matches!(
            FieldMapper::to_config(&attributes),
            Err(ZoneError::Validation { field, .. }) if field == "advertise_subnets"
        ));

        attributes.set("advertise_subnets", "maybe");
        assert!(FieldMapper::to_config(&attributes).is_err());
    }

    #[test]
    fn test_overwrite_keeps_digest() {
        let declared = FieldMapper::to_config(&full_attributes()).unwrap();
        let mut baseline = ZoneConfig::new("evpn", "evpn1");
        baseline.mtu = 9000;
        baseline.bridge = "vmbr9".to_string();
        baseline.digest = Some("d1".to_string());

        FieldMapper::overwrite(&declared, &mut baseline);

        assert_eq!(baseline.mtu, 1450);
        assert_eq!(baseline.bridge, "vmbr0");
        assert_eq!(baseline.digest.as_deref(), Some("d1"));
        baseline.digest = None;
        assert_eq!(baseline, declared);
    }
}
