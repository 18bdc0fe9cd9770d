use serde::{Deserialize, Serialize};

use crate::error::{SharedResult, SharedTypeError};

/// SDN zone record as exchanged with the cluster API
/// (`/cluster/sdn/zones/{zone}`).
///
/// Zero values (empty strings, `false`, `0`) are left out when encoding and
/// restored by `#[serde(default)]` when decoding, so a zone read back from
/// the controller compares equal to the one that was submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ZoneConfig {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub zone_type: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default, with = "pve_bool", skip_serializing_if = "is_false")]
    pub advertise_subnets: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bridge: String,
    #[serde(default, with = "pve_bool", skip_serializing_if = "is_false")]
    pub bridge_disable_mac_learning: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub controller: String,
    #[serde(default, with = "pve_bool", skip_serializing_if = "is_false")]
    pub disable_arp_nd_suppression: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dns: String,
    #[serde(
        rename = "dnszone",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub dns_zone: String,
    #[serde(default, with = "pve_int", skip_serializing_if = "is_zero")]
    pub dp_id: i64,
    #[serde(
        rename = "exitnodes",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub exit_nodes: String,
    #[serde(
        rename = "exitnodes-local-routing",
        default,
        with = "pve_bool",
        skip_serializing_if = "is_false"
    )]
    pub exit_nodes_local_routing: bool,
    #[serde(
        rename = "exitnodes-primary",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub exit_nodes_primary: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ipam: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mac: String,
    /// Integer in memory, decimal string on the wire.
    #[serde(default, with = "int_string", skip_serializing_if = "is_zero")]
    pub mtu: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nodes: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub peers: String,
    #[serde(
        rename = "reversedns",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub reverse_dns: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rt_import: String,
    #[serde(default, with = "pve_int", skip_serializing_if = "is_zero")]
    pub tag: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vlan_protocol: String,
    /// Declared as text; the controller reports it as a number.
    #[serde(
        default,
        deserialize_with = "scalar_string::deserialize",
        skip_serializing_if = "String::is_empty"
    )]
    pub vrf_vxlan: String,
    /// Configuration digest reported by the controller. Never declared by
    /// the user; carried from a fetched baseline into the next update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl ZoneConfig {
    /// Wire names of the properties an update may remove, in field order.
    /// Everything except the identifying `type` and `zone`.
    pub const OPTIONAL_PROPERTIES: &'static [&'static str] = &[
        "advertise-subnets",
        "bridge",
        "bridge-disable-mac-learning",
        "controller",
        "disable-arp-nd-suppression",
        "dns",
        "dnszone",
        "dp-id",
        "exitnodes",
        "exitnodes-local-routing",
        "exitnodes-primary",
        "ipam",
        "mac",
        "mtu",
        "nodes",
        "peers",
        "reversedns",
        "rt-import",
        "tag",
        "vlan-protocol",
        "vrf-vxlan",
    ];

    pub fn new(zone_type: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            zone_type: zone_type.into(),
            zone: zone.into(),
            ..Self::default()
        }
    }

    /// Decode the raw `data` object returned by the controller.
    pub fn from_json(value: serde_json::Value) -> SharedResult<Self> {
        let config: ZoneConfig = serde_json::from_value(value)?;
        if config.zone.is_empty() {
            return Err(SharedTypeError::InvalidValue {
                field: "zone",
                value: String::new(),
            });
        }
        Ok(config)
    }

    pub fn to_json(&self) -> SharedResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Numbers as the controller hands them out: JSON numbers or numeric
/// strings, whichever the schema of that property happens to use.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

mod pve_bool {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::RawScalar;

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match RawScalar::deserialize(deserializer)? {
            RawScalar::Bool(value) => Ok(value),
            RawScalar::Number(number) => match number.as_i64() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(D::Error::custom(format!("invalid boolean: {number}"))),
            },
            RawScalar::Text(text) => match text.as_str() {
                "0" | "false" => Ok(false),
                "1" | "true" => Ok(true),
                _ => Err(D::Error::custom(format!("invalid boolean: {text}"))),
            },
        }
    }
}

mod pve_int {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::RawScalar;

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(*value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match RawScalar::deserialize(deserializer)? {
            RawScalar::Number(number) => number
                .as_i64()
                .ok_or_else(|| D::Error::custom(format!("integer out of range: {number}"))),
            RawScalar::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|err| D::Error::custom(format!("invalid integer '{text}': {err}"))),
            RawScalar::Bool(value) => {
                Err(D::Error::custom(format!("expected integer, got {value}")))
            }
        }
    }
}

mod int_string {
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        super::pve_int::deserialize(deserializer)
    }
}

mod scalar_string {
    use serde::{Deserialize, Deserializer};

    use super::RawScalar;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match RawScalar::deserialize(deserializer)? {
            RawScalar::Text(text) => text,
            RawScalar::Number(number) => number.to_string(),
            RawScalar::Bool(value) => value.to_string(),
        })
    }
}
