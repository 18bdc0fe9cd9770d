//! Declared attribute schema for SDN zones
//!
//! One table drives every translation between declared attributes and
//! [`ZoneConfig`]. Adding a zone property means adding one row here.

use crate::attributes::AttributeKind;
use crate::zone::ZoneConfig;

/// Accessors into the [`ZoneConfig`] member backing a declared attribute
#[derive(Clone, Copy)]
pub enum FieldAccess {
    Str(
        fn(&ZoneConfig) -> &String,
        fn(&mut ZoneConfig) -> &mut String,
    ),
    Bool(fn(&ZoneConfig) -> &bool, fn(&mut ZoneConfig) -> &mut bool),
    Int(fn(&ZoneConfig) -> &i64, fn(&mut ZoneConfig) -> &mut i64),
}

/// One row of the zone schema
#[derive(Clone, Copy)]
pub struct ZoneField {
    pub name: &'static str,
    pub required: bool,
    pub access: FieldAccess,
}

impl ZoneField {
    pub fn kind(&self) -> AttributeKind {
        match self.access {
            FieldAccess::Str(..) => AttributeKind::String,
            FieldAccess::Bool(..) => AttributeKind::Bool,
            FieldAccess::Int(..) => AttributeKind::Integer,
        }
    }
}

impl std::fmt::Debug for ZoneField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneField")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("required", &self.required)
            .finish()
    }
}

macro_rules! zone_field {
    ($name:literal, $kind:ident, $member:ident, required) => {
        ZoneField {
            name: $name,
            required: true,
            access: FieldAccess::$kind(|c| &c.$member, |c| &mut c.$member),
        }
    };
    ($name:literal, $kind:ident, $member:ident) => {
        ZoneField {
            name: $name,
            required: false,
            access: FieldAccess::$kind(|c| &c.$member, |c| &mut c.$member),
        }
    };
}

/// Declared zone attributes, in schema order
pub static ZONE_FIELDS: &[ZoneField] = &[
    zone_field!("type", Str, zone_type, required),
    zone_field!("zone", Str, zone, required),
    zone_field!("advertise_subnets", Bool, advertise_subnets),
    zone_field!("bridge", Str, bridge),
    zone_field!("bridge_disable_mac_learning", Bool, bridge_disable_mac_learning),
    zone_field!("controller", Str, controller),
    zone_field!("disable_arp_nd_suppression", Bool, disable_arp_nd_suppression),
    zone_field!("dns", Str, dns),
    zone_field!("dnszone", Str, dns_zone),
    zone_field!("dp_id", Int, dp_id),
    zone_field!("exitnodes", Str, exit_nodes),
    zone_field!("exitnodes_local_routing", Bool, exit_nodes_local_routing),
    zone_field!("exitnodes_primary", Str, exit_nodes_primary),
    zone_field!("ipam", Str, ipam),
    zone_field!("mac", Str, mac),
    zone_field!("mtu", Int, mtu),
    zone_field!("nodes", Str, nodes),
    zone_field!("peers", Str, peers),
    zone_field!("reversedns", Str, reverse_dns),
    zone_field!("rt_import", Str, rt_import),
    zone_field!("tag", Int, tag),
    zone_field!("vlan_protocol", Str, vlan_protocol),
    zone_field!("vrf_vxlan", Str, vrf_vxlan),
];

/// Name of the attribute holding the zone identifier
pub const ZONE_ATTRIBUTE: &str = "zone";

pub fn field(name: &str) -> Option<&'static ZoneField> {
    ZONE_FIELDS.iter().find(|field| field.name == name)
}

pub fn required_fields() -> impl Iterator<Item = &'static ZoneField> {
    ZONE_FIELDS.iter().filter(|field| field.required)
}
