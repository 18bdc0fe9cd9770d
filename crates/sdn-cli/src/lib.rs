//! Proxmox VE SDN zone CLI
//!
//! Drives the zone reconciler the way a declarative host does: one state
//! file per zone, one lifecycle operation per invocation.

pub mod commands;
pub mod state;

#[cfg(test)]
mod tests;
