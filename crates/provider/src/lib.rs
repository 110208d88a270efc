//! OneView Managed SAN reconciler
//!
//! Reconciles HPE OneView Managed SAN resources against a desired state, or
//! triggers the SAN's administrative actions (refresh, endpoints CSV export,
//! unexpected zoning report).

pub mod client;
pub mod config;
pub mod module;
pub mod resources;
pub mod state;

pub use client::OneViewClient;
pub use config::{ApplianceConfig, ConfigOverrides};
pub use resources::managed_san::ManagedSanReconciler;
pub use resources::ManagedSanClient;
