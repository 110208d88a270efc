//! Resource Implementations
//!
//! Reconciliation handlers and the appliance operations they depend on.

pub mod managed_san;

use async_trait::async_trait;
use serde_json::{Map, Value};

use oneview_common::{ManagedSan, Result};

/// Appliance operations used by the Managed SAN reconciler
#[async_trait]
pub trait ManagedSanClient: Send + Sync {
    /// Look a Managed SAN up by its unique name
    async fn get_by_name(&self, name: &str) -> Result<Option<ManagedSan>>;

    /// Send a partial update; returns the server's updated representation
    async fn update(&self, uri: &str, data: &Map<String, Value>) -> Result<Value>;

    /// Create a SAN endpoints CSV file
    async fn create_endpoints_csv_file(&self, uri: &str) -> Result<Value>;

    /// Create an unexpected zoning issues report
    async fn create_issues_report(&self, uri: &str) -> Result<Value>;
}

#[async_trait]
impl<T: ManagedSanClient + ?Sized> ManagedSanClient for &T {
    async fn get_by_name(&self, name: &str) -> Result<Option<ManagedSan>> {
        (**self).get_by_name(name).await
    }

    async fn update(&self, uri: &str, data: &Map<String, Value>) -> Result<Value> {
        (**self).update(uri, data).await
    }

    async fn create_endpoints_csv_file(&self, uri: &str) -> Result<Value> {
        (**self).create_endpoints_csv_file(uri).await
    }

    async fn create_issues_report(&self, uri: &str) -> Result<Value> {
        (**self).create_issues_report(uri).await
    }
}
