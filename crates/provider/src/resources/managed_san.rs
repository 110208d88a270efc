//! Managed SAN reconciler
//!
//! Looks the SAN up by name and dispatches on the requested operation.
//! Only `present` is declarative; the other three always act.

use serde_json::{Map, Value};
use tracing::{debug, info};

use oneview_common::{DesiredState, Error, FactKey, ManagedSan, Operation, OperationResult, Result};

use super::ManagedSanClient;
use crate::state;

pub const MSG_UPDATED: &str = "Managed SAN updated successfully.";
pub const MSG_REFRESH_STATE_UPDATED: &str = "Managed SAN's refresh state changed successfully.";
pub const MSG_NOT_FOUND: &str = "Managed SAN was not found for this operation.";
pub const MSG_NO_CHANGES_PROVIDED: &str = "The Managed SAN is already compliant.";
pub const MSG_ENDPOINTS_CSV_FILE_CREATED: &str = "SAN endpoints CSV file created successfully.";
pub const MSG_ISSUES_REPORT_CREATED: &str = "Unexpected zoning report created successfully.";

/// Reconciles Managed SAN resources through an injected client
pub struct ManagedSanReconciler<C> {
    client: C,
}

impl<C: ManagedSanClient> ManagedSanReconciler<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Run one reconciliation.
    pub async fn execute(&self, desired: &DesiredState) -> Result<OperationResult> {
        let name = desired.name()?;
        info!("Reconciling Managed SAN {} ({})", name, desired.operation);

        let resource = self
            .client
            .get_by_name(name)
            .await?
            .ok_or_else(|| Error::ResourceNotFound(MSG_NOT_FOUND.to_string()))?;

        let key = desired.operation.fact_key();
        match desired.operation {
            Operation::Present => self.update(&desired.data, resource, key).await,
            Operation::RefreshStateSet => self.set_refresh_state(&desired.data, &resource, key).await,
            Operation::EndpointsCsvFileCreated => self.create_endpoints_csv_file(&resource, key).await,
            Operation::IssuesReportCreated => self.create_issues_report(&resource, key).await,
        }
    }

    async fn update(
        &self,
        data: &Map<String, Value>,
        resource: ManagedSan,
        key: FactKey,
    ) -> Result<OperationResult> {
        if state::is_compliant(&resource, data) {
            debug!("Managed SAN {:?} already matches the requested data", resource.name());
            return Ok(OperationResult::new(
                false,
                MSG_NO_CHANGES_PROVIDED,
                key,
                resource.into_value(),
            ));
        }

        let uri = resource_uri(&resource)?;
        let updated = self.client.update(uri, data).await?;
        info!("Updated Managed SAN at {}", uri);

        Ok(OperationResult::new(true, MSG_UPDATED, key, updated))
    }

    async fn set_refresh_state(
        &self,
        data: &Map<String, Value>,
        resource: &ManagedSan,
        key: FactKey,
    ) -> Result<OperationResult> {
        let refresh_state_data = match data.get("refreshStateData") {
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(Error::InvalidArgument(format!(
                    "data.refreshStateData must be a mapping, got {}",
                    other
                )))
            }
            None => return Err(Error::missing_field("data.refreshStateData")),
        };

        let uri = resource_uri(resource)?;
        let updated = self.client.update(uri, refresh_state_data).await?;
        info!("Refresh state set on Managed SAN at {}", uri);

        Ok(OperationResult::new(
            true,
            MSG_REFRESH_STATE_UPDATED,
            key,
            updated,
        ))
    }

    async fn create_endpoints_csv_file(
        &self,
        resource: &ManagedSan,
        key: FactKey,
    ) -> Result<OperationResult> {
        let uri = resource_uri(resource)?;
        let csv_file = self.client.create_endpoints_csv_file(uri).await?;

        Ok(OperationResult::new(
            true,
            MSG_ENDPOINTS_CSV_FILE_CREATED,
            key,
            csv_file,
        ))
    }

    async fn create_issues_report(
        &self,
        resource: &ManagedSan,
        key: FactKey,
    ) -> Result<OperationResult> {
        let uri = resource_uri(resource)?;
        let report = self.client.create_issues_report(uri).await?;

        Ok(OperationResult::new(
            true,
            MSG_ISSUES_REPORT_CREATED,
            key,
            report,
        ))
    }
}

fn resource_uri(resource: &ManagedSan) -> Result<&str> {
    resource.uri().ok_or_else(|| {
        Error::MalformedResource(format!(
            "Managed SAN {:?} has no uri",
            resource.name().unwrap_or_default()
        ))
    })
}
