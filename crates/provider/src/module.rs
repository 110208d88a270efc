//! Module invocation
//!
//! Parses a parameter file, runs one reconciliation and turns the outcome
//! into the JSON document printed on stdout.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::warn;

use oneview_common::{DesiredState, Error, ModuleOutput, Operation, Result};

use crate::config::{ApplianceConfig, ConfigOverrides};
use crate::resources::managed_san::ManagedSanReconciler;
use crate::resources::ManagedSanClient;

/// Parameters of one module invocation
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleParams {
    #[serde(default, alias = "operation")]
    pub state: Operation,

    pub data: Map<String, Value>,

    /// Appliance config file (TOML)
    #[serde(default)]
    pub config: Option<PathBuf>,

    #[serde(flatten)]
    pub connection: ConfigOverrides,
}

impl ModuleParams {
    /// Read parameters from a YAML or JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn desired_state(&self) -> DesiredState {
        DesiredState::new(self.state, self.data.clone())
    }

    /// Resolve connection settings: config file, then `overrides`, then
    /// connection values given in the parameters themselves.
    pub fn appliance_config(
        &self,
        config_path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<ApplianceConfig> {
        let base = match self.config.as_deref().or(config_path) {
            Some(path) => ApplianceConfig::load(path)?,
            None => ApplianceConfig::default(),
        };
        let config = base.with_overrides(overrides).with_overrides(&self.connection);
        config.validate()?;
        Ok(config)
    }
}

/// Reconcile `desired` through `client` and render the outcome.
pub async fn run<C: ManagedSanClient>(desired: &DesiredState, client: C) -> ModuleOutput {
    let reconciler = ManagedSanReconciler::new(client);
    match reconciler.execute(desired).await {
        Ok(result) => ModuleOutput::Success(result),
        Err(e) => failure(&e),
    }
}

/// Failure document for an error
pub fn failure(error: &Error) -> ModuleOutput {
    warn!("Managed SAN operation failed: {}", error);
    ModuleOutput::failure(error.to_string(), Some(format!("{:?}", error)))
}
