//! Core types for the Managed SAN reconciler

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::{Error, Result};

/// A Managed SAN as returned by the appliance.
///
/// Only `name` and `uri` are interpreted; every other attribute
/// (`sanPolicy`, `publicAttributes`, `refreshStateData`, ...) is kept as-is,
/// in server order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManagedSan(Map<String, Value>);

impl ManagedSan {
    pub fn new(attrs: Map<String, Value>) -> Self {
        Self(attrs)
    }

    /// Build from an arbitrary JSON value; non-objects are rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::MalformedResource(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// Server-assigned URI. Present on anything fetched from the appliance.
    pub fn uri(&self) -> Option<&str> {
        self.0.get("uri").and_then(Value::as_str)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_attributes(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for ManagedSan {
    fn from(attrs: Map<String, Value>) -> Self {
        Self(attrs)
    }
}

/// Requested operation on a Managed SAN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Ensure `data` properties are compliant with the appliance
    #[default]
    Present,
    /// Update the refresh state of the SAN
    RefreshStateSet,
    /// Create a SAN endpoints CSV file
    EndpointsCsvFileCreated,
    /// Create an unexpected zoning issues report
    IssuesReportCreated,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::EndpointsCsvFileCreated,
        Operation::IssuesReportCreated,
        Operation::Present,
        Operation::RefreshStateSet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Present => "present",
            Operation::RefreshStateSet => "refresh_state_set",
            Operation::EndpointsCsvFileCreated => "endpoints_csv_file_created",
            Operation::IssuesReportCreated => "issues_report_created",
        }
    }

    /// Key the operation's result is published under.
    pub fn fact_key(&self) -> FactKey {
        match self {
            Operation::Present | Operation::RefreshStateSet => FactKey::ManagedSan,
            Operation::EndpointsCsvFileCreated => FactKey::ManagedSanEndpoints,
            Operation::IssuesReportCreated => FactKey::ManagedSanIssues,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| {
                let choices: Vec<&str> = Operation::ALL.iter().map(|op| op.as_str()).collect();
                Error::InvalidArgument(format!(
                    "value of state must be one of: {}, got: {}",
                    choices.join(", "),
                    s
                ))
            })
    }
}

/// Fact bundle keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKey {
    ManagedSan,
    ManagedSanEndpoints,
    ManagedSanIssues,
}

impl FactKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactKey::ManagedSan => "managed_san",
            FactKey::ManagedSanEndpoints => "managed_san_endpoints",
            FactKey::ManagedSanIssues => "managed_san_issues",
        }
    }
}

/// Caller input: what to do and with which properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesiredState {
    #[serde(default, alias = "state")]
    pub operation: Operation,
    pub data: Map<String, Value>,
}

impl DesiredState {
    pub fn new(operation: Operation, data: Map<String, Value>) -> Self {
        Self { operation, data }
    }

    /// The `name` the resource is looked up by.
    pub fn name(&self) -> Result<&str> {
        match self.data.get("name") {
            Some(Value::String(name)) => Ok(name),
            Some(other) => Err(Error::InvalidArgument(format!(
                "data.name must be a string, got {}",
                other
            ))),
            None => Err(Error::missing_field("data.name")),
        }
    }
}

/// Outcome of one reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub changed: bool,
    pub msg: String,
    pub facts: Map<String, Value>,
}

impl OperationResult {
    pub fn new(changed: bool, msg: impl Into<String>, key: FactKey, value: Value) -> Self {
        let mut facts = Map::new();
        facts.insert(key.as_str().to_string(), value);
        Self {
            changed,
            msg: msg.into(),
            facts,
        }
    }

    pub fn fact(&self, key: FactKey) -> Option<&Value> {
        self.facts.get(key.as_str())
    }
}

/// Failure payload emitted instead of a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleFailure {
    pub failed: bool,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

/// What the binary prints on stdout
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModuleOutput {
    Success(OperationResult),
    Failure(ModuleFailure),
}

impl ModuleOutput {
    pub fn failure(msg: impl Into<String>, exception: Option<String>) -> Self {
        ModuleOutput::Failure(ModuleFailure {
            failed: true,
            msg: msg.into(),
            exception,
        })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ModuleOutput::Failure(_))
    }
}
