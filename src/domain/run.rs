use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SourceItem;
use crate::errors::{ErrorKind, IngestError};

/// One parameter instance of a source that did not produce items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceFailure {
    pub parameter: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl InstanceFailure {
    pub fn new(parameter: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn from_error(parameter: impl Into<String>, error: &IngestError) -> Self {
        Self::new(parameter, error.kind(), error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub kind: ErrorKind,
    pub message: String,
    /// Every failed parameter instance, in configuration order.
    pub instances: Vec<InstanceFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdapterResult {
    Ok {
        items: Vec<SourceItem>,
        /// Parameter instances that failed while others succeeded.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        failures: Vec<InstanceFailure>,
    },
    Failed(FailureDetail),
}

impl AdapterResult {
    pub fn ok(items: Vec<SourceItem>) -> Self {
        AdapterResult::Ok {
            items,
            failures: Vec::new(),
        }
    }

    /// Total failure; the first instance (configuration order) names the kind.
    pub fn failed(instances: Vec<InstanceFailure>) -> Self {
        let (kind, message) = instances
            .first()
            .map(|f| (f.kind, format!("{}: {}", f.parameter, f.message)))
            .unwrap_or((ErrorKind::Internal, "no parameter instances ran".to_string()));

        AdapterResult::Failed(FailureDetail {
            kind,
            message,
            instances,
        })
    }

    pub fn items(&self) -> Option<&[SourceItem]> {
        match self {
            AdapterResult::Ok { items, .. } => Some(items),
            AdapterResult::Failed(_) => None,
        }
    }

    pub fn failure_kind(&self) -> Option<ErrorKind> {
        match self {
            AdapterResult::Ok { .. } => None,
            AdapterResult::Failed(detail) => Some(detail.kind),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, AdapterResult::Ok { .. })
    }
}

/// Output of one orchestrator invocation, handed to downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub sources: BTreeMap<String, AdapterResult>,
    pub hours_back: u32,
    pub executed_at: DateTime<Utc>,
}

impl RunResult {
    pub fn get(&self, source_name: &str) -> Option<&AdapterResult> {
        self.sources.get(source_name)
    }

    pub fn total_items(&self) -> usize {
        self.sources
            .values()
            .filter_map(|r| r.items())
            .map(|items| items.len())
            .sum()
    }

    pub fn failed_sources(&self) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|(_, r)| !r.is_ok())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
