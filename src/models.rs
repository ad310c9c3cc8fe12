//! Platform-side models, as observed through the cf CLI.
use std::fmt::Display;

use serde::Deserialize;

/// A service instance that exists in the targeted space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstance {
    pub name: String,
    pub last_operation: LastOperation,
}

impl ServiceInstance {
    pub fn new(name: impl Into<String>, last_operation: LastOperation) -> Self {
        Self {
            name: name.into(),
            last_operation,
        }
    }
}

/// The most recent asynchronous operation on a service instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastOperation {
    pub state: OperationState,
    /// Human readable progress message reported by the broker.
    pub description: String,
}

impl LastOperation {
    pub fn new(state: OperationState, description: impl Into<String>) -> Self {
        Self {
            state,
            description: description.into(),
        }
    }
}

/// State of a service instance operation, as reported by the Cloud Controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum OperationState {
    #[serde(rename = "initial")]
    Initial,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "succeeded")]
    Succeeded,
    #[serde(rename = "failed")]
    Failed,
    /// No operation reported, or a state this plugin does not know about.
    #[default]
    #[serde(other)]
    Unknown,
}

impl OperationState {
    /// The operation will not change state anymore.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl Display for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::InProgress => write!(f, "in progress"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
