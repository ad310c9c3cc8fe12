//! Service manifest: the declarative list of services to create before pushing.
//!
//! ```yaml
//! create-services:
//! - name: my-configserver
//!   broker: p-config-server
//!   plan: standard
//! - name: Credentials-UPS
//!   type: credentials
//!   credentials:
//!     user: ((user))
//! ```
use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_yaml_ng::Value;

mod parser;
mod template;

pub use parser::{ManifestLoader, ManifestParser};


/// The parsed manifest, services in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceManifest {
    #[serde(rename = "create-services", default, deserialize_with = "null_as_empty")]
    pub services: Vec<ServiceDeclaration>,
}

/// One service entry of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawServiceDeclaration")]
pub struct ServiceDeclaration {
    pub name: String,
    pub kind: ServiceKind,
    /// Passed verbatim to `-t` when not empty.
    pub tags: String,
    /// Update the service when it already exists instead of skipping it.
    pub update_existing: bool,
}

/// What kind of service to create, with the fields that kind uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceKind {
    /// Marketplace service, provisioned asynchronously by a broker.
    Brokered {
        broker: String,
        plan: String,
        /// Configuration parameters passed to `-c` when not empty.
        parameters: String,
    },
    /// User provided service holding credentials.
    Credentials { credentials: BTreeMap<String, String> },
    /// User provided log drain.
    Drain { url: String },
    /// User provided route service; the URL must use https.
    Route { url: String },
    /// A `type` this plugin does not know. Rejected when the service is reconciled.
    Unsupported { kind: String },
}

impl ServiceKind {
    pub fn name(&self) -> &str {
        match self {
            Self::Brokered { .. } => "brokered",
            Self::Credentials { .. } => "credentials",
            Self::Drain { .. } => "drain",
            Self::Route { .. } => "route",
            Self::Unsupported { kind } => kind,
        }
    }
}

/// Service entry exactly as written in the YAML file.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawServiceDeclaration {
    #[serde(deserialize_with = "scalar_string")]
    name: String,
    #[serde(rename = "type", default, deserialize_with = "scalar_string")]
    kind: String,
    #[serde(default, deserialize_with = "scalar_string")]
    broker: String,
    #[serde(default, deserialize_with = "scalar_string")]
    plan: String,
    #[serde(default, deserialize_with = "scalar_string")]
    url: String,
    #[serde(default, alias = "updateExisting")]
    update_service: bool,
    #[serde(default, deserialize_with = "scalar_map")]
    credentials: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "scalar_string")]
    tags: String,
    #[serde(default, deserialize_with = "scalar_string")]
    parameters: String,
}

impl From<RawServiceDeclaration> for ServiceDeclaration {
    fn from(raw: RawServiceDeclaration) -> Self {
        let kind = match raw.kind.as_str() {
            "" | "brokered" => ServiceKind::Brokered {
                broker: raw.broker,
                plan: raw.plan,
                parameters: raw.parameters,
            },
            "credentials" => ServiceKind::Credentials {
                credentials: raw.credentials,
            },
            "drain" => ServiceKind::Drain { url: raw.url },
            "route" => ServiceKind::Route { url: raw.url },
            _ => ServiceKind::Unsupported { kind: raw.kind },
        };

        Self {
            name: raw.name,
            kind,
            tags: raw.tags,
            update_existing: raw.update_service,
        }
    }
}

/// Render a YAML scalar the way it was written. `null` becomes an empty string.
pub(crate) fn value_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s,
        other => serde_yaml_ng::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Value::deserialize(deserializer).map(value_to_string)
}

fn scalar_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    Ok(Option::<BTreeMap<String, Value>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, value_to_string(value)))
        .collect())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
