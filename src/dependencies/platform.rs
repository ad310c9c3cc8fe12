//! Connection to the Cloud Foundry platform, through the cf CLI.
//!
//! The reconciler only needs three capabilities: list the services of the targeted space,
//! fetch a single service with its last operation, and run a cf command.
//! [`CfCli`] implements them by invoking the cf executable, using `cf curl` against the
//! Cloud Controller v3 API for the queries.
use std::{
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
    process::Output,
};

use async_trait::async_trait;
use serde::{Deserialize, de::DeserializeOwned};
use tokio::process::Command;
use tracing::{debug, trace};
use url::form_urlencoded;
use which::which;

use crate::{
    models::{LastOperation, OperationState, ServiceInstance},
    settings::Settings,
};

#[cfg(not(target_os = "windows"))]
pub const CF_BIN: &str = "cf";

#[cfg(target_os = "windows")]
pub const CF_BIN: &str = "cf.exe";

/// Largest page the Cloud Controller hands out.
const PER_PAGE: usize = 5000;

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("unable to find the cf executable: {0}")]
    BinaryNotFound(#[from] which::Error),
    #[error("failed to run cf {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("cf {command} failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("unable to read the cf CLI config at {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid cf CLI config at {}: {source}", .path.display())]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unable to locate the cf CLI config, set CF_HOME or HOME")]
    NoConfigHome,
    #[error("no space targeted, use 'cf target -s SPACE' to target a space")]
    NoTargetSpace,
    #[error("unexpected response from {path}: {source}")]
    MalformedResponse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("service instance {0} not found")]
    ServiceNotFound(String),
}

// Dependency to list the services of the targeted space
#[async_trait]
pub trait ServiceLister {
    async fn list_services(&self) -> Result<Vec<ServiceInstance>, PlatformError>;
}

// Dependency to fetch a single service and its last operation
#[async_trait]
pub trait ServiceGetter {
    async fn get_service(&self, name: &str) -> Result<ServiceInstance, PlatformError>;
}

// Dependency to run a cf command, returning its output lines
#[async_trait]
pub trait CommandRunner {
    async fn run_command(&self, args: &[String]) -> Result<Vec<String>, PlatformError>;
}

/// Everything the plugin needs from the platform.
pub trait Platform: ServiceLister + ServiceGetter + CommandRunner + Send + Sync {}
impl<T: ServiceLister + ServiceGetter + CommandRunner + Send + Sync> Platform for T {}

/// Platform connection backed by the cf executable.
#[derive(Debug, Clone, Default)]
pub struct CfCli {
    binary: Option<PathBuf>,
    cf_home: Option<PathBuf>,
}

impl CfCli {
    pub fn new(settings: &Settings) -> Self {
        Self {
            binary: settings.cf_binary.clone(),
            cf_home: settings.cf_home.clone(),
        }
    }

    fn binary(&self) -> Result<PathBuf, PlatformError> {
        match &self.binary {
            Some(binary) => Ok(binary.clone()),
            None => Ok(which(CF_BIN)?),
        }
    }

    async fn output<S: AsRef<OsStr>>(&self, args: &[S]) -> Result<Output, PlatformError> {
        let command_line = join(args);
        trace!(command = %command_line, "running cf");

        let output = Command::new(self.binary()?)
            .args(args)
            .output()
            .await
            .map_err(|source| PlatformError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(PlatformError::CommandFailed {
                command: command_line,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output)
    }

    /// GET a Cloud Controller path through `cf curl` and decode the JSON body.
    async fn curl<T: DeserializeOwned>(&self, path: &str) -> Result<T, PlatformError> {
        let output = self.output(&["curl", path]).await?;

        serde_json::from_slice(&output.stdout).map_err(|source| PlatformError::MalformedResponse {
            path: path.to_string(),
            source,
        })
    }

    async fn target_space_guid(&self) -> Result<String, PlatformError> {
        let cf_home = self.cf_home.as_deref().ok_or(PlatformError::NoConfigHome)?;
        let path = config_path(cf_home);

        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| PlatformError::Config {
                path: path.clone(),
                source,
            })?;

        space_guid_from_config(&contents)
            .map_err(|source| PlatformError::InvalidConfig { path, source })?
            .ok_or(PlatformError::NoTargetSpace)
    }

    async fn service_instances(
        &self,
        name: Option<&str>,
    ) -> Result<Vec<ServiceInstance>, PlatformError> {
        let space_guid = self.target_space_guid().await?;
        let path = service_instances_path(&space_guid, name);
        debug!(%path, "querying service instances");

        let page: ServiceInstancesPage = self.curl(&path).await?;
        Ok(page.resources.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl ServiceLister for CfCli {
    async fn list_services(&self) -> Result<Vec<ServiceInstance>, PlatformError> {
        self.service_instances(None).await
    }
}

#[async_trait]
impl ServiceGetter for CfCli {
    async fn get_service(&self, name: &str) -> Result<ServiceInstance, PlatformError> {
        self.service_instances(Some(name))
            .await?
            .into_iter()
            .find(|service| service.name == name)
            .ok_or_else(|| PlatformError::ServiceNotFound(name.to_string()))
    }
}

#[async_trait]
impl CommandRunner for CfCli {
    async fn run_command(&self, args: &[String]) -> Result<Vec<String>, PlatformError> {
        let output = self.output(args).await?;

        // The host CLI shows the output of commands run on behalf of a plugin.
        let lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect();
        for line in &lines {
            println!("{line}");
        }

        Ok(lines)
    }
}

fn join<S: AsRef<OsStr>>(args: &[S]) -> String {
    args.iter()
        .map(|arg| arg.as_ref().to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

fn config_path(cf_home: &Path) -> PathBuf {
    cf_home.join(".cf").join("config.json")
}

fn service_instances_path(space_guid: &str, name: Option<&str>) -> String {
    let mut path = format!(
        "/v3/service_instances?space_guids={}&per_page={PER_PAGE}",
        encode(space_guid)
    );
    if let Some(name) = name {
        path.push_str("&names=");
        path.push_str(&encode(name));
    }
    path
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Subset of the cf CLI `config.json`.
#[derive(Deserialize)]
struct CfConfig {
    #[serde(rename = "SpaceFields", default)]
    space_fields: SpaceFields,
}

#[derive(Deserialize, Default)]
struct SpaceFields {
    #[serde(rename = "GUID", default)]
    guid: String,
}

/// Targeted space guid, `None` when no space is targeted.
fn space_guid_from_config(contents: &str) -> Result<Option<String>, serde_json::Error> {
    let config: CfConfig = serde_json::from_str(contents)?;

    Ok(Some(config.space_fields.guid).filter(|guid| !guid.is_empty()))
}

/// Page of `GET /v3/service_instances`.
#[derive(Deserialize)]
struct ServiceInstancesPage {
    #[serde(default)]
    resources: Vec<ServiceInstanceResource>,
}

#[derive(Deserialize)]
struct ServiceInstanceResource {
    name: String,
    #[serde(default)]
    last_operation: Option<LastOperationResource>,
}

#[derive(Deserialize)]
struct LastOperationResource {
    #[serde(default)]
    state: OperationState,
    #[serde(default)]
    description: Option<String>,
}

impl From<ServiceInstanceResource> for ServiceInstance {
    fn from(resource: ServiceInstanceResource) -> Self {
        let last_operation = resource
            .last_operation
            .map(|operation| {
                LastOperation::new(operation.state, operation.description.unwrap_or_default())
            })
            .unwrap_or_default();

        ServiceInstance::new(resource.name, last_operation)
    }
}
