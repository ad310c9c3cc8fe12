use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde_yaml_ng::Value;
use thiserror::Error;
use tracing::debug;

use super::{
    ServiceManifest,
    template::{self, Bindings, TemplateError},
};
use crate::dependencies::{FileReader, TokioFs};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("The file {} was not found", .0.display())]
    NotFound(PathBuf),
    #[error("unable to read {}: {source}", .path.display())]
    Unreadable { path: PathBuf, source: io::Error },
    #[error("Invalid vars file {}: {source}", .path.display())]
    InvalidVarsFile {
        path: PathBuf,
        source: serde_yaml_ng::Error,
    },
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("unable to parse the service manifest {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml_ng::Error,
    },
}

/// Loads a service manifest, substituting variables into its string values.
#[async_trait]
pub trait ManifestLoader {
    async fn load(
        &self,
        path: &Path,
        vars_files: &[PathBuf],
        vars: &BTreeMap<String, String>,
    ) -> Result<ServiceManifest, ManifestError>;
}

pub struct ManifestParser {
    fs: Box<dyn FileReader + Send + Sync>,
}

impl ManifestParser {
    pub fn new() -> Self {
        Self::with_reader(Box::new(TokioFs::new()))
    }

    pub fn with_reader(fs: Box<dyn FileReader + Send + Sync>) -> Self {
        Self { fs }
    }

    async fn read(&self, path: &Path) -> Result<String, ManifestError> {
        self.fs
            .read_to_string(path)
            .await
            .map_err(|source| ManifestError::Unreadable {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Layer the vars files in order, then the explicit bindings on top.
    async fn bindings(
        &self,
        vars_files: &[PathBuf],
        vars: &BTreeMap<String, String>,
    ) -> Result<Bindings, ManifestError> {
        let mut bindings = Bindings::new();

        for path in vars_files {
            let contents = self.read(path).await?;
            let file: Option<BTreeMap<String, Value>> = if contents.trim().is_empty() {
                None
            } else {
                serde_yaml_ng::from_str(&contents).map_err(|source| {
                    ManifestError::InvalidVarsFile {
                        path: path.clone(),
                        source,
                    }
                })?
            };

            debug!(path = %path.display(), "loaded vars file");
            bindings.extend(file.unwrap_or_default());
        }

        bindings.extend(
            vars.iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone()))),
        );
        Ok(bindings)
    }
}

impl Default for ManifestParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ManifestLoader for ManifestParser {
    async fn load(
        &self,
        path: &Path,
        vars_files: &[PathBuf],
        vars: &BTreeMap<String, String>,
    ) -> Result<ServiceManifest, ManifestError> {
        if !self.fs.exists(path).await {
            return Err(ManifestError::NotFound(path.to_path_buf()));
        }
        println!("Found Service Manifest File: {}", path.display());

        let raw = self.read(path).await?;
        let bindings = self.bindings(vars_files, vars).await?;

        let yaml_error = |source: serde_yaml_ng::Error| ManifestError::Yaml {
            path: path.to_path_buf(),
            source,
        };

        // Placeholders are resolved on the decoded document so bound values stay plain text.
        let document = if raw.trim().is_empty() {
            Value::Null
        } else {
            serde_yaml_ng::from_str(&raw).map_err(yaml_error)?
        };
        let document = template::evaluate(document, &bindings)?;

        let manifest = serde_yaml_ng::from_value::<Option<ServiceManifest>>(document)
            .map_err(yaml_error)?
            .unwrap_or_default();

        debug!(
            path = %path.display(),
            services = manifest.services.len(),
            "parsed service manifest"
        );
        Ok(manifest)
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use mockall::mock;

    mock! {
        pub ManifestParser {}

        #[async_trait]
        impl ManifestLoader for ManifestParser {
            async fn load(
                &self,
                path: &Path,
                vars_files: &[PathBuf],
                vars: &BTreeMap<String, String>,
            ) -> Result<ServiceManifest, ManifestError>;
        }
    }
}
