//! Deployment dispatch: `cf push` with the forwarded arguments.
use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
    sync::Arc,
};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::dependencies::{CF_BIN, Platform, PlatformError};

const PUSH: &str = "push";

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("unable to determine the current directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),
    #[error("cf executable not found: {0}")]
    BinaryNotFound(#[from] which::Error),
    #[error("failed to start {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cf push exited with {0}")]
    PushFailed(ExitStatus),
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

#[async_trait]
pub trait Deployer {
    async fn push(&self, args: &[String]) -> Result<(), DeployError>;
}

fn push_args(args: &[String]) -> Vec<String> {
    std::iter::once(PUSH.to_string())
        .chain(args.iter().cloned())
        .collect()
}

/// Pushes through the platform connection, the way any other cf command is run.
pub struct InProcessDeployer {
    platform: Arc<dyn Platform>,
}

impl InProcessDeployer {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl Deployer for InProcessDeployer {
    async fn push(&self, args: &[String]) -> Result<(), DeployError> {
        println!(
            "Performing a CF Push with arguments [ {} ] ...",
            args.join(" ")
        );

        self.platform.run_command(&push_args(args)).await?;
        Ok(())
    }
}

/// Runs `cf push` as a child process sharing the terminal.
///
/// Only this path accepts `--var` and `--vars-file`, which the host does not hand to plugins.
#[derive(Debug, Default, Clone)]
pub struct SubprocessDeployer {
    working_dir: Option<PathBuf>,
}

impl SubprocessDeployer {
    pub fn new() -> Self {
        Default::default()
    }

    async fn locate(&self) -> Result<PathBuf, DeployError> {
        let working_dir = match &self.working_dir {
            Some(dir) => dir.clone(),
            None => env::current_dir().map_err(DeployError::WorkingDirectory)?,
        };

        locate_cf(&working_dir, env::var_os("PATH")).await
    }
}

/// Find the cf executable, looking in `working_dir` before `path`.
async fn locate_cf(working_dir: &Path, path: Option<OsString>) -> Result<PathBuf, DeployError> {
    let local = working_dir.join(CF_BIN);
    if tokio::fs::try_exists(&local).await.unwrap_or(false) {
        return Ok(local);
    }

    println!("Did not find the cf executable in the current directory...Now looking at PATH");
    Ok(which::which_in(CF_BIN, path, working_dir)?)
}

#[async_trait]
impl Deployer for SubprocessDeployer {
    async fn push(&self, args: &[String]) -> Result<(), DeployError> {
        println!(
            "Performing a CF Push, as a subprocess, with arguments [ {} ] ...",
            args.join(" ")
        );

        let binary = self.locate().await?;
        println!("Now Running the cf command: {}", binary.display());

        let status = launch(&binary, &push_args(args)).await?;
        if !status.success() {
            return Err(DeployError::PushFailed(status));
        }

        Ok(())
    }
}

async fn launch(binary: &Path, args: &[String]) -> Result<ExitStatus, DeployError> {
    debug!(binary = %binary.display(), ?args, "launching cf");

    let mut command = Command::new(binary);
    command.args(args);
    command.stdin(Stdio::inherit());
    command.stdout(Stdio::inherit());
    command.stderr(Stdio::inherit());

    command.status().await.map_err(|source| DeployError::Spawn {
        path: binary.to_path_buf(),
        source,
    })
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use mockall::mock;

    mock! {
        pub Pusher {}

        #[async_trait]
        impl Deployer for Pusher {
            async fn push(&self, args: &[String]) -> Result<(), DeployError>;
        }
    }
}
