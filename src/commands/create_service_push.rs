use std::{env, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::{
    args::{DeploymentMode, Invocation, ManifestSelection, process},
    commands::{
        Command,
        deploy::{Deployer, InProcessDeployer, SubprocessDeployer},
        reconcile::ServiceReconciler,
    },
    dependencies::{CfCli, Platform},
    interaction::{Interaction, ProgressInteraction},
    manifest::{ManifestLoader, ManifestParser},
    settings::Settings,
};

/// The `create-service-push` command: create the manifest's services, then push.
pub struct CreateServicePush {
    tokens: Vec<String>,
    environment: Vec<(String, String)>,

    // Built from the environment settings once the invocation is known to be a run.
    dependencies: Option<Dependencies>,
}

struct Dependencies {
    poll_interval: Duration,
    poll_timeout: Option<Duration>,

    platform: Arc<dyn Platform>,
    manifest_loader: Box<dyn ManifestLoader + Send + Sync>,
    interaction: Box<dyn ProgressInteraction + Send + Sync>,
    in_process: Box<dyn Deployer + Send + Sync>,
    subprocess: Box<dyn Deployer + Send + Sync>,
}

impl Dependencies {
    fn from_settings(settings: &Settings) -> Self {
        let platform: Arc<dyn Platform> = Arc::new(CfCli::new(settings));

        Self {
            poll_interval: settings.poll_interval,
            poll_timeout: settings.poll_timeout,
            manifest_loader: Box::new(ManifestParser::new()),
            interaction: Box::new(Interaction::new()),
            in_process: Box::new(InProcessDeployer::new(platform.clone())),
            subprocess: Box::new(SubprocessDeployer::new()),
            platform,
        }
    }
}

impl CreateServicePush {
    pub fn new(tokens: Vec<String>) -> Self {
        Self {
            tokens,
            environment: env::vars().collect(),
            dependencies: None,
        }
    }
}

#[async_trait]
impl Command for CreateServicePush {
    async fn execute(&mut self) -> Result<()> {
        let arguments = match process(&self.tokens, self.environment.clone())? {
            Invocation::UninstallProbe => {
                debug!("uninstall requested, nothing to clean up");
                return Ok(());
            }
            Invocation::Run(arguments) => arguments,
        };

        debug!(
            manifest = ?arguments.manifest,
            skip_service_creation = arguments.skip_service_creation(),
            skip_deployment = arguments.skip_deployment(),
            forwarded = ?arguments.forwarded_args,
            "arguments processed"
        );

        let dependencies = match self.dependencies.take() {
            Some(dependencies) => dependencies,
            None => {
                let settings = Settings::from_env()?;
                debug!(?settings, "settings loaded");
                Dependencies::from_settings(&settings)
            }
        };

        if let ManifestSelection::Path(path) = &arguments.manifest {
            let manifest = dependencies
                .manifest_loader
                .load(path, &arguments.vars_files, &arguments.vars)
                .await?;

            ServiceReconciler::builder()
                .platform(dependencies.platform.as_ref())
                .interaction(dependencies.interaction.as_ref())
                .poll_interval(dependencies.poll_interval)
                .poll_timeout(dependencies.poll_timeout)
                .build()
                .reconcile(&manifest.services)
                .await?;
        } else {
            debug!("--no-service-manifest given, skipping service creation");
        }

        let deployer = match arguments.deployment {
            DeploymentMode::Skip => {
                println!("--no-push applied: Your application will not be pushed to CF ...");
                return Ok(());
            }
            DeploymentMode::InProcess => &dependencies.in_process,
            DeploymentMode::Subprocess => &dependencies.subprocess,
        };

        deployer
            .push(&arguments.forwarded_args)
            .await
            .context("while pushing")
    }
}
