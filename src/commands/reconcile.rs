//! Converges the services declared in a manifest with the services of the targeted space.
//!
//! Declarations are processed in order and the first error stops the run. Services created
//! before the failing declaration are left in place.
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;
use typed_builder::TypedBuilder;
use url::Url;

use crate::{
    dependencies::{Platform, PlatformError},
    interaction::ProgressInteraction,
    manifest::{ServiceDeclaration, ServiceKind},
    models::OperationState,
};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{name}: Service Type: {kind} unsupported")]
    UnsupportedKind { name: String, kind: String },
    #[error("{name}: {field} is required for a {kind} service")]
    MissingField {
        name: String,
        kind: String,
        field: &'static str,
    },
    #[error(
        "{name}: route scheme not specified or unsupported. User provided route service only supports https (got \"{url}\")"
    )]
    InvalidRoute { name: String, url: String },
    #[error("{name}: error {description} [status: {state}]")]
    OperationFailed {
        name: String,
        description: String,
        state: OperationState,
    },
    #[error("{name}: operation still running after {timeout:?}")]
    Timeout { name: String, timeout: Duration },
    #[error("failed to reconcile service {name}")]
    Platform { name: String, source: PlatformError },
    #[error(transparent)]
    Progress(#[from] anyhow::Error),
}

/// What to do with a declaration, given the services that already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Skip,
}

impl Action {
    pub fn decide(exists: bool, update_existing: bool) -> Self {
        match (exists, update_existing) {
            (false, _) => Self::Create,
            (true, false) => Self::Skip,
            (true, true) => Self::Update,
        }
    }
}

#[derive(TypedBuilder)]
pub struct ServiceReconciler<'a> {
    platform: &'a dyn Platform,
    interaction: &'a (dyn ProgressInteraction + Sync),
    #[builder(default = Duration::from_secs(1))]
    poll_interval: Duration,
    #[builder(default)]
    poll_timeout: Option<Duration>,
}

impl ServiceReconciler<'_> {
    pub async fn reconcile(&self, services: &[ServiceDeclaration]) -> Result<(), ReconcileError> {
        for service in services {
            self.reconcile_service(service).await?;
        }

        Ok(())
    }

    async fn reconcile_service(&self, service: &ServiceDeclaration) -> Result<(), ReconcileError> {
        let name = service.name.as_str();

        if let ServiceKind::Unsupported { kind } = &service.kind {
            return Err(ReconcileError::UnsupportedKind {
                name: name.to_string(),
                kind: kind.clone(),
            });
        }
        if let Some(field) = missing_field(&service.kind) {
            return Err(ReconcileError::MissingField {
                name: name.to_string(),
                kind: service.kind.name().to_string(),
                field,
            });
        }

        // The list is fetched for every declaration so earlier creations are visible.
        let existing = self
            .platform
            .list_services()
            .await
            .map_err(|source| platform_error(name, source))?;
        let exists = existing.iter().any(|instance| instance.name == name);

        let action = Action::decide(exists, service.update_existing);
        debug!(service = name, kind = service.kind.name(), ?action, "reconciling service");

        if action == Action::Skip {
            println!("{name} - already exists...skipping creation");
            return Ok(());
        }

        if let ServiceKind::Route { url } = &service.kind {
            validate_route(name, url)?;
        }

        println!("{name} - {}", announcement(&service.kind, action));
        self.run(name, command_for(service, action)).await?;

        if matches!(service.kind, ServiceKind::Brokered { .. }) {
            self.wait_for_operation(name).await?;
        }

        Ok(())
    }

    async fn run(&self, name: &str, args: Vec<String>) -> Result<(), ReconcileError> {
        let command_line = args.join(" ");
        debug!(">> {command_line}");
        println!("Now Running CLI Command: {command_line}");

        self.platform
            .run_command(&args)
            .await
            .map(|_| ())
            .map_err(|source| platform_error(name, source))
    }

    async fn wait_for_operation(&self, name: &str) -> Result<(), ReconcileError> {
        let mut progress = self.interaction.start_progress()?;
        let started = Instant::now();

        loop {
            let service = self
                .platform
                .get_service(name)
                .await
                .map_err(|source| platform_error(name, source))?;
            let operation = service.last_operation;

            progress.step(&operation.description);

            if operation.state == OperationState::Failed {
                return Err(ReconcileError::OperationFailed {
                    name: name.to_string(),
                    description: operation.description,
                    state: operation.state,
                });
            }
            if operation.state.is_terminal() {
                return Ok(());
            }

            if let Some(timeout) = self.poll_timeout.filter(|t| started.elapsed() >= *t) {
                return Err(ReconcileError::Timeout {
                    name: name.to_string(),
                    timeout,
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn platform_error(name: &str, source: PlatformError) -> ReconcileError {
    ReconcileError::Platform {
        name: name.to_string(),
        source,
    }
}

/// The first required field left empty in the declaration.
fn missing_field(kind: &ServiceKind) -> Option<&'static str> {
    match kind {
        ServiceKind::Brokered { broker, .. } if broker.is_empty() => Some("broker"),
        ServiceKind::Brokered { plan, .. } if plan.is_empty() => Some("plan"),
        ServiceKind::Drain { url } if url.is_empty() => Some("url"),
        _ => None,
    }
}

fn validate_route(name: &str, url: &str) -> Result<(), ReconcileError> {
    match Url::parse(url) {
        Ok(parsed) if parsed.scheme().eq_ignore_ascii_case("https") => Ok(()),
        _ => Err(ReconcileError::InvalidRoute {
            name: name.to_string(),
            url: url.to_string(),
        }),
    }
}

fn announcement(kind: &ServiceKind, action: Action) -> &'static str {
    match (kind, action) {
        (ServiceKind::Brokered { .. }, Action::Update) => "broker service will now be updated.",
        (ServiceKind::Brokered { .. }, _) => "will now be created as a brokered service.",
        (ServiceKind::Credentials { .. }, Action::Update) => {
            "user provided credential service will now be updated."
        }
        (ServiceKind::Credentials { .. }, _) => {
            "will now be created as a user provided credential service."
        }
        (ServiceKind::Drain { .. }, Action::Update) => {
            "user provided log drain service will now be updated."
        }
        (ServiceKind::Drain { .. }, _) => "will now be created as a user provided log drain service.",
        (ServiceKind::Route { .. }, Action::Update) => {
            "user provided route service will now be updated."
        }
        (ServiceKind::Route { .. }, _) => "will now be created as a user provided route service.",
        (ServiceKind::Unsupported { .. }, _) => "",
    }
}

/// Build the cf command for a create or an update.
fn command_for(service: &ServiceDeclaration, action: Action) -> Vec<String> {
    let name = service.name.clone();
    let update = action == Action::Update;

    let mut args: Vec<String> = match &service.kind {
        ServiceKind::Brokered { broker, plan, .. } if !update => {
            vec!["create-service".into(), broker.clone(), plan.clone(), name]
        }
        ServiceKind::Brokered { .. } => vec!["update-service".into(), name],
        ServiceKind::Credentials { credentials } => user_provided(
            update,
            name,
            "-p",
            // A map of strings always serializes.
            serde_json::to_string(credentials).unwrap_or_default(),
        ),
        ServiceKind::Drain { url } => user_provided(update, name, "-l", url.clone()),
        ServiceKind::Route { url } => user_provided(update, name, "-r", url.clone()),
        ServiceKind::Unsupported { .. } => Vec::new(),
    };

    if !service.tags.is_empty() {
        args.extend(["-t".to_string(), service.tags.clone()]);
    }

    if let ServiceKind::Brokered { parameters, .. } = &service.kind {
        if !parameters.is_empty() {
            args.extend(["-c".to_string(), parameters.clone()]);
        }
    }

    args
}

fn user_provided(update: bool, name: String, flag: &str, payload: String) -> Vec<String> {
    let command = if update { "uups" } else { "cups" };
    vec![command.to_string(), name, flag.to_string(), payload]
}
