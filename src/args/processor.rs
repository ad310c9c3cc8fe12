//! Token processor for the `create-service-push` command.
//!
//! The host CLI hands the plugin a raw token list where token 0 is the command name.
//! Plugin flags are interpreted here, everything else is forwarded untouched to `cf push`.
//!
//! Processing happens in two passes:
//! 1. The scan validates every flag in token order and records where forwarded tokens and
//!    deferred flag pairs appear. Nothing order-dependent is decided yet.
//! 2. The resolution pass decides whether `--var`/`--vars-file` pairs are forwarded, using the
//!    final state of `--push-as-subprocess`, wherever it appeared.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::PathBuf,
};

use super::flags::{FLAGS, FlagId, FlagSpec, lookup, looks_like_flag, name_of};

/// Name the command is registered under in the host CLI.
pub const COMMAND_NAME: &str = "create-service-push";
/// Short alias registered alongside the command.
pub const COMMAND_ALIAS: &str = "cspush";
/// Token sent by the host CLI when it only starts the plugin to uninstall it.
pub const UNINSTALL_SENTINEL: &str = "CLI-MESSAGE-UNINSTALL";
/// Manifest read when no manifest flag is given.
pub const DEFAULT_SERVICE_MANIFEST: &str = "services-manifest.yml";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    #[error("This plugin only works with create-service-push")]
    UnsupportedInvocation,
    #[error("{flag} is missing {expected}")]
    MissingArgument {
        flag: &'static str,
        expected: &'static str,
    },
    #[error("{flag} requires a {expected} argument. \"{found}\" was found instead")]
    FlagInsteadOfArgument {
        flag: &'static str,
        expected: &'static str,
        found: String,
    },
    #[error(
        "{0} does not seem to be of the form key=value. Ensure there are no spaces between the equals sign"
    )]
    NotKeyValue(String),
    #[error(
        "{0} seems to be a hanging input. Ensure there are no spaces between the equals sign"
    )]
    HangingValue(String),
    #[error("{flag} cannot be used in conjunction with {other}")]
    Conflict {
        flag: &'static str,
        other: &'static str,
    },
}

/// What the host CLI asked the plugin to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// The plugin is started only so that it can be uninstalled; nothing must happen.
    UninstallProbe,
    Run(ParsedArguments),
}

/// Where the service manifest comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSelection {
    Path(PathBuf),
    Disabled,
}

/// How the application is pushed once the services are in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    /// Push through the host CLI connection.
    #[default]
    InProcess,
    /// Push by launching the `cf` executable as a child process.
    Subprocess,
    /// `--no-push`: only create the services.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArguments {
    pub manifest: ManifestSelection,
    pub deployment: DeploymentMode,
    /// Substitution bindings from `--var` and `--use-env-vars-prefixed-with`, last writer wins.
    pub vars: BTreeMap<String, String>,
    /// Variable files in the order given on the command line.
    pub vars_files: Vec<PathBuf>,
    /// Tokens handed to `cf push`, in their original relative order.
    pub forwarded_args: Vec<String>,
}

impl Default for ParsedArguments {
    fn default() -> Self {
        Self {
            manifest: ManifestSelection::Path(PathBuf::from(DEFAULT_SERVICE_MANIFEST)),
            deployment: DeploymentMode::default(),
            vars: BTreeMap::new(),
            vars_files: Vec::new(),
            forwarded_args: Vec::new(),
        }
    }
}

impl ParsedArguments {
    pub fn skip_service_creation(&self) -> bool {
        matches!(self.manifest, ManifestSelection::Disabled)
    }

    pub fn skip_deployment(&self) -> bool {
        self.deployment == DeploymentMode::Skip
    }
}

/// A token position recorded during the scan.
enum Forward<'t> {
    Token(&'t str),
    /// A deferred flag with its argument; forwarded only when pushing as a subprocess.
    DeferredPair {
        flag: &'static str,
        argument: &'t str,
    },
}

/// Process the raw tokens with the plugin's flag table.
///
/// `environment` is scanned by `--use-env-vars-prefixed-with`.
pub fn process<I>(tokens: &[String], environment: I) -> Result<Invocation, ArgumentError>
where
    I: IntoIterator<Item = (String, String)>,
{
    process_with_flags(FLAGS, tokens, environment)
}

pub fn process_with_flags<I>(
    flags: &[FlagSpec],
    tokens: &[String],
    environment: I,
) -> Result<Invocation, ArgumentError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let Some((command, rest)) = tokens.split_first() else {
        return Err(ArgumentError::UnsupportedInvocation);
    };

    if command == UNINSTALL_SENTINEL {
        return Ok(Invocation::UninstallProbe);
    }

    if command != COMMAND_NAME && command != COMMAND_ALIAS {
        return Err(ArgumentError::UnsupportedInvocation);
    }

    let environment: Vec<(String, String)> = environment.into_iter().collect();

    let mut arguments = ParsedArguments::default();
    let mut seen = BTreeSet::new();
    let mut forwards = Vec::new();
    let mut skip_push = false;
    let mut push_as_subprocess = false;

    // First pass: validate in token order, record positions.
    let mut index = 0;
    while index < rest.len() {
        let token = rest[index].as_str();
        let Some(flag) = lookup(flags, token) else {
            forwards.push(Forward::Token(token));
            index += 1;
            continue;
        };

        let argument = rest.get(index + 1).map(String::as_str);
        let conflict = |other: FlagId| ArgumentError::Conflict {
            flag: flag.name,
            other: name_of(flags, other),
        };

        match flag.id {
            FlagId::ServiceManifest => {
                let path = argument.ok_or(ArgumentError::MissingArgument {
                    flag: flag.name,
                    expected: "a manifest filename argument",
                })?;
                if seen.contains(&FlagId::NoServiceManifest) {
                    return Err(conflict(FlagId::NoServiceManifest));
                }
                if looks_like_flag(path) {
                    return Err(ArgumentError::FlagInsteadOfArgument {
                        flag: flag.name,
                        expected: "filename",
                        found: path.to_string(),
                    });
                }
                arguments.manifest = ManifestSelection::Path(PathBuf::from(path));
            }
            FlagId::NoServiceManifest => {
                if seen.contains(&FlagId::ServiceManifest) {
                    return Err(conflict(FlagId::ServiceManifest));
                }
                arguments.manifest = ManifestSelection::Disabled;
            }
            FlagId::NoPush => {
                if seen.contains(&FlagId::PushAsSubprocess) {
                    return Err(conflict(FlagId::PushAsSubprocess));
                }
                skip_push = true;
            }
            FlagId::PushAsSubprocess => {
                if seen.contains(&FlagId::NoPush) {
                    return Err(conflict(FlagId::NoPush));
                }
                push_as_subprocess = true;
            }
            FlagId::Var => {
                let pair = argument.ok_or(ArgumentError::MissingArgument {
                    flag: flag.name,
                    expected: "a key=value pair argument",
                })?;
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| ArgumentError::NotKeyValue(pair.to_string()))?;

                // Guard against `--var key= value`, where the value ended up in its own token.
                if value.is_empty() || value == " " {
                    if let Some(next) = rest.get(index + 2).filter(|next| !looks_like_flag(next)) {
                        return Err(ArgumentError::HangingValue(next.clone()));
                    }
                }

                arguments.vars.insert(key.to_string(), value.to_string());
                forwards.push(Forward::DeferredPair {
                    flag: flag.name,
                    argument: pair,
                });
            }
            FlagId::VarsFile => {
                let path = argument.ok_or(ArgumentError::MissingArgument {
                    flag: flag.name,
                    expected: "a variable yaml filename argument",
                })?;
                if looks_like_flag(path) {
                    return Err(ArgumentError::FlagInsteadOfArgument {
                        flag: flag.name,
                        expected: "filename",
                        found: path.to_string(),
                    });
                }
                arguments.vars_files.push(PathBuf::from(path));
                forwards.push(Forward::DeferredPair {
                    flag: flag.name,
                    argument: path,
                });
            }
            FlagId::UseEnvVarsPrefixedWith => {
                let prefix = argument.ok_or(ArgumentError::MissingArgument {
                    flag: flag.name,
                    expected: "a prefix input",
                })?;
                arguments.vars.extend(
                    environment
                        .iter()
                        .filter(|(key, _)| key.starts_with(prefix))
                        .cloned(),
                );
            }
        }

        seen.insert(flag.id);
        index += 1 + flag.arity;
    }

    // Second pass: resolve what depends on the final flag state.
    arguments.deployment = match (skip_push, push_as_subprocess) {
        (true, _) => DeploymentMode::Skip,
        (false, true) => DeploymentMode::Subprocess,
        (false, false) => DeploymentMode::InProcess,
    };

    arguments.forwarded_args = forwards
        .into_iter()
        .flat_map(|forward| match forward {
            Forward::Token(token) => vec![token.to_string()],
            Forward::DeferredPair { flag, argument } if push_as_subprocess => {
                vec![flag.to_string(), argument.to_string()]
            }
            Forward::DeferredPair { .. } => Vec::new(),
        })
        .collect();

    Ok(Invocation::Run(arguments))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|token| token.to_string()).collect()
    }

    fn run(raw: &[&str]) -> Result<ParsedArguments, ArgumentError> {
        run_with_env(raw, &[])
    }

    fn run_with_env(
        raw: &[&str],
        environment: &[(&str, &str)],
    ) -> Result<ParsedArguments, ArgumentError> {
        let environment = environment
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()));

        match process(&tokens(raw), environment)? {
            Invocation::Run(arguments) => Ok(arguments),
            Invocation::UninstallProbe => panic!("unexpected uninstall probe"),
        }
    }

    #[test]
    fn test_uninstall_probe_short_circuits() {
        let result = process(
            &tokens(&[UNINSTALL_SENTINEL, "--no-push", "--push-as-subprocess"]),
            Vec::new(),
        );

        assert_eq!(result, Ok(Invocation::UninstallProbe));
    }

    #[test]
    fn test_other_commands_are_rejected() {
        for raw in [
            vec!["push"],
            vec!["create-service", "--no-push"],
            vec!["--service-manifest", "a.yml"],
            vec![""],
        ] {
            assert_eq!(run(&raw), Err(ArgumentError::UnsupportedInvocation));
        }

        assert_eq!(
            process(&[], Vec::new()),
            Err(ArgumentError::UnsupportedInvocation)
        );
    }

    #[test]
    fn test_defaults() {
        let arguments = run(&["create-service-push"]).unwrap();

        assert_eq!(arguments, ParsedArguments::default());
        assert_eq!(
            arguments.manifest,
            ManifestSelection::Path(PathBuf::from("services-manifest.yml"))
        );
        assert_eq!(arguments.deployment, DeploymentMode::InProcess);
        assert!(!arguments.skip_service_creation());
        assert!(!arguments.skip_deployment());
    }

    #[test]
    fn test_alias_is_accepted() {
        let arguments = run(&["cspush", "--no-push"]).unwrap();

        assert!(arguments.skip_deployment());
    }

    #[test]
    fn test_unknown_tokens_are_forwarded_in_order() {
        let arguments = run(&[
            "create-service-push",
            "my-app",
            "-b",
            "hwc_buildpack",
            "--no-push",
            "-p",
            "push/some/path",
        ])
        .unwrap();

        assert_eq!(
            arguments.forwarded_args,
            tokens(&["my-app", "-b", "hwc_buildpack", "-p", "push/some/path"])
        );
    }

    #[test]
    fn test_service_manifest_path() {
        let arguments = run(&["create-service-push", "--service-manifest", "my.yml"]).unwrap();

        assert_eq!(
            arguments.manifest,
            ManifestSelection::Path(PathBuf::from("my.yml"))
        );
        assert!(arguments.forwarded_args.is_empty());
    }

    #[test]
    fn test_service_manifest_missing_argument() {
        let error = run(&["create-service-push", "--service-manifest"]).unwrap_err();

        assert_eq!(
            error.to_string(),
            "--service-manifest is missing a manifest filename argument"
        );
    }

    #[test]
    fn test_service_manifest_followed_by_flag() {
        let error = run(&["create-service-push", "--service-manifest", "--no-push"]).unwrap_err();

        assert_eq!(
            error.to_string(),
            "--service-manifest requires a filename argument. \"--no-push\" was found instead"
        );
    }

    #[test]
    fn test_no_service_manifest() {
        let arguments = run(&["create-service-push", "--no-service-manifest"]).unwrap();

        assert_eq!(arguments.manifest, ManifestSelection::Disabled);
        assert!(arguments.skip_service_creation());
    }

    #[test]
    fn test_manifest_flags_conflict_in_either_order() {
        let error = run(&[
            "create-service-push",
            "--service-manifest",
            "myfile",
            "--no-service-manifest",
        ])
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            "--no-service-manifest cannot be used in conjunction with --service-manifest"
        );

        let error = run(&[
            "create-service-push",
            "--no-service-manifest",
            "--service-manifest",
            "myfile",
        ])
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            "--service-manifest cannot be used in conjunction with --no-service-manifest"
        );
    }

    #[test]
    fn test_push_flags_conflict_in_either_order() {
        let error = run(&["create-service-push", "--no-push", "--push-as-subprocess"]).unwrap_err();
        assert_eq!(
            error.to_string(),
            "--push-as-subprocess cannot be used in conjunction with --no-push"
        );

        let error = run(&["create-service-push", "--push-as-subprocess", "--no-push"]).unwrap_err();
        assert_eq!(
            error.to_string(),
            "--no-push cannot be used in conjunction with --push-as-subprocess"
        );
    }

    #[test]
    fn test_push_as_subprocess() {
        let arguments = run(&["create-service-push", "--push-as-subprocess"]).unwrap();

        assert_eq!(arguments.deployment, DeploymentMode::Subprocess);
    }

    #[test]
    fn test_var_bindings() {
        let arguments = run(&[
            "create-service-push",
            "--var",
            "a=1",
            "--var",
            "b=x=y",
            "--var",
            "a=2",
        ])
        .unwrap();

        assert_eq!(arguments.vars.get("a").map(String::as_str), Some("2"));
        assert_eq!(arguments.vars.get("b").map(String::as_str), Some("x=y"));
        assert!(arguments.forwarded_args.is_empty());
    }

    #[test]
    fn test_var_missing_argument() {
        let error = run(&["create-service-push", "--var"]).unwrap_err();

        assert_eq!(error.to_string(), "--var is missing a key=value pair argument");
    }

    #[test]
    fn test_var_without_equals_sign() {
        let error = run(&["create-service-push", "--var", "key"]).unwrap_err();

        assert_eq!(error, ArgumentError::NotKeyValue("key".to_string()));
    }

    #[test]
    fn test_var_hanging_value() {
        let error = run(&["create-service-push", "--var", "key=", "value"]).unwrap_err();
        assert_eq!(error, ArgumentError::HangingValue("value".to_string()));

        let error = run(&["create-service-push", "--var", "key= ", "value"]).unwrap_err();
        assert_eq!(error, ArgumentError::HangingValue("value".to_string()));
    }

    #[test]
    fn test_var_empty_value_followed_by_flag_is_accepted() {
        let arguments = run(&["create-service-push", "--var", "key=", "--no-push"]).unwrap();
        assert_eq!(arguments.vars.get("key").map(String::as_str), Some(""));

        let arguments = run(&["create-service-push", "--var", "key="]).unwrap();
        assert_eq!(arguments.vars.get("key").map(String::as_str), Some(""));
    }

    #[test]
    fn test_vars_file() {
        let arguments = run(&[
            "create-service-push",
            "--vars-file",
            "one.yml",
            "--vars-file",
            "two.yml",
        ])
        .unwrap();

        assert_eq!(
            arguments.vars_files,
            vec![PathBuf::from("one.yml"), PathBuf::from("two.yml")]
        );
    }

    #[test]
    fn test_vars_file_errors() {
        let error = run(&["create-service-push", "--vars-file"]).unwrap_err();
        assert_eq!(
            error.to_string(),
            "--vars-file is missing a variable yaml filename argument"
        );

        let error = run(&["create-service-push", "--vars-file", "-p"]).unwrap_err();
        assert_eq!(
            error.to_string(),
            "--vars-file requires a filename argument. \"-p\" was found instead"
        );
    }

    #[test]
    fn test_substitution_flags_forwarded_when_subprocess_comes_first() {
        let arguments = run(&[
            "create-service-push",
            "--push-as-subprocess",
            "--var",
            "a=1",
            "app",
            "--vars-file",
            "vars.yml",
        ])
        .unwrap();

        assert_eq!(
            arguments.forwarded_args,
            tokens(&["--var", "a=1", "app", "--vars-file", "vars.yml"])
        );
    }

    #[test]
    fn test_substitution_flags_forwarded_when_subprocess_comes_last() {
        let arguments = run(&[
            "create-service-push",
            "app",
            "--vars-file",
            "vars.yml",
            "-i",
            "2",
            "--var",
            "a=1",
            "--push-as-subprocess",
        ])
        .unwrap();

        assert_eq!(
            arguments.forwarded_args,
            tokens(&["app", "--vars-file", "vars.yml", "-i", "2", "--var", "a=1"])
        );
    }

    #[test]
    fn test_substitution_flags_not_forwarded_in_process() {
        let arguments = run(&[
            "create-service-push",
            "app",
            "--var",
            "a=1",
            "--vars-file",
            "vars.yml",
        ])
        .unwrap();

        assert_eq!(arguments.forwarded_args, tokens(&["app"]));
        assert_eq!(arguments.vars.get("a").map(String::as_str), Some("1"));
        assert_eq!(arguments.vars_files, vec![PathBuf::from("vars.yml")]);
    }

    #[test]
    fn test_env_prefix_scanning() {
        let arguments = run_with_env(
            &["create-service-push", "--use-env-vars-prefixed-with", "CSPAPP"],
            &[
                ("CSPAPP_ENV", "blah"),
                ("CSPAPPX", "literal-prefix"),
                ("OTHER", "ignored"),
            ],
        )
        .unwrap();

        assert_eq!(arguments.vars.len(), 2);
        assert_eq!(
            arguments.vars.get("CSPAPP_ENV").map(String::as_str),
            Some("blah")
        );
        assert_eq!(
            arguments.vars.get("CSPAPPX").map(String::as_str),
            Some("literal-prefix")
        );
    }

    #[test]
    fn test_env_prefix_and_var_last_writer_wins() {
        let environment = [("APP_NAME", "from-env")];

        let arguments = run_with_env(
            &[
                "create-service-push",
                "--use-env-vars-prefixed-with",
                "APP_",
                "--var",
                "APP_NAME=from-flag",
            ],
            &environment,
        )
        .unwrap();
        assert_eq!(
            arguments.vars.get("APP_NAME").map(String::as_str),
            Some("from-flag")
        );

        let arguments = run_with_env(
            &[
                "create-service-push",
                "--var",
                "APP_NAME=from-flag",
                "--use-env-vars-prefixed-with",
                "APP_",
            ],
            &environment,
        )
        .unwrap();
        assert_eq!(
            arguments.vars.get("APP_NAME").map(String::as_str),
            Some("from-env")
        );
    }

    #[test]
    fn test_env_prefix_missing_argument() {
        let error = run(&["create-service-push", "--use-env-vars-prefixed-with"]).unwrap_err();

        assert_eq!(
            error.to_string(),
            "--use-env-vars-prefixed-with is missing a prefix input"
        );
    }

    #[test]
    fn test_first_error_stops_processing() {
        let error = run(&[
            "create-service-push",
            "--var",
            "novalue",
            "--no-push",
            "--push-as-subprocess",
        ])
        .unwrap_err();

        assert_eq!(error, ArgumentError::NotKeyValue("novalue".to_string()));
    }
}
