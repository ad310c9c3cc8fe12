use std::{collections::BTreeMap, fmt::Display};

use anyhow::{Context, Result};
use async_trait::async_trait;
use semver::Version;
use serde::Serialize;

use crate::{
    args::{
        flags::{FLAGS, FlagSpec},
        processor::{COMMAND_ALIAS, COMMAND_NAME},
    },
    commands::CommandWithOutput,
    table::{Table, TableColumn},
};

const PLUGIN_NAME: &str = "Create-Service-Push";
const MIN_CLI_VERSION: PluginVersion = PluginVersion {
    major: 6,
    minor: 7,
    build: 0,
};

const HELP_TEXT: &str = "Works in the same manner as cf push, except that it will create services defined in a services-manifest.yml file first before performing a cf push.";

const USAGE: &str = r#"
    cf create-service-push [APP_NAME]
                           [ --service-manifest SERVICE_MANIFEST_FULL_PATH | --no-service-manifest ]
                           [ --no-push | --push-as-subprocess ]
                           [ --var KEY=VALUE ] [ --vars-file VARS_FILE_FULL_PATH ]
                           [ --use-env-vars-prefixed-with PREFIX ]
                           [CF_PUSH_ARGUMENTS]
    NOTES:
    a) APP_NAME is optional but should always be at the first position. If specified, it is passed
       to cf push in that order. Otherwise cf push expects to find it in an application manifest.

    b) --push-as-subprocess runs the cf executable installed on the machine instead of pushing
       through the plugin connection. The cf executable is looked up in the current working
       directory first, then in the PATH.

    c) --var and --vars-file are only passed to cf push together with --push-as-subprocess.
       Variable substitution in the service manifest works either way."#;

/// Registration record the cf CLI reads when the plugin is installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginMetadata {
    pub name: String,
    pub version: PluginVersion,
    pub min_cli_version: PluginVersion,
    pub commands: Vec<PluginCommand>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginVersion {
    pub major: u64,
    pub minor: u64,
    pub build: u64,
}

impl From<&Version> for PluginVersion {
    fn from(version: &Version) -> Self {
        Self {
            major: version.major,
            minor: version.minor,
            build: version.patch,
        }
    }
}

impl Display for PluginVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginCommand {
    pub name: String,
    pub alias: String,
    pub help_text: String,
    pub usage_details: Usage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Usage {
    pub usage: String,
    pub options: BTreeMap<String, String>,
}

impl Display for PluginMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} {}", self.name, self.version)?;
        writeln!(f, "Minimum cf CLI version: {}", self.min_cli_version)?;

        for command in &self.commands {
            writeln!(f)?;
            writeln!(f, "{} (alias: {})", command.name, command.alias)?;
            writeln!(f, "{}", command.help_text)?;
            writeln!(f, "{}", command.usage_details.usage)?;
            writeln!(f)?;

            let options: Vec<(&String, &String)> = command.usage_details.options.iter().collect();
            let columns: &[TableColumn<&str, (&String, &String)>] = &[
                ("OPTION", |(flag, _)| flag.to_string()),
                ("DESCRIPTION", |(_, description)| description.to_string()),
            ];
            write!(f, "{}", Table::from_iter(&options, columns))?;
        }

        Ok(())
    }
}

pub struct Metadata {
    version: &'static str,
    flags: &'static [FlagSpec],
}

impl Metadata {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            flags: FLAGS,
        }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandWithOutput for Metadata {
    type Output = PluginMetadata;

    async fn execute(&mut self) -> Result<Self::Output> {
        let version = Version::parse(self.version)
            .with_context(|| format!("parsing plugin version {}", self.version))?;

        Ok(PluginMetadata {
            name: PLUGIN_NAME.to_string(),
            version: PluginVersion::from(&version),
            min_cli_version: MIN_CLI_VERSION,
            commands: vec![PluginCommand {
                name: COMMAND_NAME.to_string(),
                alias: COMMAND_ALIAS.to_string(),
                help_text: HELP_TEXT.to_string(),
                usage_details: Usage {
                    usage: USAGE.to_string(),
                    options: self
                        .flags
                        .iter()
                        .map(|flag| (flag.name.to_string(), flag.description.to_string()))
                        .collect(),
                },
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatting::{Format, Formattable};

    #[tokio::test]
    async fn test_metadata_from_crate_version() {
        let mut command = Metadata {
            version: "1.3.1",
            flags: FLAGS,
        };

        let metadata = command.execute().await.unwrap();

        assert_eq!(metadata.name, "Create-Service-Push");
        assert_eq!(
            metadata.version,
            PluginVersion {
                major: 1,
                minor: 3,
                build: 1
            }
        );
        assert_eq!(metadata.min_cli_version.to_string(), "6.7.0");
        assert_eq!(metadata.commands[0].name, "create-service-push");
        assert_eq!(metadata.commands[0].alias, "cspush");
        assert_eq!(
            metadata.commands[0].usage_details.options.len(),
            FLAGS.len()
        );
        assert!(
            metadata.commands[0]
                .usage_details
                .options
                .contains_key("--push-as-subprocess")
        );
    }

    #[tokio::test]
    async fn test_invalid_version() {
        let mut command = Metadata {
            version: "one",
            flags: FLAGS,
        };

        assert!(command.execute().await.is_err());
    }

    #[tokio::test]
    async fn test_json_uses_host_field_names() {
        let metadata = Metadata::new().execute().await.unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&metadata.format(Format::Json).unwrap()).unwrap();

        assert_eq!(json["Name"], "Create-Service-Push");
        assert_eq!(json["MinCliVersion"]["Minor"], 7);
        assert_eq!(json["Commands"][0]["Alias"], "cspush");
        assert!(json["Commands"][0]["UsageDetails"]["Options"]["--no-push"].is_string());
    }

    #[tokio::test]
    async fn test_text_lists_every_option() {
        let metadata = Metadata::new().execute().await.unwrap();

        let text = metadata.format(Format::Text).unwrap();

        assert!(text.starts_with(&format!("Create-Service-Push {}", env!("CARGO_PKG_VERSION"))));
        for flag in FLAGS {
            assert!(text.contains(flag.name), "{} missing from output", flag.name);
        }
    }
}
