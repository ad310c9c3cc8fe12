//! Output formatting for commands that produce a result, such as `metadata`.
//!
//! The main entry point is the [`Formattable`] trait which renders a value as text or JSON.
use std::fmt::Display;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

/// Format of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

/// Types that can be rendered as text or JSON.
///
/// Anything implementing both [`Display`] and [`Serialize`] gets this for free.
pub trait Formattable {
    fn format(&self, format: Format) -> Result<String>;
}

impl<T> Formattable for T
where
    T: Display + Serialize,
{
    fn format(&self, format: Format) -> Result<String> {
        Ok(match format {
            Format::Text => self.to_string(),
            Format::Json => serde_json::to_string(self).context("serializing to json")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Version {
        major: u64,
        minor: u64,
    }

    impl Display for Version {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "v{}.{}", self.major, self.minor)
        }
    }

    #[test]
    fn test_format_text_uses_display() {
        let version = Version { major: 1, minor: 3 };

        assert_eq!(version.format(Format::Text).unwrap(), "v1.3");
    }

    #[test]
    fn test_format_json_uses_serialize() {
        let version = Version { major: 1, minor: 3 };

        assert_eq!(
            version.format(Format::Json).unwrap(),
            r#"{"major":1,"minor":3}"#
        );
    }
}
