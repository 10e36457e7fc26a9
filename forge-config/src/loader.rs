//! Reading configuration documents from files, inline text, or the environment.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::ConfigValidationError;
use crate::validate::{ValidatedConfig, validate};

/// Result alias for configuration loading.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors raised while reading, parsing, or validating a configuration.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {}: {source}", .path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML.
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document is not valid JSON.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but does not describe valid tools and prompts.
    #[error(transparent)]
    Validation(#[from] ConfigValidationError),
}

/// Where a configuration document comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    /// A file on disk; `.json` files are parsed as JSON, anything else as YAML.
    Path(PathBuf),
    /// Inline YAML text.
    Yaml(String),
    /// Inline JSON text.
    Json(String),
}

impl ConfigSource {
    /// Environment variable naming a configuration file.
    pub const PATH_VAR: &'static str = "CMDFORGE_CONFIG_PATH";

    /// Environment variable holding an inline configuration document.
    pub const VALUE_VAR: &'static str = "CMDFORGE_CONFIG_VALUE";

    /// Resolves a source from the process environment.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Resolves a source through `lookup`, preferring [`Self::PATH_VAR`] over
    /// [`Self::VALUE_VAR`]. Blank values are ignored.
    ///
    /// Inline values starting with `{` are treated as JSON.
    pub fn from_env_with<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(path) = present(Self::PATH_VAR) {
            return Some(Self::Path(PathBuf::from(path)));
        }
        present(Self::VALUE_VAR).map(|value| {
            if value.trim_start().starts_with('{') {
                Self::Json(value)
            } else {
                Self::Yaml(value)
            }
        })
    }

    /// Reads and parses the document into a raw configuration tree.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] when a file cannot be read and
    /// [`LoadError::Yaml`]/[`LoadError::Json`] when the text does not parse.
    pub fn read(&self) -> LoadResult<Value> {
        match self {
            Self::Path(path) => {
                let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?;
                if is_json_path(path) {
                    parse_json(&text)
                } else {
                    parse_yaml(&text)
                }
            }
            Self::Yaml(text) => parse_yaml(text),
            Self::Json(text) => parse_json(text),
        }
    }

    fn label(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Yaml(_) => "inline YAML".to_owned(),
            Self::Json(_) => "inline JSON".to_owned(),
        }
    }
}

fn is_json_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn parse_yaml(text: &str) -> LoadResult<Value> {
    Ok(serde_yaml::from_str(text)?)
}

fn parse_json(text: &str) -> LoadResult<Value> {
    Ok(serde_json::from_str(text)?)
}

/// Reads, parses, and validates a configuration.
///
/// Validation warnings are logged and kept on the returned value.
///
/// # Errors
///
/// Propagates read, parse, and validation failures as [`LoadError`].
pub fn load(source: &ConfigSource) -> LoadResult<ValidatedConfig> {
    let label = source.label();
    debug!(source = %label, "loading configuration");

    let tree = source.read()?;
    let config = validate(&tree)?;

    for warning in &config.warnings {
        warn!(source = %label, kind = %warning.kind, name = %warning.name, "{}", warning.message);
    }
    info!(
        source = %label,
        tools = config.tools.len(),
        prompts = config.prompts.len(),
        "configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::io::Write;

    const YAML: &str = r#"
tools:
  echo:
    description: Echo
    execution:
      command: "echo <<msg>>"
    parameters:
      msg: { description: Message, required: true }
"#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn loads_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let config = load(&ConfigSource::Path(file.path().to_path_buf())).unwrap();
        assert_eq!(config.tools[0].name(), "echo");
    }

    #[test]
    fn json_extension_selects_json_parser() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(
            br#"{"prompts": {"hi": {"description": "Hi", "template": "Hello"}}}"#,
        )
        .unwrap();

        let config = load(&ConfigSource::Path(file.path().to_path_buf())).unwrap();
        assert_eq!(config.prompts[0].name(), "hi");
    }

    #[test]
    fn reports_each_failure_stage() {
        let missing = ConfigSource::Path(PathBuf::from("/no/such/cmdforge.yaml"));
        assert!(matches!(load(&missing), Err(LoadError::Io { .. })));

        let broken = ConfigSource::Yaml("tools: [unclosed".into());
        assert!(matches!(load(&broken), Err(LoadError::Yaml(_))));

        let broken = ConfigSource::Json("{not json".into());
        assert!(matches!(load(&broken), Err(LoadError::Json(_))));

        let empty = ConfigSource::Yaml("{}".into());
        assert!(matches!(
            load(&empty),
            Err(LoadError::Validation(ConfigValidationError::NothingDefined))
        ));
    }

    #[test]
    fn environment_prefers_path_over_value() {
        let source = ConfigSource::from_env_with(env(&[
            (ConfigSource::PATH_VAR, "/etc/cmdforge.yaml"),
            (ConfigSource::VALUE_VAR, YAML),
        ]));
        assert_eq!(
            source,
            Some(ConfigSource::Path(PathBuf::from("/etc/cmdforge.yaml")))
        );

        let source = ConfigSource::from_env_with(env(&[
            (ConfigSource::PATH_VAR, "  "),
            (ConfigSource::VALUE_VAR, YAML),
        ]));
        assert_eq!(source, Some(ConfigSource::Yaml(YAML.to_owned())));

        let source = ConfigSource::from_env_with(env(&[(ConfigSource::VALUE_VAR, r#" {"tools": {}}"#)]));
        assert!(matches!(source, Some(ConfigSource::Json(_))));

        assert_eq!(ConfigSource::from_env_with(env(&[])), None);
    }

    #[test]
    fn inline_sources_load() {
        let config = load(&ConfigSource::Yaml(YAML.to_owned())).unwrap();
        assert_eq!(config.tools.len(), 1);
        assert!(config.warnings.is_empty());
    }
}
