//! Configuration file parsing for `strainer.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{SyntaxError, SyntaxResult};

/// Main configuration structure for `strainer.toml`.
///
/// ```toml
/// [parser]
/// max_depth = 16
///
/// [compiler]
/// ignore_case = true
///
/// [logging]
/// level = "${STRAINER_LEVEL}"
///
/// [environments.test.compiler]
/// ignore_case = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StrainerConfig {
    /// Filter parser settings.
    #[serde(default)]
    pub parser: ParserConfig,

    /// Predicate compiler settings.
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl StrainerConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SyntaxResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SyntaxError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> SyntaxResult<Self> {
        let expanded = expand_env_vars(content);
        toml::from_str(&expanded).map_err(|e| SyntaxError::TomlError { source: e })
    }

    /// Apply environment-specific overrides.
    pub fn with_environment(mut self, env: &str) -> Self {
        if let Some(overrides) = self.environments.remove(env) {
            if let Some(parser) = overrides.parser {
                if let Some(max_depth) = parser.max_depth {
                    self.parser.max_depth = max_depth;
                }
            }
            if let Some(compiler) = overrides.compiler {
                if let Some(ignore_case) = compiler.ignore_case {
                    self.compiler.ignore_case = ignore_case;
                }
            }
            if let Some(logging) = overrides.logging {
                if let Some(level) = logging.level {
                    self.logging.level = level;
                }
                if let Some(format) = logging.format {
                    self.logging.format = format;
                }
            }
        }
        self
    }
}

/// Filter parser settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParserConfig {
    /// Deepest nesting of parentheses, sets and ranges accepted.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    32
}

/// Predicate compiler settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    /// Compare text without regard to case.
    #[serde(default)]
    pub ignore_case: bool,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Minimum level (`trace`, `debug`, `info`, `warn`, `error`).
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line, human readable.
    Pretty,
    /// Single line, human readable.
    Compact,
}

/// Environment-specific overrides.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    pub parser: Option<ParserOverride>,
    pub compiler: Option<CompilerOverride>,
    pub logging: Option<LoggingOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParserOverride {
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerOverride {
    pub ignore_case: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingOverride {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

static ENV_VAR: LazyLock<regex_lite::Regex> =
    LazyLock::new(|| regex_lite::Regex::new(r"\$\{([^}]+)\}").expect("valid env var regex"));

/// Expand `${VAR}` references, leaving unknown variables untouched.
fn expand_env_vars(content: &str) -> String {
    let mut result = content.to_string();

    for cap in ENV_VAR.captures_iter(content) {
        if let Ok(value) = std::env::var(&cap[1]) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}
