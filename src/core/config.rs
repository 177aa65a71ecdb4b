// src/core/config.rs

use crate::core::common::KdError;
use crate::core::indexing::kdtree::{ModelFraming, SplitRule, DEFAULT_BOUND};
use serde::{Deserialize, Serialize};
use std::fs; // For reading file
use std::path::Path;

/// Configuration for building, persisting and querying a KD-Tree index.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// bound = 0.25
/// split_rule = 1
/// framed_model = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Hyperplane distance below which a search explores both children.
    pub bound: f64,
    /// Split-axis rule code: 0 max std, 1 min |skew|, 2 min |kurtosis|.
    pub split_rule: SplitRule,
    /// Prefix saved models with a `# nodes=<N>` header.
    pub framed_model: bool,
    /// Run batch queries on the rayon thread pool.
    pub parallel_queries: bool,
}

/// Builder for Config struct implementing the Builder pattern.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    bound: Option<f64>,
    split_rule: Option<SplitRule>,
    framed_model: Option<bool>,
    parallel_queries: Option<bool>,
}

impl ConfigBuilder {
    /// Creates a new ConfigBuilder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search bound
    pub fn bound(mut self, bound: f64) -> Self {
        self.bound = Some(bound);
        self
    }

    /// Sets the split-axis rule
    pub fn split_rule(mut self, rule: SplitRule) -> Self {
        self.split_rule = Some(rule);
        self
    }

    /// Enables or disables the model header
    pub fn framed_model(mut self, framed: bool) -> Self {
        self.framed_model = Some(framed);
        self
    }

    /// Enables or disables parallel batch queries
    pub fn parallel_queries(mut self, parallel: bool) -> Self {
        self.parallel_queries = Some(parallel);
        self
    }

    /// Builds the Config instance with validation
    pub fn build(self) -> Result<Config, KdError> {
        let defaults = Config::default();
        let config = Config {
            bound: self.bound.unwrap_or(defaults.bound),
            split_rule: self.split_rule.unwrap_or(defaults.split_rule),
            framed_model: self.framed_model.unwrap_or(defaults.framed_model),
            parallel_queries: self.parallel_queries.unwrap_or(defaults.parallel_queries),
        };

        config.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bound: DEFAULT_BOUND,
            split_rule: SplitRule::MaxStdDev,
            framed_model: true,
            parallel_queries: true,
        }
    }
}

impl Config {
    /// Creates a new ConfigBuilder for fluent configuration
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), KdError> {
        if self.bound.is_nan() || self.bound < 0.0 {
            return Err(KdError::Configuration(format!(
                "bound must be a non-negative number, got {}",
                self.bound
            )));
        }
        Ok(())
    }

    /// Framing used when saving models.
    pub const fn model_framing(&self) -> ModelFraming {
        if self.framed_model {
            ModelFraming::Framed
        } else {
            ModelFraming::Plain
        }
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the default configuration, which suits an
    /// implicit default location. Use [`Config::load_or_default`] for a path
    /// the user named explicitly.
    ///
    /// # Errors
    ///
    /// Returns `KdError::Configuration` if parsing or validation fails, and
    /// `KdError::File` if the file exists but cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, KdError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(KdError::file(path, e)),
        }
    }

    /// Loads configuration from an optional TOML file path.
    ///
    /// If `optional_path` is `Some(path)`, the file must exist: a missing file
    /// is reported as `KdError::File` with its path. If `optional_path` is
    /// `None`, it returns the default configuration.
    pub fn load_or_default(optional_path: Option<&Path>) -> Result<Self, KdError> {
        match optional_path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|e| KdError::file(path, e))?;
                Self::from_toml(&contents, path)
            }
            None => Ok(Self::default()),
        }
    }

    fn from_toml(contents: &str, path: &Path) -> Result<Self, KdError> {
        let config: Self = toml::from_str(contents).map_err(|e| {
            KdError::Configuration(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        // Validate the loaded configuration
        config.validate()?;
        Ok(config)
    }

    /// Applies command-line values on top of this configuration.
    ///
    /// `Some` values and set flags win over whatever the configuration holds;
    /// unset ones leave it untouched. Unknown rule codes fall back to
    /// [`SplitRule::MaxStdDev`]. The result is validated.
    pub fn with_overrides(
        mut self,
        bound: Option<f64>,
        rule: Option<i64>,
        plain: bool,
        sequential: bool,
    ) -> Result<Self, KdError> {
        if let Some(bound) = bound {
            self.bound = bound;
        }
        if let Some(code) = rule {
            self.split_rule = SplitRule::from_code(code);
        }
        if plain {
            self.framed_model = false;
        }
        if sequential {
            self.parallel_queries = false;
        }
        self.validate()?;
        Ok(self)
    }

    /// Configuration whose searches are exact (every node is visited).
    pub fn exhaustive() -> Self {
        Self {
            bound: f64::INFINITY,
            ..Self::default()
        }
    }
}
