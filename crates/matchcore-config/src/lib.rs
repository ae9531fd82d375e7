//! Configuration system for MatchCore.
//!
//! Load inference rules, the relaxation strategy table and diagnosis
//! defaults from TOML or YAML files. All of it is process-wide, read-only
//! configuration: loaded once at startup, validated eagerly, and never
//! mutated afterwards.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use matchcore_config::MatchConfig;
//!
//! let config = MatchConfig::from_toml_str(r#"
//!     [diagnosis]
//!     max_sets = 3
//!     insufficient_threshold = 3
//!
//!     [[rules]]
//!     id = "staff-needs-mentoring"
//!     name = "Staff engineers must mentor"
//!     priority = 10
//!
//!     [rules.condition]
//!     type = "leaf"
//!     path = "required.seniority"
//!     op = "eq"
//!     value = "staff"
//!
//!     [rules.effect]
//!     kind = "derived_filter"
//!     target_field = "skills"
//!     target_value = "mentoring"
//!     rationale = "Staff roles carry mentoring responsibility"
//!
//!     [strategies.budget]
//!     type = "numeric_step"
//!     steps_up = [1.2, 1.5]
//!     rationale_template = "Raise {field} from {original} to {suggested}"
//!     suggested_field = "budget"
//! "#).unwrap();
//!
//! assert_eq!(config.rules.len(), 1);
//! assert!(config.strategies.contains_key("budget"));
//! ```
//!
//! Use defaults when the file is missing:
//!
//! ```
//! use matchcore_config::MatchConfig;
//!
//! let config = MatchConfig::load("matchcore.toml").unwrap_or_default();
//! assert_eq!(config.diagnosis.max_sets, 3);
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use matchcore_diagnosis::{DiagnosisConfig, RelaxationStrategy};
use matchcore_rules::{RuleDefinition, DEFAULT_MAX_ITERATIONS};

#[cfg(test)]
mod tests;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main MatchCore configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MatchConfig {
    /// Diagnosis tuning (conflict set cap, insufficiency threshold).
    #[serde(default)]
    pub diagnosis: DiagnosisConfig,

    /// Pass cap for forward-chaining inference.
    #[serde(default = "default_max_inference_iterations")]
    pub max_inference_iterations: usize,

    /// Inference rules in declaration order.
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,

    /// Relaxation strategy table, keyed by constraint field.
    #[serde(default)]
    pub strategies: BTreeMap<String, RelaxationStrategy>,
}

fn default_max_inference_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            diagnosis: DiagnosisConfig::default(),
            max_inference_iterations: DEFAULT_MAX_ITERATIONS,
            rules: Vec::new(),
            strategies: BTreeMap::new(),
        }
    }
}

impl MatchConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist, contains invalid TOML, or
    /// fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses and validates configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Adds a rule.
    pub fn with_rule(mut self, rule: RuleDefinition) -> Self {
        self.rules.push(rule);
        self
    }

    /// Sets the strategy for a constraint field.
    pub fn with_strategy(mut self, field: impl Into<String>, strategy: RelaxationStrategy) -> Self {
        self.strategies.insert(field.into(), strategy);
        self
    }

    /// Sets the diagnosis tuning.
    pub fn with_diagnosis(mut self, diagnosis: DiagnosisConfig) -> Self {
        self.diagnosis = diagnosis;
        self
    }

    /// Validates the whole configuration.
    ///
    /// Configuration errors are fatal at load time, never discovered at
    /// request time: malformed condition paths, duplicate rule ids and
    /// degenerate strategies are all rejected here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::BTreeSet::new();
        for rule in &self.rules {
            if !seen.insert(&rule.id) {
                return Err(ConfigError::Invalid(format!("duplicate rule id '{}'", rule.id)));
            }
            rule.validate()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }

        for (field, strategy) in &self.strategies {
            match strategy {
                RelaxationStrategy::NumericStep {
                    steps_down,
                    steps_up,
                    ..
                } => {
                    if steps_down.is_empty() && steps_up.is_empty() {
                        return Err(ConfigError::Invalid(format!(
                            "strategy for '{field}': numeric_step needs at least one multiplier"
                        )));
                    }
                }
                RelaxationStrategy::EnumExpand {
                    ordered_values,
                    max_expansion,
                    ..
                } => {
                    if ordered_values.is_empty() || *max_expansion == 0 {
                        return Err(ConfigError::Invalid(format!(
                            "strategy for '{field}': enum_expand needs values and a nonzero expansion"
                        )));
                    }
                }
                RelaxationStrategy::SkillRelaxation {
                    proficiency_order, ..
                } => {
                    if proficiency_order.is_empty() {
                        return Err(ConfigError::Invalid(format!(
                            "strategy for '{field}': skill_relaxation needs a proficiency order"
                        )));
                    }
                }
                RelaxationStrategy::Remove { .. } | RelaxationStrategy::DerivedOverride { .. } => {}
            }
        }

        if self.max_inference_iterations == 0 {
            return Err(ConfigError::Invalid(
                "max_inference_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
