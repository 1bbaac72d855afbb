//! Recommendation engine configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/menage/config/recommend.toml) when it exists
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Keys missing from an override keep their default value.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/recommend.toml");

/// Tunables for the budget recommendation engine
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendConfig {
    /// Months analyzed when the request does not specify a window
    pub default_months_window: u32,
    /// Largest accepted window
    pub max_months_window: u32,
    /// Savings rate applied when the request does not specify one
    pub default_savings_rate: f64,
    /// Multiplier applied to average expenses when no income is recorded
    pub income_fallback_multiplier: f64,
    /// Minimum monthly budget of a variable category
    pub min_variable_budget: f64,
    /// Category name used for transactions without one
    pub uncategorized_label: String,
    /// Lowercase substrings marking a category as fixed
    pub fixed_keywords: Vec<String>,
    /// Lowercase substrings marking a category as essential
    pub essential_keywords: Vec<String>,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            default_months_window: 3,
            max_months_window: 24,
            default_savings_rate: 0.10,
            income_fallback_multiplier: 1.2,
            min_variable_budget: 10.0,
            uncategorized_label: "Uncategorized".to_string(),
            fixed_keywords: Vec::new(),
            essential_keywords: Vec::new(),
        }
    }
}

impl RecommendConfig {
    /// Load from the default override location, else the embedded defaults
    pub fn load() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Self::embedded(),
        }
    }

    /// Load from an explicit path (falls back to defaults if it does not exist)
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::from_file(path),
            Some(path) => {
                tracing::warn!(
                    path = %path.display(),
                    "Config file not found, using embedded defaults"
                );
                Self::embedded()
            }
            None => Self::load(),
        }
    }

    /// The configuration compiled into the binary
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG, Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        // Overrides are layered on top of the embedded defaults
        parse_config(&content, Self::embedded()?)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("menage").join("config").join("recommend.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    defaults: Option<RawDefaults>,
    allocation: Option<RawAllocation>,
    categories: Option<RawCategories>,
}

#[derive(Debug, Deserialize)]
struct RawDefaults {
    months_window: Option<u32>,
    max_months_window: Option<u32>,
    savings_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawAllocation {
    income_fallback_multiplier: Option<f64>,
    min_variable_budget: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawCategories {
    uncategorized_label: Option<String>,
    fixed_keywords: Option<Vec<String>>,
    essential_keywords: Option<Vec<String>>,
}

/// Parse config from TOML content on top of `base`
fn parse_config(content: &str, base: RecommendConfig) -> Result<RecommendConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = base;

    if let Some(defaults) = raw.defaults {
        if let Some(window) = defaults.months_window {
            config.default_months_window = window;
        }
        if let Some(max) = defaults.max_months_window {
            config.max_months_window = max;
        }
        if let Some(rate) = defaults.savings_rate {
            config.default_savings_rate = rate;
        }
    }

    if let Some(allocation) = raw.allocation {
        if let Some(multiplier) = allocation.income_fallback_multiplier {
            config.income_fallback_multiplier = multiplier;
        }
        if let Some(floor) = allocation.min_variable_budget {
            config.min_variable_budget = floor;
        }
    }

    if let Some(categories) = raw.categories {
        if let Some(label) = categories.uncategorized_label {
            config.uncategorized_label = label;
        }
        if let Some(keywords) = categories.fixed_keywords {
            config.fixed_keywords = normalize_keywords(keywords);
        }
        if let Some(keywords) = categories.essential_keywords {
            config.essential_keywords = normalize_keywords(keywords);
        }
    }

    validate(&config)?;
    Ok(config)
}

fn normalize_keywords(keywords: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = keywords
        .into_iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

fn validate(config: &RecommendConfig) -> Result<()> {
    if config.max_months_window == 0 {
        return Err(Error::Config("max_months_window must be at least 1".into()));
    }
    if config.default_months_window == 0 || config.default_months_window > config.max_months_window
    {
        return Err(Error::Config(format!(
            "months_window must be between 1 and {}",
            config.max_months_window
        )));
    }
    if !(0.0..=1.0).contains(&config.default_savings_rate) {
        return Err(Error::Config("savings_rate must be between 0 and 1".into()));
    }
    if !config.income_fallback_multiplier.is_finite() || config.income_fallback_multiplier < 0.0 {
        return Err(Error::Config(
            "income_fallback_multiplier must be a non-negative number".into(),
        ));
    }
    if !config.min_variable_budget.is_finite() || config.min_variable_budget < 0.0 {
        return Err(Error::Config(
            "min_variable_budget must be a non-negative number".into(),
        ));
    }
    if config.uncategorized_label.trim().is_empty() {
        return Err(Error::Config("uncategorized_label must not be empty".into()));
    }
    Ok(())
}
