//! Configuration loading and resolution
//!
//! Bootstrap configuration comes from a TOML file. Every field has a compiled
//! default, so a missing file is not fatal: the service warns and starts with
//! defaults. A file that exists but does not parse or validate is an error.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `MMFD_CONFIG` environment variable
//! 3. Platform config directory (`~/.config/mmfd/mmfd-an.toml` on Linux)
//! 4. Compiled defaults (fallback)

use crate::{Error, Modality, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MMFD_CONFIG";

/// Config file name inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "mmfd-an.toml";

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Top-level configuration for the analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub fusion: FusionConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logging: LoggingConfig::default(),
            fusion: FusionConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Bounds on the in-memory analysis store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Stored analyses kept before the oldest is evicted
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_records: default_max_records(),
        }
    }
}

fn default_max_records() -> usize {
    10_000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// How per-modality results are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionStrategy {
    /// Weighted average over present modalities (re-normalized weights)
    #[default]
    WeightedAverage,
    /// Most optimistic modality wins
    Maximum,
    /// Most pessimistic modality wins
    Minimum,
    /// Majority vote of credible (> 50) vs not credible
    Voting,
}

impl FusionStrategy {
    pub const ALL: [FusionStrategy; 4] = [
        FusionStrategy::WeightedAverage,
        FusionStrategy::Maximum,
        FusionStrategy::Minimum,
        FusionStrategy::Voting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FusionStrategy::WeightedAverage => "weighted_average",
            FusionStrategy::Maximum => "maximum",
            FusionStrategy::Minimum => "minimum",
            FusionStrategy::Voting => "voting",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FusionStrategy::WeightedAverage => "Weighted average of all modalities (recommended)",
            FusionStrategy::Maximum => "Most optimistic score (highest credibility)",
            FusionStrategy::Minimum => "Most pessimistic score (lowest credibility)",
            FusionStrategy::Voting => "Majority voting across modalities",
        }
    }
}

impl fmt::Display for FusionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FusionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FusionStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s.trim())
            .ok_or_else(|| Error::InvalidInput(format!("Unknown fusion strategy: {}", s)))
    }
}

/// Base weight per modality (must sum to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModalityWeights {
    pub text: f64,
    pub audio: f64,
    pub video: f64,
}

impl Default for ModalityWeights {
    fn default() -> Self {
        Self {
            text: 0.45,
            audio: 0.30,
            video: 0.25,
        }
    }
}

impl ModalityWeights {
    pub fn get(&self, modality: Modality) -> f64 {
        match modality {
            Modality::Text => self.text,
            Modality::Audio => self.audio,
            Modality::Video => self.video,
        }
    }
}

/// Verdict cutoffs on the fused credibility score
///
/// score < `fake_below` is FAKE, score >= `real_at_or_above` is REAL,
/// everything between is UNCERTAIN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerdictThresholds {
    pub fake_below: f64,
    pub real_at_or_above: f64,
}

impl Default for VerdictThresholds {
    fn default() -> Self {
        Self {
            fake_below: 40.0,
            real_at_or_above: 70.0,
        }
    }
}

/// Cross-modal agreement adjustment
///
/// Spread is the population standard deviation of the present modalities'
/// scores. At or below `low_spread` confidence gains `bonus` (never pushed
/// past `bonus_ceiling`); at or above `high_spread` it loses `penalty` (never
/// pushed below `penalty_floor`); in between the adjustment is interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgreementConfig {
    pub low_spread: f64,
    pub high_spread: f64,
    pub bonus: f64,
    pub penalty: f64,
    pub bonus_ceiling: f64,
    pub penalty_floor: f64,
}

impl Default for AgreementConfig {
    fn default() -> Self {
        Self {
            low_spread: 15.0,
            high_spread: 35.0,
            bonus: 0.10,
            penalty: 0.10,
            bonus_ceiling: 0.95,
            penalty_floor: 0.35,
        }
    }
}

/// Confidence added per severe indicator, by originating modality
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SevereBoost {
    pub text: f64,
    pub audio: f64,
    pub video: f64,
}

impl Default for SevereBoost {
    fn default() -> Self {
        Self {
            text: 0.07,
            audio: 0.08,
            video: 0.07,
        }
    }
}

impl SevereBoost {
    pub fn get(&self, modality: Modality) -> f64 {
        match modality {
            Modality::Text => self.text,
            Modality::Audio => self.audio,
            Modality::Video => self.video,
        }
    }
}

/// Fusion engine tables
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FusionConfig {
    #[serde(default)]
    pub strategy: FusionStrategy,

    #[serde(default)]
    pub weights: ModalityWeights,

    #[serde(default)]
    pub verdict: VerdictThresholds,

    #[serde(default)]
    pub agreement: AgreementConfig,

    #[serde(default)]
    pub severe_boost: SevereBoost,

    /// Below this fused confidence the verdict is forced to UNCERTAIN.
    /// Unset by default.
    #[serde(default)]
    pub min_confidence: Option<f64>,
}

impl FusionConfig {
    /// Reject tables that would make the fusion math meaningless
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("text", self.weights.text),
            ("audio", self.weights.audio),
            ("video", self.weights.video),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::Config(format!(
                    "fusion.weights.{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        let sum: f64 = weights.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(Error::Config(format!(
                "fusion.weights must sum to 1.0, got {:.6}",
                sum
            )));
        }

        let verdict = &self.verdict;
        if !(0.0..=100.0).contains(&verdict.fake_below)
            || !(0.0..=100.0).contains(&verdict.real_at_or_above)
            || verdict.fake_below > verdict.real_at_or_above
        {
            return Err(Error::Config(format!(
                "fusion.verdict cutoffs must satisfy 0 <= fake_below <= real_at_or_above <= 100, got {} / {}",
                verdict.fake_below, verdict.real_at_or_above
            )));
        }

        let agreement = &self.agreement;
        if !(agreement.low_spread >= 0.0 && agreement.low_spread < agreement.high_spread) {
            return Err(Error::Config(format!(
                "fusion.agreement spreads must satisfy 0 <= low_spread < high_spread, got {} / {}",
                agreement.low_spread, agreement.high_spread
            )));
        }
        let unit_fields = [
            ("agreement.bonus", agreement.bonus),
            ("agreement.penalty", agreement.penalty),
            ("agreement.bonus_ceiling", agreement.bonus_ceiling),
            ("agreement.penalty_floor", agreement.penalty_floor),
            ("severe_boost.text", self.severe_boost.text),
            ("severe_boost.audio", self.severe_boost.audio),
            ("severe_boost.video", self.severe_boost.video),
        ];
        for (name, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "fusion.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if let Some(min_confidence) = self.min_confidence {
            if !(0.0..=1.0).contains(&min_confidence) {
                return Err(Error::Config(format!(
                    "fusion.min_confidence must be within [0, 1], got {}",
                    min_confidence
                )));
            }
        }

        Ok(())
    }
}

impl AnalyzerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AnalyzerConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.fusion.validate()?;
        if config.store.max_records == 0 {
            return Err(Error::Config(
                "store.max_records must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Resolve the config file by priority and load it
    ///
    /// Missing files fall back to compiled defaults. Does not log; call
    /// [`ConfigSource::log`] once tracing is installed.
    pub fn resolve(cli_arg: Option<&Path>) -> Result<(Self, ConfigSource)> {
        match resolve_config_path(cli_arg) {
            Some(path) if path.exists() => {
                let config = Self::load_from_file(&path)?;
                Ok((config, ConfigSource::File(path)))
            }
            Some(path) => Ok((Self::default(), ConfigSource::Missing(path))),
            None => Ok((Self::default(), ConfigSource::Defaults)),
        }
    }
}

/// Where the resolved configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Loaded from this file
    File(PathBuf),
    /// Named by CLI or environment but absent; compiled defaults used
    Missing(PathBuf),
    /// No file named or found; compiled defaults used
    Defaults,
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Configuration loaded from {}", path.display()),
            ConfigSource::Missing(path) => warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            ),
            ConfigSource::Defaults => info!("No config file found, using compiled defaults"),
        }
    }
}

/// Pick the config file path by priority
///
/// Explicit sources (CLI, environment) are returned even if the file does
/// not exist so the caller can report it; the platform default is only
/// returned when present.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path().filter(|path| path.exists())
}

/// Platform config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mmfd").join(CONFIG_FILE_NAME))
}
