use std::env;

use anyhow::{Context, Result};

use crate::clustering::traits::{ClusterSpec, DISABLED};
use crate::events::Interval;
use crate::period::Granularity;
use crate::pipeline::PipelineOptions;

pub const DEFAULT_ALPHA: f64 = 0.005;
pub const DEFAULT_THRESHOLD: f64 = 2.0;

/// Tuning knobs for a run.
///
/// Values come from environment variables (a .env file is loaded at startup
/// via dotenvy) and can be overridden per invocation by CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Decay factor applied to the carried-over score.
    pub alpha: f64,
    pub granularity: Granularity,
    /// Minimum summed score for an author to be kept.
    pub threshold: f64,
    /// Inclusive `start,end` window, unparsed.
    pub interval: Option<String>,
    /// Clustering method name, `-` when unset.
    pub method: String,
    /// Clustering algorithm name, `-` disables clustering.
    pub algorithm: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            granularity: Granularity::default(),
            threshold: DEFAULT_THRESHOLD,
            interval: None,
            method: DISABLED.to_string(),
            algorithm: DISABLED.to_string(),
        }
    }
}

/// Per-invocation overrides. `None` keeps the loaded value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub alpha: Option<f64>,
    pub granularity: Option<String>,
    pub threshold: Option<f64>,
    pub interval: Option<String>,
    pub method: Option<String>,
    pub algorithm: Option<String>,
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            alpha: env_parse("POLARNET_ALPHA")?.unwrap_or(defaults.alpha),
            granularity: match env::var("POLARNET_GRANULARITY") {
                Ok(code) => code.parse()?,
                Err(_) => defaults.granularity,
            },
            threshold: env_parse("POLARNET_THRESHOLD")?.unwrap_or(defaults.threshold),
            interval: env::var("POLARNET_INTERVAL").ok().filter(|s| !s.trim().is_empty()),
            method: env::var("POLARNET_METHOD").unwrap_or(defaults.method),
            algorithm: env::var("POLARNET_ALGORITHM").unwrap_or(defaults.algorithm),
        })
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self> {
        if let Some(alpha) = overrides.alpha {
            self.alpha = alpha;
        }
        if let Some(code) = overrides.granularity {
            self.granularity = code.parse()?;
        }
        if let Some(threshold) = overrides.threshold {
            self.threshold = threshold;
        }
        if overrides.interval.is_some() {
            self.interval = overrides.interval;
        }
        if let Some(method) = overrides.method {
            self.method = method;
        }
        if let Some(algorithm) = overrides.algorithm {
            self.algorithm = algorithm;
        }
        Ok(self)
    }

    /// Validate and convert into pipeline options.
    pub fn pipeline_options(&self) -> Result<PipelineOptions> {
        if !self.alpha.is_finite() {
            anyhow::bail!("alpha must be a finite number, got {}", self.alpha);
        }
        if !self.threshold.is_finite() {
            anyhow::bail!("threshold must be a finite number, got {}", self.threshold);
        }
        let interval = self
            .interval
            .as_deref()
            .map(str::parse::<Interval>)
            .transpose()?;
        let clustering = ClusterSpec::parse(&self.method, &self.algorithm)?;

        Ok(PipelineOptions {
            alpha: self.alpha,
            granularity: self.granularity,
            threshold: self.threshold,
            interval,
            clustering,
        })
    }
}

fn env_parse(key: &str) -> Result<Option<f64>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .with_context(|| format!("{key} must be a number, got {raw:?}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::traits::ClusterMethod;

    #[test]
    fn test_defaults_disable_clustering() {
        let opts = Config::default().pipeline_options().unwrap();
        assert_eq!(opts.alpha, 0.005);
        assert_eq!(opts.threshold, 2.0);
        assert_eq!(opts.granularity, Granularity::Month);
        assert!(opts.interval.is_none());
        assert!(opts.clustering.is_none());
    }

    #[test]
    fn test_overrides_replace_loaded_values() {
        let config = Config::default()
            .with_overrides(Overrides {
                alpha: Some(0.0),
                granularity: Some("W".to_string()),
                interval: Some("2021-01-01,2021-06-30".to_string()),
                method: Some("centroid".to_string()),
                algorithm: Some("generic".to_string()),
                ..Overrides::default()
            })
            .unwrap();
        let opts = config.pipeline_options().unwrap();
        assert_eq!(opts.alpha, 0.0);
        assert_eq!(opts.threshold, 2.0);
        assert_eq!(opts.granularity, Granularity::Week);
        assert!(opts.interval.is_some());
        assert_eq!(opts.clustering.unwrap().method, ClusterMethod::Centroid);
    }

    #[test]
    fn test_bad_values_are_rejected() {
        assert!(Config::default()
            .with_overrides(Overrides {
                granularity: Some("fortnight".to_string()),
                ..Overrides::default()
            })
            .is_err());

        let config = Config {
            interval: Some("2021-06-01".to_string()),
            ..Config::default()
        };
        assert!(config.pipeline_options().is_err());

        let config = Config {
            alpha: f64::NAN,
            ..Config::default()
        };
        assert!(config.pipeline_options().is_err());
    }
}
