//! Matching configuration.
//!
//! Defaults can be overridden by a YAML file (`--config`) and then by
//! individual command-line flags:
//!
//! ```yaml
//! similarity_threshold: 0.75
//! date_formats: ["yyyy-MM-dd", "dd.MM.yyyy"]
//! worker_count: 4
//! comparison_timeout_secs: 600
//! sample_rows: 0
//! ```

use std::{fs::File, io::BufReader, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    classify::{DEFAULT_DATE_FORMATS, DateFormats, TypeClassifier},
    error::MatchError,
    profile::ProfileOptions,
    scheduler::{self, DEFAULT_COMPARISON_TIMEOUT, SchedulerOptions},
    similarity::{self, DEFAULT_SIMILARITY_THRESHOLD},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchConfig {
    #[serde(alias = "similarityThreshold")]
    pub similarity_threshold: f64,
    #[serde(alias = "dateFormats")]
    pub date_formats: Vec<String>,
    /// 0 uses the available parallelism.
    #[serde(alias = "workerCount")]
    pub worker_count: usize,
    #[serde(alias = "comparisonTimeoutSecs")]
    pub comparison_timeout_secs: u64,
    /// Rows used for type inference; 0 scans every row.
    #[serde(alias = "sampleRows")]
    pub sample_rows: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            worker_count: 0,
            comparison_timeout_secs: DEFAULT_COMPARISON_TIMEOUT.as_secs(),
            sample_rows: 0,
        }
    }
}

impl MatchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: MatchConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config file {path:?}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        similarity::validate_threshold(self.similarity_threshold)?;
        DateFormats::new(&self.date_formats)?;
        scheduler::validate_timeout(self.comparison_timeout())?;
        Ok(())
    }

    pub fn classifier(&self) -> Result<TypeClassifier, MatchError> {
        Ok(TypeClassifier::new(DateFormats::new(&self.date_formats)?))
    }

    pub fn profile_options(&self, collect_values: bool) -> ProfileOptions {
        ProfileOptions {
            sample_rows: self.sample_rows,
            collect_values,
        }
    }

    pub fn comparison_timeout(&self) -> Duration {
        Duration::from_secs(self.comparison_timeout_secs)
    }

    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            threshold: self.similarity_threshold,
            worker_count: self.worker_count,
            timeout: self.comparison_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_documented_values() {
        let config = MatchConfig::default();
        assert_eq!(config.similarity_threshold, 0.5);
        assert_eq!(
            config.date_formats,
            vec!["MM/dd/yyyy", "dd/MM/yyyy", "yyyy-MM-dd"]
        );
        assert_eq!(config.worker_count, 0);
        assert_eq!(config.comparison_timeout(), Duration::from_secs(3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_reads_partial_yaml_with_aliases() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "similarityThreshold: 0.8").unwrap();
        writeln!(file, "worker_count: 3").unwrap();
        let config = MatchConfig::load(file.path()).expect("load config");
        assert_eq!(config.similarity_threshold, 0.8);
        assert_eq!(config.worker_count, 3);
        assert_eq!(config.date_formats.len(), 3);
        assert_eq!(config.scheduler_options().worker_count, 3);
    }

    #[test]
    fn load_rejects_unknown_keys_and_bad_values() {
        let mut unknown = NamedTempFile::new().expect("temp file");
        writeln!(unknown, "threshold_pct: 50").unwrap();
        assert!(MatchConfig::load(unknown.path()).is_err());

        let mut bad = NamedTempFile::new().expect("temp file");
        writeln!(bad, "similarity_threshold: 2.0").unwrap();
        let err = MatchConfig::load(bad.path()).expect_err("threshold out of range");
        assert!(err.to_string().contains("between 0 and 1"));
    }

    #[test]
    fn timeouts_beyond_the_maximum_are_rejected() {
        let config = MatchConfig {
            comparison_timeout_secs: u64::MAX,
            ..MatchConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MatchError::InvalidConfig(ref message)) if message.contains("must not exceed")
        ));

        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "comparison_timeout_secs: 0").unwrap();
        assert!(MatchConfig::load(file.path()).is_err());

        let longest = MatchConfig {
            comparison_timeout_secs: scheduler::MAX_COMPARISON_TIMEOUT.as_secs(),
            ..MatchConfig::default()
        };
        assert!(longest.validate().is_ok());
    }

    #[test]
    fn empty_date_formats_are_invalid() {
        let config = MatchConfig {
            date_formats: Vec::new(),
            ..MatchConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MatchError::InvalidConfig(_))
        ));
    }
}
