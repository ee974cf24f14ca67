use crate::utils::error::{PrimerError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimerConfig {
    pub data: DataConfig,
    pub task: TaskConfig,
    pub mpi: MpiConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub size: usize,
    pub multiplier: f64,
    pub seed: u64,
    /// Defaults to the number of logical CPUs.
    pub workers: Option<usize>,
    pub scaling_workers: Vec<usize>,
    pub weak_base_size: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            size: 1_000_000,
            multiplier: 2.5,
            seed: 42,
            workers: None,
            scaling_workers: vec![1, 2, 4],
            weak_base_size: 250_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Defaults to `min(4, cpus)`.
    pub workers: Option<usize>,
    /// Multiplies every simulated task latency. 0 disables the sleeps.
    pub latency_scale: f64,
    pub idle_timeout_ms: u64,
    /// Defaults to tasks + workers so the producer never blocks.
    pub queue_capacity: Option<usize>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            workers: None,
            latency_scale: 1.0,
            idle_timeout_ms: 1000,
            queue_capacity: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MpiConfig {
    pub ranks: usize,
    pub root: usize,
}

impl Default for MpiConfig {
    fn default() -> Self {
        Self { ranks: 4, root: 0 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl PrimerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PrimerError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PrimerError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value. Unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PrimerError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_positive_number("data.size", self.data.size, 1)?;
        validation::validate_finite("data.multiplier", self.data.multiplier)?;
        if let Some(workers) = self.data.workers {
            validation::validate_positive_number("data.workers", workers, 1)?;
        }
        validation::validate_non_empty("data.scaling_workers", &self.data.scaling_workers)?;
        for workers in &self.data.scaling_workers {
            validation::validate_positive_number("data.scaling_workers", *workers, 1)?;
        }
        validation::validate_positive_number("data.weak_base_size", self.data.weak_base_size, 1)?;

        if let Some(workers) = self.task.workers {
            validation::validate_positive_number("task.workers", workers, 1)?;
        }
        validation::validate_finite("task.latency_scale", self.task.latency_scale)?;
        validation::validate_range("task.latency_scale", self.task.latency_scale, 0.0, 100.0)?;
        if self.task.idle_timeout_ms == 0 {
            return Err(PrimerError::InvalidConfigValueError {
                field: "task.idle_timeout_ms".to_string(),
                value: "0".to_string(),
                reason: "Workers need at least 1 ms to wait for the next task".to_string(),
            });
        }
        if let Some(capacity) = self.task.queue_capacity {
            validation::validate_positive_number("task.queue_capacity", capacity, 1)?;
        }

        validation::validate_positive_number("mpi.ranks", self.mpi.ranks, 1)?;
        if self.mpi.root >= self.mpi.ranks {
            return Err(PrimerError::InvalidConfigValueError {
                field: "mpi.root".to_string(),
                value: self.mpi.root.to_string(),
                reason: format!("Root must be below the number of ranks ({})", self.mpi.ranks),
            });
        }

        Ok(())
    }

    pub fn data_workers(&self) -> usize {
        self.data.workers.unwrap_or_else(num_cpus::get)
    }

    pub fn task_workers(&self) -> usize {
        self.task.workers.unwrap_or_else(|| num_cpus::get().min(4))
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.task.idle_timeout_ms)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }
}

impl Validate for PrimerConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = PrimerConfig::from_toml_str("").unwrap();

        assert_eq!(config.data.size, 1_000_000);
        assert_eq!(config.data.multiplier, 2.5);
        assert_eq!(config.data.seed, 42);
        assert_eq!(config.data.scaling_workers, vec![1, 2, 4]);
        assert_eq!(config.mpi.ranks, 4);
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
[data]
size = 5000
workers = 3

[task]
latency_scale = 0.0
workers = 2

[mpi]
ranks = 2
root = 1

[monitoring]
enabled = true
"#;

        let config = PrimerConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.data.size, 5000);
        assert_eq!(config.data_workers(), 3);
        assert_eq!(config.data.multiplier, 2.5);
        assert_eq!(config.task_workers(), 2);
        assert_eq!(config.task.latency_scale, 0.0);
        assert_eq!(config.idle_timeout(), Duration::from_millis(1000));
        assert_eq!(config.mpi.root, 1);
        assert!(config.monitoring_enabled());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PRIMER_TEST_RANKS", "6");

        let toml_content = r#"
[mpi]
ranks = ${PRIMER_TEST_RANKS}
"#;

        let config = PrimerConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.mpi.ranks, 6);

        std::env::remove_var("PRIMER_TEST_RANKS");
    }

    #[test]
    fn test_config_validation() {
        let config = PrimerConfig::from_toml_str("[mpi]\nranks = 2\nroot = 2\n").unwrap();
        assert!(config.validate().is_err());

        let config = PrimerConfig::from_toml_str("[data]\nworkers = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = PrimerConfig::from_toml_str("[data]\nscaling_workers = []\n").unwrap();
        assert!(config.validate().is_err());

        let config = PrimerConfig::from_toml_str("[task]\nlatency_scale = -0.5\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_idle_timeout_is_rejected() {
        let config = PrimerConfig::from_toml_str("[task]\nidle_timeout_ms = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            PrimerError::InvalidConfigValueError { ref field, .. } if field == "task.idle_timeout_ms"
        ));

        let config = PrimerConfig::from_toml_str("[task]\nidle_timeout_ms = 1\n").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = PrimerConfig::from_toml_str("[data\nsize = 1").unwrap_err();
        assert!(matches!(err, PrimerError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[data]\nsize = 1234\nseed = 7\n")
            .unwrap();

        let config = PrimerConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.data.size, 1234);
        assert_eq!(config.data.seed, 7);
    }
}
