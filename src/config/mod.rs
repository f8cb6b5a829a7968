// ABOUTME: Configuration types and parsing for cutover.yml.
// ABOUTME: Handles YAML parsing, validation, and the init template.

mod healthcheck;
mod rollout;

pub use healthcheck::HealthCheckConfig;
pub use rollout::{RolloutConfig, ShiftMode};

use crate::error::{Error, Result};
use crate::types::{ImageRef, ServiceName};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "cutover.yml";
pub const CONFIG_FILENAME_ALT: &str = "cutover.yaml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_service_name")]
    pub service: ServiceName,

    #[serde(deserialize_with = "deserialize_image_ref")]
    pub image: ImageRef,

    #[serde(default = "default_desired_count")]
    pub desired_count: u32,

    #[serde(default = "default_container_port")]
    pub container_port: u16,

    #[serde(default)]
    pub rollout: RolloutConfig,

    #[serde(default)]
    pub healthcheck: HealthCheckConfig,

    #[serde(default)]
    pub ports: PortsConfig,

    /// Bounded window for replacement tasks to come up healthy before a
    /// deployment is even started.
    #[serde(default = "default_startup_window", with = "humantime_serde")]
    pub startup_window: Duration,

    /// Append-only deployment history file.
    #[serde(default)]
    pub history: Option<PathBuf>,
}

/// Front-door ports for the two listeners.
#[derive(Debug, Clone, Deserialize)]
pub struct PortsConfig {
    #[serde(default = "default_production_port")]
    pub production: u16,

    #[serde(default = "default_test_port")]
    pub test: u16,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            production: default_production_port(),
            test: default_test_port(),
        }
    }
}

fn default_desired_count() -> u32 {
    1
}

fn default_container_port() -> u16 {
    3000
}

fn default_production_port() -> u16 {
    80
}

fn default_test_port() -> u16 {
    8080
}

fn default_startup_window() -> Duration {
    Duration::from_secs(120)
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [dir.join(CONFIG_FILENAME), dir.join(CONFIG_FILENAME_ALT)];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Pre-flight validation. Runs before any resource is touched.
    pub fn validate(&self) -> Result<()> {
        match self.rollout.mode {
            ShiftMode::AllAtOnce => {}
            ShiftMode::Canary | ShiftMode::Linear => {
                if self.rollout.percentage == 0 || self.rollout.percentage > 100 {
                    return Err(Error::InvalidConfig(format!(
                        "rollout percentage must be within 1..=100, got {}",
                        self.rollout.percentage
                    )));
                }
                if self.rollout.interval.is_zero() {
                    return Err(Error::InvalidConfig(
                        "rollout interval must be non-zero for canary/linear".to_string(),
                    ));
                }
            }
        }

        if self.desired_count == 0 {
            return Err(Error::InvalidConfig(
                "desired_count must be at least 1".to_string(),
            ));
        }

        if self.ports.production == self.ports.test {
            return Err(Error::InvalidConfig(
                "production and test listeners must use distinct ports".to_string(),
            ));
        }

        Ok(())
    }

    /// Port the health check probes, falling back to the container port.
    pub fn healthcheck_port(&self) -> u16 {
        self.healthcheck.port.unwrap_or(self.container_port)
    }

    pub fn template() -> Self {
        Config {
            service: ServiceName::new("my-app").expect("template name is valid"),
            image: ImageRef::parse("my-registry/my-app:latest").expect("template image is valid"),
            desired_count: default_desired_count(),
            container_port: default_container_port(),
            rollout: RolloutConfig::default(),
            healthcheck: HealthCheckConfig::default(),
            ports: PortsConfig::default(),
            startup_window: default_startup_window(),
            history: None,
        }
    }
}

pub fn init_config(
    dir: &Path,
    service: Option<&str>,
    image: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(s) = service {
        config.service = ServiceName::new(s).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    }

    if let Some(i) = image {
        config.image = ImageRef::parse(i).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    }

    std::fs::write(&config_path, template_yaml(&config))?;

    Ok(())
}

fn template_yaml(config: &Config) -> String {
    format!(
        r#"service: {service}
image: {image}
desired_count: {count}
container_port: {port}
rollout:
  mode: canary
  interval: 5m
  percentage: 50
  approval_wait: 60m
  termination_wait: 5m
healthcheck:
  path: /health
  interval: 10s
  timeout: 5s
  retries: 3
ports:
  production: 80
  test: 8080
"#,
        service = config.service,
        image = config.image,
        count = config.desired_count,
        port = config.container_port,
    )
}

// Custom deserializers

fn deserialize_service_name<'de, D>(deserializer: D) -> std::result::Result<ServiceName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ServiceName::new(&s).map_err(serde::de::Error::custom)
}

fn deserialize_image_ref<'de, D>(deserializer: D) -> std::result::Result<ImageRef, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ImageRef::parse(&s).map_err(serde::de::Error::custom)
}
