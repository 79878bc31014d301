// ABOUTME: Configuration types and parsing for chainlift.yml.
// ABOUTME: Explicit config injected at construction time, never read ambiently.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILENAME: &str = "chainlift.yml";
pub const CONFIG_FILENAME_ALT: &str = "chainlift.yaml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Target environment artifacts are published into.
    #[serde(default = "default_target_env")]
    pub target_env: String,

    /// Domain under which result URLs for deployed projects are minted.
    #[serde(default = "default_result_domain")]
    pub result_domain: String,

    pub publisher: PublisherConfig,

    #[serde(default)]
    pub build: BuildConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublisherConfig {
    pub host: String,

    #[serde(default = "default_publisher_port")]
    pub port: u16,

    #[serde(default)]
    pub api_key: Option<String>,
}

/// Settings for the fetch/classify/compile stages.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Directory whose non-empty presence marks a recognized project.
    #[serde(default = "default_sources_dir")]
    pub sources_dir: String,

    /// Build-tool config file whose readability marks a recognized project.
    #[serde(default = "default_config_file")]
    pub config_file: String,

    /// Command that compiles the tree, run from the tree root.
    #[serde(default = "default_build_command")]
    pub command: Vec<String>,

    /// Directory the build command writes artifact JSON into.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            sources_dir: default_sources_dir(),
            config_file: default_config_file(),
            command: default_build_command(),
            artifacts_dir: default_artifacts_dir(),
        }
    }
}

fn default_target_env() -> String {
    "sepolia".to_string()
}

fn default_result_domain() -> String {
    "apps.chainlift.dev".to_string()
}

fn default_publisher_port() -> u16 {
    8080
}

fn default_sources_dir() -> String {
    "contracts".to_string()
}

fn default_config_file() -> String {
    "hardhat.config.js".to_string()
}

fn default_build_command() -> Vec<String> {
    vec![
        "npx".to_string(),
        "hardhat".to_string(),
        "compile".to_string(),
    ]
}

fn default_artifacts_dir() -> String {
    "artifacts/contracts".to_string()
}

impl Config {
    /// Load configuration from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Find and load `chainlift.yml` (or `.yaml`) in the given directory.
    pub fn discover(dir: &Path) -> Result<Self> {
        for name in [CONFIG_FILENAME, CONFIG_FILENAME_ALT] {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Self::load(&candidate);
            }
        }
        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// A complete config with placeholder publisher endpoint, used by
    /// `init` scaffolding and tests.
    pub fn template() -> Self {
        Self {
            target_env: default_target_env(),
            result_domain: default_result_domain(),
            publisher: PublisherConfig {
                host: "publisher.example.test".to_string(),
                port: default_publisher_port(),
                api_key: None,
            },
            build: BuildConfig::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.target_env.is_empty() {
            return Err(Error::InvalidConfig("target_env cannot be empty".into()));
        }
        if self.publisher.host.is_empty() {
            return Err(Error::InvalidConfig("publisher.host cannot be empty".into()));
        }
        if self.build.command.is_empty() {
            return Err(Error::InvalidConfig("build.command cannot be empty".into()));
        }
        Ok(())
    }

    /// Result URL minted for a successfully deployed project.
    pub fn result_url(&self, project_name: &str) -> String {
        format!("https://{}.{}", project_name, self.result_domain)
    }
}

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, template_yaml())?;

    Ok(())
}

fn template_yaml() -> String {
    let config = Config::template();
    format!(
        r#"target_env: {}
result_domain: {}
publisher:
  host: {}
  port: {}
  # api_key: <bearer token for the publish API>
build:
  sources_dir: {}
  config_file: {}
  command: [npx, hardhat, compile]
  artifacts_dir: {}
"#,
        config.target_env,
        config.result_domain,
        config.publisher.host,
        config.publisher.port,
        config.build.sources_dir,
        config.build.config_file,
        config.build.artifacts_dir,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_yaml_round_trips() {
        let config: Config = serde_yaml::from_str(&template_yaml()).unwrap();
        assert_eq!(config.target_env, "sepolia");
        assert_eq!(config.build.sources_dir, "contracts");
        assert_eq!(config.build.command, ["npx", "hardhat", "compile"]);
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let config: Config = serde_yaml::from_str("publisher:\n  host: pub.test\n").unwrap();
        assert_eq!(config.target_env, "sepolia");
        assert_eq!(config.publisher.port, 8080);
        assert_eq!(config.build.config_file, "hardhat.config.js");
        assert_eq!(config.build.artifacts_dir, "artifacts/contracts");
    }

    #[test]
    fn result_url_uses_configured_domain() {
        let mut config = Config::template();
        config.result_domain = "deploys.example.test".to_string();
        assert_eq!(config.result_url("demo"), "https://demo.deploys.example.test");
    }

    #[test]
    fn empty_build_command_is_rejected() {
        let config: Config = serde_yaml::from_str(
            "publisher:\n  host: pub.test\nbuild:\n  command: []\n",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
