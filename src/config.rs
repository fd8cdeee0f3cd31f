use crate::cli::Cli;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "VALIDATE_XML_DIR_";

/// File names searched in the current directory when `--config` is absent
pub const CONFIG_FILE_NAMES: [&str; 4] = [
    "validate-xml-dir.toml",
    ".validate-xml-dir.toml",
    "validate-xml-dir.json",
    ".validate-xml-dir.json",
];

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Run configuration: immutable once resolved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Emit debug-level diagnostics
    pub verbose: bool,
    /// Directory scanned for `*.xsd` files
    pub schema_directory: PathBuf,
    /// Directory scanned for `*.xml` files
    pub xml_directory: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: false,
            schema_directory: PathBuf::from("."),
            xml_directory: PathBuf::from("."),
        }
    }
}

/// Loads and merges configuration layers
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment -> CLI
    pub fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(cli, &SystemEnvProvider, Path::new("."))
    }

    /// Same as [`ConfigManager::load_config`] with an explicit environment and
    /// search directory for configuration files
    pub fn load_config_with(
        cli: &Cli,
        env: &impl EnvProvider,
        search_dir: &Path,
    ) -> Result<Config> {
        let mut config = match &cli.config {
            Some(path) => Self::load_from_file(path)?,
            None => Self::find_config_file(search_dir)?.unwrap_or_default(),
        };

        config = Self::apply_environment_overrides_with(env, config)?;
        config = Self::merge_with_cli(config, cli);

        Self::validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find a configuration file in `dir`
    pub fn find_config_file(dir: &Path) -> Result<Option<Config>> {
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if path.is_file() {
                return Ok(Some(Self::load_from_file(&path)?));
            }
        }
        Ok(None)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        let key = |name: &str| format!("{ENV_PREFIX}{name}");

        if let Some(verbose) = env.get(&key("VERBOSE")) {
            config.verbose = verbose.trim().parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid {} value: {}", key("VERBOSE"), verbose))
            })?;
        }

        if let Some(schemes) = env.get(&key("SCHEMES")) {
            config.schema_directory = PathBuf::from(schemes);
        }

        if let Some(xml) = env.get(&key("XML")) {
            config.xml_directory = PathBuf::from(xml);
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if cli.verbose {
            config.verbose = true;
        }
        if let Some(schemes) = &cli.schemes {
            config.schema_directory = schemes.clone();
        }
        if let Some(xml) = &cli.xml {
            config.xml_directory = xml.clone();
        }
        config
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if config.schema_directory.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "Schema directory must not be empty".to_string(),
            ));
        }
        if config.xml_directory.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "XML directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    /// Mock environment variable provider for testing
    #[derive(Default)]
    struct MockEnvProvider {
        vars: HashMap<String, String>,
    }

    impl MockEnvProvider {
        fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
            self.vars.insert(key.into(), value.into());
        }
    }

    impl EnvProvider for MockEnvProvider {
        fn get(&self, key: &str) -> Option<String> {
            self.vars.get(key).cloned()
        }
    }

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["validate-xml-dir"];
        argv.extend_from_slice(args);
        Cli::resolve(argv).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.verbose);
        assert_eq!(config.schema_directory, PathBuf::from("."));
        assert_eq!(config.xml_directory, PathBuf::from("."));
    }

    #[test]
    fn test_defaults_without_any_layer() {
        let temp_dir = TempDir::new().unwrap();
        let config =
            ConfigManager::load_config_with(&cli(&[]), &MockEnvProvider::default(), temp_dir.path())
                .unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_toml_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("run.toml");
        fs::write(
            &config_path,
            r#"
verbose = true
schema_directory = "/srv/schemas"
xml_directory = "/srv/documents"
"#,
        )
        .unwrap();

        let config = ConfigManager::load_from_file(&config_path).unwrap();

        assert!(config.verbose);
        assert_eq!(config.schema_directory, PathBuf::from("/srv/schemas"));
        assert_eq!(config.xml_directory, PathBuf::from("/srv/documents"));
    }

    #[test]
    fn test_load_partial_json_config_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("run.json");
        fs::write(&config_path, r#"{ "xml_directory": "incoming" }"#).unwrap();

        let config = ConfigManager::load_from_file(&config_path).unwrap();

        assert!(!config.verbose);
        assert_eq!(config.schema_directory, PathBuf::from("."));
        assert_eq!(config.xml_directory, PathBuf::from("incoming"));
    }

    #[test]
    fn test_unsupported_file_format() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "verbose: true").unwrap();

        match ConfigManager::load_from_file(&config_path) {
            Err(ConfigError::UnsupportedFormat(ext)) => assert_eq!(ext, "yaml"),
            other => panic!("Expected UnsupportedFormat error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "invalid toml [[[").unwrap();

        assert!(matches!(
            ConfigManager::load_from_file(&config_path),
            Err(ConfigError::TomlParsing(_))
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let result = ConfigManager::load_from_file(Path::new("/nonexistent/run.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_find_config_file_in_search_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(".validate-xml-dir.toml"),
            "schema_directory = \"found\"",
        )
        .unwrap();

        let config = ConfigManager::find_config_file(temp_dir.path())
            .unwrap()
            .unwrap();
        assert_eq!(config.schema_directory, PathBuf::from("found"));
    }

    #[test]
    fn test_environment_overrides() {
        let mut env = MockEnvProvider::default();
        env.set("VALIDATE_XML_DIR_VERBOSE", "true");
        env.set("VALIDATE_XML_DIR_SCHEMES", "env-schemas");
        env.set("VALIDATE_XML_DIR_XML", "env-xml");

        let config =
            ConfigManager::apply_environment_overrides_with(&env, Config::default()).unwrap();

        assert!(config.verbose);
        assert_eq!(config.schema_directory, PathBuf::from("env-schemas"));
        assert_eq!(config.xml_directory, PathBuf::from("env-xml"));
    }

    #[test]
    fn test_invalid_environment_value() {
        let mut env = MockEnvProvider::default();
        env.set("VALIDATE_XML_DIR_VERBOSE", "sometimes");

        match ConfigManager::apply_environment_overrides_with(&env, Config::default()) {
            Err(ConfigError::Environment(message)) => {
                assert!(message.contains("VALIDATE_XML_DIR_VERBOSE"))
            }
            other => panic!("Expected Environment error, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_file_env_cli() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("run.toml");
        fs::write(
            &config_path,
            "schema_directory = \"file-schemas\"\nxml_directory = \"file-xml\"\n",
        )
        .unwrap();

        let mut env = MockEnvProvider::default();
        env.set("VALIDATE_XML_DIR_XML", "env-xml");

        let config_arg = config_path.to_string_lossy().to_string();
        let cli = cli(&["--config", config_arg.as_str(), "--schemes", "cli-schemas"]);

        let config = ConfigManager::load_config_with(&cli, &env, temp_dir.path()).unwrap();

        assert_eq!(config.schema_directory, PathBuf::from("cli-schemas"));
        assert_eq!(config.xml_directory, PathBuf::from("env-xml"));
        assert!(!config.verbose);
    }

    #[test]
    fn test_empty_directory_rejected() {
        let config = Config {
            xml_directory: PathBuf::new(),
            ..Config::default()
        };

        assert!(matches!(
            ConfigManager::validate_config(&config),
            Err(ConfigError::Validation(_))
        ));
    }
}
