//! # validate-xml-dir Library
//!
//! Validates every `*.xml` file of one directory against the combined set of
//! `*.xsd` schemas found in another, using libxml2.

pub mod cli;
pub mod config;
pub mod error;
pub mod file_discovery;
pub mod libxml2;
pub mod logging;
pub mod reporter;
pub mod schema_set;
pub mod validator;

pub use cli::Cli;
pub use config::{Config, ConfigError, ConfigManager};
pub use error::{LibXml2Error, ValidationError};
pub use file_discovery::FileDiscovery;
pub use libxml2::{LibXml2Wrapper, ValidationResult};
pub use reporter::{Reporter, TracingReporter};
pub use schema_set::{CompiledSchemaSet, SchemaSet, SchemaSetBuilder};
pub use validator::{DocumentValidator, FileValidationResult, ValidationEngine, ValidationResults};

/// Run one validation pass for `config`, reporting through `reporter`.
pub fn run(config: &Config, reporter: &dyn Reporter) -> error::Result<ValidationResults> {
    ValidationEngine::new(config.clone()).run(reporter)
}
