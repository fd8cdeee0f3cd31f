//! Sequential Validation Engine
//!
//! Documents are validated one at a time, in discovery order, against the
//! schema set compiled once up front. The batch is a lazy sequence of
//! validation attempts: the first document that cannot be parsed (or that
//! libxml2 fails on internally) abandons the sequence, so later documents are
//! never opened and never reported.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::{LibXml2Error, Result, ValidationError};
use crate::file_discovery::FileDiscovery;
use crate::libxml2::{LibXml2Wrapper, ValidationResult};
use crate::reporter::Reporter;
use crate::schema_set::{CompiledSchemaSet, SchemaSetBuilder};

/// Result of validating a single file
#[derive(Debug, Clone, PartialEq)]
pub struct FileValidationResult {
    /// Path to the validated file
    pub path: PathBuf,
    /// Number of schema violations reported for the file
    pub violations: usize,
    /// Duration of parsing plus validation
    pub duration: Duration,
}

impl FileValidationResult {
    pub fn is_valid(&self) -> bool {
        self.violations == 0
    }
}

/// Outcome of one pass over the document directory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResults {
    /// One entry per document validated, in order
    pub file_results: Vec<FileValidationResult>,
    /// Document whose failure abandoned the rest of the batch
    pub abandoned_at: Option<PathBuf>,
    /// Documents discovered, whether attempted or not
    pub discovered_files: usize,
    /// Wall-clock duration of the pass
    pub total_duration: Duration,
}

impl ValidationResults {
    /// Total violations over every validated document
    pub fn total_violations(&self) -> usize {
        self.file_results.iter().map(|r| r.violations).sum()
    }

    /// Whether a batch-fatal failure cut the pass short
    pub fn was_truncated(&self) -> bool {
        self.abandoned_at.is_some()
    }

    /// Documents never attempted because the batch was abandoned
    pub fn skipped_files(&self) -> usize {
        let attempted = self.file_results.len() + usize::from(self.was_truncated());
        self.discovered_files.saturating_sub(attempted)
    }
}

/// Validates the documents of a directory against a compiled schema set
pub struct DocumentValidator<'a> {
    wrapper: &'a LibXml2Wrapper,
    schemas: &'a CompiledSchemaSet,
    discovery: FileDiscovery,
}

impl<'a> DocumentValidator<'a> {
    pub fn new(wrapper: &'a LibXml2Wrapper, schemas: &'a CompiledSchemaSet) -> Result<Self> {
        Ok(Self {
            wrapper,
            schemas,
            discovery: FileDiscovery::documents()?,
        })
    }

    /// Parse and validate one document.
    ///
    /// Violations go to `reporter` as error lines holding only the message.
    /// An `Err` means the document could not be parsed or libxml2 failed.
    pub fn validate_file(
        &self,
        path: &Path,
        reporter: &dyn Reporter,
    ) -> Result<FileValidationResult> {
        let start = Instant::now();
        reporter.info(&format!("validating {} file...", path.display()));

        let document =
            self.wrapper
                .parse_file(path)
                .map_err(|e| ValidationError::DocumentParse {
                    file: path.to_path_buf(),
                    details: e.to_string(),
                })?;

        let result = self
            .schemas
            .validate(self.wrapper, &document, &mut |message| reporter.error(message))?;

        if let ValidationResult::InternalError { code } = result {
            return Err(LibXml2Error::ValidationFailed {
                code,
                file: path.to_path_buf(),
            }
            .into());
        }

        let file_result = FileValidationResult {
            path: path.to_path_buf(),
            violations: result.violations(),
            duration: start.elapsed(),
        };
        reporter.debug(&format!(
            "{}: {} violation(s) in {:?}",
            path.display(),
            file_result.violations,
            file_result.duration
        ));
        Ok(file_result)
    }

    /// Validate every `*.xml` file directly inside `dir`.
    ///
    /// A batch-fatal failure is logged as `error while validation: ...` and
    /// stops the pass; it is not returned as an error. Only a failure to list
    /// the directory is.
    pub fn validate_directory(
        &self,
        dir: &Path,
        reporter: &dyn Reporter,
    ) -> Result<ValidationResults> {
        let start = Instant::now();
        let files = self.discovery.discover_files(dir)?;

        let mut results = ValidationResults {
            discovered_files: files.len(),
            ..ValidationResults::default()
        };

        let mut attempts = files
            .iter()
            .map(|path| (path, self.validate_file(path, reporter)));

        for (path, attempt) in attempts.by_ref() {
            match attempt {
                Ok(file_result) => results.file_results.push(file_result),
                Err(err) if !err.is_batch_fatal() => return Err(err),
                Err(err) => {
                    reporter.error(&format!("error while validation: {err}"));
                    results.abandoned_at = Some(path.clone());
                    break;
                }
            }
        }

        results.total_duration = start.elapsed();
        if results.was_truncated() {
            reporter.debug(&format!(
                "batch abandoned, {} file(s) not validated",
                results.skipped_files()
            ));
        }
        Ok(results)
    }
}

/// Runs the whole pipeline for one configuration
pub struct ValidationEngine {
    wrapper: LibXml2Wrapper,
    config: Config,
}

impl ValidationEngine {
    pub fn new(config: Config) -> Self {
        Self {
            wrapper: LibXml2Wrapper::new(),
            config,
        }
    }

    /// Build the schema set, validate the document directory, then log
    /// `Validation finished`.
    ///
    /// Schema loading and directory listing failures are returned; violations
    /// and a truncated batch are not errors.
    pub fn run(&self, reporter: &dyn Reporter) -> Result<ValidationResults> {
        reporter.debug(&format!(
            "schema directory: {}, xml directory: {}",
            self.config.schema_directory.display(),
            self.config.xml_directory.display()
        ));

        let schemas = SchemaSetBuilder::new(&self.wrapper)?
            .load_directory(&self.config.schema_directory, reporter)?;

        let results = DocumentValidator::new(&self.wrapper, &schemas)?
            .validate_directory(&self.config.xml_directory, reporter)?;

        reporter.info("Validation finished");
        Ok(results)
    }
}
