//! Combined schema set
//!
//! Every `*.xsd` file of the schema directory joins a single pool with no
//! target namespace. libxml2 compiles one schema document at a time, so the
//! pool is compiled from a generated driver schema that `xs:include`s each
//! added file by absolute path:
//!
//! ```xml
//! <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
//!   <xs:include schemaLocation="file:///abs/path/a.xsd"/>
//!   <xs:include schemaLocation="file:///abs/path/b.xsd"/>
//! </xs:schema>
//! ```
//!
//! Locations are percent-encoded `file://` URIs, since libxml2 resolves
//! `schemaLocation` as a URI reference.
//!
//! A file declaring another target namespace, or two files declaring the
//! same global component, make compilation fail.

use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{LibXml2Error, Result, ValidationError};
use crate::file_discovery::FileDiscovery;
use crate::libxml2::{LibXml2Wrapper, ValidationResult, XmlDocument, XmlSchemaPtr};
use crate::reporter::Reporter;

/// Schema files accumulated before compilation
#[derive(Debug, Default)]
pub struct SchemaSet {
    files: Vec<PathBuf>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a schema file to the pool.
    ///
    /// The file must be a well-formed XML document; it is not compiled on its
    /// own since it may reference components declared by other files.
    pub fn add(&mut self, wrapper: &LibXml2Wrapper, path: &Path) -> Result<()> {
        let absolute = path.canonicalize().map_err(|e| ValidationError::SchemaLoad {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;

        wrapper
            .parse_file(&absolute)
            .map_err(|e| ValidationError::SchemaLoad {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?;

        self.files.push(absolute);
        Ok(())
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Text of the driver schema including every added file
    pub fn driver_schema(&self) -> Result<String> {
        let mut driver = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <xs:schema xmlns:xs=\"http://www.w3.org/2001/XMLSchema\">\n",
        );
        for file in &self.files {
            let location = schema_location(file)?;
            driver.push_str(&format!(
                "  <xs:include schemaLocation=\"{}\"/>\n",
                escape_attribute(location.as_str())
            ));
        }
        driver.push_str("</xs:schema>\n");
        Ok(driver)
    }

    /// Compile the pool. The result is read-only for the rest of the run.
    pub fn compile(self, wrapper: &LibXml2Wrapper) -> Result<CompiledSchemaSet> {
        if self.files.is_empty() {
            return Ok(CompiledSchemaSet {
                files: self.files,
                schema: None,
            });
        }

        let driver = self.driver_schema()?;
        let schema = wrapper
            .parse_schema_from_memory(driver.as_bytes())
            .map_err(|e| match e {
                LibXml2Error::SchemaParseFailed { .. } => ValidationError::SchemaCompile {
                    details: e.to_string(),
                },
                other => other.into(),
            })?;

        Ok(CompiledSchemaSet {
            files: self.files,
            schema: Some(schema),
        })
    }
}

/// Compiled schema pool. Empty when no schema file was found.
#[derive(Debug)]
pub struct CompiledSchemaSet {
    files: Vec<PathBuf>,
    schema: Option<XmlSchemaPtr>,
}

impl CompiledSchemaSet {
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.schema.is_none()
    }

    /// Validate a parsed document, passing each violation message to
    /// `on_violation`. An empty set accepts every document.
    pub fn validate(
        &self,
        wrapper: &LibXml2Wrapper,
        document: &XmlDocument,
        on_violation: &mut dyn FnMut(&str),
    ) -> Result<ValidationResult> {
        match &self.schema {
            Some(schema) => Ok(wrapper.validate_document(schema, document, on_violation)?),
            None => Ok(ValidationResult::Valid),
        }
    }
}

/// Builds the combined schema set from a directory
pub struct SchemaSetBuilder<'a> {
    wrapper: &'a LibXml2Wrapper,
    discovery: FileDiscovery,
}

impl<'a> SchemaSetBuilder<'a> {
    pub fn new(wrapper: &'a LibXml2Wrapper) -> Result<Self> {
        Ok(Self {
            wrapper,
            discovery: FileDiscovery::schemas()?,
        })
    }

    /// Add every `*.xsd` file directly inside `dir`, then compile the set.
    pub fn load_directory(&self, dir: &Path, reporter: &dyn Reporter) -> Result<CompiledSchemaSet> {
        let mut set = SchemaSet::new();

        for xsd in self.discovery.discover_files(dir)? {
            reporter.info(&format!("add {} file to schema set", xsd.display()));
            set.add(self.wrapper, &xsd)?;
        }

        reporter.debug(&format!("compiling schema set of {} file(s)", set.len()));
        set.compile(self.wrapper)
    }
}

/// `file://` URI of an absolute schema path
fn schema_location(path: &Path) -> Result<Url> {
    Url::from_file_path(path).map_err(|_| ValidationError::SchemaLoad {
        path: path.to_path_buf(),
        details: "path cannot be expressed as a file URI".to_string(),
    })
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
