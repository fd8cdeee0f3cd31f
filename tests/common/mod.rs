#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;
use validate_xml_dir::{Config, Reporter};

/// Severity of a recorded line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
    Debug,
}

/// Reporter that keeps every line for later assertions
#[derive(Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<(Level, String)>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn messages(&self, level: Level) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    /// Info and error lines, in order, without debug diagnostics
    pub fn visible(&self) -> Vec<(Level, String)> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l != Level::Debug)
            .collect()
    }

    fn record(&self, level: Level, message: &str) {
        self.lines.lock().unwrap().push((level, message.to_string()));
    }
}

impl Reporter for RecordingReporter {
    fn info(&self, message: &str) {
        self.record(Level::Info, message);
    }

    fn error(&self, message: &str) {
        self.record(Level::Error, message);
    }

    fn debug(&self, message: &str) {
        self.record(Level::Debug, message);
    }
}

pub const ROOT_ID_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="root">
        <xs:complexType>
            <xs:sequence>
                <xs:element name="id" type="xs:integer"/>
            </xs:sequence>
        </xs:complexType>
    </xs:element>
</xs:schema>"#;

pub const ORDER_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="order">
        <xs:complexType>
            <xs:sequence>
                <xs:element name="qty" type="xs:positiveInteger" maxOccurs="unbounded"/>
            </xs:sequence>
        </xs:complexType>
    </xs:element>
</xs:schema>"#;

pub const GOOD_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<root><id>42</id></root>"#;

pub const BAD_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<root><id>forty-two</id></root>"#;

pub const MALFORMED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<root><id>1</id>"#;

/// Schema and document directories in one temporary tree
pub struct Workspace {
    _root: TempDir,
    pub schemas: PathBuf,
    pub documents: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_schema_dir("schemas")
    }

    /// Workspace whose schema directory has the given name
    pub fn with_schema_dir(name: &str) -> Self {
        let root = TempDir::new().unwrap();
        let schemas = root.path().join(name);
        let documents = root.path().join("documents");
        fs::create_dir(&schemas).unwrap();
        fs::create_dir(&documents).unwrap();
        Self {
            _root: root,
            schemas,
            documents,
        }
    }

    pub fn schema(&self, name: &str, content: &str) -> PathBuf {
        write_file(&self.schemas, name, content)
    }

    pub fn document(&self, name: &str, content: &str) -> PathBuf {
        write_file(&self.documents, name, content)
    }

    pub fn config(&self) -> Config {
        Config {
            verbose: false,
            schema_directory: self.schemas.clone(),
            xml_directory: self.documents.clone(),
        }
    }
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}
