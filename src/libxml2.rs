//! LibXML2 FFI Wrapper Module
//!
//! This module provides a safe wrapper around the libxml2 calls needed to
//! check documents for well-formedness and validate them against a compiled
//! XML Schema.
//!
//! No mature pure Rust library implements XML Schema (XSD) validation, so the
//! system libxml2 is used directly through FFI. Every libxml2 object handed
//! out by this module is owned by a Rust value that frees it on drop:
//!
//! - [`XmlDocument`] owns an `xmlDoc` and calls `xmlFreeDoc`
//! - [`XmlSchemaPtr`] owns an `xmlSchema` and calls `xmlSchemaFree`
//! - parser and validation contexts never escape the function that created them
//!
//! Diagnostics are captured through libxml2's structured error callbacks
//! rather than printed to stderr, so callers decide how to report them.

use std::ffi::{CStr, CString};
use std::path::Path;
use std::ptr::NonNull;
use std::sync::Once;

use libc::{c_char, c_int, c_void};

use crate::error::{LibXml2Error, LibXml2Result};

/// Global initialization flag for libxml2
///
/// libxml2's initialization functions are not reentrant, so they run exactly
/// once per process.
static LIBXML2_INIT: Once = Once::new();

/// Suppress error reports on stderr
const XML_PARSE_NOERROR: c_int = 1 << 5;
/// Suppress warning reports on stderr
const XML_PARSE_NOWARNING: c_int = 1 << 6;
/// Forbid network access while parsing
const XML_PARSE_NONET: c_int = 1 << 11;

const DOCUMENT_PARSE_OPTIONS: c_int = XML_PARSE_NOERROR | XML_PARSE_NOWARNING | XML_PARSE_NONET;

// Opaque libxml2 structures
#[repr(C)]
pub struct XmlDoc {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

#[repr(C)]
#[allow(non_camel_case_types)]
pub struct xmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut c_void,
    pub node: *mut c_void,
}

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, error: *mut xmlError)>;

// External libxml2 FFI declarations
#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    pub fn xmlInitParser();
    pub fn xmlInitGlobals();
    pub fn xmlSetStructuredErrorFunc(ctx: *mut c_void, handler: XmlStructuredErrorFunc);

    // Document parsing
    pub fn xmlNewParserCtxt() -> *mut XmlParserCtxt;
    pub fn xmlFreeParserCtxt(ctxt: *mut XmlParserCtxt);
    pub fn xmlCtxtReadFile(
        ctxt: *mut XmlParserCtxt,
        filename: *const c_char,
        encoding: *const c_char,
        options: c_int,
    ) -> *mut XmlDoc;
    pub fn xmlCtxtGetLastError(ctx: *mut c_void) -> *const xmlError;
    pub fn xmlFreeDoc(doc: *mut XmlDoc);

    // Schema parsing
    pub fn xmlSchemaNewMemParserCtxt(
        buffer: *const c_char,
        size: c_int,
    ) -> *mut XmlSchemaParserCtxt;
    pub fn xmlSchemaSetParserStructuredErrors(
        ctxt: *mut XmlSchemaParserCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    pub fn xmlSchemaParse(ctxt: *const XmlSchemaParserCtxt) -> *mut XmlSchema;
    pub fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    pub fn xmlSchemaFree(schema: *mut XmlSchema);

    // Schema validation
    pub fn xmlSchemaNewValidCtxt(schema: *const XmlSchema) -> *mut XmlSchemaValidCtxt;
    pub fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    pub fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    pub fn xmlSchemaValidateDoc(ctxt: *mut XmlSchemaValidCtxt, doc: *mut XmlDoc) -> c_int;
}

/// Read the message of a libxml2 error, trimmed of its trailing newline.
///
/// # Safety
///
/// `error` must be null or point to a live `xmlError`.
unsafe fn error_message(error: *const xmlError) -> Option<String> {
    if error.is_null() {
        return None;
    }
    let msg_ptr = unsafe { (*error).message };
    if msg_ptr.is_null() {
        return None;
    }
    let message = unsafe { CStr::from_ptr(msg_ptr) }.to_string_lossy();
    Some(message.trim().to_string())
}

/// `xmlErrorLevel` value of a recoverable error; warnings sit below it
const XML_ERR_ERROR: c_int = 2;

/// `XML_SCHEMAV_CVC_ELT_1`: no global declaration matches the validation root
const XML_SCHEMAV_CVC_ELT_1: c_int = 1845;

/// Codes dropped while validating: a document whose root the schema set does
/// not declare is left unchecked instead of rejected.
const LAX_VALIDATION_CODES: &[c_int] = &[XML_SCHEMAV_CVC_ELT_1];

/// Receiver of structured errors for the duration of one libxml2 call
struct DiagnosticSink<'a> {
    ignored_codes: &'static [c_int],
    forward: &'a mut dyn FnMut(&str),
}

impl<'a> DiagnosticSink<'a> {
    fn new(ignored_codes: &'static [c_int], forward: &'a mut dyn FnMut(&str)) -> Self {
        Self {
            ignored_codes,
            forward,
        }
    }

    fn accepts(&self, level: c_int, code: c_int) -> bool {
        level >= XML_ERR_ERROR && !self.ignored_codes.contains(&code)
    }

    fn as_user_data(&mut self) -> *mut c_void {
        self as *mut DiagnosticSink<'a> as *mut c_void
    }
}

/// Structured error callback forwarding error-level messages to a Rust sink.
///
/// `user_data` is a `*mut DiagnosticSink` owned by the caller's stack frame
/// for the whole libxml2 call.
unsafe extern "C" fn structured_error_callback(user_data: *mut c_void, error: *mut xmlError) {
    if user_data.is_null() || error.is_null() {
        return;
    }
    let sink = unsafe { &mut *(user_data as *mut DiagnosticSink<'_>) };
    let (level, code) = unsafe { ((*error).level, (*error).code) };
    if !sink.accepts(level, code) {
        return;
    }
    if let Some(message) = unsafe { error_message(error) } {
        (sink.forward)(&message);
    }
}

/// Global handler for errors raised outside any of our contexts, such as
/// loading an included schema. They are reported again by the schema parser.
unsafe extern "C" fn discard_error(_user_data: *mut c_void, _error: *mut xmlError) {}

/// Keep libxml2 off stderr. The global handler is per thread in libxml2, so
/// it is installed before each call rather than once.
fn silence_global_errors() {
    unsafe { xmlSetStructuredErrorFunc(std::ptr::null_mut(), Some(discard_error)) }
}

fn path_to_cstring(path: &Path) -> LibXml2Result<CString> {
    path.to_str()
        .and_then(|s| CString::new(s).ok())
        .ok_or_else(|| LibXml2Error::InvalidPath {
            path: path.to_path_buf(),
        })
}

/// A parsed XML document tree, freed when dropped
#[derive(Debug)]
pub struct XmlDocument {
    ptr: NonNull<XmlDoc>,
}

impl XmlDocument {
    pub(crate) fn as_ptr(&self) -> *mut XmlDoc {
        self.ptr.as_ptr()
    }
}

impl Drop for XmlDocument {
    fn drop(&mut self) {
        unsafe { xmlFreeDoc(self.ptr.as_ptr()) }
    }
}

/// Owned pointer to a compiled libxml2 schema, freed when dropped
#[derive(Debug)]
pub struct XmlSchemaPtr {
    ptr: NonNull<XmlSchema>,
}

impl XmlSchemaPtr {
    /// # Safety
    ///
    /// `ptr` must have been returned by `xmlSchemaParse` and must not be freed
    /// by anyone else.
    unsafe fn from_raw(ptr: *mut XmlSchema) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| XmlSchemaPtr { ptr })
    }

    pub(crate) fn as_ptr(&self) -> *const XmlSchema {
        self.ptr.as_ptr()
    }
}

impl Drop for XmlSchemaPtr {
    fn drop(&mut self) {
        unsafe { xmlSchemaFree(self.ptr.as_ptr()) }
    }
}

/// Validation result from libxml2
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Validation succeeded (return code 0)
    Valid,
    /// Validation failed with schema violations (return code > 0)
    Invalid { violations: usize },
    /// Internal error occurred (return code < 0)
    InternalError { code: i32 },
}

impl ValidationResult {
    /// Create a ValidationResult from the libxml2 return code and the number
    /// of violation messages reported during the call.
    ///
    /// A positive code with nothing reported means every event was dropped
    /// as lax, so the document counts as valid.
    pub fn from_code(code: c_int, violations: usize) -> Self {
        match code {
            0 => ValidationResult::Valid,
            n if n > 0 && violations == 0 => ValidationResult::Valid,
            n if n > 0 => ValidationResult::Invalid { violations },
            n => ValidationResult::InternalError { code: n },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ValidationResult::Invalid { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ValidationResult::InternalError { .. })
    }

    /// Number of violations reported, zero unless `Invalid`
    pub fn violations(&self) -> usize {
        match self {
            ValidationResult::Invalid { violations } => *violations,
            _ => 0,
        }
    }
}

/// Safe access to the libxml2 parser, schema compiler and validator
pub struct LibXml2Wrapper {
    _private: (),
}

impl LibXml2Wrapper {
    /// Create a new wrapper, initializing libxml2 on first use
    pub fn new() -> Self {
        LIBXML2_INIT.call_once(|| unsafe {
            xmlInitParser();
            xmlInitGlobals();
        });

        LibXml2Wrapper { _private: () }
    }

    /// Parse a file into a document tree.
    ///
    /// Fails with [`LibXml2Error::NotWellFormed`] when the file cannot be read
    /// or is not well-formed XML. Nothing is printed on stderr.
    pub fn parse_file(&self, path: &Path) -> LibXml2Result<XmlDocument> {
        let c_path = path_to_cstring(path)?;
        silence_global_errors();

        unsafe {
            let ctxt = xmlNewParserCtxt();
            if ctxt.is_null() {
                return Err(LibXml2Error::ParserContextCreationFailed);
            }

            let doc = xmlCtxtReadFile(
                ctxt,
                c_path.as_ptr(),
                std::ptr::null(),
                DOCUMENT_PARSE_OPTIONS,
            );

            let result = match NonNull::new(doc) {
                Some(ptr) => Ok(XmlDocument { ptr }),
                None => {
                    let last_error = xmlCtxtGetLastError(ctxt as *mut c_void);
                    Err(LibXml2Error::NotWellFormed {
                        details: describe_parse_error(last_error),
                    })
                }
            };

            // The last error lives inside the context, so it is read first.
            xmlFreeParserCtxt(ctxt);
            result
        }
    }

    /// Compile an XML schema held in memory.
    ///
    /// Every diagnostic libxml2 emits while compiling is collected into the
    /// returned error.
    pub fn parse_schema_from_memory(&self, schema_data: &[u8]) -> LibXml2Result<XmlSchemaPtr> {
        let size = c_int::try_from(schema_data.len()).map_err(|_| LibXml2Error::MemoryAllocation)?;
        silence_global_errors();
        let mut messages: Vec<String> = Vec::new();

        let schema = unsafe {
            let parser_ctxt =
                xmlSchemaNewMemParserCtxt(schema_data.as_ptr() as *const c_char, size);
            if parser_ctxt.is_null() {
                return Err(LibXml2Error::MemoryAllocation);
            }

            let mut collect = |message: &str| messages.push(message.to_string());
            let mut sink = DiagnosticSink::new(&[], &mut collect);
            let sink_ptr = sink.as_user_data();

            xmlSchemaSetParserStructuredErrors(
                parser_ctxt,
                Some(structured_error_callback),
                sink_ptr,
            );

            let schema_ptr = xmlSchemaParse(parser_ctxt);
            xmlSchemaFreeParserCtxt(parser_ctxt);
            XmlSchemaPtr::from_raw(schema_ptr)
        };

        schema.ok_or(LibXml2Error::SchemaParseFailed { messages })
    }

    /// Validate a parsed document against a compiled schema.
    ///
    /// Each violation message is passed to `on_violation` as libxml2 reports
    /// it. A fresh validation context is created per call.
    pub fn validate_document(
        &self,
        schema: &XmlSchemaPtr,
        document: &XmlDocument,
        on_violation: &mut dyn FnMut(&str),
    ) -> LibXml2Result<ValidationResult> {
        let mut violations = 0usize;
        silence_global_errors();
        let mut counting = |message: &str| {
            violations += 1;
            on_violation(message);
        };

        let result_code = unsafe {
            let valid_ctxt = xmlSchemaNewValidCtxt(schema.as_ptr());
            if valid_ctxt.is_null() {
                return Err(LibXml2Error::ValidationContextCreationFailed);
            }

            let mut sink = DiagnosticSink::new(LAX_VALIDATION_CODES, &mut counting);
            let sink_ptr = sink.as_user_data();

            xmlSchemaSetValidStructuredErrors(
                valid_ctxt,
                Some(structured_error_callback),
                sink_ptr,
            );

            let code = xmlSchemaValidateDoc(valid_ctxt, document.as_ptr());
            xmlSchemaFreeValidCtxt(valid_ctxt);
            code
        };

        Ok(ValidationResult::from_code(result_code, violations))
    }
}

impl Default for LibXml2Wrapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn the parser's last error into a single line, appending the line number
/// when libxml2 knows it.
///
/// # Safety
///
/// `error` must be null or point to a live `xmlError`.
unsafe fn describe_parse_error(error: *const xmlError) -> String {
    let message = unsafe { error_message(error) };
    let line = if error.is_null() {
        0
    } else {
        unsafe { (*error).line }
    };

    match message {
        Some(message) if line > 0 => format!("{message} (line {line})"),
        Some(message) => message,
        None => "document could not be parsed".to_string(),
    }
}
