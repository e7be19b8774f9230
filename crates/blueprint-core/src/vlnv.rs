//! VLNV type references.
//!
//! A VLNV (vendor, library, name, version) uniquely identifies a document in
//! the component library. Instances and typed endpoints carry VLNVs; the
//! library service resolves them to concrete definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error produced when parsing a VLNV from its textual form.
#[derive(Debug, Error, PartialEq)]
pub enum VlnvError {
    #[error("expected four colon-separated fields, found {0}")]
    FieldCount(usize),

    #[error("VLNV field may not be empty")]
    EmptyField,
}

/// A vendor:library:name:version reference to a library document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vlnv {
    vendor: String,
    library: String,
    name: String,
    version: String,
}

impl Vlnv {
    /// Creates a VLNV from its four fields.
    pub fn new(
        vendor: impl Into<String>,
        library: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            vendor: vendor.into(),
            library: library.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for Vlnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.vendor, self.library, self.name, self.version
        )
    }
}

impl FromStr for Vlnv {
    type Err = VlnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(':').collect();

        if fields.len() != 4 {
            return Err(VlnvError::FieldCount(fields.len()));
        }

        if fields.iter().any(|f| f.is_empty()) {
            return Err(VlnvError::EmptyField);
        }

        Ok(Vlnv::new(fields[0], fields[1], fields[2], fields[3]))
    }
}
