//! CV document assembler.
//!
//! Concatenates the header template, the section fragments in a fixed order
//! and the footer template, then writes the result to disk atomically.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use academiccv_shared::{CvError, Result};

/// CV sections in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Heading,
    Education,
    Employment,
    Distinctions,
    Editorial,
    Memberships,
    Service,
    Funding,
    Teaching,
    Publications,
    Conferences,
    Talks,
}

impl Section {
    /// Order of sections in the assembled document.
    pub const ORDER: [Section; 12] = [
        Section::Heading,
        Section::Education,
        Section::Employment,
        Section::Distinctions,
        Section::Editorial,
        Section::Memberships,
        Section::Service,
        Section::Funding,
        Section::Teaching,
        Section::Publications,
        Section::Conferences,
        Section::Talks,
    ];
}

/// Rendered fragments keyed by section. Sections never set are left out.
#[derive(Debug, Clone, Default)]
pub struct Fragments {
    parts: HashMap<Section, String>,
}

impl Fragments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, section: Section, text: String) {
        self.parts.insert(section, text);
    }

    /// Fragment for a section; empty when unset.
    pub fn get(&self, section: Section) -> &str {
        self.parts.get(&section).map(String::as_str).unwrap_or_default()
    }
}

/// Result of writing the document.
#[derive(Debug, Clone, serde::Serialize)]
pub struct WrittenDocument {
    pub path: PathBuf,
    pub size_bytes: usize,
    pub sha256: String,
}

/// Header, every fragment in [`Section::ORDER`], then footer. Fragment
/// contents are not inspected.
pub fn assemble_document(header: &str, fragments: &Fragments, footer: &str) -> String {
    let body_len: usize = Section::ORDER.iter().map(|s| fragments.get(*s).len()).sum();
    let mut doc = String::with_capacity(header.len() + body_len + footer.len());

    doc.push_str(header);
    for section in Section::ORDER {
        doc.push_str(fragments.get(section));
    }
    doc.push_str(footer);
    doc
}

/// Read a header or footer template.
pub fn read_template(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CvError::io(path, e))
}

/// Write the document via a temp file and rename, returning its checksum.
#[instrument(skip_all, fields(path = %path.display(), size = text.len()))]
pub fn write_document(path: &Path, text: &str) -> Result<WrittenDocument> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| CvError::io(&dir, e))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| CvError::validation(format!("output path has no file name: {}", path.display())))?
        .to_string_lossy()
        .into_owned();
    let temp = dir.join(format!(".{file_name}.tmp"));

    std::fs::write(&temp, text).map_err(|e| CvError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| CvError::io(path, e))?;

    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let sha256 = format!("{:x}", hasher.finalize());

    debug!(%sha256, "document written");
    info!(path = %path.display(), size = text.len(), "wrote CV document");

    Ok(WrittenDocument {
        path: path.to_path_buf(),
        size_bytes: text.len(),
        sha256,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
