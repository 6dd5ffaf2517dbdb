//! Document and chunk types with source tracking

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// HTML document
    Html,
    /// CSV file
    Csv,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            "html" | "htm" => Self::Html,
            "csv" => Self::Csv,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a path's extension
    pub fn from_path(path: &std::path::Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Check if this build can parse the type
    pub fn is_supported(&self) -> bool {
        match self {
            Self::Pdf => cfg!(feature = "pdf"),
            Self::Docx => cfg!(feature = "docx"),
            Self::Unknown => false,
            _ => true,
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Txt => "Text File",
            Self::Markdown => "Markdown",
            Self::Html => "HTML",
            Self::Csv => "CSV",
            Self::Unknown => "Unknown",
        }
    }
}

/// A loaded source document. Discarded once it has been chunked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Path relative to the document directory, used as the source reference
    pub id: String,
    /// Absolute or configured path on disk
    pub path: PathBuf,
    /// File type
    pub file_type: FileType,
    /// Extracted plain text
    pub content: String,
}

impl Document {
    /// Create a document from extracted text
    pub fn new(id: impl Into<String>, path: PathBuf, file_type: FileType, content: String) -> Self {
        Self {
            id: id.into(),
            path,
            file_type,
            content,
        }
    }
}

/// A bounded slice of a document's text, the unit of retrieval
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Stable identifier derived from document id, ordinal and text
    pub id: String,
    /// Source document reference
    pub document_id: String,
    /// Position of this chunk within its document
    pub chunk_index: u32,
    /// Chunk text (non-empty)
    pub content: String,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(document_id: impl Into<String>, chunk_index: u32, content: String) -> Self {
        let document_id = document_id.into();
        let mut hasher = Sha256::new();
        hasher.update(document_id.as_bytes());
        hasher.update(chunk_index.to_le_bytes());
        hasher.update(content.as_bytes());
        let digest = hasher.finalize();

        Self {
            id: hex::encode(&digest[..16]),
            document_id,
            chunk_index,
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_extension("MD"), FileType::Markdown);
        assert_eq!(FileType::from_extension("htm"), FileType::Html);
        assert_eq!(FileType::from_extension("exe"), FileType::Unknown);
        assert_eq!(
            FileType::from_path(std::path::Path::new("notes/readme.txt")),
            FileType::Txt
        );
        assert_eq!(FileType::from_path(std::path::Path::new("Makefile")), FileType::Unknown);
        assert!(!FileType::Unknown.is_supported());
        assert!(FileType::Csv.is_supported());
    }

    #[test]
    fn test_chunk_ids_are_stable() {
        let a = Chunk::new("guide.md", 0, "Hello world".to_string());
        let b = Chunk::new("guide.md", 0, "Hello world".to_string());
        let c = Chunk::new("guide.md", 1, "Hello world".to_string());

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.id.len(), 32);
    }
}
