//! Document loader for the configured corpus directory
//!
//! Provisioning (`prepare_directory`) and loading are separate steps:
//! loading only reads, and reports a missing or empty directory as a
//! configuration error instead of creating anything.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::parser::FileParser;
use crate::config::DocumentsConfig;
use crate::error::{Error, Result};
use crate::types::{Document, FileType};

/// Outcome of directory provisioning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryStatus {
    /// Directory was already there
    Existing,
    /// Directory was created and is therefore empty
    Created,
    /// Directory is missing and auto-creation is disabled
    Missing,
}

/// Reads every supported file under a directory into documents
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    root: PathBuf,
    recursive: bool,
    extensions: Vec<String>,
}

impl DocumentLoader {
    /// Create a loader from configuration
    pub fn new(config: &DocumentsConfig) -> Self {
        Self {
            root: config.dir.clone(),
            recursive: config.recursive,
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Create the document directory if it is missing and `auto_create` is set
    pub fn prepare_directory(config: &DocumentsConfig) -> Result<DirectoryStatus> {
        if config.dir.exists() {
            return Ok(DirectoryStatus::Existing);
        }
        if !config.auto_create {
            return Ok(DirectoryStatus::Missing);
        }

        std::fs::create_dir_all(&config.dir).map_err(|e| {
            Error::Config(format!(
                "Failed to create document directory {}: {}",
                config.dir.display(),
                e
            ))
        })?;
        tracing::info!("Created document directory {}", config.dir.display());
        Ok(DirectoryStatus::Created)
    }

    /// Load all supported documents in file-name order.
    ///
    /// Any unreadable or unparseable file aborts the whole load.
    pub fn load(&self) -> Result<Vec<Document>> {
        if !self.root.exists() {
            return Err(Error::Config(format!(
                "Document directory {} does not exist. Create it, add documents ({}) and restart.",
                self.root.display(),
                supported_extensions()
            )));
        }
        if !self.root.is_dir() {
            return Err(Error::Config(format!(
                "Document path {} is not a directory",
                self.root.display()
            )));
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        let mut documents = Vec::new();
        let mut skipped = 0usize;

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| self.root.display().to_string());
                Error::load(path, e.to_string())
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(file_type) = self.wanted_type(path) else {
                tracing::debug!("Skipping unsupported file {}", path.display());
                skipped += 1;
                continue;
            };

            if let Some(document) = self.load_file(path, file_type)? {
                documents.push(document);
            }
        }

        if documents.is_empty() {
            return Err(Error::Config(format!(
                "No documents found in {}. Add documents ({}) to this directory and restart.",
                self.root.display(),
                supported_extensions()
            )));
        }

        tracing::info!(
            "Loaded {} documents from {} ({} unsupported files skipped)",
            documents.len(),
            self.root.display(),
            skipped
        );

        Ok(documents)
    }

    /// Read and parse one file; `None` when it holds no text
    fn load_file(&self, path: &Path, file_type: FileType) -> Result<Option<Document>> {
        let id = self.document_id(path);
        let data = std::fs::read(path).map_err(|e| Error::load(&id, e.to_string()))?;
        let content = FileParser::parse(&id, file_type, &data)?;

        if content.trim().is_empty() {
            tracing::warn!("Skipping {}: no text content", id);
            return Ok(None);
        }

        tracing::debug!("Loaded {} ({}, {} bytes)", id, file_type.display_name(), data.len());
        Ok(Some(Document::new(id, path.to_path_buf(), file_type, content)))
    }

    fn wanted_type(&self, path: &Path) -> Option<FileType> {
        let file_type = FileType::from_path(path);
        if !file_type.is_supported() {
            return None;
        }

        if !self.extensions.is_empty() {
            let ext = path.extension()?.to_str()?.to_lowercase();
            if !self.extensions.contains(&ext) {
                return None;
            }
        }

        Some(file_type)
    }

    /// Path relative to the root with `/` separators
    fn document_id(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn supported_extensions() -> String {
    let mut extensions = vec![".txt", ".md", ".html", ".csv"];
    if FileType::Pdf.is_supported() {
        extensions.push(".pdf");
    }
    if FileType::Docx.is_supported() {
        extensions.push(".docx");
    }
    extensions.join(", ")
}
