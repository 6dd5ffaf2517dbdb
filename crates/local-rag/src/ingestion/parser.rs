//! Multi-format text extraction

use pulldown_cmark::{Event, Parser, TagEnd};

use crate::error::{Error, Result};
use crate::types::FileType;

/// Extracts plain text from supported file formats
pub struct FileParser;

impl FileParser {
    /// Extract text from `data`, dispatching on `file_type`.
    /// `name` is only used in error messages.
    pub fn parse(name: &str, file_type: FileType, data: &[u8]) -> Result<String> {
        if !file_type.is_supported() {
            return Err(Error::load(
                name,
                format!("{} files are not supported by this build", file_type.display_name()),
            ));
        }

        match file_type {
            FileType::Txt => Ok(Self::parse_text(data)),
            FileType::Markdown => Ok(Self::parse_markdown(data)),
            FileType::Html => Self::parse_html(name, data),
            FileType::Csv => Self::parse_csv(name, data),
            #[cfg(feature = "pdf")]
            FileType::Pdf => Self::parse_pdf(name, data),
            #[cfg(feature = "docx")]
            FileType::Docx => Self::parse_docx(name, data),
            _ => Err(Error::load(name, "File type not supported")),
        }
    }

    /// Parse plain text
    fn parse_text(data: &[u8]) -> String {
        String::from_utf8_lossy(data).replace('\0', "")
    }

    /// Render markdown to plain text, keeping block structure as line breaks
    fn parse_markdown(data: &[u8]) -> String {
        let source = String::from_utf8_lossy(data);
        let mut content = String::new();

        for event in Parser::new(&source) {
            match event {
                Event::Text(text) | Event::Code(text) => content.push_str(&text),
                Event::SoftBreak => content.push(' '),
                Event::HardBreak => content.push('\n'),
                Event::End(
                    TagEnd::Paragraph
                    | TagEnd::Heading(_)
                    | TagEnd::Item
                    | TagEnd::CodeBlock
                    | TagEnd::TableRow,
                ) => content.push('\n'),
                Event::End(TagEnd::TableCell) => content.push_str(" | "),
                _ => {}
            }
        }

        content
    }

    /// Parse HTML document body text
    fn parse_html(name: &str, data: &[u8]) -> Result<String> {
        let html = String::from_utf8_lossy(data);
        let document = scraper::Html::parse_document(&html);

        let body_selector = scraper::Selector::parse("body")
            .map_err(|e| Error::load(name, format!("Invalid selector: {}", e)))?;
        let mut content = String::new();

        if let Some(body) = document.select(&body_selector).next() {
            for text in body.text() {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if !content.is_empty() {
                        content.push(' ');
                    }
                    content.push_str(trimmed);
                }
            }
        }

        Ok(content)
    }

    /// Parse CSV into one ` | `-joined line per record
    fn parse_csv(name: &str, data: &[u8]) -> Result<String> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);
        let mut content = String::new();

        let headers = reader
            .headers()
            .map_err(|e| Error::load(name, format!("Invalid CSV header: {}", e)))?;
        content.push_str(&headers.iter().collect::<Vec<_>>().join(" | "));
        content.push('\n');

        for result in reader.records() {
            let record = result.map_err(|e| Error::load(name, format!("Invalid CSV record: {}", e)))?;
            content.push_str(&record.iter().collect::<Vec<_>>().join(" | "));
            content.push('\n');
        }

        Ok(content)
    }

    /// Parse PDF, falling back to lopdf when pdf-extract fails
    #[cfg(feature = "pdf")]
    fn parse_pdf(name: &str, data: &[u8]) -> Result<String> {
        // pdf-extract panics on some malformed fonts
        let raw = match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data)) {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                tracing::warn!("pdf-extract failed for {}: {}, trying fallback", name, e);
                Self::extract_pdf_text_fallback(name, data)?
            }
            Err(_) => {
                tracing::warn!("pdf-extract panicked on {}, trying fallback", name);
                Self::extract_pdf_text_fallback(name, data)?
            }
        };

        let content = raw
            .replace('\0', "")
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if content.is_empty() {
            return Err(Error::load(
                name,
                "No text content could be extracted from PDF (image-based or encrypted?)",
            ));
        }

        Ok(content)
    }

    /// Page-by-page extraction with lopdf
    #[cfg(feature = "pdf")]
    fn extract_pdf_text_fallback(name: &str, data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::load(name, format!("Failed to load PDF: {}", e)))?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let mut all_text = String::new();

        for page in page_numbers {
            match doc.extract_text(&[page]) {
                Ok(text) => {
                    all_text.push_str(&text);
                    all_text.push('\n');
                }
                Err(e) => tracing::debug!("Could not extract page {} of {}: {}", page, name, e),
            }
        }

        Ok(all_text)
    }

    /// Parse DOCX paragraphs
    #[cfg(feature = "docx")]
    fn parse_docx(name: &str, data: &[u8]) -> Result<String> {
        let doc = docx_rs::read_docx(data).map_err(|e| Error::load(name, e.to_string()))?;
        let mut content = String::new();

        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }

        Ok(content)
    }
}
