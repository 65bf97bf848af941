//! Multi-format file parser

use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::FileType;

/// Upper bound for the pdf-extract fallback, which can hang on unusual fonts
const PDF_FALLBACK_TIMEOUT: Duration = Duration::from_secs(60);

/// Parsed file with extracted text
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// Extracted text; one entry per page for PDFs, a single entry otherwise
    pub pages: Vec<PageContent>,
    /// Total pages (PDF only)
    pub total_pages: Option<u32>,
    /// Document title (HTML only)
    pub title: Option<String>,
}

/// Content from a single page
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Page index (0-indexed)
    pub page_number: u32,
    /// Normalized text of the page
    pub content: String,
}

impl ParsedDocument {
    fn single(file_type: FileType, content: String) -> Self {
        Self {
            file_type,
            pages: vec![PageContent {
                page_number: 0,
                content,
            }],
            total_pages: None,
            title: None,
        }
    }
}

/// Multi-format file parser
pub struct FileParser;

impl FileParser {
    /// Parse a file based on its extension
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let file_type = FileType::from_path(std::path::Path::new(filename)).ok_or_else(|| {
            Error::file_parse(filename, "File type not supported")
        })?;

        let mut parsed = match file_type {
            FileType::Pdf => Self::parse_pdf(filename, data)?,
            FileType::Docx | FileType::Doc => Self::parse_docx(filename, data, file_type)?,
            FileType::Txt | FileType::Markdown => Self::parse_text(data, file_type),
            FileType::Html => Self::parse_html(filename, data)?,
        };

        for page in &mut parsed.pages {
            page.content = normalize_text(&page.content);
        }

        Ok(parsed)
    }

    /// Parse PDF page by page, falling back to whole-document extraction
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        match lopdf::Document::load_mem(data) {
            Ok(doc) => {
                let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
                let total_pages = page_numbers.len() as u32;

                let mut pages = Vec::new();
                for (index, number) in page_numbers.iter().enumerate() {
                    match doc.extract_text(&[*number]) {
                        Ok(text) if !text.trim().is_empty() => pages.push(PageContent {
                            page_number: index as u32,
                            content: text,
                        }),
                        Ok(_) => {}
                        Err(e) => {
                            tracing::debug!("{}: no text on page {}: {}", filename, number, e);
                        }
                    }
                }

                if !pages.is_empty() {
                    return Ok(ParsedDocument {
                        file_type: FileType::Pdf,
                        pages,
                        total_pages: Some(total_pages),
                        title: None,
                    });
                }

                tracing::warn!("{}: per-page extraction found no text, trying fallback", filename);
                let text = Self::extract_pdf_with_timeout(filename, data)?;
                Ok(Self::pdf_fallback_document(text, Some(total_pages)))
            }
            Err(e) => {
                tracing::warn!("{}: lopdf failed to load ({}), trying fallback", filename, e);
                let text = Self::extract_pdf_with_timeout(filename, data)?;
                Ok(Self::pdf_fallback_document(text, None))
            }
        }
    }

    fn pdf_fallback_document(text: String, total_pages: Option<u32>) -> ParsedDocument {
        let pages = if text.trim().is_empty() {
            Vec::new()
        } else {
            vec![PageContent {
                page_number: 0,
                content: text,
            }]
        };

        ParsedDocument {
            file_type: FileType::Pdf,
            pages,
            total_pages: total_pages.or(Some(1)),
            title: None,
        }
    }

    /// Run pdf-extract on its own thread so a pathological file cannot stall ingestion
    fn extract_pdf_with_timeout(filename: &str, data: &[u8]) -> Result<String> {
        use std::sync::mpsc;
        use std::thread;

        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(PDF_FALLBACK_TIMEOUT) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(Error::file_parse(filename, format!("Failed to read PDF: {}", e))),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::error!("{}: PDF extraction timed out", filename);
                Err(Error::file_parse(filename, "PDF extraction timed out"))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("{}: PDF extraction thread crashed", filename);
                Err(Error::file_parse(filename, "PDF extraction failed"))
            }
        }
    }

    /// Parse a Word document; paragraphs become lines
    fn parse_docx(filename: &str, data: &[u8], file_type: FileType) -> Result<ParsedDocument> {
        let doc = docx_rs::read_docx(data)
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;

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

        Ok(ParsedDocument::single(file_type, content))
    }

    /// Parse plain text or markdown
    fn parse_text(data: &[u8], file_type: FileType) -> ParsedDocument {
        ParsedDocument::single(file_type, String::from_utf8_lossy(data).into_owned())
    }

    /// Parse HTML body text, recording the title
    fn parse_html(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let html = String::from_utf8_lossy(data);
        let document = scraper::Html::parse_document(&html);

        let body_selector = selector(filename, "body")?;
        let title_selector = selector(filename, "title")?;

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

        let title = document
            .select(&title_selector)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty());

        let mut parsed = ParsedDocument::single(FileType::Html, content);
        parsed.title = title;
        Ok(parsed)
    }
}

fn selector(filename: &str, css: &str) -> Result<scraper::Selector> {
    scraper::Selector::parse(css)
        .map_err(|e| Error::file_parse(filename, format!("Invalid selector {}: {:?}", css, e)))
}

/// Drop NUL characters and normalize line endings
pub fn normalize_text(text: &str) -> String {
    text.replace('\0', "").replace("\r\n", "\n")
}
