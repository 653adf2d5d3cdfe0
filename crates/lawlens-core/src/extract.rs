//! Plain-text extraction from uploaded .txt, .pdf and .docx files.

use std::io::{Cursor, Read};

use base64::Engine;
use thiserror::Error;
use tracing::{debug, info};

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const TEXT_MIME: &str = "text/plain";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Classify an upload by its declared content type, falling back to the
    /// file extension when the type is missing or generic.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Option<Self> {
        let declared = content_type
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
            .unwrap_or_default();
        match declared.as_str() {
            TEXT_MIME => return Some(Self::PlainText),
            PDF_MIME => return Some(Self::Pdf),
            DOCX_MIME => return Some(Self::Docx),
            _ => {},
        }

        let ext = file_name?.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::PlainText),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::PlainText => TEXT_MIME,
            Self::Pdf => PDF_MIME,
            Self::Docx => DOCX_MIME,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not read PDF: {0}")]
    Pdf(String),
    #[error("could not read DOCX: {0}")]
    Docx(String),
    #[error("extraction task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Text(String),
    /// A PDF with too little text layer; the model has to read the file itself.
    Scanned { data_uri: String },
}

pub fn extract_text(kind: DocumentKind, bytes: &[u8], ocr_min_chars: usize) -> Result<Extracted, ExtractError> {
    let extracted = match kind {
        DocumentKind::PlainText => Extracted::Text(String::from_utf8_lossy(bytes).into_owned()),
        DocumentKind::Pdf => classify_pdf_text(pdf_text(bytes)?, bytes, ocr_min_chars),
        DocumentKind::Docx => Extracted::Text(docx_text(bytes)?),
    };
    match &extracted {
        Extracted::Text(text) => debug!(kind = ?kind, chars = text.len(), "extracted document text"),
        Extracted::Scanned { .. } => info!(bytes = bytes.len(), "pdf has no usable text layer, sending file to model"),
    }
    Ok(extracted)
}

/// [`extract_text`] on the blocking pool. PDF and DOCX parsing is CPU-bound
/// and uploads can be large, so it stays off the async workers.
pub async fn extract_text_blocking(
    kind: DocumentKind,
    bytes: Vec<u8>,
    ocr_min_chars: usize,
) -> Result<Extracted, ExtractError> {
    tokio::task::spawn_blocking(move || extract_text(kind, &bytes, ocr_min_chars))
        .await
        .map_err(|e| ExtractError::Task(e.to_string()))?
}

/// Decide whether extracted PDF text is usable or the file looks scanned.
pub fn classify_pdf_text(text: String, bytes: &[u8], ocr_min_chars: usize) -> Extracted {
    if text.trim().chars().count() < ocr_min_chars {
        Extracted::Scanned {
            data_uri: data_uri(PDF_MIME, bytes),
        }
    } else {
        Extracted::Text(text)
    }
}

fn pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed inputs.
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::Pdf(e.to_string())),
        Err(_) => Err(ExtractError::Pdf("parser aborted on malformed input".into())),
    }
}

pub fn docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    Ok(docx_xml_to_text(&xml))
}

/// Flatten WordprocessingML body XML to text: one line per paragraph.
pub fn docx_xml_to_text(xml: &str) -> String {
    let mut out = String::new();
    let mut rest = xml;
    let mut in_text = false;

    while let Some(lt) = rest.find('<') {
        if in_text {
            out.push_str(&decode_entities(&rest[..lt]));
        }
        let Some(gt) = rest[lt..].find('>') else {
            break;
        };
        let tag = &rest[lt + 1..lt + gt];
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("");
        let closing = tag.starts_with('/');
        let self_closing = tag.ends_with('/');

        match name {
            "w:t" => in_text = !closing && !self_closing,
            "w:tab" if !closing => out.push('\t'),
            "w:br" | "w:cr" if !closing => out.push('\n'),
            "w:p" if closing || self_closing => out.push('\n'),
            _ => {},
        }
        rest = &rest[lt + gt + 1..];
    }

    out.trim_end().to_string()
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';').filter(|i| *i <= 10) else {
            out.push('&');
            rest = &tail[1..];
            continue;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[semi + 1..];
            },
            None => {
                out.push('&');
                rest = &tail[1..];
            },
        }
    }
    out.push_str(rest);
    out
}

pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime_type};base64,{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_prefers_content_type() {
        assert_eq!(DocumentKind::detect(Some("application/pdf"), Some("notes.txt")), Some(DocumentKind::Pdf));
        assert_eq!(
            DocumentKind::detect(Some("text/plain; charset=utf-8"), None),
            Some(DocumentKind::PlainText)
        );
        assert_eq!(DocumentKind::detect(Some(DOCX_MIME), None), Some(DocumentKind::Docx));
    }

    #[test]
    fn detect_falls_back_to_extension() {
        assert_eq!(
            DocumentKind::detect(Some("application/octet-stream"), Some("Lease.PDF")),
            Some(DocumentKind::Pdf)
        );
        assert_eq!(DocumentKind::detect(None, Some("contract.docx")), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::detect(None, Some("image.png")), None);
        assert_eq!(DocumentKind::detect(Some("image/png"), Some("scan")), None);
        assert_eq!(DocumentKind::detect(None, None), None);
    }

    #[test]
    fn short_pdf_text_is_scanned() {
        let bytes = b"%PDF-1.4 fake";
        match classify_pdf_text("  page 1  ".into(), bytes, 100) {
            Extracted::Scanned { data_uri } => {
                assert!(data_uri.starts_with("data:application/pdf;base64,"));
            },
            other => panic!("expected scanned, got {other:?}"),
        }
        let long = "word ".repeat(30);
        assert_eq!(classify_pdf_text(long.clone(), bytes, 100), Extracted::Text(long));
    }

    #[test]
    fn docx_xml_paragraphs_and_entities() {
        let xml = r#"<?xml version="1.0"?><w:document><w:body>
<w:p><w:r><w:t>Tenant &amp; Landlord</w:t></w:r><w:r><w:t xml:space="preserve"> agree.</w:t></w:r></w:p>
<w:p/>
<w:p><w:r><w:t>Rent:</w:t><w:tab/><w:t>&#36;1,500</w:t><w:br/><w:t>&lt;monthly&gt;</w:t></w:r></w:p>
</w:body></w:document>"#;
        assert_eq!(docx_xml_to_text(xml), "Tenant & Landlord agree.\n\nRent:\t$1,500\n<monthly>");
    }

    #[test]
    fn plain_text_is_lossy_utf8() {
        let out = extract_text(DocumentKind::PlainText, b"caf\xC3\xA9 \xFF", 100).unwrap();
        assert_eq!(out, Extracted::Text("café \u{FFFD}".into()));
    }

    #[test]
    fn garbage_docx_is_an_error() {
        assert!(matches!(docx_text(b"not a zip"), Err(ExtractError::Docx(_))));
    }
}
