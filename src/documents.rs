use std::path::Path;
use tracing::warn;

use crate::error::Result;

/// Document formats the agenda generator accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Csv,
    Image,
    Pdf,
    Word,
    Excel,
    Unknown,
}

impl DocumentKind {
    /// Sniff the format from the file extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "txt" | "md" => DocumentKind::PlainText,
            "csv" => DocumentKind::Csv,
            "png" | "jpg" | "jpeg" => DocumentKind::Image,
            "pdf" => DocumentKind::Pdf,
            "docx" | "doc" => DocumentKind::Word,
            "xlsx" | "xls" => DocumentKind::Excel,
            _ => DocumentKind::Unknown,
        }
    }
}

/// Extract text from one document, format by format. These readers are
/// deliberately thin: binary office formats are acknowledged rather than
/// parsed, so one odd attachment never sinks the whole agenda.
pub async fn read_document(path: &Path) -> Result<String> {
    let kind = DocumentKind::from_path(path);
    let text = match kind {
        DocumentKind::PlainText | DocumentKind::Unknown => {
            let bytes = tokio::fs::read(path).await?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
        DocumentKind::Csv => {
            let bytes = tokio::fs::read(path).await?;
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_reader(bytes.as_slice());
            let mut rows = Vec::new();
            for record in reader.records() {
                let record = record?;
                rows.push(record.iter().map(str::trim).collect::<Vec<_>>().join(" "));
            }
            rows.join("\n")
        }
        DocumentKind::Image => {
            "Image uploaded successfully. (Further processing can be added here)".to_string()
        }
        DocumentKind::Pdf | DocumentKind::Word | DocumentKind::Excel => {
            warn!(
                "No text extractor for {:?} document {}, including a placeholder",
                kind,
                path.display()
            );
            format!(
                "[{} attached: no text could be extracted]",
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            )
        }
    };
    Ok(text)
}

/// Read every document and join the extracted texts with newlines,
/// preserving the order the caller supplied.
pub async fn combine_documents(paths: &[impl AsRef<Path>]) -> Result<String> {
    let mut combined = String::new();
    for path in paths {
        let text = read_document(path.as_ref()).await?;
        combined.push('\n');
        combined.push_str(&text);
    }
    Ok(combined)
}
