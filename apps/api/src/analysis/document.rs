//! Turns an uploaded resume file into plain text according to its format.

use bytes::Bytes;
use tracing::debug;

use crate::analysis::validation::ResumeFormat;
use crate::analysis::AnalysisError;

/// A resume file as received from the multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub contents: Bytes,
}

/// Decodes file bytes to text.
///
/// - `.txt` must be valid UTF-8.
/// - `.docx` is unpacked and its paragraph and table text joined by newlines.
/// - `.doc` is a legacy binary format; it is read as lossy UTF-8 with control
///   characters dropped, which recovers the embedded text runs.
pub fn extract_text(format: ResumeFormat, contents: &[u8]) -> Result<String, AnalysisError> {
    let text = match format {
        ResumeFormat::Txt => String::from_utf8(contents.to_vec())
            .map_err(|e| AnalysisError::UnreadableFile(format!("invalid UTF-8: {e}")))?,
        ResumeFormat::Docx => extract_docx(contents)?,
        ResumeFormat::Doc => extract_legacy_doc(contents),
    };

    debug!(
        "Decoded {} upload: {} bytes -> {} chars",
        format.extension(),
        contents.len(),
        text.chars().count()
    );

    Ok(text)
}

fn extract_docx(contents: &[u8]) -> Result<String, AnalysisError> {
    let docx = docx_rs::read_docx(contents)
        .map_err(|e| AnalysisError::UnreadableFile(format!("DOCX parse error: {e}")))?;

    let mut lines: Vec<String> = Vec::new();

    for child in &docx.document.children {
        match child {
            docx_rs::DocumentChild::Paragraph(paragraph) => {
                let text = paragraph_text(paragraph);
                if !text.trim().is_empty() {
                    lines.push(text);
                }
            }
            docx_rs::DocumentChild::Table(table) => {
                for table_child in &table.rows {
                    let docx_rs::TableChild::TableRow(row) = table_child;
                    let cells: Vec<String> = row
                        .cells
                        .iter()
                        .map(|row_child| {
                            let docx_rs::TableRowChild::TableCell(cell) = row_child;
                            cell.children
                                .iter()
                                .filter_map(|content| match content {
                                    docx_rs::TableCellContent::Paragraph(p) => {
                                        Some(paragraph_text(p))
                                    }
                                    _ => None,
                                })
                                .collect::<Vec<_>>()
                                .join(" ")
                                .trim()
                                .to_string()
                        })
                        .filter(|cell| !cell.is_empty())
                        .collect();
                    if !cells.is_empty() {
                        lines.push(cells.join(" | "));
                    }
                }
            }
            _ => {}
        }
    }

    Ok(lines.join("\n"))
}

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut content = String::new();
    for para_child in &paragraph.children {
        if let docx_rs::ParagraphChild::Run(run) = para_child {
            for run_child in &run.children {
                match run_child {
                    docx_rs::RunChild::Text(text) => content.push_str(&text.text),
                    docx_rs::RunChild::Tab(_) => content.push('\t'),
                    _ => {}
                }
            }
        }
    }
    content
}

fn extract_legacy_doc(contents: &[u8]) -> String {
    String::from_utf8_lossy(contents)
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .collect()
}
