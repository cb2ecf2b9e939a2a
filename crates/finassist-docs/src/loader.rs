use std::path::Path;

use finassist_models::{Document, DocumentKind};

use crate::error::DocsError;

const SAMPLE_ROWS: usize = 10;

/// Decode an uploaded file into a [`Document`].
///
/// Plain text and markdown are taken as-is. CSV files become a textual
/// summary (columns, row count, numeric column statistics, sample rows).
/// PDFs are reduced to their extracted text. Non-UTF-8 files are rejected.
pub fn load_document(name: &str, bytes: &[u8]) -> Result<Document, DocsError> {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if extension == "pdf" {
        let content = extract_pdf_text(name, bytes)?;
        return Ok(Document {
            name: name.to_string(),
            kind: DocumentKind::Pdf,
            content,
        });
    }

    let text = std::str::from_utf8(bytes).map_err(|_| DocsError::Unsupported {
        name: name.to_string(),
        reason: "file is not UTF-8 text".to_string(),
    })?;
    let text = text.trim_start_matches('\u{feff}');

    if text.trim().is_empty() {
        return Err(DocsError::Empty(name.to_string()));
    }

    let (kind, content) = match extension.as_str() {
        "csv" => (DocumentKind::Csv, summarize_csv(name, text)),
        "md" | "markdown" => (DocumentKind::Markdown, text.to_string()),
        _ => (DocumentKind::Text, text.to_string()),
    };

    Ok(Document {
        name: name.to_string(),
        kind,
        content,
    })
}

/// Text of every page, blank lines collapsed. Scanned PDFs without a text
/// layer come back empty.
fn extract_pdf_text(name: &str, bytes: &[u8]) -> Result<String, DocsError> {
    let unsupported = |reason: String| DocsError::Unsupported {
        name: name.to_string(),
        reason,
    };

    // The extractor panics on some malformed fonts and streams.
    let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| unsupported("PDF could not be parsed".to_string()))?
        .map_err(|e| unsupported(format!("PDF could not be parsed: {e}")))?;

    let content = extracted
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if content.is_empty() {
        return Err(DocsError::Empty(name.to_string()));
    }
    Ok(content)
}

/// Split one CSV line, honouring double-quoted fields and `""` escapes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

fn summarize_csv(name: &str, text: &str) -> String {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().map(split_csv_line).unwrap_or_default();
    let rows: Vec<Vec<String>> = lines.map(split_csv_line).collect();

    let mut out = format!("Data from {name}:\n\n");
    out.push_str(&format!("Columns: {}\n", header.join(", ")));
    out.push_str(&format!("Rows: {}\n", rows.len()));

    let stats: Vec<String> = header
        .iter()
        .enumerate()
        .filter_map(|(col, column)| {
            let values: Vec<f64> = rows
                .iter()
                .filter_map(|r| r.get(col))
                .filter(|v| !v.is_empty())
                .map(|v| v.parse::<f64>())
                .collect::<Result<_, _>>()
                .ok()?;
            if values.is_empty() {
                return None;
            }
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            Some(format!(
                "- {column}: count {}, mean {mean:.2}, min {min}, max {max}",
                values.len()
            ))
        })
        .collect();
    if !stats.is_empty() {
        out.push_str("\nNumeric columns:\n");
        out.push_str(&stats.join("\n"));
        out.push('\n');
    }

    out.push_str(&format!("\nFirst {} rows:\n", rows.len().min(SAMPLE_ROWS)));
    for row in rows.iter().take(SAMPLE_ROWS) {
        out.push_str(&row.join(" | "));
        out.push('\n');
    }
    out.trim_end().to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// One-page PDF with each entry of `lines` on its own line, in Courier.
    pub fn pdf_with_text(lines: &[&str]) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut operations = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let y = 700 - 40 * i as i64;
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("Td", vec![72.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations }.encode().unwrap();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn text_and_markdown_pass_through() {
        let doc = load_document("notes.txt", b"Revenue grew 12%.").unwrap();
        assert_eq!(doc.kind, DocumentKind::Text);
        assert_eq!(doc.content, "Revenue grew 12%.");

        let doc = load_document("README.MD", b"# Q3\nMargins up.").unwrap();
        assert_eq!(doc.kind, DocumentKind::Markdown);
    }

    #[test]
    fn pdf_text_is_extracted() {
        let bytes = pdf_with_text(&["Quarterly revenue rose 12%", "Margins held steady"]);
        let doc = load_document("Q3-Report.PDF", &bytes).unwrap();
        assert_eq!(doc.kind, DocumentKind::Pdf);
        assert!(doc.content.contains("Quarterly revenue rose 12%"));
        assert!(doc.content.contains("Margins held steady"));
        assert!(!doc.content.contains("\n\n"));
    }

    #[test]
    fn malformed_pdf_is_unsupported() {
        let err = load_document("report.pdf", b"%PDF-1.7").unwrap_err();
        match err {
            DocsError::Unsupported { name, reason } => {
                assert_eq!(name, "report.pdf");
                assert!(reason.contains("PDF could not be parsed"));
            }
            other => panic!("Expected Unsupported, got {other:?}"),
        }
    }

    #[test]
    fn pdf_without_text_is_empty() {
        let err = load_document("scan.pdf", &pdf_with_text(&[])).unwrap_err();
        assert!(matches!(err, DocsError::Empty(_)));
    }

    #[test]
    fn binary_is_unsupported() {
        let err = load_document("blob.bin", &[0xff, 0xfe, 0x00, 0x9f]).unwrap_err();
        assert!(matches!(err, DocsError::Unsupported { .. }));
    }

    #[test]
    fn blank_file_is_empty() {
        let err = load_document("empty.txt", b"  \n ").unwrap_err();
        assert!(matches!(err, DocsError::Empty(_)));
    }

    #[test]
    fn csv_is_summarized() {
        let csv = "symbol,price,note\nAAPL,227.5,\"Apple, Inc.\"\nMSFT,410,Microsoft\n";
        let doc = load_document("prices.csv", csv.as_bytes()).unwrap();
        assert_eq!(doc.kind, DocumentKind::Csv);
        assert!(doc.content.starts_with("Data from prices.csv:"));
        assert!(doc.content.contains("Columns: symbol, price, note"));
        assert!(doc.content.contains("Rows: 2"));
        assert!(doc.content.contains("- price: count 2, mean 318.75, min 227.5, max 410"));
        assert!(doc.content.contains("AAPL | 227.5 | Apple, Inc."));
    }

    #[test]
    fn quoted_fields_keep_commas_and_escapes() {
        assert_eq!(
            split_csv_line(r#"a,"b, c","say ""hi""""#),
            vec!["a", "b, c", "say \"hi\""]
        );
    }
}
