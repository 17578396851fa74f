//! Read an encoded `.docx` back into paragraphs and runs.
//!
//! Only the parts of WordprocessingML that the encoder writes are
//! understood: paragraph styles, bold runs, text, line breaks and table
//! cells. That is enough to verify reading order and emphasis without a
//! renderer, and to summarise uploaded packages in the CLI.

use crate::error::Guide2PdfError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// A run of text read back from a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedRun {
    pub text: String,
    pub bold: bool,
}

/// A non-empty paragraph read back from a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedParagraph {
    pub runs: Vec<DecodedRun>,
    /// Paragraph style id, e.g. `Heading2`.
    pub style: Option<String>,
    /// Whether the paragraph sits inside a table cell.
    pub in_table: bool,
}

impl DecodedParagraph {
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Decode the body paragraphs of a `.docx` package in document order.
///
/// Paragraphs without text are skipped.
pub fn decode(bytes: &[u8]) -> Result<Vec<DecodedParagraph>, Guide2PdfError> {
    let xml = read_part(bytes, "word/document.xml")?;
    parse_document(&xml)
}

fn read_part(bytes: &[u8], name: &str) -> Result<String, Guide2PdfError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Guide2PdfError::Decoding(format!("not a zip package: {e}")))?;
    let mut entry = archive
        .by_name(name)
        .map_err(|e| Guide2PdfError::Decoding(format!("{name}: {e}")))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| Guide2PdfError::Decoding(format!("{name}: {e}")))?;
    Ok(xml)
}

fn parse_document(xml: &str) -> Result<Vec<DecodedParagraph>, Guide2PdfError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut paragraphs = Vec::new();
    let mut current: Option<DecodedParagraph> = None;
    let mut run: Option<DecodedRun> = None;
    let mut cell_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"p" => {
                    current = Some(DecodedParagraph {
                        in_table: cell_depth > 0,
                        ..Default::default()
                    })
                }
                b"tc" => cell_depth += 1,
                b"r" => {
                    run = Some(DecodedRun {
                        text: String::new(),
                        bold: false,
                    })
                }
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"pStyle" => {
                    if let Some(p) = current.as_mut() {
                        p.style = val_attr(e)?;
                    }
                }
                b"b" => {
                    if let Some(r) = run.as_mut() {
                        r.bold = !matches!(val_attr(e)?.as_deref(), Some("0" | "false"));
                    }
                }
                b"br" => {
                    if let Some(r) = run.as_mut() {
                        r.text.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| Guide2PdfError::Decoding(e.to_string()))?;
                if let Some(r) = run.as_mut() {
                    r.text.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => {
                    if let (Some(r), Some(p)) = (run.take(), current.as_mut()) {
                        if !r.text.is_empty() {
                            p.runs.push(r);
                        }
                    }
                }
                b"p" => {
                    if let Some(p) = current.take() {
                        if !p.runs.is_empty() {
                            paragraphs.push(p);
                        }
                    }
                }
                b"tc" => cell_depth = cell_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Guide2PdfError::Decoding(format!(
                    "XML error at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

/// Value of the `val` attribute, whatever its namespace prefix.
fn val_attr(e: &BytesStart<'_>) -> Result<Option<String>, Guide2PdfError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Guide2PdfError::Decoding(e.to_string()))?;
        if attr.key.local_name().as_ref() == b"val" {
            let value = attr
                .unescape_value()
                .map_err(|e| Guide2PdfError::Decoding(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::assemble::{assemble, ColumnStrategy, PageSetup};
    use crate::pipeline::classify::classify;
    use crate::pipeline::encode::{DocumentEncoder, DocxEncoder};
    use crate::pipeline::theme::ThemeId;

    const GUIDE: &str = "Main Idea: water cycles\n\nEvaporation & condensation\n\n### Review\n\nlast <one>";

    fn encoded(strategy: ColumnStrategy, theme: ThemeId) -> Vec<u8> {
        let doc = assemble(
            "Guide",
            &classify(GUIDE),
            &theme.style_sheet(),
            strategy,
            PageSetup::default(),
        );
        DocxEncoder.encode(&doc).unwrap()
    }

    #[test]
    fn reads_back_order_and_emphasis() {
        let paragraphs = decode(&encoded(ColumnStrategy::Native, ThemeId::Formal)).unwrap();
        let texts: Vec<String> = paragraphs.iter().map(|p| p.plain_text()).collect();
        assert_eq!(
            texts,
            vec![
                "Guide",
                "Main Idea: water cycles",
                "Evaporation & condensation",
                "Review",
                "last <one>"
            ]
        );

        let header = &paragraphs[1];
        assert_eq!(header.runs.len(), 2);
        assert!(header.runs[0].bold);
        assert!(!header.runs[1].bold);
        assert!(!paragraphs[2].runs[0].bold);
        assert!(paragraphs.iter().all(|p| !p.in_table));
    }

    #[test]
    fn table_cells_are_flagged() {
        let paragraphs = decode(&encoded(ColumnStrategy::Table, ThemeId::Formal)).unwrap();
        assert_eq!(paragraphs.len(), 5);
        assert!(!paragraphs[0].in_table);
        assert!(paragraphs[1..].iter().all(|p| p.in_table));
        assert_eq!(paragraphs[1].plain_text(), "Main Idea: water cycles");
        assert_eq!(paragraphs[2].plain_text(), "Evaporation & condensation");
    }

    #[test]
    fn styles_are_reported() {
        let paragraphs = decode(&encoded(ColumnStrategy::Native, ThemeId::Heading)).unwrap();
        assert_eq!(paragraphs[0].style.as_deref(), Some("Title"));
        assert_eq!(paragraphs[3].style.as_deref(), Some("Heading3"));
        assert_eq!(paragraphs[2].style, None);
    }

    #[test]
    fn line_breaks_survive() {
        let xml = r#"<w:document xmlns:w="x"><w:body><w:p><w:r><w:t xml:space="preserve">a</w:t><w:br/><w:t>b</w:t></w:r></w:p><w:p/></w:body></w:document>"#;
        let paragraphs = parse_document(xml).unwrap();
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].plain_text(), "a\nb");
    }

    #[test]
    fn rejects_non_zip_input() {
        let err = decode(b"%PDF-1.4").unwrap_err();
        assert!(matches!(err, Guide2PdfError::Decoding(_)));
    }
}
