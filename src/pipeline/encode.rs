//! Document encoding: [`Document`] → WordprocessingML (`.docx`) package.
//!
//! The core only depends on the [`DocumentEncoder`] contract: a synchronous,
//! deterministic function from model to bytes. [`DocxEncoder`] is the
//! default implementation. It writes a minimal OPC package with `zip` and
//! hand-assembled XML parts.
//!
//! ## Determinism
//!
//! Identical documents must encode to byte-identical packages. Parts are
//! written in a fixed order, every zip entry carries the same DOS timestamp,
//! and no part embeds the current time or a random identifier.

use crate::error::Guide2PdfError;
use crate::model::{
    Alignment, BorderLine, Document, LineStyle, Paragraph, ParagraphBorder,
    RowPair, Section, SectionItem, SectionLayout, StyledRun, PAGE_HEIGHT_TWIPS, PAGE_WIDTH_TWIPS,
};
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// MIME type of the packages produced by [`DocxEncoder`].
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Serialises a [`Document`] into a binary office-document package.
pub trait DocumentEncoder: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Encode the document. Must be deterministic.
    fn encode(&self, doc: &Document) -> Result<Vec<u8>, Guide2PdfError>;

    /// Whether native multi-column sections can be expressed. When `false`
    /// the pipeline assembles with table emulation instead.
    fn supports_native_columns(&self) -> bool {
        true
    }
}

/// Writes `.docx` packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxEncoder;

impl DocumentEncoder for DocxEncoder {
    fn name(&self) -> &str {
        "docx"
    }

    fn encode(&self, doc: &Document) -> Result<Vec<u8>, Guide2PdfError> {
        let section = single_section(doc)?;
        check_colors(doc)?;
        check_text(doc)?;

        let document_xml = document_xml(section);
        let parts: [(&str, String); 6] = [
            ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
            ("_rels/.rels", ROOT_RELS_XML.to_string()),
            ("docProps/core.xml", core_xml(&doc.title)),
            ("word/document.xml", document_xml),
            ("word/styles.xml", STYLES_XML.to_string()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.to_string()),
        ];

        let bytes = write_package(&parts)
            .map_err(|e| Guide2PdfError::Encoding(format!("zip: {e}")))?;
        debug!("Encoded '{}' → {} bytes", doc.title, bytes.len());
        Ok(bytes)
    }
}

fn single_section(doc: &Document) -> Result<&Section, Guide2PdfError> {
    let section = match doc.sections.as_slice() {
        [] => return Err(Guide2PdfError::Encoding("document has no sections".into())),
        [only] => only,
        many => {
            return Err(Guide2PdfError::Encoding(format!(
                "expected exactly one section, found {}",
                many.len()
            )))
        }
    };
    section.validate().map_err(Guide2PdfError::Encoding)?;
    Ok(section)
}

fn check_colors(doc: &Document) -> Result<(), Guide2PdfError> {
    let is_hex = |s: &str| s.len() == 6 && s.chars().all(|c| c.is_ascii_hexdigit());
    for p in doc.paragraphs() {
        let borders = p.border.iter().flat_map(|b| [&b.top, &b.left, &b.bottom, &b.right]);
        let colors = p
            .runs
            .iter()
            .map(|r| r.color_hex.as_str())
            .chain(p.shading.as_deref())
            .chain(borders.flatten().map(|l| l.color_hex.as_str()));
        for color in colors {
            if !is_hex(color) {
                return Err(Guide2PdfError::Encoding(format!(
                    "'{color}' is not a six-digit hex colour"
                )));
            }
        }
    }
    Ok(())
}

/// Characters allowed by XML 1.0 (surrogates cannot occur in a `str`).
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

fn check_text(doc: &Document) -> Result<(), Guide2PdfError> {
    let runs = doc.paragraphs().into_iter().flat_map(|p| p.runs.iter());
    let texts = std::iter::once(doc.title.as_str())
        .chain(runs.flat_map(|r| std::iter::once(r.text.as_str()).chain(r.font_family.as_deref())));
    for text in texts {
        if let Some(bad) = text.chars().find(|&c| !is_xml_char(c)) {
            return Err(Guide2PdfError::Encoding(format!(
                "text contains U+{:04X}, which XML cannot represent",
                bad as u32
            )));
        }
    }
    Ok(())
}

fn write_package(parts: &[(&str, String)]) -> zip::result::ZipResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opt = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    for (name, body) in parts {
        zip.start_file(*name, opt)?;
        zip.write_all(body.as_bytes())?;
    }
    Ok(zip.finish()?.into_inner())
}

// ── word/document.xml ────────────────────────────────────────────────────

fn document_xml(section: &Section) -> String {
    let mut xml = String::with_capacity(8 * 1024);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(r#"<w:document xmlns:w="{W_NS}"><w:body>"#));

    let mut items = section.items.iter().peekable();
    while let Some(item) = items.next() {
        match item {
            SectionItem::Paragraph(p) => push_paragraph(&mut xml, p),
            SectionItem::Row(first) => {
                let mut rows = vec![first];
                while let Some(SectionItem::Row(next)) = items.peek() {
                    rows.push(next);
                    items.next();
                }
                push_table(&mut xml, &rows, section.content_width());
                // a table may not be the last body element before sectPr
                xml.push_str("<w:p/>");
            }
        }
    }

    push_section_properties(&mut xml, section);
    xml.push_str("</w:body></w:document>");
    xml
}

fn push_paragraph(xml: &mut String, p: &Paragraph) {
    xml.push_str("<w:p><w:pPr>");
    if let Some(heading) = p.heading {
        xml.push_str(&format!(r#"<w:pStyle w:val="{}"/>"#, heading.style_id()));
    }
    if let Some(ref border) = p.border {
        push_border(xml, border);
    }
    if let Some(ref fill) = p.shading {
        xml.push_str(&format!(
            r#"<w:shd w:val="clear" w:color="auto" w:fill="{fill}"/>"#
        ));
    }
    xml.push_str(&format!(
        r#"<w:spacing w:before="{}" w:after="{}"/>"#,
        p.spacing_before, p.spacing_after
    ));
    if let Some(indent) = p.indent {
        xml.push_str(&format!(
            r#"<w:ind w:left="{}" w:right="{}" w:hanging="{}"/>"#,
            indent.left, indent.right, indent.hanging
        ));
    }
    xml.push_str(&format!(r#"<w:jc w:val="{}"/>"#, justification(p.alignment)));
    xml.push_str("</w:pPr>");

    for run in &p.runs {
        push_run(xml, run);
    }
    xml.push_str("</w:p>");
}

fn push_run(xml: &mut String, run: &StyledRun) {
    xml.push_str("<w:r><w:rPr>");
    if let Some(ref font) = run.font_family {
        let font = escape(font.as_str());
        xml.push_str(&format!(
            r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>"#
        ));
    }
    if run.bold {
        xml.push_str("<w:b/><w:bCs/>");
    }
    xml.push_str(&format!(
        r#"<w:color w:val="{}"/><w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#,
        run.color_hex,
        size = run.size_half_points
    ));
    xml.push_str("</w:rPr>");

    for (i, line) in run.text.split('\n').enumerate() {
        if i > 0 {
            xml.push_str("<w:br/>");
        }
        xml.push_str(&format!(
            r#"<w:t xml:space="preserve">{}</w:t>"#,
            escape(line)
        ));
    }
    xml.push_str("</w:r>");
}

fn push_border(xml: &mut String, border: &ParagraphBorder) {
    xml.push_str("<w:pBdr>");
    let edges = [
        ("top", &border.top),
        ("left", &border.left),
        ("bottom", &border.bottom),
        ("right", &border.right),
    ];
    for (edge, line) in edges {
        if let Some(line) = line {
            push_border_line(xml, edge, line);
        }
    }
    xml.push_str("</w:pBdr>");
}

fn push_border_line(xml: &mut String, edge: &str, line: &BorderLine) {
    let style = match line.style {
        LineStyle::Single => "single",
        LineStyle::Double => "double",
        LineStyle::Thick => "thick",
    };
    xml.push_str(&format!(
        r#"<w:{edge} w:val="{style}" w:sz="{}" w:space="{}" w:color="{}"/>"#,
        line.size, line.space, line.color_hex
    ));
}

fn push_table(xml: &mut String, rows: &[&RowPair], content_width: u32) {
    let cell = content_width / 2;
    xml.push_str("<w:tbl><w:tblPr>");
    xml.push_str(&format!(r#"<w:tblW w:w="{}" w:type="dxa"/>"#, cell * 2));
    xml.push_str(concat!(
        "<w:tblBorders>",
        r#"<w:top w:val="nil"/><w:left w:val="nil"/><w:bottom w:val="nil"/>"#,
        r#"<w:right w:val="nil"/><w:insideH w:val="nil"/><w:insideV w:val="nil"/>"#,
        "</w:tblBorders>",
    ));
    // schema order: tblBorders, tblLayout, tblCellMar
    xml.push_str(r#"<w:tblLayout w:type="fixed"/>"#);
    xml.push_str(r#"<w:tblCellMar><w:left w:w="120" w:type="dxa"/><w:right w:w="120" w:type="dxa"/></w:tblCellMar>"#);
    xml.push_str("</w:tblPr>");
    xml.push_str(&format!(
        r#"<w:tblGrid><w:gridCol w:w="{cell}"/><w:gridCol w:w="{cell}"/></w:tblGrid>"#
    ));

    for row in rows {
        xml.push_str(r#"<w:tr><w:trPr><w:cantSplit/></w:trPr>"#);
        push_cell(xml, Some(&row.left), cell);
        push_cell(xml, row.right.as_ref(), cell);
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
}

fn push_cell(xml: &mut String, paragraph: Option<&Paragraph>, width: u32) {
    xml.push_str(&format!(
        r#"<w:tc><w:tcPr><w:tcW w:w="{width}" w:type="dxa"/></w:tcPr>"#
    ));
    match paragraph {
        Some(p) => push_paragraph(xml, p),
        // every cell needs at least one paragraph
        None => xml.push_str("<w:p/>"),
    }
    xml.push_str("</w:tc>");
}

fn push_section_properties(xml: &mut String, section: &Section) {
    let m = section.margins;
    xml.push_str("<w:sectPr>");
    xml.push_str(&format!(
        r#"<w:pgSz w:w="{PAGE_WIDTH_TWIPS}" w:h="{PAGE_HEIGHT_TWIPS}"/>"#
    ));
    xml.push_str(&format!(
        r#"<w:pgMar w:top="{}" w:right="{}" w:bottom="{}" w:left="{}" w:header="708" w:footer="708" w:gutter="0"/>"#,
        m.top, m.right, m.bottom, m.left
    ));
    match section.layout {
        SectionLayout::Native(cols) => xml.push_str(&format!(
            r#"<w:cols w:num="{}" w:space="{}" w:sep="{}"/>"#,
            cols.count,
            cols.gap_twips,
            if cols.separator { 1 } else { 0 }
        )),
        SectionLayout::TableEmulation => xml.push_str(r#"<w:cols w:space="708"/>"#),
    }
    xml.push_str("</w:sectPr>");
}

fn justification(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
        Alignment::Justify => "both",
    }
}

// ── Package parts ────────────────────────────────────────────────────────

fn core_xml(title: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/">"#,
            "<dc:title>{}</dc:title><dc:creator>guide2pdf</dc:creator>",
            "</cp:coreProperties>"
        ),
        escape(title)
    )
}

const CONTENT_TYPES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
    r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#,
    "</Types>"
);

const ROOT_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
    "</Relationships>"
);

const DOCUMENT_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    "</Relationships>"
);

const STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:docDefaults><w:rPrDefault><w:rPr><w:sz w:val="20"/><w:szCs w:val="20"/></w:rPr></w:rPrDefault></w:docDefaults>"#,
    r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:rPr><w:b/><w:sz w:val="48"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="2"/></w:pPr><w:rPr><w:b/><w:sz w:val="26"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading4"><w:name w:val="heading 4"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="3"/></w:pPr><w:rPr><w:b/><w:sz w:val="24"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading5"><w:name w:val="heading 5"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="4"/></w:pPr><w:rPr><w:b/><w:sz w:val="22"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading6"><w:name w:val="heading 6"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="5"/></w:pPr><w:rPr><w:b/><w:i/><w:sz w:val="22"/></w:rPr></w:style>"#,
    "</w:styles>"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnSpec, Margins};
    use crate::pipeline::assemble::{assemble, ColumnStrategy, PageSetup};
    use crate::pipeline::classify::classify;
    use crate::pipeline::theme::ThemeId;
    use std::io::Read;
    use zip::ZipArchive;

    fn sample(strategy: ColumnStrategy, theme: ThemeId) -> Document {
        let blocks = classify(
            "Main Idea: plants <make> food & store it\n\nBody one\nline two\n\n## Heading\n\nBody three",
        );
        assemble(
            "Bio \"101\"",
            &blocks,
            &theme.style_sheet(),
            strategy,
            PageSetup::default(),
        )
    }

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
        let mut entry = archive.by_name(name).expect("part exists");
        let mut s = String::new();
        entry.read_to_string(&mut s).expect("utf-8 part");
        s
    }

    #[test]
    fn encoding_is_deterministic() {
        for theme in ThemeId::ALL {
            let doc = sample(ColumnStrategy::Table, theme);
            let a = DocxEncoder.encode(&doc).unwrap();
            let b = DocxEncoder.encode(&doc.clone()).unwrap();
            assert_eq!(a, b, "theme {theme}");
        }
    }

    #[test]
    fn package_contains_every_part() {
        let bytes = DocxEncoder
            .encode(&sample(ColumnStrategy::Native, ThemeId::Formal))
            .unwrap();
        assert_eq!(&bytes[..2], b"PK");
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for expected in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "word/document.xml",
            "word/styles.xml",
            "word/_rels/document.xml.rels",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn native_layout_declares_two_columns_with_separator() {
        let bytes = DocxEncoder
            .encode(&sample(ColumnStrategy::Native, ThemeId::Formal))
            .unwrap();
        let xml = part(&bytes, "word/document.xml");
        assert!(xml.contains(r#"<w:cols w:num="2" w:space="708" w:sep="1"/>"#));
        assert!(xml.contains(r#"w:top="1440" w:right="1440" w:bottom="1440" w:left="1440""#));
        assert!(!xml.contains("<w:tbl>"));
    }

    #[test]
    fn table_layout_emits_equal_fixed_cells() {
        let bytes = DocxEncoder
            .encode(&sample(ColumnStrategy::Table, ThemeId::Formal))
            .unwrap();
        let xml = part(&bytes, "word/document.xml");
        assert_eq!(xml.matches("<w:tbl>").count(), 1);
        assert_eq!(xml.matches("<w:tr>").count(), 2);
        assert_eq!(xml.matches(r#"<w:tcW w:w="4680" w:type="dxa"/>"#).count(), 4);
        assert!(!xml.contains("w:num=\"2\""));

        let pos = |needle: &str| xml.find(needle).unwrap_or_else(|| panic!("missing {needle}"));
        assert!(pos("<w:tblW ") < pos("<w:tblBorders>"));
        assert!(pos("</w:tblBorders>") < pos(r#"<w:tblLayout w:type="fixed"/>"#));
        assert!(pos("<w:tblLayout ") < pos("<w:tblCellMar>"));
    }

    #[test]
    fn text_is_escaped_and_line_breaks_kept() {
        let bytes = DocxEncoder
            .encode(&sample(ColumnStrategy::Native, ThemeId::Formal))
            .unwrap();
        let xml = part(&bytes, "word/document.xml");
        assert!(xml.contains("plants &lt;make&gt; food &amp; store it"));
        assert!(xml.contains(r#"Body one</w:t><w:br/><w:t xml:space="preserve">line two"#));
        let core = part(&bytes, "docProps/core.xml");
        assert!(core.contains("<dc:title>Bio &quot;101&quot;</dc:title>"));
    }

    #[test]
    fn heading_theme_references_styles() {
        let bytes = DocxEncoder
            .encode(&sample(ColumnStrategy::Native, ThemeId::Heading))
            .unwrap();
        let xml = part(&bytes, "word/document.xml");
        assert!(xml.contains(r#"<w:pStyle w:val="Title"/>"#));
        assert!(xml.contains(r#"<w:pStyle w:val="Heading2"/>"#));
    }

    #[test]
    fn rejects_rows_in_native_section() {
        let mut doc = sample(ColumnStrategy::Native, ThemeId::Formal);
        doc.sections[0].items.push(SectionItem::Row(RowPair {
            left: Paragraph::empty(),
            right: None,
        }));
        let err = DocxEncoder.encode(&doc).unwrap_err();
        assert!(matches!(err, Guide2PdfError::Encoding(_)), "got: {err}");
    }

    #[test]
    fn rejects_section_count_other_than_one() {
        let mut doc = sample(ColumnStrategy::Native, ThemeId::Formal);
        doc.sections.push(Section::new(
            SectionLayout::Native(ColumnSpec::default()),
            Margins::default(),
        ));
        assert!(DocxEncoder.encode(&doc).is_err());

        doc.sections.clear();
        assert!(DocxEncoder.encode(&doc).is_err());
    }

    #[test]
    fn rejects_malformed_colours() {
        let mut doc = sample(ColumnStrategy::Native, ThemeId::Formal);
        if let SectionItem::Paragraph(ref mut p) = doc.sections[0].items[0] {
            p.runs[0].color_hex = "#000".into();
        }
        let err = DocxEncoder.encode(&doc).unwrap_err();
        assert!(err.to_string().contains("#000"));
    }

    #[test]
    fn rejects_text_xml_cannot_carry() {
        let mut doc = sample(ColumnStrategy::Native, ThemeId::Formal);
        if let SectionItem::Paragraph(ref mut p) = doc.sections[0].items[1] {
            p.runs[0].text = "page one\x0cpage two".into();
        }
        let err = DocxEncoder.encode(&doc).unwrap_err();
        assert!(matches!(err, Guide2PdfError::Encoding(_)), "got: {err}");
        assert!(err.to_string().contains("U+000C"), "got: {err}");

        let mut doc = sample(ColumnStrategy::Native, ThemeId::Formal);
        doc.title = "Bio\x01".into();
        assert!(DocxEncoder.encode(&doc).is_err());

        let mut doc = sample(ColumnStrategy::Native, ThemeId::Formal);
        doc.title = "Tabs\tand\nbreaks are fine".into();
        assert!(DocxEncoder.encode(&doc).is_ok());
    }
}
