//! Document model shared by every pipeline stage.
//!
//! The model is deliberately format-agnostic: it describes *what* the page
//! should look like (runs, spacing, borders, column strategy) and leaves the
//! container syntax to [`crate::pipeline::encode`]. Measurements follow the
//! office-document conventions so the encoder can copy them verbatim:
//!
//! | Quantity | Unit |
//! |----------|------|
//! | spacing, indents, margins, column gap | twips (1/20 pt, 1440 per inch) |
//! | font size | half-points (`20` = 10 pt) |
//! | border width | eighths of a point |
//! | colours | six-digit RGB hex without `#` |

use serde::{Deserialize, Serialize};

/// One inch, in twips.
pub const INCH_TWIPS: u32 = 1440;

/// US Letter page width, in twips.
pub const PAGE_WIDTH_TWIPS: u32 = 12_240;

/// US Letter page height, in twips.
pub const PAGE_HEIGHT_TWIPS: u32 = 15_840;

// ── Blocks ───────────────────────────────────────────────────────────────

/// Semantic label assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Header,
    Body,
}

/// A classified unit of input text.
///
/// Created by [`crate::pipeline::classify::classify`] and consumed once by a
/// [`crate::pipeline::theme::Theme`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    /// The trimmed segment exactly as it appeared in the input.
    pub raw_text: String,
    /// Display text with markdown markers removed.
    pub text: String,
    /// Emphasised prefix of a header, including its trailing colon.
    pub label: Option<String>,
    /// Body-weight text following `label`.
    pub remainder: Option<String>,
    /// Number of leading `#` markers (1–6) when the segment began with one.
    pub level: Option<u8>,
}

impl Block {
    /// Build a body block.
    pub fn body(raw_text: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Body,
            raw_text: raw_text.into(),
            text: text.into(),
            label: None,
            remainder: None,
            level: None,
        }
    }

    pub fn is_header(&self) -> bool {
        self.kind == BlockKind::Header
    }
}

// ── Runs and paragraphs ──────────────────────────────────────────────────

/// Smallest styled unit of text. Owned by exactly one [`Paragraph`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledRun {
    pub text: String,
    pub bold: bool,
    pub size_half_points: u32,
    pub color_hex: String,
    pub font_family: Option<String>,
}

impl StyledRun {
    /// Plain black run at the given size.
    pub fn new(text: impl Into<String>, size_half_points: u32) -> Self {
        Self {
            text: text.into(),
            bold: false,
            size_half_points,
            color_hex: "000000".to_string(),
            font_family: None,
        }
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn color(mut self, hex: impl Into<String>) -> Self {
        self.color_hex = hex.into();
        self
    }

    pub fn font(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }
}

/// Horizontal alignment of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    /// Justified on both edges.
    Justify,
}

/// Line style of a paragraph border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    Single,
    Double,
    Thick,
}

/// One edge of a paragraph border.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderLine {
    pub style: LineStyle,
    /// Width in eighths of a point.
    pub size: u32,
    pub color_hex: String,
    /// Distance between border and text, in points.
    pub space: u32,
}

impl BorderLine {
    pub fn new(style: LineStyle, size: u32, color_hex: impl Into<String>) -> Self {
        Self {
            style,
            size,
            color_hex: color_hex.into(),
            space: 4,
        }
    }

    pub fn space(mut self, points: u32) -> Self {
        self.space = points;
        self
    }
}

/// Paragraph border; absent edges are not drawn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphBorder {
    pub top: Option<BorderLine>,
    pub bottom: Option<BorderLine>,
    pub left: Option<BorderLine>,
    pub right: Option<BorderLine>,
}

impl ParagraphBorder {
    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.bottom.is_none() && self.left.is_none() && self.right.is_none()
    }
}

/// Paragraph indentation in twips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indent {
    pub left: u32,
    pub right: u32,
    pub hanging: u32,
}

/// Structural rank of a paragraph, mapped to a named style by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingLevel {
    Title,
    /// Heading 1–6.
    Heading(u8),
}

impl HeadingLevel {
    /// Clamp an arbitrary level into the `Heading1..=Heading6` range.
    pub fn heading(level: u8) -> Self {
        HeadingLevel::Heading(level.clamp(1, 6))
    }

    /// Style identifier used in the encoded document.
    pub fn style_id(&self) -> String {
        match self {
            HeadingLevel::Title => "Title".to_string(),
            HeadingLevel::Heading(n) => format!("Heading{}", (*n).clamp(1, 6)),
        }
    }
}

/// A styled paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub runs: Vec<StyledRun>,
    pub spacing_before: u32,
    pub spacing_after: u32,
    pub alignment: Alignment,
    pub border: Option<ParagraphBorder>,
    /// Background fill colour.
    pub shading: Option<String>,
    pub indent: Option<Indent>,
    pub heading: Option<HeadingLevel>,
}

impl Paragraph {
    pub fn new(runs: Vec<StyledRun>) -> Self {
        Self {
            runs,
            ..Default::default()
        }
    }

    /// Empty paragraph, used for the blank cell of an odd table row.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn spacing(mut self, before: u32, after: u32) -> Self {
        self.spacing_before = before;
        self.spacing_after = after;
        self
    }

    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Concatenated run text.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty())
    }
}

// ── Sections ─────────────────────────────────────────────────────────────

/// Page margins in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Margins {
    pub fn uniform(twips: u32) -> Self {
        Self {
            top: twips,
            right: twips,
            bottom: twips,
            left: twips,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(INCH_TWIPS)
    }
}

/// Native multi-column page flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub count: u32,
    pub gap_twips: u32,
    /// Draw a vertical rule between columns.
    pub separator: bool,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            count: 2,
            gap_twips: 708,
            separator: true,
        }
    }
}

/// Column strategy of a section. A section uses exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionLayout {
    Native(ColumnSpec),
    TableEmulation,
}

/// A fixed two-cell, equal-width row used by table emulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowPair {
    pub left: Paragraph,
    /// `None` renders as an empty cell.
    pub right: Option<Paragraph>,
}

/// Content of a section, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionItem {
    Paragraph(Paragraph),
    Row(RowPair),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub margins: Margins,
    pub layout: SectionLayout,
    pub items: Vec<SectionItem>,
}

impl Section {
    pub fn new(layout: SectionLayout, margins: Margins) -> Self {
        Self {
            margins,
            layout,
            items: Vec::new(),
        }
    }

    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.items.push(SectionItem::Paragraph(paragraph));
    }

    pub fn push_row(&mut self, row: RowPair) {
        self.items.push(SectionItem::Row(row));
    }

    /// Number of table rows in the section.
    pub fn row_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i, SectionItem::Row(_)))
            .count()
    }

    /// Check the one-strategy-per-section invariant.
    ///
    /// Returns a description of the first violation.
    pub fn validate(&self) -> Result<(), String> {
        match self.layout {
            SectionLayout::Native(cols) => {
                if cols.count == 0 {
                    return Err("native column layout declares zero columns".into());
                }
                if self.row_count() > 0 {
                    return Err(
                        "table rows are not allowed in a section using native columns".into(),
                    );
                }
            }
            SectionLayout::TableEmulation => {}
        }
        Ok(())
    }

    /// Width available between the left and right margins.
    pub fn content_width(&self) -> u32 {
        PAGE_WIDTH_TWIPS.saturating_sub(self.margins.left + self.margins.right)
    }
}

/// A complete document: always exactly one section in this crate's usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub sections: Vec<Section>,
}

impl Document {
    /// Every paragraph in reading order, table cells left then right.
    pub fn paragraphs(&self) -> Vec<&Paragraph> {
        let mut out = Vec::new();
        for section in &self.sections {
            for item in &section.items {
                match item {
                    SectionItem::Paragraph(p) => out.push(p),
                    SectionItem::Row(row) => {
                        out.push(&row.left);
                        if let Some(ref right) = row.right {
                            out.push(right);
                        }
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_section_rejects_rows() {
        let mut s = Section::new(SectionLayout::Native(ColumnSpec::default()), Margins::default());
        s.push_row(RowPair {
            left: Paragraph::empty(),
            right: None,
        });
        let err = s.validate().unwrap_err();
        assert!(err.contains("native"), "got: {err}");
    }

    #[test]
    fn table_section_accepts_rows_and_paragraphs() {
        let mut s = Section::new(SectionLayout::TableEmulation, Margins::default());
        s.push_paragraph(Paragraph::empty());
        s.push_row(RowPair {
            left: Paragraph::empty(),
            right: None,
        });
        assert!(s.validate().is_ok());
        assert_eq!(s.row_count(), 1);
    }

    #[test]
    fn content_width_subtracts_margins() {
        let s = Section::new(SectionLayout::TableEmulation, Margins::default());
        assert_eq!(s.content_width(), 9360);
    }

    #[test]
    fn heading_style_ids() {
        assert_eq!(HeadingLevel::Title.style_id(), "Title");
        assert_eq!(HeadingLevel::heading(9).style_id(), "Heading6");
        assert_eq!(HeadingLevel::heading(0).style_id(), "Heading1");
    }
}
