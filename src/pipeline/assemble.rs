//! Document assembly: title + styled blocks → one-section [`Document`].
//!
//! Two competing two-column strategies exist because not every downstream
//! consumer understands native multi-column sections:
//!
//! * **Native flow** declares `count = 2` on the section and lets the
//!   renderer balance paragraphs across columns. Reading order is kept, but
//!   where the column break falls is the renderer's decision.
//! * **Table emulation** pairs consecutive blocks into fixed two-cell rows.
//!   Placement is deterministic (`block[2i]` left, `block[2i + 1]` right)
//!   at the cost of balancing.

use crate::model::{Block, ColumnSpec, Document, Margins, Paragraph, RowPair, Section, SectionLayout};
use crate::pipeline::theme::Theme;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Which column strategy the assembler uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnStrategy {
    /// Native two-column section. (default)
    #[default]
    Native,
    /// Two-cell table rows.
    Table,
}

impl fmt::Display for ColumnStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnStrategy::Native => f.write_str("native"),
            ColumnStrategy::Table => f.write_str("table"),
        }
    }
}

impl FromStr for ColumnStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native" | "columns" | "flow" => Ok(ColumnStrategy::Native),
            "table" | "tables" => Ok(ColumnStrategy::Table),
            other => Err(format!(
                "unknown layout '{other}' (expected 'native' or 'table')"
            )),
        }
    }
}

/// Page geometry shared by both strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageSetup {
    pub margins: Margins,
    /// Used only by native flow.
    pub columns: ColumnSpec,
}

/// Build the document for one request.
pub fn assemble(
    title: &str,
    blocks: &[Block],
    theme: &dyn Theme,
    strategy: ColumnStrategy,
    page: PageSetup,
) -> Document {
    let paragraphs: Vec<Paragraph> = blocks
        .iter()
        .enumerate()
        .map(|(i, b)| theme.block(b, i))
        .collect();

    let layout = match strategy {
        ColumnStrategy::Native => SectionLayout::Native(page.columns),
        ColumnStrategy::Table => SectionLayout::TableEmulation,
    };

    let mut section = Section::new(layout, page.margins);
    section.push_paragraph(theme.title(title));

    match strategy {
        ColumnStrategy::Native => {
            for p in paragraphs {
                section.push_paragraph(p);
            }
        }
        ColumnStrategy::Table => {
            for row in pair_blocks(paragraphs) {
                section.push_row(row);
            }
        }
    }

    debug!(
        "Assembled '{}' with theme '{}' ({} layout, {} items)",
        title,
        theme.name(),
        strategy,
        section.items.len()
    );

    Document {
        title: title.to_string(),
        sections: vec![section],
    }
}

/// Pair paragraphs consecutively into rows; an odd tail gets an empty right cell.
pub fn pair_blocks(paragraphs: Vec<Paragraph>) -> Vec<RowPair> {
    let mut rows = Vec::with_capacity(paragraphs.len().div_ceil(2));
    let mut iter = paragraphs.into_iter();
    while let Some(left) = iter.next() {
        rows.push(RowPair {
            left,
            right: iter.next(),
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SectionItem, StyledRun};
    use crate::pipeline::classify::classify;
    use crate::pipeline::theme::{StyleSheet, ThemeId};

    fn numbered(n: usize) -> Vec<Paragraph> {
        (0..n)
            .map(|i| Paragraph::new(vec![StyledRun::new(i.to_string(), 20)]))
            .collect()
    }

    #[test]
    fn odd_count_pairs_with_empty_cell() {
        for n in 0..5 {
            let len = 2 * n + 1;
            let rows = pair_blocks(numbered(len));
            assert_eq!(rows.len(), n + 1);
            let last = rows.last().unwrap();
            assert_eq!(last.left.plain_text(), (len - 1).to_string());
            assert!(last.right.is_none());
        }
    }

    #[test]
    fn even_count_fills_every_cell() {
        let rows = pair_blocks(numbered(4));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].left.plain_text(), "0");
        assert_eq!(rows[0].right.as_ref().unwrap().plain_text(), "1");
        assert_eq!(rows[1].left.plain_text(), "2");
        assert_eq!(rows[1].right.as_ref().unwrap().plain_text(), "3");
    }

    #[test]
    fn native_flow_keeps_reading_order() {
        let blocks = classify("Main Idea: one\n\ntwo\n\nthree");
        let doc = assemble(
            "Guide",
            &blocks,
            &StyleSheet::formal(),
            ColumnStrategy::Native,
            PageSetup::default(),
        );

        assert_eq!(doc.sections.len(), 1);
        let section = &doc.sections[0];
        assert_eq!(section.layout, SectionLayout::Native(ColumnSpec::default()));
        assert_eq!(section.margins, Margins::uniform(1440));
        assert_eq!(section.items.len(), 4);
        assert!(section.validate().is_ok());

        let texts: Vec<String> = doc.paragraphs().iter().map(|p| p.plain_text()).collect();
        assert_eq!(texts, vec!["Guide", "Main Idea: one", "two", "three"]);
    }

    #[test]
    fn table_emulation_keeps_title_full_width() {
        let blocks = classify("a\n\nb\n\nc");
        let doc = assemble(
            "Guide",
            &blocks,
            &ThemeId::Accent.style_sheet(),
            ColumnStrategy::Table,
            PageSetup::default(),
        );

        let section = &doc.sections[0];
        assert_eq!(section.layout, SectionLayout::TableEmulation);
        assert!(matches!(section.items[0], SectionItem::Paragraph(_)));
        assert_eq!(section.row_count(), 2);
        assert!(section.validate().is_ok());
    }

    #[test]
    fn palette_index_follows_block_position() {
        let blocks = classify("# A\n\n# B");
        let doc = assemble(
            "T",
            &blocks,
            &ThemeId::Accent.style_sheet(),
            ColumnStrategy::Native,
            PageSetup::default(),
        );
        let paragraphs = doc.paragraphs();
        assert_eq!(paragraphs[1], &resolve_first(&blocks[0], 0));
        assert_eq!(paragraphs[2], &resolve_first(&blocks[1], 1));
    }

    fn resolve_first(block: &Block, index: usize) -> Paragraph {
        crate::pipeline::theme::resolve(block, ThemeId::Accent, index)
    }

    #[test]
    fn strategy_parses() {
        assert_eq!("TABLE".parse::<ColumnStrategy>(), Ok(ColumnStrategy::Table));
        assert_eq!("native".parse::<ColumnStrategy>(), Ok(ColumnStrategy::Native));
        assert!("grid".parse::<ColumnStrategy>().is_err());
    }
}
