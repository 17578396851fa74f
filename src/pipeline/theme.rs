//! Style resolution: `(Block, ThemeId, index)` → styled [`Paragraph`].
//!
//! A theme is a presentation policy over the block stream. Themes never see
//! the raw input and never decide layout; they only turn one classified block
//! into one paragraph (plus the title paragraph). That keeps the classifier
//! and the assembler identical across visual variants, so a new look is one
//! new [`Theme`] implementation and nothing else.
//!
//! The five built-in themes are all data: a [`StyleSheet`] per [`ThemeId`].

use crate::model::{
    Alignment, Block, BorderLine, HeadingLevel, LineStyle, Paragraph, ParagraphBorder, StyledRun,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maps blocks to styled paragraphs.
///
/// Implementations must be pure: the same block and index always produce
/// the same paragraph.
pub trait Theme: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Style the document title.
    fn title(&self, title: &str) -> Paragraph;

    /// Style one content block. `index` is the block's position in the
    /// stream and drives palette rotation.
    fn block(&self, block: &Block, index: usize) -> Paragraph;
}

/// Built-in themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeId {
    /// Serif, black, justified, undecorated. (default)
    #[default]
    Formal,
    /// Palette-rotated left border and light shading per header, bullets on body text.
    Accent,
    /// Headers carry a bottom rule.
    Underline,
    /// Headers are white text on a solid banner.
    Banner,
    /// Headers become structural headings.
    Heading,
}

impl ThemeId {
    pub const ALL: [ThemeId; 5] = [
        ThemeId::Formal,
        ThemeId::Accent,
        ThemeId::Underline,
        ThemeId::Banner,
        ThemeId::Heading,
    ];

    /// The style sheet implementing this theme.
    pub fn style_sheet(self) -> StyleSheet {
        match self {
            ThemeId::Formal => StyleSheet::formal(),
            ThemeId::Accent => StyleSheet::accent(),
            ThemeId::Underline => StyleSheet::underline(),
            ThemeId::Banner => StyleSheet::banner(),
            ThemeId::Heading => StyleSheet::heading(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeId::Formal => "formal",
            ThemeId::Accent => "accent",
            ThemeId::Underline => "underline",
            ThemeId::Banner => "banner",
            ThemeId::Heading => "heading",
        }
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThemeId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown theme '{s}' (expected one of: formal, accent, underline, banner, heading)"
                )
            })
    }
}

/// Resolve one block with a built-in theme.
pub fn resolve(block: &Block, theme: ThemeId, index: usize) -> Paragraph {
    theme.style_sheet().block(block, index)
}

// ── Style sheets ─────────────────────────────────────────────────────────

/// Fixed colour or a palette rotated by block index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorPolicy {
    Fixed(&'static str),
    Palette(&'static [&'static str]),
}

impl ColorPolicy {
    pub fn pick(&self, index: usize) -> &'static str {
        match self {
            ColorPolicy::Fixed(hex) => hex,
            ColorPolicy::Palette(colors) if colors.is_empty() => "000000",
            ColorPolicy::Palette(colors) => colors[index % colors.len()],
        }
    }
}

/// How the title paragraph is set apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleDecoration {
    None,
    /// Single rules above and below.
    Rules,
    /// The same glyph on both sides of the title text.
    Glyphs(&'static str),
    /// Double border on all four sides.
    DoubleBox,
    /// Use the structural `Title` style.
    TitleStyle,
}

/// Optional per-header and per-body decorations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decorations {
    /// Left border on headers, coloured like the header text.
    pub left_border: bool,
    /// Bottom rule under headers, coloured like the header text.
    pub bottom_border: bool,
    /// Background fill behind headers.
    pub header_shading: Option<ColorPolicy>,
    /// Render header text in white over `header_shading`.
    pub banner: bool,
    /// Glyph prefixed to body paragraphs.
    pub bullet: Option<&'static str>,
    /// Promote headers to `Heading N` instead of styled body text.
    pub promote_headers: bool,
}

/// A data-driven [`Theme`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSheet {
    pub name: &'static str,
    pub font_family: &'static str,
    /// Body and header size, half-points.
    pub base_size: u32,
    /// Title size, half-points.
    pub title_size: u32,
    pub title_color: &'static str,
    pub header_color: ColorPolicy,
    pub body_color: ColorPolicy,
    /// `(before, after)` in twips.
    pub header_spacing: (u32, u32),
    pub body_spacing: (u32, u32),
    pub title_spacing_after: u32,
    pub alignment: Alignment,
    pub decorations: Decorations,
    pub title_decoration: TitleDecoration,
}

const ACCENT_PALETTE: &[&str] = &["2E86AB", "A23B72", "F18F01", "C73E1D", "6A4C93"];
const ACCENT_TINTS: &[&str] = &["EAF4FA", "F7E9F1", "FEF3E2", "F9E8E5", "F0ECF6"];

impl StyleSheet {
    /// Times New Roman 10 pt, black, justified.
    pub fn formal() -> Self {
        Self {
            name: "formal",
            font_family: "Times New Roman",
            base_size: 20,
            title_size: 24,
            title_color: "000000",
            header_color: ColorPolicy::Fixed("000000"),
            body_color: ColorPolicy::Fixed("000000"),
            header_spacing: (240, 120),
            body_spacing: (0, 120),
            title_spacing_after: 360,
            alignment: Alignment::Justify,
            decorations: Decorations::default(),
            title_decoration: TitleDecoration::None,
        }
    }

    pub fn accent() -> Self {
        Self {
            name: "accent",
            font_family: "Calibri",
            base_size: 21,
            title_size: 32,
            title_color: "2E86AB",
            header_color: ColorPolicy::Palette(ACCENT_PALETTE),
            body_color: ColorPolicy::Fixed("333333"),
            header_spacing: (200, 100),
            body_spacing: (0, 100),
            title_spacing_after: 360,
            alignment: Alignment::Left,
            decorations: Decorations {
                left_border: true,
                header_shading: Some(ColorPolicy::Palette(ACCENT_TINTS)),
                bullet: Some("\u{2022}"),
                ..Decorations::default()
            },
            title_decoration: TitleDecoration::Glyphs("\u{2726}"),
        }
    }

    pub fn underline() -> Self {
        Self {
            name: "underline",
            font_family: "Georgia",
            base_size: 20,
            title_size: 28,
            title_color: "1F3864",
            header_color: ColorPolicy::Fixed("1F3864"),
            body_color: ColorPolicy::Fixed("000000"),
            header_spacing: (240, 120),
            body_spacing: (0, 120),
            title_spacing_after: 360,
            alignment: Alignment::Justify,
            decorations: Decorations {
                bottom_border: true,
                ..Decorations::default()
            },
            title_decoration: TitleDecoration::Rules,
        }
    }

    pub fn banner() -> Self {
        Self {
            name: "banner",
            font_family: "Arial",
            base_size: 20,
            title_size: 28,
            title_color: "1F4E79",
            header_color: ColorPolicy::Fixed("1F4E79"),
            body_color: ColorPolicy::Fixed("000000"),
            header_spacing: (240, 120),
            body_spacing: (0, 120),
            title_spacing_after: 360,
            alignment: Alignment::Left,
            decorations: Decorations {
                header_shading: Some(ColorPolicy::Fixed("1F4E79")),
                banner: true,
                ..Decorations::default()
            },
            title_decoration: TitleDecoration::DoubleBox,
        }
    }

    pub fn heading() -> Self {
        Self {
            name: "heading",
            font_family: "Calibri",
            base_size: 22,
            title_size: 36,
            title_color: "000000",
            header_color: ColorPolicy::Fixed("2F5496"),
            body_color: ColorPolicy::Fixed("000000"),
            header_spacing: (240, 80),
            body_spacing: (0, 120),
            title_spacing_after: 240,
            alignment: Alignment::Left,
            decorations: Decorations {
                promote_headers: true,
                ..Decorations::default()
            },
            title_decoration: TitleDecoration::TitleStyle,
        }
    }

    fn run(&self, text: impl Into<String>, size: u32, color: &str) -> StyledRun {
        StyledRun::new(text, size)
            .color(color)
            .font(self.font_family)
    }

    fn header(&self, block: &Block, index: usize) -> Paragraph {
        let deco = &self.decorations;
        let accent = self.header_color.pick(index);
        let (label_color, rest_color) = if deco.banner {
            ("FFFFFF", "FFFFFF")
        } else {
            (accent, self.body_color.pick(index))
        };

        let label = block.label.as_deref().unwrap_or(&block.text);
        let runs = match block.remainder {
            Some(ref rest) => vec![
                self.run(format!("{label} "), self.base_size, label_color)
                    .bold(true),
                self.run(rest.as_str(), self.base_size, rest_color),
            ],
            None => vec![self.run(label, self.base_size, label_color).bold(true)],
        };

        let (before, after) = self.header_spacing;
        let mut p = Paragraph::new(runs)
            .spacing(before, after)
            .align(self.alignment);

        let mut border = ParagraphBorder::default();
        if deco.left_border {
            border.left = Some(BorderLine::new(LineStyle::Single, 24, accent).space(8));
        }
        if deco.bottom_border {
            border.bottom = Some(BorderLine::new(LineStyle::Single, 8, accent).space(2));
        }
        if !border.is_empty() {
            p.border = Some(border);
        }
        if let Some(shading) = deco.header_shading {
            p.shading = Some(shading.pick(index).to_string());
        }
        if deco.promote_headers {
            p.heading = Some(HeadingLevel::heading(block.level.unwrap_or(2)));
        }
        p
    }

    fn body(&self, block: &Block, index: usize) -> Paragraph {
        let color = self.body_color.pick(index);
        let mut runs = Vec::with_capacity(2);
        if let Some(glyph) = self.decorations.bullet {
            runs.push(self.run(format!("{glyph} "), self.base_size, self.header_color.pick(index)));
        }
        runs.push(self.run(block.text.as_str(), self.base_size, color));

        let (before, after) = self.body_spacing;
        Paragraph::new(runs)
            .spacing(before, after)
            .align(self.alignment)
    }
}

impl Theme for StyleSheet {
    fn name(&self) -> &str {
        self.name
    }

    fn title(&self, title: &str) -> Paragraph {
        let text = match self.title_decoration {
            TitleDecoration::Glyphs(glyph) => format!("{glyph} {title} {glyph}"),
            _ => title.to_string(),
        };
        let mut p = Paragraph::new(vec![self
            .run(text, self.title_size, self.title_color)
            .bold(true)])
        .spacing(0, self.title_spacing_after)
        .align(Alignment::Center);

        match self.title_decoration {
            TitleDecoration::Rules => {
                let rule = BorderLine::new(LineStyle::Single, 6, self.title_color);
                p.border = Some(ParagraphBorder {
                    top: Some(rule.clone()),
                    bottom: Some(rule),
                    ..ParagraphBorder::default()
                });
            }
            TitleDecoration::DoubleBox => {
                let line = BorderLine::new(LineStyle::Double, 12, self.title_color);
                p.border = Some(ParagraphBorder {
                    top: Some(line.clone()),
                    bottom: Some(line.clone()),
                    left: Some(line.clone()),
                    right: Some(line),
                });
            }
            TitleDecoration::TitleStyle => p.heading = Some(HeadingLevel::Title),
            TitleDecoration::None | TitleDecoration::Glyphs(_) => {}
        }
        p
    }

    fn block(&self, block: &Block, index: usize) -> Paragraph {
        if block.is_header() {
            self.header(block, index)
        } else {
            self.body(block, index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::classify::classify;

    fn header(text: &str) -> Block {
        classify(text).remove(0)
    }

    #[test]
    fn labelled_header_yields_two_runs() {
        for id in ThemeId::ALL {
            let p = resolve(&header("Main Idea:   energy flows  "), id, 0);
            assert_eq!(p.runs.len(), 2, "theme {id}");
            assert_eq!(p.runs[0].text, "Main Idea: ");
            assert!(p.runs[0].bold);
            assert_eq!(p.runs[1].text, "energy flows");
            assert!(!p.runs[1].bold);
        }
    }

    #[test]
    fn formal_matches_reference_styling() {
        let p = resolve(&header("Relevance: exams"), ThemeId::Formal, 3);
        assert_eq!((p.spacing_before, p.spacing_after), (240, 120));
        assert_eq!(p.alignment, Alignment::Justify);
        assert_eq!(p.runs[0].size_half_points, 20);
        assert_eq!(p.runs[0].color_hex, "000000");
        assert_eq!(p.runs[0].font_family.as_deref(), Some("Times New Roman"));
        assert!(p.border.is_none());
        assert!(p.shading.is_none());

        let body = resolve(&Block::body("x", "x"), ThemeId::Formal, 0);
        assert_eq!((body.spacing_before, body.spacing_after), (0, 120));
        assert_eq!(body.runs.len(), 1);
    }

    #[test]
    fn accent_rotates_palette_by_index() {
        let block = header("# Topic");
        let first = resolve(&block, ThemeId::Accent, 0);
        let second = resolve(&block, ThemeId::Accent, 1);
        let wrapped = resolve(&block, ThemeId::Accent, ACCENT_PALETTE.len());

        assert_ne!(first.runs[0].color_hex, second.runs[0].color_hex);
        assert_eq!(first.runs[0].color_hex, wrapped.runs[0].color_hex);
        assert_eq!(first.shading.as_deref(), Some(ACCENT_TINTS[0]));
        let left = first.border.unwrap().left.unwrap();
        assert_eq!(left.color_hex, ACCENT_PALETTE[0]);
    }

    #[test]
    fn accent_prefixes_body_with_bullet() {
        let p = resolve(&Block::body("text", "text"), ThemeId::Accent, 0);
        assert_eq!(p.runs.len(), 2);
        assert_eq!(p.runs[0].text, "\u{2022} ");
        assert_eq!(p.plain_text(), "\u{2022} text");
    }

    #[test]
    fn underline_adds_bottom_rule() {
        let p = resolve(&header("Potential Confusion: units"), ThemeId::Underline, 0);
        let border = p.border.unwrap();
        assert!(border.bottom.is_some());
        assert!(border.left.is_none());
    }

    #[test]
    fn banner_uses_white_text_on_fill() {
        let p = resolve(&header("Expert Insight: x"), ThemeId::Banner, 0);
        assert!(p.runs.iter().all(|r| r.color_hex == "FFFFFF"));
        assert_eq!(p.shading.as_deref(), Some("1F4E79"));
    }

    #[test]
    fn heading_theme_promotes_headers() {
        let p = resolve(&header("### Deep dive"), ThemeId::Heading, 0);
        assert_eq!(p.heading, Some(HeadingLevel::Heading(3)));
        let p = resolve(&header("Main Idea: x"), ThemeId::Heading, 0);
        assert_eq!(p.heading, Some(HeadingLevel::Heading(2)));
        let body = resolve(&Block::body("b", "b"), ThemeId::Heading, 0);
        assert_eq!(body.heading, None);
    }

    #[test]
    fn title_decorations() {
        let formal = StyleSheet::formal().title("Guide");
        assert_eq!(formal.alignment, Alignment::Center);
        assert_eq!(formal.spacing_after, 360);
        assert_eq!(formal.runs[0].size_half_points, 24);

        let accent = StyleSheet::accent().title("Guide");
        assert_eq!(accent.plain_text(), "\u{2726} Guide \u{2726}");

        let rules = StyleSheet::underline().title("Guide").border.unwrap();
        assert!(rules.top.is_some() && rules.bottom.is_some());

        let boxed = StyleSheet::banner().title("Guide").border.unwrap();
        assert_eq!(boxed.left.unwrap().style, LineStyle::Double);

        let heading = StyleSheet::heading().title("Guide");
        assert_eq!(heading.heading, Some(HeadingLevel::Title));
    }

    #[test]
    fn theme_id_parses_case_insensitively() {
        assert_eq!("Accent".parse::<ThemeId>(), Ok(ThemeId::Accent));
        assert!("neon".parse::<ThemeId>().is_err());
        assert_eq!(ThemeId::default(), ThemeId::Formal);
    }

    #[test]
    fn empty_palette_falls_back_to_black() {
        assert_eq!(ColorPolicy::Palette(&[]).pick(7), "000000");
    }
}
