//! DOCX assembly: maps elements and inline runs onto `docx-rs` structures.

use std::io::Cursor;
use std::path::PathBuf;

use docx_rs::*;
use image::GenericImageView;
use tracing::{debug, warn};

use crate::config::Config;
use crate::element::{Element, InlineRun};
use crate::error::{Error, Result};
use crate::html;
use crate::inline;
use crate::loader;

const HEADING_STYLES: [(&str, &str, usize); 6] = [
    ("Heading1", "Heading 1", 56),
    ("Heading2", "Heading 2", 42),
    ("Heading3", "Heading 3", 32),
    ("Heading4", "Heading 4", 28),
    ("Heading5", "Heading 5", 24),
    ("Heading6", "Heading 6", 22),
];

const BULLET_NUMBERING: usize = 2;
const MAX_BULLET_LEVEL: usize = 4;

const CHECKED_GLYPH: &str = "☑ ";
const UNCHECKED_GLYPH: &str = "☐ ";

const CODE_SIZE: usize = 21;
const CODE_FILL: &str = "lightGray";
const PLACEHOLDER_COLOR: &str = "666666";
const HEADER_CELL_FILL: &str = "D3D3D3";
const QUOTE_COLOR: &str = "595959";

const EMU_PER_POINT: u32 = 12_700;
const EMU_PER_PIXEL: u32 = 9_525;

enum DocxChild {
    Paragraph(Paragraph),
    Table(Table),
}

/// Builds a document incrementally: one [`add_element`] call per element, in
/// order, then [`render`] packs the result.
///
/// [`add_element`]: DocxBuilder::add_element
/// [`render`]: DocxBuilder::render
pub struct DocxBuilder<'a> {
    config: &'a Config,
    base_path: Option<PathBuf>,
    children: Vec<DocxChild>,
}

impl<'a> DocxBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            base_path: None,
            children: Vec::new(),
        }
    }

    /// Directory that relative image paths resolve against.
    pub fn with_base_path(mut self, base: PathBuf) -> Self {
        self.base_path = Some(base);
        self
    }

    pub fn add_element(&mut self, element: &Element) {
        match element {
            Element::Heading { level, text } => self.push_heading(*level, text),
            Element::List { level, text } => self.push_list(*level, text),
            Element::Checkbox {
                level,
                text,
                checked,
            } => self.push_checkbox(*level, text, *checked),
            Element::Blockquote { text } => self.push_blockquote(text),
            Element::Table { headers, rows } => self.push_table(headers, rows),
            Element::Image {
                alt,
                src,
                width,
                height,
            } => self.push_image(alt, src, *width, *height),
            Element::Paragraph { text } => self.push_paragraph(text),
        }
    }

    /// Pack everything added so far into DOCX bytes.
    pub fn render(self) -> Result<Vec<u8>> {
        let mut docx = Docx::new();

        for (id, name, size) in HEADING_STYLES {
            docx = docx.add_style(
                Style::new(id, StyleType::Paragraph)
                    .name(name)
                    .size(size)
                    .bold(),
            );
        }
        docx = docx.add_style(
            Style::new("Quote", StyleType::Paragraph)
                .name("Quote")
                .italic()
                .color(QUOTE_COLOR),
        );
        docx = docx
            .add_abstract_numbering(bullet_numbering())
            .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING));

        for child in self.children {
            docx = match child {
                DocxChild::Paragraph(p) => docx.add_paragraph(p),
                DocxChild::Table(t) => docx.add_table(t),
            };
        }

        let mut cursor = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut cursor)
            .map_err(|e| Error::Render(e.to_string()))?;
        Ok(cursor.into_inner())
    }

    fn push_heading(&mut self, level: u8, text: &str) {
        let style = format!("Heading{}", level.clamp(1, 6));
        let para = Paragraph::new().style(&style);
        // Size and weight come from the style; runs carry fonts only.
        let para = self.add_runs(para, inline::tokenize(text), None);
        self.children.push(DocxChild::Paragraph(para));
    }

    fn push_list(&mut self, level: usize, text: &str) {
        let para = Paragraph::new().numbering(
            NumberingId::new(BULLET_NUMBERING),
            IndentLevel::new(level.min(MAX_BULLET_LEVEL)),
        );
        let para = self.add_runs(para, inline::tokenize(text), Some(self.config.font.size));
        self.children.push(DocxChild::Paragraph(para));
    }

    fn push_checkbox(&mut self, level: usize, text: &str, checked: bool) {
        let glyph = if checked { CHECKED_GLYPH } else { UNCHECKED_GLYPH };
        let indent = 720 + 360 * level.min(MAX_BULLET_LEVEL) as i32;
        let para = Paragraph::new()
            .indent(Some(indent), None, None, None)
            .add_run(self.body_run(glyph, Some(self.config.font.size)));
        let para = self.add_runs(para, inline::tokenize(text), Some(self.config.font.size));
        self.children.push(DocxChild::Paragraph(para));
    }

    fn push_blockquote(&mut self, text: &str) {
        let para = Paragraph::new()
            .style("Quote")
            .indent(Some(360), None, None, None);
        let para = self.add_runs(para, inline::tokenize(text), Some(self.config.font.size));
        self.children.push(DocxChild::Paragraph(para));
    }

    fn push_table(&mut self, headers: &[String], rows: &[Vec<String>]) {
        let header_cells = headers
            .iter()
            .map(|cell| {
                self.table_cell(cell, true)
                    .shading(
                        Shading::new()
                            .shd_type(ShdType::Clear)
                            .color("auto")
                            .fill(HEADER_CELL_FILL),
                    )
                    .vertical_align(VAlignType::Center)
            })
            .collect();

        let mut table_rows = vec![TableRow::new(header_cells)];
        for row in rows {
            let cells = row.iter().map(|cell| self.table_cell(cell, false)).collect();
            table_rows.push(TableRow::new(cells));
        }

        self.children.push(DocxChild::Table(
            Table::new(table_rows).width(5000, WidthType::Pct),
        ));
        // Breathing room below the table.
        self.children.push(DocxChild::Paragraph(Paragraph::new()));
    }

    fn table_cell(&self, text: &str, header: bool) -> TableCell {
        let mut para = Paragraph::new();
        for run in inline::tokenize(text) {
            let mut styled = self.style_run(run, Some(self.config.font.size));
            if header {
                styled = styled.bold();
            }
            para = para.add_run(styled);
        }
        TableCell::new().add_paragraph(para)
    }

    fn push_image(&mut self, alt: &str, src: &str, width: Option<u32>, height: Option<u32>) {
        match self.load_and_measure(src) {
            Ok((bytes, px_w, px_h)) => {
                debug!(src, px_w, px_h, "embedding image");
                let (w_emu, h_emu) = emu_size(px_w, px_h, width, height);
                let pic = Pic::new(&bytes).size(w_emu, h_emu);
                self.children.push(DocxChild::Paragraph(
                    Paragraph::new().add_run(Run::new().add_image(pic)),
                ));
            }
            Err(e) => {
                warn!(src, error = %e, "image unavailable, substituting placeholder");
                let label = format!("[image unavailable: {src} ({e})] {alt}");
                let run = self
                    .body_run(&label, Some(self.config.font.size))
                    .italic()
                    .color(PLACEHOLDER_COLOR);
                self.children
                    .push(DocxChild::Paragraph(Paragraph::new().add_run(run)));
            }
        }
    }

    /// Fetch and decode, yielding bytes plus pixel dimensions. Decoding up
    /// front keeps undecodable payloads out of the document writer, which
    /// cannot reject them gracefully.
    fn load_and_measure(&self, src: &str) -> Result<(Vec<u8>, u32, u32)> {
        let loaded = loader::load_image(src, self.base_path.as_deref())?;
        let decoded = image::load_from_memory(&loaded.bytes).map_err(|e| Error::Image {
            src: src.to_string(),
            reason: format!("undecodable {} data: {e}", loaded.mime),
        })?;
        let (px_w, px_h) = decoded.dimensions();
        Ok((loaded.bytes, px_w, px_h))
    }

    fn push_paragraph(&mut self, text: &str) {
        for segment in paragraph_segments(text) {
            let para = Paragraph::new().line_spacing(LineSpacing::new().line(276));
            let para = self.add_runs(para, inline::tokenize(segment), Some(self.config.font.size));
            self.children.push(DocxChild::Paragraph(para));
        }
    }

    fn add_runs(&self, mut para: Paragraph, runs: Vec<InlineRun>, size: Option<usize>) -> Paragraph {
        for run in runs {
            para = para.add_run(self.style_run(run, size));
        }
        para
    }

    fn style_run(&self, run: InlineRun, size: Option<usize>) -> Run {
        match run {
            InlineRun::Text(text) => self.body_run(&text, size),
            InlineRun::Bold(text) => self.body_run(&text, size).bold(),
            InlineRun::Italic(text) => self.body_run(&text, size).italic(),
            InlineRun::Code(text) => {
                let code = &self.config.font.code_family;
                text_run(&text)
                    .fonts(
                        RunFonts::new()
                            .ascii(code.as_str())
                            .hi_ansi(code.as_str())
                            .east_asia(code.as_str()),
                    )
                    .size(CODE_SIZE)
                    .color(self.config.code.color.as_str())
                    .highlight(CODE_FILL)
            }
            InlineRun::Link { text, .. } => {
                let mut run = self
                    .body_run(&text, size)
                    .color(self.config.links.color.as_str());
                if self.config.links.underline {
                    run = run.underline("single");
                }
                run
            }
            InlineRun::LinkUrl(url) => self
                .body_run(&format!(" ({url})"), size)
                .color(self.config.links.annotation_color.as_str()),
            InlineRun::ImageRef(label) => self
                .body_run(&label, size)
                .italic()
                .color(PLACEHOLDER_COLOR),
            InlineRun::LineBreak => Run::new().add_break(BreakType::TextWrapping),
            InlineRun::HorizontalRule => self.body_run(html::RULE_GLYPH, size),
        }
    }

    fn body_run(&self, text: &str, size: Option<usize>) -> Run {
        let family = &self.config.font.family;
        let mut run = text_run(text).fonts(
            RunFonts::new()
                .ascii(family.as_str())
                .hi_ansi(family.as_str())
                .east_asia(family.as_str()),
        );
        if let Some(size) = size {
            run = run.size(size);
        }
        run
    }
}

/// Literal newlines inside run text become in-paragraph breaks; the XML text
/// node must never carry a raw line feed.
fn text_run(text: &str) -> Run {
    let mut run = Run::new();
    for (idx, piece) in text.split('\n').enumerate() {
        if idx > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        if !piece.is_empty() {
            run = run.add_text(piece);
        }
    }
    run
}

/// Paragraph text splits on newline (restored `<br>`): the first segment is
/// dropped when blank, later blank segments become empty spacer paragraphs.
fn paragraph_segments(text: &str) -> Vec<&str> {
    text.split('\n')
        .enumerate()
        .filter(|(idx, segment)| *idx > 0 || !segment.trim().is_empty())
        .map(|(_, segment)| segment)
        .collect()
}

fn bullet_numbering() -> AbstractNumbering {
    let mut numbering = AbstractNumbering::new(BULLET_NUMBERING);
    for level in 0..=MAX_BULLET_LEVEL {
        let glyph = if level % 2 == 0 { "•" } else { "◦" };
        numbering = numbering.add_level(
            Level::new(
                level,
                Start::new(1),
                NumberFormat::new("bullet"),
                LevelText::new(glyph),
                LevelJc::new("left"),
            )
            .indent(
                Some(720 + 360 * level as i32),
                Some(SpecialIndentType::Hanging(360)),
                None,
                None,
            ),
        );
    }
    numbering
}

/// Final size in EMU. Explicit dimensions are points; a missing side keeps
/// the decoded aspect ratio; with neither, natural pixel size at 96 DPI.
fn emu_size(px_w: u32, px_h: u32, width_pt: Option<u32>, height_pt: Option<u32>) -> (u32, u32) {
    match (width_pt, height_pt) {
        (Some(w), Some(h)) => (
            w.saturating_mul(EMU_PER_POINT),
            h.saturating_mul(EMU_PER_POINT),
        ),
        (Some(w), None) => {
            let w_emu = w.saturating_mul(EMU_PER_POINT);
            (w_emu, scale(w_emu, px_h, px_w))
        }
        (None, Some(h)) => {
            let h_emu = h.saturating_mul(EMU_PER_POINT);
            (scale(h_emu, px_w, px_h), h_emu)
        }
        (None, None) => (
            px_w.saturating_mul(EMU_PER_PIXEL),
            px_h.saturating_mul(EMU_PER_PIXEL),
        ),
    }
}

fn scale(base: u32, numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return base;
    }
    (u64::from(base) * u64::from(numerator) / u64::from(denominator)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn render(markdown: &str) -> Vec<u8> {
        let config = Config::default();
        let mut builder = DocxBuilder::new(&config);
        for element in parse(markdown) {
            builder.add_element(&element);
        }
        builder.render().unwrap()
    }

    #[test]
    fn output_is_a_zip_archive() {
        let bytes = render("# Hello\n\nworld");
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn every_element_kind_renders() {
        let md = "# H\n\npara **b** *i* `c` [l](u)\n\n- item\n  - nested\n- [x] done\n- [ ] todo\n> quote\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\nx<hr>y\na<br>b\n";
        let bytes = render(md);
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn failed_image_load_becomes_a_placeholder() {
        // Missing file: the document still renders.
        let bytes = render("![gone](no/such/file.png)");
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn undecodable_image_bytes_become_a_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.png");
        std::fs::write(&path, b"not an image").unwrap();

        let config = Config::default();
        let mut builder =
            DocxBuilder::new(&config).with_base_path(dir.path().to_path_buf());
        builder.add_element(&Element::Image {
            alt: "x".into(),
            src: "fake.png".into(),
            width: None,
            height: None,
        });
        assert!(builder.render().unwrap().starts_with(b"PK"));
    }

    #[test]
    fn paragraph_segments_keep_interior_blanks_only() {
        assert_eq!(paragraph_segments("a\n\nb"), vec!["a", "", "b"]);
        assert_eq!(paragraph_segments("\na"), vec!["a"]);
        assert_eq!(paragraph_segments("a"), vec!["a"]);
        assert!(paragraph_segments("").is_empty());
    }

    #[test]
    fn emu_sizes() {
        // Both sides given: points straight to EMU.
        assert_eq!(
            emu_size(400, 300, Some(100), Some(50)),
            (100 * EMU_PER_POINT, 50 * EMU_PER_POINT)
        );
        // Width only: height follows the 4:3 aspect.
        let (w, h) = emu_size(400, 300, Some(100), None);
        assert_eq!(w, 100 * EMU_PER_POINT);
        assert_eq!(h, 75 * EMU_PER_POINT);
        // Height only.
        let (w, h) = emu_size(400, 300, None, Some(75));
        assert_eq!(w, 100 * EMU_PER_POINT);
        assert_eq!(h, 75 * EMU_PER_POINT);
        // Natural size at 96 DPI.
        assert_eq!(
            emu_size(400, 300, None, None),
            (400 * EMU_PER_PIXEL, 300 * EMU_PER_PIXEL)
        );
    }

    #[test]
    fn zero_pixel_dimensions_do_not_divide_by_zero() {
        let (_, h) = emu_size(0, 0, Some(10), None);
        assert_eq!(h, 10 * EMU_PER_POINT);
    }
}
