mod config;
mod docx;
mod element;
mod error;
mod html;
mod inline;
mod loader;
mod parser;

use std::path::Path;

use tracing::info;

pub use config::Config;
pub use docx::DocxBuilder;
pub use element::{Element, ElementCounts, InlineRun};
pub use error::{Error, Result};
pub use loader::{LoadedImage, load_image};

/// Parse markdown text into a vector of elements.
pub fn parse(markdown: &str) -> Vec<Element> {
    parser::parse(markdown)
}

/// Parse markdown and tally how many elements of each kind came out.
pub fn parse_with_summary(markdown: &str) -> (Vec<Element>, ElementCounts) {
    let elements = parser::parse(markdown);
    let counts = ElementCounts::tally(&elements);
    (elements, counts)
}

/// Tokenize one line of text into styled inline runs.
pub fn tokenize_inline(text: &str) -> Vec<InlineRun> {
    inline::tokenize(text)
}

/// Convert markdown to DOCX bytes with default settings.
pub fn markdown_to_docx(markdown: &str) -> Result<Vec<u8>> {
    markdown_to_docx_with_config(markdown, &Config::default(), None)
}

/// Convert markdown to DOCX bytes. Relative image paths resolve against
/// `base_path` when given.
pub fn markdown_to_docx_with_config(
    markdown: &str,
    config: &Config,
    base_path: Option<&Path>,
) -> Result<Vec<u8>> {
    let (elements, counts) = parse_with_summary(markdown);
    info!(
        elements = counts.total(),
        headings = counts.headings,
        lists = counts.lists,
        checkboxes = counts.checkboxes,
        blockquotes = counts.blockquotes,
        tables = counts.tables,
        images = counts.images,
        paragraphs = counts.paragraphs,
        "building document"
    );

    let mut builder = DocxBuilder::new(config);
    if let Some(base) = base_path {
        builder = builder.with_base_path(base.to_path_buf());
    }
    for element in &elements {
        builder.add_element(element);
    }
    builder.render()
}

/// Convert a markdown file on disk into a DOCX file.
pub fn convert_file(input: &Path, output: &Path, config: &Config) -> Result<()> {
    let markdown = std::fs::read_to_string(input)?;
    let bytes = markdown_to_docx_with_config(&markdown, config, input.parent())?;
    std::fs::write(output, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_to_docx_produces_a_zip() {
        let bytes = markdown_to_docx("# Title\n\nBody text.").unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn summary_counts_every_kind() {
        let md = "# h\n\n- a\n- [ ] b\n> q\n\n| x |\n|---|\n| 1 |\n\n![i](a.png)\n\npara\n";
        let (elements, counts) = parse_with_summary(md);
        assert_eq!(counts.headings, 1);
        assert_eq!(counts.lists, 1);
        assert_eq!(counts.checkboxes, 1);
        assert_eq!(counts.blockquotes, 1);
        assert_eq!(counts.tables, 1);
        assert_eq!(counts.images, 1);
        assert_eq!(counts.paragraphs, 1);
        assert_eq!(counts.total(), elements.len());
    }

    #[test]
    fn convert_file_writes_the_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.md");
        let output = dir.path().join("doc.docx");
        std::fs::write(&input, "# Hi\n\n![gone](missing.png)\n\ndone\n").unwrap();

        convert_file(&input, &output, &Config::default()).unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn convert_file_missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("absent.md");
        let output = dir.path().join("out.docx");
        assert!(convert_file(&input, &output, &Config::default()).is_err());
    }
}
