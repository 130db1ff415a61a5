/// Inline text runs with formatting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineRun {
    Text(String),
    Bold(String),
    Italic(String),
    Code(String),
    /// Link label. Always immediately followed by the matching [`InlineRun::LinkUrl`].
    Link {
        text: String,
        url: String,
    },
    /// URL annotation rendered after the link label, as " (url)".
    LinkUrl(String),
    /// Placeholder label for an image that appeared mid-text, e.g. "[image: logo]".
    ImageRef(String),
    LineBreak,
    HorizontalRule,
}

/// Block-level elements parsed from Markdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Heading {
        level: u8,
        text: String,
    },
    List {
        level: usize,
        text: String,
    },
    Checkbox {
        level: usize,
        text: String,
        checked: bool,
    },
    Blockquote {
        text: String,
    },
    /// Headers and rows are kept exactly as split; rows are not padded to the
    /// header width.
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Width and height are in points, each independently optional.
    Image {
        alt: String,
        src: String,
        width: Option<u32>,
        height: Option<u32>,
    },
    Paragraph {
        text: String,
    },
}

/// Per-kind element counts, computed after parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementCounts {
    pub headings: usize,
    pub lists: usize,
    pub checkboxes: usize,
    pub tables: usize,
    pub blockquotes: usize,
    pub images: usize,
    pub paragraphs: usize,
}

impl ElementCounts {
    pub fn tally(elements: &[Element]) -> Self {
        let mut counts = Self::default();
        for element in elements {
            match element {
                Element::Heading { .. } => counts.headings += 1,
                Element::List { .. } => counts.lists += 1,
                Element::Checkbox { .. } => counts.checkboxes += 1,
                Element::Table { .. } => counts.tables += 1,
                Element::Blockquote { .. } => counts.blockquotes += 1,
                Element::Image { .. } => counts.images += 1,
                Element::Paragraph { .. } => counts.paragraphs += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.headings
            + self.lists
            + self.checkboxes
            + self.tables
            + self.blockquotes
            + self.images
            + self.paragraphs
    }
}
