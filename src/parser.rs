use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::element::Element;
use crate::html;

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"^(#{1,6})\s+(.+)$").unwrap()
});

static BLOCK_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"^!\[([^\]]*)\]\(([^)]+)\)(?:\{([^}]*)\})?$").unwrap()
});

static INLINE_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").unwrap()
});

static CHECKBOX: LazyLock<Regex> = LazyLock::new(|| {
    // The capture starts at the character inside the brackets so the checked
    // flag and the text come out of one group.
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"^(\s*)[-*]\s+\[([ xX]\]\s+.+)$").unwrap()
});

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"^(\s*)[-*]\s+(.+)$").unwrap()
});

static QUOTE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"^>\s*").unwrap()
});

static IMAGE_WIDTH: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"width=(\d+)").unwrap()
});

static IMAGE_HEIGHT: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"height=(\d+)").unwrap()
});

/// Parse markdown text into a list of elements.
///
/// Total over any input: malformed constructs fall through to less specific
/// rules, never to an error.
pub fn parse(markdown: &str) -> Vec<Element> {
    let text = html::sanitize_document(markdown);
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = text.split('\n').collect();

    let mut elements = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = html::restore_markers(lines[i]);

        if line.trim().is_empty() {
            i += 1;
            continue;
        }

        // Tables are collected from the raw lines: markers inside cells must
        // stay intact for the inline tokenizer. Rejection consumes nothing.
        if lines[i].contains('|') {
            if let Some((table, next)) = parse_table(&lines, i) {
                elements.push(table);
                i = next;
                continue;
            }
        }

        if let Some(caps) = HEADING.captures(&line) {
            elements.push(Element::Heading {
                level: caps[1].len() as u8,
                text: caps[2].to_string(),
            });
            i += 1;
            continue;
        }

        if let Some(image) = parse_block_image(line.trim()) {
            elements.push(image);
            i += 1;
            continue;
        }

        if line.trim_start().starts_with('>') {
            elements.push(Element::Blockquote {
                text: QUOTE_PREFIX.replace(&line, "").into_owned(),
            });
            i += 1;
            continue;
        }

        if let Some(caps) = CHECKBOX.captures(&line) {
            let rest = &caps[2];
            elements.push(Element::Checkbox {
                level: indent_level(&caps[1]),
                checked: rest.starts_with(['x', 'X']),
                text: rest[2..].trim().to_string(),
            });
            i += 1;
            continue;
        }

        if let Some(caps) = LIST_ITEM.captures(&line) {
            elements.push(Element::List {
                level: indent_level(&caps[1]),
                text: caps[2].to_string(),
            });
            i += 1;
            continue;
        }

        push_paragraph_elements(&line, &mut elements);
        i += 1;
    }

    debug!(elements = elements.len(), lines = lines.len(), "parsed markdown");
    elements
}

/// Indent depth shared by checkboxes and list items: two spaces per level.
fn indent_level(indent: &str) -> usize {
    indent.chars().count() / 2
}

/// Collect consecutive `|`-prefixed lines starting at `start`. Needs at
/// least a header plus a `---` separator line; anything less is not a table
/// and the cursor stays put.
fn parse_table(lines: &[&str], start: usize) -> Option<(Element, usize)> {
    let mut end = start;
    let mut collected = Vec::new();
    while end < lines.len() && lines[end].trim().starts_with('|') {
        collected.push(lines[end].trim());
        end += 1;
    }

    if collected.len() < 2 || !collected[1].contains("---") {
        return None;
    }

    let headers = split_row(collected[0]);
    let rows = collected[2..].iter().map(|line| split_row(line)).collect();
    Some((Element::Table { headers, rows }, end))
}

/// Split a `| a | b |` line into cells, dropping the empty fields outside the
/// outer pipes. Cell counts are whatever the line said; rows are not padded.
fn split_row(line: &str) -> Vec<String> {
    let cells: Vec<&str> = line.split('|').collect();
    if cells.len() < 2 {
        return Vec::new();
    }
    cells[1..cells.len() - 1]
        .iter()
        .map(|cell| cell.trim().to_string())
        .collect()
}

/// A line that is an image and nothing else. Dimensions come from an
/// optional `{width=N,height=M}` suffix, in points, each on its own.
fn parse_block_image(line: &str) -> Option<Element> {
    let caps = BLOCK_IMAGE.captures(line)?;
    let alt = match &caps[1] {
        "" => "Image".to_string(),
        alt => alt.to_string(),
    };
    let mut width = None;
    let mut height = None;
    if let Some(options) = caps.get(3) {
        width = IMAGE_WIDTH
            .captures(options.as_str())
            .and_then(|c| c[1].parse().ok());
        height = IMAGE_HEIGHT
            .captures(options.as_str())
            .and_then(|c| c[1].parse().ok());
    }
    Some(Element::Image {
        alt,
        src: caps[2].to_string(),
        width,
        height,
    })
}

/// Paragraph fallback. Images embedded mid-line are lifted out as their own
/// elements; the surrounding text becomes paragraphs, skipping blank gaps.
fn push_paragraph_elements(line: &str, elements: &mut Vec<Element>) {
    let mut last = 0;
    let mut matched = false;
    for caps in INLINE_IMAGE.captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        matched = true;

        let before = &line[last..whole.start()];
        if !before.trim().is_empty() {
            elements.push(Element::Paragraph {
                text: before.to_string(),
            });
        }

        let alt = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let alt = if alt.is_empty() { "Image" } else { alt };
        let src = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        elements.push(Element::Image {
            alt: alt.to_string(),
            src: src.to_string(),
            width: None,
            height: None,
        });
        last = whole.end();
    }

    if !matched {
        elements.push(Element::Paragraph {
            text: line.to_string(),
        });
        return;
    }

    let after = &line[last..];
    if !after.trim().is_empty() {
        elements.push(Element::Paragraph {
            text: after.to_string(),
        });
    }
}
