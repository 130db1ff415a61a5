//! HTML markup handling: `<br>`/`<hr>` survive as marker sequences while
//! every other tag and comment is stripped before line classification.

use std::sync::LazyLock;

use regex::Regex;

/// Marker standing in for `<br>` until restore time.
pub const BREAK_MARKER: &str = "\u{1}BR\u{1}";

/// Marker standing in for `<hr>` until restore time.
pub const RULE_MARKER: &str = "\u{1}HR\u{1}";

/// The glyph row a horizontal rule renders as.
pub const RULE_GLYPH: &str = "─────────────────────";

static BR_TAG: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"(?i)<br\s*/?>").unwrap()
});

static HR_TAG: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"(?i)<hr\s*/?>").unwrap()
});

static HTML_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"(?s)<!--.*?-->").unwrap()
});

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"<[^>]+>").unwrap()
});

/// Replace `<br>`/`<hr>` with markers, then drop comments and every other
/// tag. Marker substitution runs first so the two tags survive the strip.
pub fn strip_markup(text: &str) -> String {
    let text = BR_TAG.replace_all(text, BREAK_MARKER);
    let text = HR_TAG.replace_all(&text, RULE_MARKER);
    let text = HTML_COMMENT.replace_all(&text, "");
    HTML_TAG.replace_all(&text, "").into_owned()
}

/// Document-level pass: deletes any literal U+0001 first, so source text can
/// never forge a marker, then applies [`strip_markup`]. The tokenizer must
/// not use this variant: its input may carry markers this pass produced.
pub fn sanitize_document(text: &str) -> String {
    let scrubbed: String = text.chars().filter(|&c| c != '\u{1}').collect();
    strip_markup(&scrubbed)
}

/// Restore markers in one line: break → newline, rule → the glyph row.
pub fn restore_markers(line: &str) -> String {
    line.replace(BREAK_MARKER, "\n")
        .replace(RULE_MARKER, RULE_GLYPH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn br_variants_become_markers() {
        assert_eq!(strip_markup("a<br>b"), format!("a{BREAK_MARKER}b"));
        assert_eq!(strip_markup("a<br/>b"), format!("a{BREAK_MARKER}b"));
        assert_eq!(strip_markup("a<br />b"), format!("a{BREAK_MARKER}b"));
        assert_eq!(strip_markup("a<BR>b"), format!("a{BREAK_MARKER}b"));
    }

    #[test]
    fn hr_variants_become_markers() {
        assert_eq!(strip_markup("<hr>"), RULE_MARKER);
        assert_eq!(strip_markup("<HR />"), RULE_MARKER);
    }

    #[test]
    fn comments_stripped_across_lines() {
        assert_eq!(strip_markup("a <!-- one\ntwo --> b"), "a  b");
        // Non-greedy: stops at the first closer.
        assert_eq!(strip_markup("<!-- x -->keep<!-- y -->"), "keep");
    }

    #[test]
    fn other_tags_stripped() {
        assert_eq!(strip_markup("<div class=\"x\">text</div>"), "text");
        assert_eq!(strip_markup("<span\nid=\"a\">y</span>"), "y");
    }

    #[test]
    fn marker_inside_comment_is_dropped_with_it() {
        assert_eq!(strip_markup("<!-- <br> -->"), "");
    }

    #[test]
    fn document_pass_scrubs_forged_markers() {
        let forged = format!("x{BREAK_MARKER}y");
        assert_eq!(sanitize_document(&forged), "xBRy");
    }

    #[test]
    fn restore_replaces_all_markers() {
        let line = format!("a{BREAK_MARKER}b{BREAK_MARKER}c");
        assert_eq!(restore_markers(&line), "a\nb\nc");
        assert_eq!(restore_markers(RULE_MARKER), RULE_GLYPH);
    }

    #[test]
    fn rule_glyph_width() {
        assert_eq!(RULE_GLYPH.chars().count(), 21);
    }
}
