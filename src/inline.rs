//! Inline tokenizer: one left-to-right scan over a block's text, producing
//! typed runs. Malformed constructs fall through to plain text, never error.

use crate::element::InlineRun;
use crate::html;

/// Tokenize one block of text into formatted runs.
///
/// Always returns at least one run. Markup substitution is re-applied here
/// because some callers hand over text that never saw the document pass
/// (table cells, direct API use).
pub fn tokenize(text: &str) -> Vec<InlineRun> {
    let text = html::strip_markup(text);
    let chars: Vec<char> = text.chars().collect();
    let break_marker: Vec<char> = html::BREAK_MARKER.chars().collect();
    let rule_marker: Vec<char> = html::RULE_MARKER.chars().collect();

    let mut runs = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i..].starts_with(&break_marker) {
            runs.push(InlineRun::LineBreak);
            i += break_marker.len();
            continue;
        }

        if chars[i..].starts_with(&rule_marker) {
            runs.push(InlineRun::HorizontalRule);
            i += rule_marker.len();
            continue;
        }

        // ![alt](url)
        if i + 3 < chars.len() && chars[i] == '!' && chars[i + 1] == '[' {
            if let Some((run, next)) = scan_image(&chars, i) {
                runs.push(run);
                i = next;
                continue;
            }
        }

        // [text](url)
        if i + 3 < chars.len() && chars[i] == '[' {
            if let Some((label, url, next)) = scan_link(&chars, i) {
                runs.push(InlineRun::Link {
                    text: label,
                    url: url.clone(),
                });
                runs.push(InlineRun::LinkUrl(url));
                i = next;
                continue;
            }
        }

        // **bold**
        if i + 3 < chars.len() && chars[i] == '*' && chars[i + 1] == '*' {
            if let Some(end) = find_double_star(&chars, i + 2) {
                runs.push(InlineRun::Bold(chars[i + 2..end].iter().collect()));
                i = end + 2;
                continue;
            }
        }

        // `code`
        if chars[i] == '`' {
            if let Some(end) = find_char(&chars, i + 1, '`') {
                runs.push(InlineRun::Code(chars[i + 1..end].iter().collect()));
                i = end + 1;
                continue;
            }
        }

        // *italic* (a single star; double stars were handled above)
        if chars[i] == '*' && chars.get(i + 1) != Some(&'*') {
            if let Some(end) = find_char(&chars, i + 1, '*') {
                runs.push(InlineRun::Italic(chars[i + 1..end].iter().collect()));
                i = end + 1;
                continue;
            }
        }

        let end = next_special(&chars, i);
        runs.push(InlineRun::Text(chars[i..end].iter().collect()));
        i = end;
    }

    if runs.is_empty() {
        runs.push(InlineRun::Text(text));
    }
    runs
}

/// `![alt](url)`: each delimiter is searched from where the previous one
/// ended, so stray text between them is tolerated. Returns the placeholder
/// run and the index past the closing parenthesis.
fn scan_image(chars: &[char], start: usize) -> Option<(InlineRun, usize)> {
    let alt_end = find_char(chars, start + 2, ']')?;
    let url_start = find_char(chars, alt_end, '(')?;
    let url_end = find_char(chars, url_start, ')')?;

    let alt: String = chars[start + 2..alt_end].iter().collect();
    let url: String = chars[url_start + 1..url_end].iter().collect();
    let label = if alt.is_empty() { &url } else { &alt };
    Some((InlineRun::ImageRef(format!("[image: {label}]")), url_end + 1))
}

/// `[text](url)`: same delimiter discipline as [`scan_image`].
fn scan_link(chars: &[char], start: usize) -> Option<(String, String, usize)> {
    let text_end = find_char(chars, start + 1, ']')?;
    let url_start = find_char(chars, text_end, '(')?;
    let url_end = find_char(chars, url_start, ')')?;

    let text: String = chars[start + 1..text_end].iter().collect();
    let url: String = chars[url_start + 1..url_end].iter().collect();
    Some((text, url, url_end + 1))
}

fn find_char(chars: &[char], from: usize, needle: char) -> Option<usize> {
    chars
        .iter()
        .skip(from)
        .position(|&c| c == needle)
        .map(|pos| from + pos)
}

fn find_double_star(chars: &[char], from: usize) -> Option<usize> {
    let mut j = from;
    while j + 1 < chars.len() {
        if chars[j] == '*' && chars[j + 1] == '*' {
            return Some(j);
        }
        j += 1;
    }
    None
}

/// End of the plain run starting at `from`: the next position that could
/// begin a construct — `*`, backtick, `_`, `[` not preceded by `!`, `!`
/// directly before `[`, or a marker head. The scan starts one past `from`,
/// so a character no rule claimed still gets absorbed and the loop advances.
fn next_special(chars: &[char], from: usize) -> usize {
    let mut j = from + 1;
    while j < chars.len() {
        let c = chars[j];
        if c == '*' || c == '`' || c == '_' || c == '\u{1}' {
            return j;
        }
        if c == '[' && chars[j - 1] != '!' {
            return j;
        }
        if c == '!' && chars.get(j + 1) == Some(&'[') {
            return j;
        }
        j += 1;
    }
    chars.len()
}
