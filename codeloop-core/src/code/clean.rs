//! Sanitizing raw model output into plain source code

use std::sync::OnceLock;

use regex::Regex;

/// Opening fence with an optional language tag (e.g. "```python")
fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"```[a-zA-Z]*").expect("fence pattern is valid"))
}

/// Line boundaries recognized by Python's `str.splitlines`
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split on every line boundary; `\r\n` counts as one break and a final
/// break does not produce an empty trailing line
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                chars.next();
                start = j + 1;
            }
        }
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Strip markdown fences and whole-line comments from model output.
///
/// Every fence token is removed wherever it appears, then every line whose
/// first non-whitespace character is `#` is dropped. Inline comments after
/// code survive. The result is trimmed and may be empty.
pub fn clean_code(raw: &str) -> String {
    let unfenced = fence_pattern().replace_all(raw, "");
    let unfenced = unfenced.replace("```", "");

    split_lines(&unfenced)
        .into_iter()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
