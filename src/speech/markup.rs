//! Text preparation for speech synthesis.
//!
//! Model replies arrive with light structural markup (bold/italic markers,
//! inline code, headings, blank-line paragraph breaks). Spoken output must
//! not read those markers aloud, so every utterance passes through
//! [`strip_markup`] before it reaches the synthesis engine.

/// Strip structural markup so the text reads naturally when spoken.
///
/// Applies the following transformations in order:
/// 1. Drop code-fence delimiter lines (``` and ~~~), keeping fenced content
/// 2. Strip leading `#` heading markers and `-`/`*` list bullets per line
/// 3. Remove `*`, `_`, and `` ` `` emphasis/code markers
/// 4. Collapse blank-line runs into sentence breaks
#[must_use]
pub fn strip_markup(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            // A fence boundary reads as a paragraph break, not as text.
            lines.push(String::new());
            continue;
        }
        lines.push(strip_line_markers(trimmed));
    }
    collapse_blank_runs(&lines)
}

/// Strip heading hashes and list bullets from the start of a line, then
/// remove inline emphasis and code markers.
fn strip_line_markers(line: &str) -> String {
    let content = if line.starts_with('#') {
        line.trim_start_matches('#').trim_start()
    } else if let Some(rest) = line.strip_prefix("- ") {
        rest
    } else if let Some(rest) = line.strip_prefix("* ") {
        rest
    } else {
        line
    };
    content.chars().filter(|c| !matches!(c, '*' | '`')).collect()
}

/// Join lines back together, turning each run of blank lines into a single
/// sentence break so paragraphs pause naturally instead of running on.
fn collapse_blank_runs(lines: &[String]) -> String {
    let mut result = String::new();
    let mut pending_break = false;
    for line in lines {
        if line.is_empty() {
            pending_break = !result.is_empty();
            continue;
        }
        if pending_break {
            if !result.ends_with(['.', '!', '?', ':', ',']) {
                result.push('.');
            }
            result.push(' ');
            pending_break = false;
        } else if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(line);
    }
    result
}
