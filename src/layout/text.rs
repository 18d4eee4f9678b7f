//! Greedy line breaking.

use super::{FontSpec, TextMeasure};

/// Breaks `text` into lines no wider than `max_width`.
///
/// Words are kept whole where possible; a word wider than the line on its own is split between
/// characters.  Explicit newlines start a new line.  The result always holds at least one line.
pub fn wrap_text(
    text: &str,
    max_width: f64,
    font: FontSpec,
    measure: &dyn TextMeasure,
) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_owned()
            } else {
                format!("{} {}", current, word)
            };

            if measure.text_width(&candidate, font) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if measure.text_width(word, font) <= max_width {
                current = word.to_owned();
            } else {
                let mut pieces = split_word(word, max_width, font, measure);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }

        lines.push(current);
    }

    lines
}

/// Splits a single word into chunks that fit `max_width`, keeping at least one character per
/// chunk.
fn split_word(
    word: &str,
    max_width: f64,
    font: FontSpec,
    measure: &dyn TextMeasure,
) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for ch in word.chars() {
        current.push(ch);
        if current.chars().count() > 1 && measure.text_width(&current, font) > max_width {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}
