//! Korean Braille transliteration.
//!
//! Cell rules (Hangul abbreviations, number and roman indicators, quotation
//! marks, English passages) come from `braillify`. Its output is Unicode
//! Braille Patterns, with a space rendered as the blank cell U+2800.
//!
//! Translation runs one line at a time, so a rejected paragraph never takes
//! its neighbours down with it.

use crate::error::CellError;
use tracing::{debug, warn};

const BLANK: &str = "\u{2800}";

fn translate_line(line: &str) -> Result<String, CellError> {
    if line.is_empty() {
        return Ok(String::new());
    }
    braillify::encode_to_unicode(line).map_err(|reason| CellError::Rejected {
        text: line.to_string(),
        reason,
    })
}

/// Translate `text`, keeping its line breaks.
///
/// Fails on the first line `braillify` rejects.
pub fn translate(text: &str) -> Result<String, CellError> {
    let lines = text
        .split('\n')
        .map(translate_line)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

/// Translate a single character in isolation.
pub fn translate_char(ch: char) -> Result<String, CellError> {
    let mut buf = [0u8; 4];
    braillify::encode_to_unicode(ch.encode_utf8(&mut buf))
        .map_err(|reason| CellError::Untranslatable { ch, reason })
}

/// Translate `text` without failing.
///
/// A line rejected as a whole is retried word by word; a word that is still
/// rejected is spelled out cell by cell, with a blank cell for every
/// character that has no rendering of its own.
pub fn translate_lossy(text: &str) -> String {
    text.split('\n')
        .map(|line| match translate_line(line) {
            Ok(cells) => cells,
            Err(e) => {
                warn!("{}; translating word by word", e);
                line.split(' ')
                    .map(translate_word_lossy)
                    .collect::<Vec<_>>()
                    .join(BLANK)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn translate_word_lossy(word: &str) -> String {
    translate_line(word).unwrap_or_else(|_| {
        word.chars()
            .map(|ch| {
                translate_char(ch).unwrap_or_else(|e| {
                    debug!("{}", e);
                    BLANK.to_string()
                })
            })
            .collect()
    })
}
