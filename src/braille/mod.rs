//! Korean Braille conversion.
//!
//! Paragraph text goes through three stages:
//!
//! 1. [`prepare`] narrows it to characters worth transliterating,
//! 2. [`translit::translate_lossy`] turns it into Unicode Braille cells,
//! 3. [`encoding::encode`] renders the cells as Unicode or ASCII BRF.

pub mod encoding;
pub mod prepare;
pub mod translit;

use crate::config::BrailleEncoding;

pub use prepare::prepare;
pub use translit::{translate, translate_char, translate_lossy};

/// Braille text for a sequence of paragraphs, joined by `\n`.
pub fn braille_text<S: AsRef<str>>(paragraphs: &[S], encoding: BrailleEncoding) -> String {
    let joined = paragraphs
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");
    let cells = translate_lossy(&prepare(&joined));
    encoding::encode(&cells, encoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_keep_line_structure() {
        let out = braille_text(&["가나", "", "사"], BrailleEncoding::Unicode);
        assert_eq!(out, "⠫⠉\n\n⠇");
    }

    #[test]
    fn url_sentence_reads_as_link_word() {
        let out = braille_text(&["Visit https://example.com today!"], BrailleEncoding::Unicode);
        assert_eq!(out, translate("Visit (링크) today!").unwrap());
        assert!(out.chars().all(|c| ('\u{2800}'..='\u{28FF}').contains(&c)));
    }
}
