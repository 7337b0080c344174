//! Text cleaning for extracted page and slide text.
//!
//! Slide decks carry characters a screen reader reads aloud as noise, mostly
//! symbol-font glyphs in the Private Use Area and bullet dingbats.

use once_cell::sync::Lazy;
use regex::Regex;

/// Everything outside TAB/LF/CR/U+0020..=U+FFFF, the symbol-font PUA range,
/// decorative bullets and U+FFFD.
static UNWANTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\t\n\r\x{20}-\x{FFFF}]|[\x{F000}-\x{F2FF}]|[•●▪★☆◆◇○◉◎∎\x{FFFD}]").unwrap()
});

/// Strip characters that do not belong in an accessible text document.
///
/// Only removes; never rewrites or reorders. `clean_text(clean_text(s)) == clean_text(s)`.
pub fn clean_text(s: &str) -> String {
    UNWANTED.replace_all(s, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_bullets_and_pua() {
        let s = "• 첫째\n\u{F0B7} second\u{FFFD}\n★ third";
        assert_eq!(clean_text(s), " 첫째\n second\n third");
    }

    #[test]
    fn removes_controls_and_astral() {
        assert_eq!(clean_text("a\u{0007}b\u{1F600}c"), "abc");
    }

    #[test]
    fn keeps_whitespace_and_korean() {
        let s = "=== SLIDE 1 ===\n강의\t소개\r\n";
        assert_eq!(clean_text(s), s);
    }

    #[test]
    fn idempotent() {
        for s in ["", "• a ● b", "x\u{F000}\u{F2FF}y", "plain text", "\u{1F4A1}idea"] {
            let once = clean_text(s);
            assert_eq!(clean_text(&once), once);
        }
    }
}
