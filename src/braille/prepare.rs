//! Text preparation ahead of Braille transliteration.
//!
//! Word documents carry far more than a Braille reader needs. Preparation
//! narrows the text to a fixed allow-list, normalises it, rewrites a few
//! constructs into readable words, and finally replaces any character
//! `braillify` rejects on its own with a space.

use super::translit::translate_char;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

const ALLOWED_ASCII: &str = concat!(
    "abcdefghijklmnopqrstuvwxyz",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "0123456789",
    " .,;:-!?\"'()[]{}<>/\\+=_*#%&$@",
);

/// Hangul syllables the allow-list keeps, row by row.
const ALLOWED_HANGUL: [&str; 6] = [
    "가나다라마바사아자차카타파하",
    "거너더러머버서어저처커터퍼허",
    "고노도로모보소오조초코토포호",
    "구누두루무부수우주추쿠투푸후",
    "규뉴듀류뮤뷰수유쥬츄큐튜퓨휴",
    "각낙닥락막박삭악작착칵탁팍학",
];

const ALLOWED_MARKS: &str = "…·—–";

static ALLOWED: Lazy<HashSet<char>> = Lazy::new(|| {
    ALLOWED_ASCII
        .chars()
        .chain(ALLOWED_HANGUL.iter().flat_map(|row| row.chars()))
        .chain(ALLOWED_MARKS.chars())
        .chain(std::iter::once('\n'))
        .collect()
});

static RE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());

/// Keep only allow-listed characters and `\n`.
pub fn filter_allowed(text: &str) -> String {
    text.chars().filter(|c| ALLOWED.contains(c)).collect()
}

/// Literal substitutions: ellipsis, URLs, at-signs and ampersands.
pub fn substitute(text: &str) -> String {
    let s = text.replace('…', "...");
    let s = RE_URL.replace_all(&s, "(링크)");
    s.replace('＠', "(at)")
        .replace('@', "(at)")
        .replace('&', "(and)")
}

/// Drop control characters (below U+0020 and U+007F), keeping `\n`.
pub fn strip_controls(text: &str) -> String {
    text.chars()
        .filter(|&c| c == '\n' || (c >= ' ' && c != '\u{7f}'))
        .collect()
}

/// Replace every character the transliterator rejects with a space.
pub fn replace_untranslatable(text: &str) -> String {
    let mut replaced = 0usize;
    let out = text
        .chars()
        .map(|c| match translate_char(c) {
            Ok(_) => c,
            Err(e) => {
                debug!("{}", e);
                replaced += 1;
                ' '
            }
        })
        .collect();
    if replaced > 0 {
        debug!("Replaced {} untranslatable character(s) with spaces", replaced);
    }
    out
}

/// Run every preparation step in order.
pub fn prepare(text: &str) -> String {
    let s = filter_allowed(text);
    let s: String = s.nfkc().collect();
    let s = substitute(&s);
    let s = strip_controls(&s);
    replace_untranslatable(&s)
}
