//! Post-processing: deterministic cleanup of VLM-generated captions.
//!
//! Chat-tuned vision models sometimes echo pieces of their own template back:
//! `<|im_start|>`-style control tokens, a bare `assistant` line, or an
//! `assistant:` prefix before the answer. None of that belongs in a document
//! a screen reader will read aloud.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so the role-marker rules can work line by
//! line; control tokens go before role markers because `<|im_start|>assistant`
//! leaves a bare role word once the token is gone.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all caption cleanup rules to the raw VLM output.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Remove `<|…|>` control tokens
/// 3. Drop lines that consist only of a role marker
/// 4. Strip a leading `role:` prefix from lines
/// 5. Trim surrounding whitespace
pub fn clean_caption(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_control_tokens(&s);
    let s = remove_role_lines(&s);
    let s = strip_role_prefixes(&s);
    s.trim().to_string()
}

// ── Rule 1 ───────────────────────────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2 ───────────────────────────────────────────────────────────────

static RE_CONTROL_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<\|[^|>]*\|>").unwrap());

fn remove_control_tokens(input: &str) -> String {
    RE_CONTROL_TOKEN.replace_all(input, "").into_owned()
}

// ── Rules 3 and 4 ────────────────────────────────────────────────────────

static RE_ROLE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(user|assistant|system)\s*:?\s*$").unwrap());

static RE_ROLE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(user|assistant|system)\s*:\s*").unwrap());

fn remove_role_lines(input: &str) -> String {
    input
        .lines()
        .filter(|line| !RE_ROLE_LINE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_role_prefixes(input: &str) -> String {
    input
        .lines()
        .map(|line| RE_ROLE_PREFIX.replace(line, "").into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_chat_template_echo() {
        let raw = "<|im_start|>user\n이 이미지를 설명해줘.<|im_end|>\n<|im_start|>assistant\n막대 그래프입니다.<|im_end|>";
        assert_eq!(clean_caption(raw), "이 이미지를 설명해줘.\n막대 그래프입니다.");
    }

    #[test]
    fn strips_role_prefix() {
        assert_eq!(clean_caption("Assistant: A red circle."), "A red circle.");
    }

    #[test]
    fn keeps_role_words_inside_sentences() {
        let s = "The user interface shows a system diagram.";
        assert_eq!(clean_caption(s), s);
    }

    #[test]
    fn normalises_crlf_and_trims() {
        assert_eq!(clean_caption("  line one\r\nline two\r\n\n"), "line one\nline two");
    }

    #[test]
    fn empty_output_stays_empty() {
        assert_eq!(clean_caption("<|im_end|>\nassistant\n"), "");
    }
}
