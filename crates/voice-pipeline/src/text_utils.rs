//! Text preprocessing for the LLM → TTS boundary.
//!
//! Adapted from the markdown-stripping and sentence-bounded chunking used
//! ahead of a local TTS engine, retargeted at the spoken-text control tags
//! this orchestrator's prompts use instead of markdown:
//! `[END_CALL]`, `[TRANSFER]`, `[DTMF:<digits>]`.

/// Directives detected and stripped out of one flushed text chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlTags {
    pub should_hangup: bool,
    pub should_transfer: bool,
    pub dtmf_digits: Option<String>,
}

/// Strips recognized control tags from `text`, returning the spoken-clean
/// remainder and which directives were found.
#[must_use]
pub fn strip_control_tags(text: &str) -> (String, ControlTags) {
    let mut tags = ControlTags::default();
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    loop {
        let Some(start) = rest.find('[') else {
            out.push_str(rest);
            break;
        };
        out.push_str(&rest[..start]);
        let Some(end) = rest[start..].find(']') else {
            out.push_str(&rest[start..]);
            break;
        };
        let tag = &rest[start + 1..start + end];
        match tag {
            "END_CALL" => tags.should_hangup = true,
            "TRANSFER" => tags.should_transfer = true,
            t if t.starts_with("DTMF:") => tags.dtmf_digits = Some(t["DTMF:".len()..].to_string()),
            _ => out.push_str(&rest[start..start + end + 1]),
        }
        rest = &rest[start + end + 1..];
    }

    (collapse_whitespace(&out), tags)
}

/// True if `text` ends in a sentence-terminating punctuation mark.
#[must_use]
pub fn ends_with_sentence_boundary(text: &str) -> bool {
    matches!(text.trim_end().chars().last(), Some('.' | '?' | '!' | '\n'))
}

/// True if the tail of `text` could still grow into a recognized control tag
/// (an open `[` without a matching `]` yet). While true, the LLM processor
/// should hold the sentence buffer rather than flush, so a tag never gets
/// split across two TTS chunks.
#[must_use]
pub fn has_unclosed_tag_prefix(text: &str) -> bool {
    match text.rfind('[') {
        Some(idx) => !text[idx..].contains(']'),
        None => false,
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_end_call_tag() {
        let (clean, tags) = strip_control_tags("Gracias por tu tiempo. [END_CALL]");
        assert_eq!(clean, "Gracias por tu tiempo.");
        assert!(tags.should_hangup);
    }

    #[test]
    fn strips_transfer_tag() {
        let (clean, tags) = strip_control_tags("Te transfiero. [TRANSFER]");
        assert_eq!(clean, "Te transfiero.");
        assert!(tags.should_transfer);
    }

    #[test]
    fn strips_dtmf_tag_and_captures_digits() {
        let (clean, tags) = strip_control_tags("Marcando [DTMF:123] ahora.");
        assert_eq!(clean, "Marcando ahora.");
        assert_eq!(tags.dtmf_digits.as_deref(), Some("123"));
    }

    #[test]
    fn unrecognized_bracket_text_is_kept() {
        let (clean, tags) = strip_control_tags("Code: [NOT_A_TAG] here");
        assert_eq!(clean, "Code: [NOT_A_TAG] here");
        assert_eq!(tags, ControlTags::default());
    }

    #[test]
    fn detects_sentence_boundary() {
        assert!(ends_with_sentence_boundary("Hola. "));
        assert!(!ends_with_sentence_boundary("Hola,"));
    }

    #[test]
    fn detects_unclosed_tag_prefix() {
        assert!(has_unclosed_tag_prefix("Un momento [END"));
        assert!(!has_unclosed_tag_prefix("Un momento [END_CALL]"));
        assert!(!has_unclosed_tag_prefix("Un momento."));
    }
}
