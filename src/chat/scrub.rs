//! Best-effort PII redaction for chat memory.
//!
//! Replaces emails, phone numbers, card numbers, SSNs, IP addresses, street
//! addresses, and two-word capitalized names with bracketed tags before
//! anything is stored. Idempotent: the tags themselves never re-match, so
//! scrubbing already-scrubbed text is a no-op. This is a filter, not a
//! guaranteed redaction.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid regex")
});

static CARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:\d{4}[ -]?){3}\d{4}\b").expect("valid regex"));

static SSN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("valid regex"));

// No leading \b: a word boundary never sits before "(".
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?1[ .-])?\(?\d{3}\)?[ .-]\d{3}[ .-]\d{4}\b").expect("valid regex")
});

static IP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,3}(?:\.\d{1,3}){3}\b").expect("valid regex"));

static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b\d+ [A-Z][a-z]+(?: [A-Z][a-z]+)? (?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr)\b",
    )
    .expect("valid regex")
});

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][a-z]+) ([A-Z][a-z]+)\b").expect("valid regex"));

/// Leading words that make a capitalized bigram ordinary prose, not a name.
const NAME_ALLOWLIST: &[&str] = &[
    "The", "A", "An", "This", "That", "What", "How", "Why", "When", "Where", "Who", "Is",
    "Are", "Can", "Could", "Please", "Hello", "Thanks", "Thank",
];

/// Redact PII markers from `text`.
pub fn scrub(text: &str) -> String {
    // Order matters: digit-bearing patterns run before the name pattern so a
    // replaced tag never feeds a later rule.
    let text = EMAIL.replace_all(text, "[EMAIL]");
    let text = CARD.replace_all(&text, "[CARD]");
    let text = SSN.replace_all(&text, "[SSN]");
    let text = PHONE.replace_all(&text, "[PHONE]");
    let text = IP.replace_all(&text, "[IP]");
    let text = ADDRESS.replace_all(&text, "[ADDRESS]");
    let text = NAME.replace_all(&text, |caps: &regex::Captures| {
        let first = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        if NAME_ALLOWLIST.contains(&first) {
            Cow::Owned(caps[0].to_string())
        } else {
            Cow::Borrowed("[NAME]")
        }
    });
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrubs_email() {
        assert_eq!(scrub("mail me at jane.doe@example.com please"), "mail me at [EMAIL] please");
    }

    #[test]
    fn scrubs_phone() {
        assert_eq!(scrub("call 415-555-1234 today"), "call [PHONE] today");
        assert_eq!(scrub("call (415) 555-1234"), "call [PHONE]");
    }

    #[test]
    fn scrubs_card_and_ssn() {
        assert_eq!(scrub("card 4111 1111 1111 1111"), "card [CARD]");
        assert_eq!(scrub("ssn 123-45-6789"), "ssn [SSN]");
    }

    #[test]
    fn scrubs_ip() {
        assert_eq!(scrub("from 192.168.0.1 today"), "from [IP] today");
    }

    #[test]
    fn scrubs_address() {
        assert_eq!(scrub("I live at 42 Baker Street now"), "I live at [ADDRESS] now");
    }

    #[test]
    fn scrubs_two_word_name() {
        assert_eq!(scrub("ask Grace Hopper about compilers"), "ask [NAME] about compilers");
    }

    #[test]
    fn allowlisted_bigrams_survive() {
        assert_eq!(scrub("The Server is down"), "The Server is down");
        assert_eq!(scrub("What Time is it"), "What Time is it");
    }

    #[test]
    fn scrub_is_idempotent() {
        let samples = [
            "mail jane.doe@example.com from 10.0.0.1",
            "Grace Hopper lives at 42 Baker Street, card 4111 1111 1111 1111",
            "already scrubbed: [EMAIL] [PHONE] [NAME] [ADDRESS]",
            "plain text with no secrets",
        ];
        for sample in samples {
            let once = scrub(sample);
            assert_eq!(scrub(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(scrub("tell me about compilers"), "tell me about compilers");
    }
}
