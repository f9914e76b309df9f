use crate::application::ports::HtmlSanitizer;
use once_cell::sync::Lazy;
use regex::Regex;

const BLOCKED_ELEMENTS: [&str; 5] = ["script", "style", "iframe", "object", "embed"];

static BLOCKED_BLOCKS: Lazy<Vec<Regex>> = Lazy::new(|| {
    BLOCKED_ELEMENTS
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<\s*{tag}\b[^>]*>.*?<\s*/\s*{tag}\s*>"))
                .expect("blocked element pattern is valid")
        })
        .collect()
});

static BLOCKED_TAGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*/?\s*(?:script|style|iframe|object|embed)\b[^>]*>")
        .expect("blocked tag pattern is valid")
});

static EVENT_HANDLERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)[\s/]+on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#)
        .expect("event handler pattern is valid")
});

static SCRIPT_URLS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(href|src|action|formaction)\s*=\s*(?:"\s*(?:javascript|vbscript|data:text/html)[^"]*"|'\s*(?:javascript|vbscript|data:text/html)[^']*'|(?:javascript|vbscript|data:text/html)[^\s>]*)"#,
    )
    .expect("script url pattern is valid")
});

/// Pattern-based sanitizer for template previews.
///
/// Removes executable elements with their bodies, inline event handlers
/// and script URLs. Markup it does not recognise is left as is.
///
/// Passes repeat until the output is stable, so fragments that join into a
/// blocked tag after one removal are caught on the next pass. Every pass
/// that changes anything shortens the text.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexHtmlSanitizer;

impl RegexHtmlSanitizer {
    pub fn new() -> Self {
        Self
    }
}

impl HtmlSanitizer for RegexHtmlSanitizer {
    fn sanitize(&self, html: &str) -> String {
        let mut cleaned = html.to_string();
        loop {
            let next = sanitize_pass(&cleaned);
            if next == cleaned {
                return cleaned;
            }
            cleaned = next;
        }
    }
}

fn sanitize_pass(html: &str) -> String {
    let mut cleaned = html.to_string();
    for pattern in BLOCKED_BLOCKS.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    cleaned = BLOCKED_TAGS.replace_all(&cleaned, "").into_owned();
    cleaned = EVENT_HANDLERS.replace_all(&cleaned, "").into_owned();
    SCRIPT_URLS
        .replace_all(&cleaned, r##"$1="#""##)
        .into_owned()
}
