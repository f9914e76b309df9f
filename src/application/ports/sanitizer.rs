/// Strips active content from user-authored HTML before it is previewed.
pub trait HtmlSanitizer: Send + Sync {
    fn sanitize(&self, html: &str) -> String;
}
