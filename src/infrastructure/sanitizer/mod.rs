pub mod regex_sanitizer;

pub use regex_sanitizer::RegexHtmlSanitizer;
