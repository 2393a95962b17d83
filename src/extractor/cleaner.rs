use regex::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->|</?[A-Za-z!?][^>]*>").unwrap());

/// Remove markup tags and comments, leaving text and entities untouched.
pub fn strip_tags(value: &str) -> String {
    TAG_REGEX.replace_all(value, "").into_owned()
}

/// Visible text of an element, trimmed.
pub fn element_text(node: ElementRef<'_>) -> String {
    node.text().collect::<String>().trim().to_string()
}
