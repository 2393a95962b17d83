use crate::fetcher::{
    errors::FetchError,
    types::{Charset, PageResponse},
};
use encoding_rs::Encoding;
use regex::Regex;
use reqwest::StatusCode;
use std::sync::LazyLock;
use url::Url;

/// Bytes of the body inspected for `<meta>` charset declarations.
const SNIFF_LEN: usize = 4096;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

pub fn process_response(
    url_final: Url,
    status: StatusCode,
    body_bytes: &[u8],
    content_type: &str,
) -> Result<PageResponse, FetchError> {
    let charset = detect_charset(content_type, body_bytes);
    let body = decode_to_utf8(body_bytes, &charset)?;

    Ok(PageResponse {
        url_final,
        status,
        body,
        charset,
    })
}

fn label_encoding(regex: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = regex.captures(haystack)?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}

/// Content-Type header first, then `<meta>` in the head of the body, then
/// statistical detection.
fn detect_charset(content_type: &str, body_bytes: &[u8]) -> Charset {
    if let Some(encoding) = label_encoding(&CHARSET_REGEX, content_type) {
        return Charset::from_encoding(encoding);
    }

    let head = &body_bytes[..body_bytes.len().min(SNIFF_LEN)];
    let head_str = String::from_utf8_lossy(head);

    // Also catches http-equiv="Content-Type" content="...; charset=..."
    if let Some(encoding) = label_encoding(&META_CHARSET_REGEX, &head_str) {
        return Charset::from_encoding(encoding);
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(head, body_bytes.len() <= SNIFF_LEN);
    Charset::from_encoding(detector.guess(None, true))
}

fn decode_to_utf8(body_bytes: &[u8], charset: &Charset) -> Result<String, FetchError> {
    let encoding = charset.encoding();
    let (decoded, _encoding, had_errors) = encoding.decode(body_bytes);

    if had_errors {
        return Err(FetchError::Charset(format!(
            "failed to decode body as {}",
            encoding.name()
        )));
    }

    Ok(decoded.into_owned())
}
