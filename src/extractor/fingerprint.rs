/// Stable identifier for a review body.
///
/// MD5 hex digest of the stored `content` value. Used only to recognise the
/// same review across fetches.
pub fn fingerprint(text: &str) -> String {
    format!("{:x}", md5::compute(text.as_bytes()))
}
