//! Static allow-list of accepted document types.
//!
//! `ALLOWED_FILE_TYPES` is the single canonical list; both lookup tables are
//! derived from it once on first use.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Canonical MIME type to extension pairs, in presentation order.
pub const ALLOWED_FILE_TYPES: [(&str, &str); 6] = [
    ("application/pdf", ".pdf"),
    ("application/msword", ".doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".docx",
    ),
    ("text/plain", ".txt"),
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
];

lazy_static! {
    static ref MIME_TO_EXTENSION: HashMap<&'static str, &'static str> =
        ALLOWED_FILE_TYPES.iter().copied().collect();

    static ref EXTENSION_TO_MIME: HashMap<&'static str, &'static str> = ALLOWED_FILE_TYPES
        .iter()
        .map(|(mime, extension)| (*extension, *mime))
        .collect();
}

pub fn is_allowed_mime(mime: &str) -> bool {
    MIME_TO_EXTENSION.contains_key(mime)
}

/// `extension` includes the leading dot and must already be lowercase.
pub fn is_allowed_extension(extension: &str) -> bool {
    EXTENSION_TO_MIME.contains_key(extension)
}

pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    MIME_TO_EXTENSION.get(mime).copied()
}

pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    EXTENSION_TO_MIME.get(extension).copied()
}

/// Canonical MIME key matching `mime`, so callers can hold a `'static` str.
pub fn canonical_mime(mime: &str) -> Option<&'static str> {
    MIME_TO_EXTENSION.get_key_value(mime).map(|(key, _)| *key)
}

pub fn allowed_extensions() -> Vec<&'static str> {
    ALLOWED_FILE_TYPES.iter().map(|(_, extension)| *extension).collect()
}

pub fn allowed_mime_types() -> Vec<&'static str> {
    ALLOWED_FILE_TYPES.iter().map(|(mime, _)| *mime).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_tables_agree() {
        for (mime, extension) in ALLOWED_FILE_TYPES {
            assert_eq!(extension_for_mime(mime), Some(extension));
            assert_eq!(mime_for_extension(extension), Some(mime));
        }
        assert_eq!(MIME_TO_EXTENSION.len(), EXTENSION_TO_MIME.len());
    }

    #[test]
    fn test_membership() {
        assert!(is_allowed_mime("application/pdf"));
        assert!(is_allowed_extension(".docx"));

        assert!(!is_allowed_mime("application/x-msdownload"));
        assert!(!is_allowed_extension(".exe"));
        assert!(!is_allowed_extension(".jpeg"));
        assert!(!is_allowed_extension("pdf"));
    }

    #[test]
    fn test_presentation_order() {
        assert_eq!(
            allowed_extensions(),
            vec![".pdf", ".doc", ".docx", ".txt", ".jpg", ".png"]
        );
        assert_eq!(allowed_mime_types()[0], "application/pdf");
        assert_eq!(canonical_mime("image/png"), Some("image/png"));
        assert_eq!(canonical_mime("image/gif"), None);
    }
}
