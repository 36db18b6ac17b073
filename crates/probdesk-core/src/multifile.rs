//! Multi-file field encoding.
//!
//! One attachment field can hold several uploaded files. The store keeps them
//! as a single string: stored filenames joined by [`MULTI_FILE_DELIMITER`].
//! Order is display order and is preserved exactly.
//!
//! `decode_file_list(&encode_file_list(xs)) == xs` holds for every list of
//! names that went through [`sanitize_attachment_name`] first (non-empty, no
//! delimiter substring, no path separators).
//!
//! [`sanitize_attachment_name`]: crate::file_safety::sanitize_attachment_name

use crate::defaults::MULTI_FILE_DELIMITER;
use crate::error::{Error, Result};

/// Join stored filenames into one field value. An empty list encodes to `""`.
pub fn encode_file_list<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|n| n.as_ref())
        .collect::<Vec<_>>()
        .join(MULTI_FILE_DELIMITER)
}

/// Split a field value back into stored filenames.
///
/// Empty segments are dropped, so `""` and a stray trailing delimiter both
/// decode without producing phantom entries.
pub fn decode_file_list(encoded: &str) -> Vec<String> {
    encoded
        .split(MULTI_FILE_DELIMITER)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Encode after checking every name is unambiguous under the codec.
pub fn try_encode_file_list<S: AsRef<str>>(names: &[S]) -> Result<String> {
    for name in names {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(Error::InvalidInput("Empty attachment filename".to_string()));
        }
        if name.contains(MULTI_FILE_DELIMITER) || name.contains(['/', '\\']) {
            return Err(Error::InvalidInput(format!(
                "Attachment filename cannot be encoded: {}",
                name
            )));
        }
    }
    Ok(encode_file_list(names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_safety::sanitize_attachment_name;

    #[test]
    fn test_encode_two_files() {
        assert_eq!(encode_file_list(&["a.txt", "b.txt"]), "a.txt|||b.txt");
    }

    #[test]
    fn test_empty_list_encodes_empty() {
        let empty: [&str; 0] = [];
        assert_eq!(encode_file_list(&empty), "");
        assert!(decode_file_list("").is_empty());
    }

    #[test]
    fn test_decode_preserves_order() {
        let names = vec!["z.log", "a.log", "m.log"];
        assert_eq!(decode_file_list(&encode_file_list(&names)), names);
    }

    #[test]
    fn test_decode_single() {
        assert_eq!(decode_file_list("only.pdf"), vec!["only.pdf"]);
    }

    #[test]
    fn test_decode_skips_empty_segments() {
        assert_eq!(decode_file_list("a.txt||||||b.txt|||"), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_sanitized_names_roundtrip() {
        let raw = [
            "trace dump.log",
            "../../etc/passwd",
            "C:\\logs\\boot.txt",
            "pipe|||inside.txt",
            "报告 v2.docx",
        ];
        let sanitized: Vec<String> = raw.iter().map(|n| sanitize_attachment_name(n)).collect();
        let encoded = try_encode_file_list(&sanitized).unwrap();
        assert_eq!(decode_file_list(&encoded), sanitized);
    }

    #[test]
    fn test_try_encode_rejects_delimiter() {
        let result = try_encode_file_list(&["ok.txt", "bad|||name.txt"]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_try_encode_rejects_separator() {
        assert!(try_encode_file_list(&["dir/file.txt"]).is_err());
        assert!(try_encode_file_list(&["dir\\file.txt"]).is_err());
        assert!(try_encode_file_list(&[""]).is_err());
    }
}
