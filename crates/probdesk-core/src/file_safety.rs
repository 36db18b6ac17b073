//! Filename safety for stored attachments.
//!
//! Attachment names end up in two places: as a path component on disk and
//! as a segment of a multi-file encoded field. Both require a name with no
//! path separators, no whitespace, and no delimiter characters.

use crate::defaults::{MAX_FILENAME_LEN, UNNAMED_FILE};

/// Sanitize an uploaded filename for storage as an attachment.
///
/// Keeps only the final path component, then replaces whitespace, path
/// separators, `|`, and other characters unsafe on common filesystems with
/// `_`. The result is never empty, never `.`/`..`, and at most
/// [`MAX_FILENAME_LEN`] bytes (extension preserved where possible).
pub fn sanitize_attachment_name(filename: &str) -> String {
    // Remove path components
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename).trim();

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.as_str();
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return UNNAMED_FILE.to_string();
    }

    if sanitized.len() > MAX_FILENAME_LEN {
        if let Some(dot_pos) = sanitized.rfind('.') {
            let ext = &sanitized[dot_pos..];
            if ext.len() < MAX_FILENAME_LEN {
                let stem =
                    truncate_at_char_boundary(&sanitized[..dot_pos], MAX_FILENAME_LEN - ext.len());
                return format!("{}{}", stem, ext);
            }
        }
        return truncate_at_char_boundary(sanitized, MAX_FILENAME_LEN).to_string();
    }

    sanitized.to_string()
}

/// Whether a name is usable verbatim as a single path component.
pub fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_path() {
        assert_eq!(sanitize_attachment_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_attachment_name("C:\\Users\\me\\report.pdf"), "report.pdf");
    }

    #[test]
    fn test_sanitize_replaces_whitespace() {
        assert_eq!(sanitize_attachment_name("core dump\t1.log"), "core_dump_1.log");
    }

    #[test]
    fn test_sanitize_replaces_pipes() {
        assert_eq!(sanitize_attachment_name("a|||b.txt"), "a___b.txt");
    }

    #[test]
    fn test_sanitize_empty_and_dots() {
        assert_eq!(sanitize_attachment_name(""), UNNAMED_FILE);
        assert_eq!(sanitize_attachment_name("   "), UNNAMED_FILE);
        assert_eq!(sanitize_attachment_name(".."), UNNAMED_FILE);
        assert_eq!(sanitize_attachment_name("dir/"), UNNAMED_FILE);
    }

    #[test]
    fn test_sanitize_keeps_unicode() {
        assert_eq!(sanitize_attachment_name("根因分析.xlsx"), "根因分析.xlsx");
    }

    #[test]
    fn test_sanitize_truncates_preserving_extension() {
        let long = format!("{}.txt", "x".repeat(400));
        let result = sanitize_attachment_name(&long);
        assert_eq!(result.len(), MAX_FILENAME_LEN);
        assert!(result.ends_with(".txt"));
    }

    #[test]
    fn test_sanitize_truncates_multibyte() {
        let long = "日".repeat(200);
        let result = sanitize_attachment_name(&long);
        assert!(result.len() <= MAX_FILENAME_LEN);
        assert!(result.chars().all(|c| c == '日'));
    }

    #[test]
    fn test_is_safe_component() {
        assert!(is_safe_component("a.txt"));
        assert!(!is_safe_component(".."));
        assert!(!is_safe_component("a/b"));
        assert!(!is_safe_component(""));
    }
}
