//! Structured logging schema and field name constants for probdesk.
//!
//! All crates use these field names for structured logging so that log
//! aggregation can query backup and restore runs consistently.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Operation aborted, requires operator attention |
//! | WARN  | Recoverable issue, item skipped (e.g. an attachment copy failed) |
//! | INFO  | Lifecycle events, export/import completions |
//! | DEBUG | Decision points (token regenerated, archive sizes) |
//! | TRACE | Per-file iteration inside archives |
//!
//! Passphrases, derived keys, and plaintext archive bytes are never logged.

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "api", "db", "crypto", "backup"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "exporter", "importer", "archive", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "export", "import", "pack", "unpack", "relocate"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Record identity being operated on.
pub const RECORD_ID: &str = "record_id";

/// Record identity as recorded in an archive manifest.
pub const OLD_ID: &str = "old_id";

/// Record identity freshly assigned during import.
pub const NEW_ID: &str = "new_id";

/// User on whose behalf an import runs.
pub const ACTING_USER: &str = "acting_user";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of records exported or imported.
pub const RECORD_COUNT: &str = "record_count";

/// Number of old→new identity mappings created.
pub const MAPPING_COUNT: &str = "mapping_count";

/// Number of files written into or read from an archive.
pub const FILE_COUNT: &str = "file_count";

/// Byte length of an archive or blob.
pub const BYTE_LEN: &str = "byte_len";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Every field name defined above.
pub const ALL_FIELDS: &[&str] = &[
    SUBSYSTEM,
    COMPONENT,
    OPERATION,
    RECORD_ID,
    OLD_ID,
    NEW_ID,
    ACTING_USER,
    DURATION_MS,
    RECORD_COUNT,
    MAPPING_COUNT,
    FILE_COUNT,
    BYTE_LEN,
    SUCCESS,
    ERROR_MSG,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_names_unique_snake_case() {
        let unique: HashSet<_> = ALL_FIELDS.iter().collect();
        assert_eq!(unique.len(), ALL_FIELDS.len());
        for name in ALL_FIELDS {
            assert!(name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}
